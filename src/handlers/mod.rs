//! Webhook event handlers
//!
//! Each handler is independent: it receives one event, queries GitHub for
//! context, performs at most a couple of mutations, and optionally notifies
//! Slack. No handler error escalates past the event that caused it.

pub mod bounty_approval;
pub mod greeter;

use tracing::debug;

use crate::config::env_flag;
use crate::event::WebhookEvent;
use crate::github::GitHubClient;
use crate::slack::SlackNotifier;

/// Everything a handler needs: API clients, the bot's own identity, and the
/// dry-run switches.
pub struct HandlerContext {
    pub github: GitHubClient,
    pub slack: SlackNotifier,
    /// Login of the bot's GitHub account; its own events are ignored
    pub bot_login: String,
    /// DRY_RUN: replace card create/delete with a log line
    pub dry_run: bool,
    /// DRY_RUN_BOUNTY_APPROVAL: suppress the bounty flow's Slack send
    pub dry_run_bounty_approval: bool,
}

impl HandlerContext {
    pub fn new(github: GitHubClient, slack: SlackNotifier, bot_login: String) -> Self {
        Self {
            github,
            slack,
            bot_login,
            dry_run: env_flag("DRY_RUN"),
            dry_run_bounty_approval: env_flag("DRY_RUN_BOUNTY_APPROVAL"),
        }
    }

    /// Is this an event the bot triggered itself?
    pub fn is_own_event(&self, sender_login: &str) -> bool {
        sender_login.eq_ignore_ascii_case(&self.bot_login)
    }

    /// Route an event to its handler. Self-triggered events are dropped here
    /// so no handler ever sees one.
    pub async fn dispatch(&self, event: WebhookEvent) {
        if self.is_own_event(actor_login(&event)) {
            debug!("Ignoring event triggered by the bot itself");
            return;
        }

        match event {
            WebhookEvent::IssueLabeled {
                repository,
                issue,
                label,
                ..
            } => bounty_approval::handle(self, &repository, &issue, &label, true).await,
            WebhookEvent::IssueUnlabeled {
                repository,
                issue,
                label,
                ..
            } => bounty_approval::handle(self, &repository, &issue, &label, false).await,
            WebhookEvent::PullRequestOpened {
                repository,
                pull_request,
                ..
            } => greeter::handle(self, &repository, &pull_request).await,
        }
    }
}

/// The login whose identity decides "did the bot cause this": the webhook
/// sender for issue events, the PR author for the greeter.
fn actor_login(event: &WebhookEvent) -> &str {
    match event {
        WebhookEvent::PullRequestOpened { pull_request, .. } => &pull_request.user.login,
        other => other.sender_login(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Account, Issue, Label, PullRequest, Repository};

    fn context() -> HandlerContext {
        HandlerContext {
            github: GitHubClient::new(),
            slack: SlackNotifier::new(None),
            bot_login: "status-github-bot".to_string(),
            dry_run: false,
            dry_run_bounty_approval: false,
        }
    }

    fn account(login: &str) -> Account {
        Account {
            login: login.to_string(),
            id: 0,
        }
    }

    fn repository() -> Repository {
        Repository {
            name: "status-react".to_string(),
            owner: account("status-im"),
        }
    }

    fn issue_labeled(sender: &str) -> WebhookEvent {
        WebhookEvent::IssueLabeled {
            repository: repository(),
            issue: Issue {
                id: 1,
                number: 42,
                title: "An issue".to_string(),
                url: "https://api.github.com/repos/status-im/status-react/issues/42".to_string(),
                html_url: "https://github.com/status-im/status-react/issues/42".to_string(),
                labels: vec![],
                user: account("alice"),
                created_at: chrono::Utc::now(),
            },
            label: Label {
                name: "bounty-awaiting-approval".to_string(),
            },
            sender: account(sender),
        }
    }

    fn pr_opened(author: &str, sender: &str) -> WebhookEvent {
        WebhookEvent::PullRequestOpened {
            repository: repository(),
            pull_request: PullRequest {
                number: 7,
                html_url: "https://github.com/status-im/status-react/pull/7".to_string(),
                user: account(author),
            },
            sender: account(sender),
        }
    }

    #[test]
    fn own_events_are_recognized() {
        let ctx = context();
        assert!(ctx.is_own_event("status-github-bot"));
        assert!(ctx.is_own_event("Status-GitHub-Bot"));
        assert!(!ctx.is_own_event("alice"));
    }

    #[test]
    fn issue_event_identity_is_the_sender() {
        let ctx = context();
        assert!(ctx.is_own_event(actor_login(&issue_labeled("status-github-bot"))));
        assert!(!ctx.is_own_event(actor_login(&issue_labeled("alice"))));
    }

    #[test]
    fn greeter_identity_is_the_pr_author() {
        let ctx = context();

        // A PR authored by the bot is its own event no matter who sent
        // the delivery
        assert!(ctx.is_own_event(actor_login(&pr_opened("status-github-bot", "alice"))));

        // A human-authored PR is handled even when the delivery's sender
        // is the bot
        assert!(!ctx.is_own_event(actor_login(&pr_opened("alice", "status-github-bot"))));
    }
}
