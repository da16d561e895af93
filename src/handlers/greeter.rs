//! First-contribution greeter
//!
//! When a pull request is opened, checks whether it is the author's first PR
//! on the repo and posts a welcome comment if so.
//!
//! The check is a heuristic: it counts PR-tagged entries in the author's
//! issue listing and treats exactly one (the PR that triggered the event) as
//! "no prior history". A paginated listing that truncates can undercount.

use tracing::{debug, error, info};

use crate::event::{PullRequest, Repository};
use crate::github::IssueSummary;
use crate::handlers::HandlerContext;

const BOT_NAME: &str = "greet-new-contributor";

// TODO: read the welcome message from a per-repo file (e.g. welcome-msg.md)
const WELCOME_MESSAGE: &str = "Thanks for making your first PR here!";

/// Handle a `pull_request.opened` event
pub async fn handle(ctx: &HandlerContext, repository: &Repository, pull_request: &PullRequest) {
    let owner = &repository.owner.login;
    let author = &pull_request.user.login;

    info!(
        "{} - Handling Pull Request #{} on repo {}",
        BOT_NAME,
        pull_request.number,
        repository.full_name()
    );

    let issues = match ctx
        .github
        .list_issues_by_creator(owner, &repository.name, author)
        .await
    {
        Ok(issues) => issues,
        Err(e) => {
            error!(
                "{} - Couldn't fetch the user's github issues for repo {}: {}",
                BOT_NAME,
                repository.full_name(),
                e
            );
            return;
        }
    };

    if !is_first_pull_request(&issues) {
        debug!(
            "{} - This is not {}'s first PR on {}, ignoring",
            BOT_NAME,
            author,
            repository.full_name()
        );
        return;
    }

    match ctx
        .github
        .create_comment(owner, &repository.name, pull_request.number, WELCOME_MESSAGE)
        .await
    {
        Ok(()) => info!(
            "{} - Greeted {} on PR #{}",
            BOT_NAME, author, pull_request.number
        ),
        // A 404 here means the PR vanished or comments are closed off
        Err(e) if e.is_not_found() => {}
        Err(e) => error!(
            "{} - Couldn't create comment on PR #{}: {}",
            BOT_NAME, pull_request.number, e
        ),
    }
}

/// Exactly one PR-tagged entry in the author's listing means the just-opened
/// PR is their first. The listing mixes issues and PRs; plain issues don't
/// count.
pub fn is_first_pull_request(issues: &[IssueSummary]) -> bool {
    issues.iter().filter(|i| i.is_pull_request()).count() == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::PullRequestRef;

    fn issue(number: u32) -> IssueSummary {
        IssueSummary {
            number,
            state: "open".to_string(),
            created_at: chrono::Utc::now(),
            pull_request: None,
        }
    }

    fn pr(number: u32) -> IssueSummary {
        IssueSummary {
            number,
            state: "open".to_string(),
            created_at: chrono::Utc::now(),
            pull_request: Some(PullRequestRef {
                url: format!("https://api.github.com/repos/o/r/pulls/{number}"),
            }),
        }
    }

    #[test]
    fn single_pr_is_first() {
        assert!(is_first_pull_request(&[pr(7)]));
    }

    #[test]
    fn plain_issues_do_not_count() {
        assert!(is_first_pull_request(&[issue(1), issue(2), pr(7)]));
    }

    #[test]
    fn prior_prs_mean_not_first() {
        assert!(!is_first_pull_request(&[pr(3), pr(7)]));
    }

    #[test]
    fn empty_listing_is_not_first() {
        // The triggering PR should appear in its own listing; an empty
        // result is treated as "don't greet" rather than guessed at.
        assert!(!is_first_pull_request(&[]));
    }
}
