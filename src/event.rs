//! Typed GitHub webhook payloads
//!
//! The bot only cares about three events: an issue being labeled, an issue
//! being unlabeled, and a pull request being opened. Everything else parses
//! to `None` and is dropped at dispatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub login: String,
    #[serde(default)]
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: Account,
}

impl Repository {
    /// The `owner/name` form used in log lines
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner.login, self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub number: u32,
    pub title: String,
    /// API URL, matched against a card's `content_url` when deleting
    pub url: String,
    /// Browser URL, used in Slack messages
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub user: Account,
    pub created_at: DateTime<Utc>,
}

impl Issue {
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u32,
    pub html_url: String,
    pub user: Account,
}

#[derive(Debug, Clone, Deserialize)]
struct IssuesPayload {
    action: String,
    issue: Issue,
    label: Option<Label>,
    repository: Repository,
    sender: Account,
}

#[derive(Debug, Clone, Deserialize)]
struct PullRequestPayload {
    action: String,
    pull_request: PullRequest,
    repository: Repository,
    sender: Account,
}

/// A webhook delivery the bot reacts to
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    IssueLabeled {
        repository: Repository,
        issue: Issue,
        label: Label,
        sender: Account,
    },
    IssueUnlabeled {
        repository: Repository,
        issue: Issue,
        label: Label,
        sender: Account,
    },
    PullRequestOpened {
        repository: Repository,
        pull_request: PullRequest,
        sender: Account,
    },
}

impl WebhookEvent {
    /// Parse a delivery from its `X-GitHub-Event` name and JSON body.
    ///
    /// Returns `Ok(None)` for events and actions the bot doesn't handle;
    /// `Err` only when a relevant payload fails to deserialize.
    pub fn parse(event_name: &str, body: &[u8]) -> Result<Option<Self>, serde_json::Error> {
        match event_name {
            "issues" => {
                let payload: IssuesPayload = serde_json::from_slice(body)?;
                let label = match payload.label {
                    Some(label) => label,
                    None => return Ok(None),
                };
                match payload.action.as_str() {
                    "labeled" => Ok(Some(WebhookEvent::IssueLabeled {
                        repository: payload.repository,
                        issue: payload.issue,
                        label,
                        sender: payload.sender,
                    })),
                    "unlabeled" => Ok(Some(WebhookEvent::IssueUnlabeled {
                        repository: payload.repository,
                        issue: payload.issue,
                        label,
                        sender: payload.sender,
                    })),
                    _ => Ok(None),
                }
            }
            "pull_request" => {
                let payload: PullRequestPayload = serde_json::from_slice(body)?;
                if payload.action == "opened" {
                    Ok(Some(WebhookEvent::PullRequestOpened {
                        repository: payload.repository,
                        pull_request: payload.pull_request,
                        sender: payload.sender,
                    }))
                } else {
                    Ok(None)
                }
            }
            _ => Ok(None),
        }
    }

    /// Login of the account that triggered the event
    pub fn sender_login(&self) -> &str {
        match self {
            WebhookEvent::IssueLabeled { sender, .. }
            | WebhookEvent::IssueUnlabeled { sender, .. }
            | WebhookEvent::PullRequestOpened { sender, .. } => &sender.login,
        }
    }
}
