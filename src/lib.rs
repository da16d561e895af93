//! Bounty Bot - webhook-driven GitHub automation
//!
//! Two independent handlers registered against the same webhook endpoint:
//!
//! 1. **Bounty approval**: when an issue gains or loses the configured
//!    "bounty awaiting approval" label, a card for it is created in or
//!    removed from a named project-board column and the change is announced
//!    on Slack.
//! 2. **First-contribution greeter**: when a pull request is opened, the
//!    author's issue history is checked and a welcome comment is posted on
//!    their first PR.
//!
//! Both are stateless: webhook payload in, a few GitHub REST calls, at most
//! one or two mutations, optional Slack message. Failures are logged, never
//! retried, and never escalate past the event that caused them.
//!
//! # Dry runs
//!
//! - `DRY_RUN`: card create/delete is replaced by a log line
//! - `DRY_RUN_BOUNTY_APPROVAL`: the bounty flow's Slack send is suppressed

pub mod config;
pub mod event;
pub mod github;
pub mod handlers;
pub mod server;
pub mod slack;

pub use config::{Config, ProjectBoardConfig, RepoConfig};
pub use event::WebhookEvent;
pub use github::{ApiError, GitHubClient};
pub use handlers::HandlerContext;
pub use slack::{Notifier, SlackNotifier};
