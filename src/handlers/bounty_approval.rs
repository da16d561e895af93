//! Bounty approval tracking
//!
//! Reacts to issues being labeled or unlabeled with the configured
//! "awaiting approval" label: keeps a card for the issue in the configured
//! project-board column and announces the change on Slack.

use tracing::{debug, error, info};

use crate::config::{self, ProjectBoardConfig};
use crate::event::{Issue, Label, Repository};
use crate::handlers::HandlerContext;
use crate::slack::Notifier;

const BOT_NAME: &str = "assign-to-bounty-awaiting-for-approval";

/// Handle an `issues.labeled` (assign = true) or `issues.unlabeled`
/// (assign = false) event. Side-effecting only; failures are logged and
/// never propagate.
pub async fn handle(
    ctx: &HandlerContext,
    repository: &Repository,
    issue: &Issue,
    label: &Label,
    assign: bool,
) {
    let owner = &repository.owner.login;
    let repo_config = config::load_repo_config(&ctx.github, owner, &repository.name).await;

    // No bounty-project-board section: feature disabled for this repo
    let Some(board) = repo_config.bounty_project_board else {
        return;
    };

    if !is_watched_label(&board, label) {
        debug!(
            "{} - {} doesn't match watched {} label. Ignoring",
            BOT_NAME, label.name, board.awaiting_approval_label_name
        );
        return;
    }

    if assign {
        info!(
            "{} - Handling labeling of #{} with {} on repo {}",
            BOT_NAME,
            issue.number,
            label.name,
            repository.full_name()
        );
    } else {
        info!(
            "{} - Handling unlabeling of #{} with {} on repo {}",
            BOT_NAME,
            issue.number,
            label.name,
            repository.full_name()
        );
    }

    // Resolve the approval column fresh on every event; either lookup
    // missing is a hard stop for this event.
    let project = match ctx.github.get_org_project_by_name(owner, &board.name).await {
        Ok(Some(project)) => project,
        Ok(None) => return,
        Err(e) => {
            error!("{} - Couldn't list org projects: {}", BOT_NAME, e);
            return;
        }
    };
    let column = match ctx
        .github
        .get_column_by_name(&project, &board.awaiting_approval_column_name)
        .await
    {
        Ok(Some(column)) => column,
        Ok(None) => return,
        Err(e) => {
            error!("{} - Couldn't list project columns: {}", BOT_NAME, e);
            return;
        }
    };

    let is_official_bounty = issue.has_label(&board.bounty_label_name);

    match card_action(assign, ctx.dry_run) {
        CardAction::LogOnly => {
            if assign {
                info!(
                    "{} - Would have created card for issue {} in column {}",
                    BOT_NAME, issue.id, column.id
                );
            } else {
                info!(
                    "{} - Would have deleted card for issue {} in column {}",
                    BOT_NAME, issue.id, column.id
                );
            }
        }
        CardAction::Create => match ctx.github.create_card(column.id, issue.id).await {
            Ok(card) => info!("{} - Created card: {} ({})", BOT_NAME, card.url, card.id),
            Err(e) => error!(
                "{} - Couldn't create project card for the issue: {} (column {}, issue {})",
                BOT_NAME, e, column.id, issue.id
            ),
        },
        CardAction::Delete => {
            match ctx.github.find_card_for_issue(column.id, &issue.url).await {
                Ok(Some(card)) => match ctx.github.delete_card(card.id).await {
                    Ok(()) => info!("{} - Deleted card: {} ({})", BOT_NAME, card.url, card.id),
                    Err(e) => error!(
                        "{} - Couldn't delete project card for the issue: {} (card {})",
                        BOT_NAME, e, card.id
                    ),
                },
                Ok(None) => debug!(
                    "{} - No card found for issue {} in column {}",
                    BOT_NAME, issue.url, column.id
                ),
                Err(e) => error!(
                    "{} - Couldn't list cards in column {}: {}",
                    BOT_NAME, column.id, e
                ),
            }
        }
    }

    // Slack is independent of the card mutation outcome
    if sends_slack_notification(ctx.dry_run, ctx.dry_run_bounty_approval) {
        let message = slack_message(
            assign,
            is_official_bounty,
            &board.name,
            &board.awaiting_approval_column_name,
            &issue.html_url,
        );
        if let Some(room) = repo_config.slack.notification.room {
            if let Err(e) = ctx.slack.send_message(&room, &message).await {
                error!("{} - Couldn't send Slack message: {}", BOT_NAME, e);
            }
        } else {
            debug!("{} - No Slack room configured, skipping notification", BOT_NAME);
        }
    }
}

/// Does the event's label match the one this handler watches?
fn is_watched_label(board: &ProjectBoardConfig, label: &Label) -> bool {
    label.name == board.awaiting_approval_label_name
}

/// What to do about the project card for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Create,
    Delete,
    /// Dry run: log what would have happened, touch nothing
    LogOnly,
}

/// Card mutation policy: the global dry-run flag wins over assign/unassign
pub fn card_action(assign: bool, dry_run: bool) -> CardAction {
    if dry_run {
        CardAction::LogOnly
    } else if assign {
        CardAction::Create
    } else {
        CardAction::Delete
    }
}

/// The Slack announcement is gated only by its own flag; the global
/// dry-run does not suppress it.
pub fn sends_slack_notification(_dry_run: bool, dry_run_bounty_approval: bool) -> bool {
    !dry_run_bounty_approval
}

/// The human-readable Slack announcement for a card change
pub fn slack_message(
    assign: bool,
    is_official_bounty: bool,
    board_name: &str,
    column_name: &str,
    issue_url: &str,
) -> String {
    if assign {
        format!("Assigned issue to {column_name} in {board_name} project\n{issue_url}")
    } else if is_official_bounty {
        format!("{issue_url} has been approved as an official bounty!")
    } else {
        format!("Unassigned issue from {column_name} in {board_name} project\n{issue_url}")
    }
}
