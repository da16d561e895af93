//! Configuration management
//!
//! Two layers:
//! - Process configuration from config.toml (bot identity, server binding,
//!   Slack webhook), with environment variable overrides.
//! - Per-repository configuration from `.github/github-bot.yml` in the
//!   target repo, fetched on every event and falling back to an embedded
//!   default. A repo without a `bounty-project-board` section has the
//!   bounty flow disabled.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::github::GitHubClient;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");
const DEFAULT_REPO_CONFIG: &str = include_str!("../github-bot.yml");

/// Path of the per-repository config file inside the target repo
pub const REPO_CONFIG_PATH: &str = ".github/github-bot.yml";

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub slack: SlackConfig,
}

/// Identity of the bot's own GitHub account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Events triggered by this login are ignored
    pub login: String,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Slack configuration (webhook URL usually comes from SLACK_WEBHOOK_URL)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub webhook_url: String,
}

impl Config {
    /// Load from config.toml or use defaults
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load from specific path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            // Use embedded default config
            toml::from_str(DEFAULT_CONFIG).context("Failed to parse default config")
        }
    }

    /// Get Slack webhook URL (env var takes precedence, None if unset everywhere)
    pub fn slack_webhook_url(&self) -> Option<String> {
        match std::env::var("SLACK_WEBHOOK_URL") {
            Ok(url) if !url.is_empty() => Some(url),
            _ => {
                if self.slack.webhook_url.is_empty() {
                    None
                } else {
                    Some(self.slack.webhook_url.clone())
                }
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        // The embedded default config is validated by the tests below,
        // so this should never fail. Using a fallback for robustness.
        toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|_| Self {
            bot: BotConfig {
                login: "status-github-bot".to_string(),
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            slack: SlackConfig::default(),
        })
    }
}

/// Read a boolean flag from the environment. Unset, empty, "0" and "false"
/// all mean off.
pub fn env_flag(name: &str) -> bool {
    match std::env::var(name) {
        Ok(v) => !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"),
        Err(_) => false,
    }
}

// ============================================================================
// Per-repository configuration (.github/github-bot.yml)
// ============================================================================

/// Per-repository configuration, deserialized from github-bot.yml
#[derive(Debug, Clone, Deserialize)]
pub struct RepoConfig {
    #[serde(rename = "bounty-project-board")]
    pub bounty_project_board: Option<ProjectBoardConfig>,
    #[serde(default)]
    pub slack: SlackSection,
}

/// The `bounty-project-board` section; absent means the feature is disabled
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectBoardConfig {
    pub name: String,
    #[serde(rename = "awaiting-approval-column-name")]
    pub awaiting_approval_column_name: String,
    #[serde(rename = "awaiting-approval-label-name")]
    pub awaiting_approval_label_name: String,
    #[serde(rename = "bounty-label-name")]
    pub bounty_label_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackSection {
    #[serde(default)]
    pub notification: NotificationSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationSection {
    pub room: Option<String>,
}

impl RepoConfig {
    /// The embedded default used when a repo carries no config of its own
    pub fn default_config() -> Self {
        serde_yaml::from_str(DEFAULT_REPO_CONFIG).unwrap_or(Self {
            bounty_project_board: None,
            slack: SlackSection::default(),
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse github-bot.yml")
    }
}

/// Fetch a repo's github-bot.yml, falling back to the embedded default.
///
/// Never fails: a missing or unparseable file just means default config.
pub async fn load_repo_config(github: &GitHubClient, owner: &str, repo: &str) -> RepoConfig {
    match github.get_file_content(owner, repo, REPO_CONFIG_PATH).await {
        Ok(content) => match RepoConfig::parse(&content) {
            Ok(config) => config,
            Err(e) => {
                debug!(
                    "Invalid {} in {}/{}: {}; using defaults",
                    REPO_CONFIG_PATH, owner, repo, e
                );
                RepoConfig::default_config()
            }
        },
        Err(e) => {
            debug!(
                "No {} in {}/{} ({}); using defaults",
                REPO_CONFIG_PATH, owner, repo, e
            );
            RepoConfig::default_config()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_config_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).expect("default config.toml");
        assert_eq!(config.bot.login, "status-github-bot");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn embedded_repo_config_has_board_section() {
        let config = RepoConfig::default_config();
        let board = config.bounty_project_board.expect("board section");
        assert_eq!(board.name, "Status SOB Swarm");
        assert_eq!(board.awaiting_approval_label_name, "bounty-awaiting-approval");
        assert_eq!(board.bounty_label_name, "bounty");
        assert_eq!(config.slack.notification.room.as_deref(), Some("status-probot"));
    }

    #[test]
    fn missing_board_section_means_disabled() {
        let yaml = r#"
slack:
  notification:
    room: "general"
"#;
        let config = RepoConfig::parse(yaml).unwrap();
        assert!(config.bounty_project_board.is_none());
        assert_eq!(config.slack.notification.room.as_deref(), Some("general"));
    }

    #[test]
    fn parses_full_repo_config() {
        let yaml = r#"
bounty-project-board:
  name: "SOB Swarm"
  awaiting-approval-column-name: "Awaiting Approval"
  awaiting-approval-label-name: "bounty-awaiting-approval"
  bounty-label-name: "bounty"
"#;
        let config = RepoConfig::parse(yaml).unwrap();
        let board = config.bounty_project_board.unwrap();
        assert_eq!(board.name, "SOB Swarm");
        assert_eq!(board.awaiting_approval_column_name, "Awaiting Approval");
        assert!(config.slack.notification.room.is_none());
    }

    #[test]
    fn env_flag_semantics() {
        std::env::remove_var("BOUNTY_BOT_TEST_FLAG");
        assert!(!env_flag("BOUNTY_BOT_TEST_FLAG"));

        std::env::set_var("BOUNTY_BOT_TEST_FLAG", "1");
        assert!(env_flag("BOUNTY_BOT_TEST_FLAG"));

        std::env::set_var("BOUNTY_BOT_TEST_FLAG", "true");
        assert!(env_flag("BOUNTY_BOT_TEST_FLAG"));

        std::env::set_var("BOUNTY_BOT_TEST_FLAG", "0");
        assert!(!env_flag("BOUNTY_BOT_TEST_FLAG"));

        std::env::set_var("BOUNTY_BOT_TEST_FLAG", "false");
        assert!(!env_flag("BOUNTY_BOT_TEST_FLAG"));

        std::env::set_var("BOUNTY_BOT_TEST_FLAG", "");
        assert!(!env_flag("BOUNTY_BOT_TEST_FLAG"));

        std::env::remove_var("BOUNTY_BOT_TEST_FLAG");
    }
}
