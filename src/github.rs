//! GitHub API client for the bot's queries and mutations
//!
//! Supports authentication via environment variables:
//! - EXTRA_GITHUB_TOKEN (priority)
//! - GITHUB_TOKEN (fallback)
//!
//! Covers the classic project-board endpoints (projects, columns, cards),
//! issue listing by creator, comment creation, and fetching a file from a
//! repository (used for per-repo configuration).

use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

const GITHUB_API_BASE: &str = "https://api.github.com";

/// Media type required by the classic projects API
const PROJECTS_PREVIEW: &str = "application/vnd.github.inertia-preview+json";

/// Media type that returns file contents raw instead of base64-wrapped JSON
const RAW_CONTENT: &str = "application/vnd.github.raw+json";

/// Get GitHub token from environment (EXTRA_GITHUB_TOKEN takes priority)
fn get_github_token() -> Option<String> {
    std::env::var("EXTRA_GITHUB_TOKEN")
        .or_else(|_| std::env::var("GITHUB_TOKEN"))
        .ok()
}

/// Failure of a single GitHub API call.
///
/// Handlers pattern-match on this to decide between swallowing (missing
/// resources) and logging (everything else). Nothing is retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("GitHub API error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectColumn {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCard {
    pub id: u64,
    pub url: String,
    /// API URL of the issue the card links to, absent for note cards
    pub content_url: Option<String>,
}

/// Marker object present on issue listings when the entry is a pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub url: String,
}

/// Entry from the repository issue listing (mixes issues and PRs)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSummary {
    pub number: u32,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub pull_request: Option<PullRequestRef>,
}

impl IssueSummary {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubClient {
    pub fn new() -> Self {
        let token = get_github_token();
        if token.is_some() {
            info!("GitHub client initialized with authentication token");
        } else {
            warn!(
                "GitHub client initialized WITHOUT token - rate limits will be very low (60/hour)"
            );
        }
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }

    fn build_request(&self, method: Method, url: &str, accept: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(method, url)
            .header("User-Agent", "bounty-bot/0.1.0")
            .header("Accept", accept)
            .header("X-GitHub-Api-Version", "2022-11-28");

        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        req
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().to_string();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url));
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }

    /// List an organization's classic project boards
    pub async fn list_org_projects(&self, org: &str) -> Result<Vec<Project>, ApiError> {
        let url = format!("{}/orgs/{}/projects?per_page=100", GITHUB_API_BASE, org);
        let response = self
            .build_request(Method::GET, &url, PROJECTS_PREVIEW)
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    /// List the columns of a project board
    pub async fn list_columns(&self, project_id: u64) -> Result<Vec<ProjectColumn>, ApiError> {
        let url = format!(
            "{}/projects/{}/columns?per_page=100",
            GITHUB_API_BASE, project_id
        );
        let response = self
            .build_request(Method::GET, &url, PROJECTS_PREVIEW)
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    /// List the cards in a column
    pub async fn list_cards(&self, column_id: u64) -> Result<Vec<ProjectCard>, ApiError> {
        let url = format!(
            "{}/projects/columns/{}/cards?per_page=100",
            GITHUB_API_BASE, column_id
        );
        let response = self
            .build_request(Method::GET, &url, PROJECTS_PREVIEW)
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    /// Create a card in a column linking an issue by its numeric id
    pub async fn create_card(
        &self,
        column_id: u64,
        issue_id: u64,
    ) -> Result<ProjectCard, ApiError> {
        let url = format!("{}/projects/columns/{}/cards", GITHUB_API_BASE, column_id);
        let response = self
            .build_request(Method::POST, &url, PROJECTS_PREVIEW)
            .json(&json!({
                "content_type": "Issue",
                "content_id": issue_id,
            }))
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    /// Delete a project card
    pub async fn delete_card(&self, card_id: u64) -> Result<(), ApiError> {
        let url = format!("{}/projects/columns/cards/{}", GITHUB_API_BASE, card_id);
        let response = self
            .build_request(Method::DELETE, &url, PROJECTS_PREVIEW)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    /// Resolve a project board by exact name among an org's boards
    pub async fn get_org_project_by_name(
        &self,
        org: &str,
        name: &str,
    ) -> Result<Option<Project>, ApiError> {
        let projects = self.list_org_projects(org).await?;
        let project = projects.into_iter().find(|p| p.name == name);
        if project.is_none() {
            debug!("No project board named '{}' in org {}", name, org);
        }
        Ok(project)
    }

    /// Resolve a column by exact name within a project board
    pub async fn get_column_by_name(
        &self,
        project: &Project,
        name: &str,
    ) -> Result<Option<ProjectColumn>, ApiError> {
        let columns = self.list_columns(project.id).await?;
        let column = columns.into_iter().find(|c| c.name == name);
        if column.is_none() {
            debug!("No column named '{}' in project '{}'", name, project.name);
        }
        Ok(column)
    }

    /// Find the card in a column whose linked content matches an issue URL
    pub async fn find_card_for_issue(
        &self,
        column_id: u64,
        issue_url: &str,
    ) -> Result<Option<ProjectCard>, ApiError> {
        let cards = self.list_cards(column_id).await?;
        Ok(cards
            .into_iter()
            .find(|c| c.content_url.as_deref() == Some(issue_url)))
    }

    /// List issues and PRs in a repo created by a given user, across all states.
    ///
    /// Single page of up to 100 entries; a truncated listing undercounts.
    pub async fn list_issues_by_creator(
        &self,
        owner: &str,
        repo: &str,
        creator: &str,
    ) -> Result<Vec<IssueSummary>, ApiError> {
        let url = format!(
            "{}/repos/{}/{}/issues?state=all&per_page=100&creator={}",
            GITHUB_API_BASE,
            owner,
            repo,
            urlencoding::encode(creator)
        );

        debug!("Fetching issues created by {}: {}", creator, url);

        let response = self
            .build_request(Method::GET, &url, "application/vnd.github+json")
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    /// Post a comment on an issue or pull request
    pub async fn create_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u32,
        body: &str,
    ) -> Result<(), ApiError> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            GITHUB_API_BASE, owner, repo, number
        );
        let response = self
            .build_request(Method::POST, &url, "application/vnd.github+json")
            .json(&json!({ "body": body }))
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    /// Fetch a file from a repository's default branch as raw text
    pub async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<String, ApiError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            GITHUB_API_BASE, owner, repo, path
        );
        let response = self
            .build_request(Method::GET, &url, RAW_CONTENT)
            .send()
            .await?;
        Ok(self.check(response).await?.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_github_token_priority() {
        std::env::remove_var("EXTRA_GITHUB_TOKEN");
        std::env::remove_var("GITHUB_TOKEN");

        std::env::set_var("GITHUB_TOKEN", "github_token");
        assert_eq!(get_github_token(), Some("github_token".to_string()));

        std::env::set_var("EXTRA_GITHUB_TOKEN", "extra_token");
        assert_eq!(get_github_token(), Some("extra_token".to_string()));

        std::env::remove_var("EXTRA_GITHUB_TOKEN");
        std::env::remove_var("GITHUB_TOKEN");
    }

    #[test]
    fn test_parse_issue_summary() -> Result<(), serde_json::Error> {
        let json = r#"[
            {"number": 1, "state": "closed", "created_at": "2018-01-01T00:00:00Z", "pull_request": {"url": "https://api.github.com/repos/o/r/pulls/1"}},
            {"number": 2, "state": "open", "created_at": "2018-01-02T00:00:00Z"}
        ]"#;

        let entries: Vec<IssueSummary> = serde_json::from_str(json)?;
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_pull_request());
        assert!(!entries[1].is_pull_request());
        Ok(())
    }

    #[test]
    fn test_parse_project_card() -> Result<(), serde_json::Error> {
        let json = r#"{
            "id": 555,
            "url": "https://api.github.com/projects/columns/cards/555",
            "content_url": "https://api.github.com/repos/o/r/issues/42"
        }"#;

        let card: ProjectCard = serde_json::from_str(json)?;
        assert_eq!(card.id, 555);
        assert_eq!(
            card.content_url.as_deref(),
            Some("https://api.github.com/repos/o/r/issues/42")
        );
        Ok(())
    }

    #[test]
    fn test_note_card_has_no_content_url() -> Result<(), serde_json::Error> {
        let json = r#"{"id": 556, "url": "https://api.github.com/projects/columns/cards/556"}"#;
        let card: ProjectCard = serde_json::from_str(json)?;
        assert!(card.content_url.is_none());
        Ok(())
    }

    #[test]
    fn test_not_found_classification() {
        let err = ApiError::NotFound("https://api.github.com/x".to_string());
        assert!(err.is_not_found());

        let err = ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        };
        assert!(!err.is_not_found());
    }
}
