use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{FetchScope, IssueSource, SourceError};
use crate::model::issue::Issue;

/// Issues requested per page
const PAGE_SIZE: u64 = 50;

/// Longest response body kept in an error message
const MAX_ERROR_BODY: usize = 500;

/// Connection settings for a Jira instance
#[derive(Debug, Clone)]
pub struct JiraCredentials {
    pub base_url: String,
    pub username: String,
    pub api_token: String,
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Board {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    filter: Option<FilterRef>,
}

#[derive(Debug, Deserialize)]
struct BoardConfiguration {
    #[serde(default)]
    filter: Option<FilterRef>,
}

#[derive(Debug, Deserialize)]
struct FilterRef {
    id: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Filter {
    #[serde(default)]
    jql: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    issues: Vec<RawIssue>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    key: String,
    #[serde(default)]
    fields: RawFields,
}

#[derive(Debug, Default, Deserialize)]
struct RawFields {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking Jira REST client. Boards are resolved to their issues: scrum
/// boards through their saved filter's JQL, kanban/simple boards through the
/// agile board issue endpoint. Pages are fetched one after another.
pub struct JiraClient {
    http: Client,
    base_url: String,
    username: String,
    api_token: String,
}

impl JiraClient {
    pub fn new(credentials: JiraCredentials, accept_invalid_certs: bool) -> Result<Self, SourceError> {
        let http = Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(SourceError::ClientError)?;
        Ok(JiraClient {
            http,
            base_url: credentials.base_url.trim_end_matches('/').to_string(),
            username: credentials.username,
            api_token: credentials.api_token,
        })
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        step: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(step, url = %url, "jira request");

        let request_error = |source| SourceError::RequestError {
            step,
            url: url.clone(),
            source,
        };
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.api_token))
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().unwrap_or_default();
            body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));
            return Err(SourceError::StatusError {
                step,
                url: url.clone(),
                status: status.as_u16(),
                body,
            });
        }
        response.json::<T>().map_err(request_error)
    }

    /// Fetch every page of an issue listing endpoint.
    fn paginate(
        &self,
        step: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<RawIssue>, SourceError> {
        let mut all = Vec::new();
        let mut start_at = 0u64;
        loop {
            let mut page_query = query.to_vec();
            page_query.push(("startAt", start_at.to_string()));
            page_query.push(("maxResults", PAGE_SIZE.to_string()));

            let page: SearchPage = self.get_json(step, path, &page_query)?;
            let count = page.issues.len() as u64;
            all.extend(page.issues);
            start_at += count;
            if count == 0 || start_at >= page.total {
                break;
            }
        }
        Ok(all)
    }

    fn board_filter_id(&self, board_id: &str, board: Board) -> Result<String, SourceError> {
        let filter = match board.filter {
            Some(filter) => Some(filter),
            None => {
                let config: BoardConfiguration = self.get_json(
                    "Board configuration fetch",
                    &format!("/rest/agile/1.0/board/{}/configuration", board_id),
                    &[],
                )?;
                config.filter
            }
        };
        filter
            .map(|f| id_string(&f.id))
            .ok_or_else(|| SourceError::MissingData(format!("scrum board {} has no filter", board_id)))
    }

    fn fetch_scrum(&self, board_id: &str, board: Board, project: Option<&str>) -> Result<Vec<RawIssue>, SourceError> {
        let filter_id = self.board_filter_id(board_id, board)?;
        tracing::info!(board = board_id, filter = %filter_id, "scrum board linked to filter");

        let filter: Filter = self.get_json(
            "Filter fetch",
            &format!("/rest/api/2/filter/{}", filter_id),
            &[],
        )?;
        let jql = filter
            .jql
            .filter(|j| !j.trim().is_empty())
            .ok_or_else(|| SourceError::MissingData(format!("filter {} has no JQL", filter_id)))?;
        let jql = match project {
            Some(project) => scope_jql(&jql, project),
            None => jql,
        };
        tracing::info!(jql = %jql, "searching issues");
        self.paginate("Issue search", "/rest/api/2/search", &[("jql", jql)])
    }

    fn fetch_kanban(&self, board_id: &str, project: Option<&str>) -> Result<Vec<RawIssue>, SourceError> {
        let query: Vec<(&str, String)> = project
            .map(|p| vec![("jql", format!("project = \"{}\"", p))])
            .unwrap_or_default();
        self.paginate(
            "Kanban issue fetch",
            &format!("/rest/agile/1.0/board/{}/issue", board_id),
            &query,
        )
    }
}

impl IssueSource for JiraClient {
    fn fetch_issues(&self, scope: &FetchScope) -> Result<Vec<Issue>, SourceError> {
        let board_id = scope
            .board
            .as_deref()
            .ok_or_else(|| SourceError::MissingData("a board id is required for Jira".to_string()))?;
        let project = scope.project.as_deref();

        let board: Board = self.get_json(
            "Board fetch",
            &format!("/rest/agile/1.0/board/{}", board_id),
            &[],
        )?;
        tracing::info!(board = board_id, kind = %board.kind, "board type detected");

        let raw = match board.kind.as_str() {
            "scrum" => self.fetch_scrum(board_id, board, project)?,
            "kanban" | "simple" => self.fetch_kanban(board_id, project)?,
            other => {
                return Err(SourceError::UnsupportedBoard {
                    board: board_id.to_string(),
                    kind: other.to_string(),
                });
            }
        };
        Ok(raw.into_iter().filter_map(to_issue).collect())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a raw issue; issues without a plain-text description carry no
/// acceptance criteria and are skipped.
fn to_issue(raw: RawIssue) -> Option<Issue> {
    let title = raw
        .fields
        .summary
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "No Title".to_string());
    match raw.fields.description {
        Some(serde_json::Value::String(text)) if !text.trim().is_empty() => {
            tracing::info!(key = %raw.key, "fetched acceptance criteria for {}", title);
            Some(Issue {
                key: raw.key,
                title,
                acceptance_criteria: text,
            })
        }
        _ => {
            tracing::debug!(key = %raw.key, "skipping issue without acceptance criteria");
            None
        }
    }
}

/// Restrict a JQL query to one project, keeping any trailing ORDER BY.
fn scope_jql(jql: &str, project: &str) -> String {
    let lower = jql.to_ascii_lowercase();
    let (condition, order) = match lower.find("order by") {
        Some(idx) => (jql[..idx].trim(), Some(jql[idx..].trim())),
        None => (jql.trim(), None),
    };
    let mut scoped = if condition.is_empty() {
        format!("project = \"{}\"", project)
    } else {
        format!("project = \"{}\" AND ({})", project, condition)
    };
    if let Some(order) = order {
        scoped.push(' ');
        scoped.push_str(order);
    }
    scoped
}

/// Jira ids come back as strings or numbers depending on the endpoint.
fn id_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
