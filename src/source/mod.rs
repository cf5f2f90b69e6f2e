pub mod jira;
pub mod json_file;

use std::path::PathBuf;

use crate::model::issue::Issue;

pub use jira::{JiraClient, JiraCredentials};
pub use json_file::JsonFileSource;

/// Error type for issue sources
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse issues in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not build HTTP client: {0}")]
    ClientError(#[source] reqwest::Error),
    #[error("{step} failed at {url}: {source}")]
    RequestError {
        step: &'static str,
        url: String,
        source: reqwest::Error,
    },
    #[error("{step} failed at {url}: HTTP {status}: {body}")]
    StatusError {
        step: &'static str,
        url: String,
        status: u16,
        body: String,
    },
    #[error("board {board} has unsupported type '{kind}'")]
    UnsupportedBoard { board: String, kind: String },
    #[error("{0}")]
    MissingData(String),
}

/// One project/board combination to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchScope {
    pub project: Option<String>,
    pub board: Option<String>,
}

impl FetchScope {
    /// Every project × board pair. An empty list contributes a single
    /// unrestricted (`None`) entry.
    pub fn cartesian(projects: &[String], boards: &[String]) -> Vec<FetchScope> {
        let projects: Vec<Option<String>> = if projects.is_empty() {
            vec![None]
        } else {
            projects.iter().cloned().map(Some).collect()
        };
        let boards: Vec<Option<String>> = if boards.is_empty() {
            vec![None]
        } else {
            boards.iter().cloned().map(Some).collect()
        };
        let mut scopes = Vec::new();
        for project in &projects {
            for board in &boards {
                scopes.push(FetchScope {
                    project: project.clone(),
                    board: board.clone(),
                });
            }
        }
        scopes
    }

    fn describe(&self) -> String {
        format!(
            "project {} / board {}",
            self.project.as_deref().unwrap_or("*"),
            self.board.as_deref().unwrap_or("*")
        )
    }
}

/// Where issues come from
pub trait IssueSource {
    fn fetch_issues(&self, scope: &FetchScope) -> Result<Vec<Issue>, SourceError>;
}

/// Fetch every scope in order. A failing scope is logged and contributes no
/// issues; the run continues with whatever was retrieved.
pub fn fetch_all(source: &dyn IssueSource, scopes: &[FetchScope]) -> Vec<Issue> {
    let mut all = Vec::new();
    for scope in scopes {
        match source.fetch_issues(scope) {
            Ok(issues) => {
                tracing::info!(count = issues.len(), "fetched issues for {}", scope.describe());
                all.extend(issues);
            }
            Err(e) => {
                tracing::error!("could not fetch issues for {}: {}", scope.describe(), e);
            }
        }
    }
    tracing::info!(total = all.len(), "total issues extracted");
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSource;

    impl IssueSource for FakeSource {
        fn fetch_issues(&self, scope: &FetchScope) -> Result<Vec<Issue>, SourceError> {
            match scope.board.as_deref() {
                Some("broken") => Err(SourceError::MissingData("boom".into())),
                Some(board) => Ok(vec![Issue::new(&format!("B{}-1", board), "t", "ac")]),
                None => Ok(Vec::new()),
            }
        }
    }

    #[test]
    fn test_cartesian() {
        let scopes = FetchScope::cartesian(
            &["CRM".to_string(), "IMS".to_string()],
            &["1".to_string(), "2".to_string()],
        );
        assert_eq!(scopes.len(), 4);
        assert_eq!(scopes[1].project.as_deref(), Some("CRM"));
        assert_eq!(scopes[1].board.as_deref(), Some("2"));
    }

    #[test]
    fn test_cartesian_empty_lists() {
        let scopes = FetchScope::cartesian(&[], &[]);
        assert_eq!(
            scopes,
            vec![FetchScope {
                project: None,
                board: None
            }]
        );
    }

    #[test]
    fn test_fetch_all_skips_failures() {
        let scopes = FetchScope::cartesian(
            &[],
            &["1".to_string(), "broken".to_string(), "3".to_string()],
        );
        let issues = fetch_all(&FakeSource, &scopes);
        let keys: Vec<&str> = issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["B1-1", "B3-1"]);
    }
}
