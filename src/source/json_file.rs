use std::fs;
use std::path::PathBuf;

use super::{FetchScope, IssueSource, SourceError};
use crate::model::issue::Issue;

/// Issues exported to a JSON array on disk
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileSource { path: path.into() }
    }

    fn read_all(&self) -> Result<Vec<Issue>, SourceError> {
        let text = fs::read_to_string(&self.path).map_err(|e| SourceError::ReadError {
            path: self.path.clone(),
            source: e,
        })?;
        serde_json::from_str(&text).map_err(|e| SourceError::ParseError {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl IssueSource for JsonFileSource {
    /// Boards are ignored; a project keeps only issues with that key prefix.
    fn fetch_issues(&self, scope: &FetchScope) -> Result<Vec<Issue>, SourceError> {
        let mut issues = self.read_all()?;
        if let Some(project) = &scope.project {
            issues.retain(|issue| issue.prefix() == project);
        }
        Ok(issues)
    }
}
