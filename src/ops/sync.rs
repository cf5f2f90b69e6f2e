use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::io::profile_io::ProfileError;
use crate::io::test_file::{self, TestFileError};
use crate::model::registry::ProfileRegistry;
use crate::ops::merge::merge;
use crate::render::{RenderError, resolve_profile};
use crate::source::{FetchScope, IssueSource, SourceError, fetch_all};

/// Error type for a sync run
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    TestFile(#[from] TestFileError),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Everything one sync run needs to know, minus the issue source
#[derive(Debug, Clone)]
pub struct SyncRequest<'a> {
    pub file: &'a Path,
    pub profile: &'a str,
    pub scopes: &'a [FetchScope],
    pub dry_run: bool,
    pub allow_duplicates: bool,
}

/// Result of a sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub file: PathBuf,
    pub fetched: usize,
    pub updated: Vec<String>,
    pub inserted: Vec<String>,
    pub skipped: Vec<String>,
    pub imports_added: Vec<String>,
    /// Whether the merged text differs from what was on disk
    pub changed: bool,
    pub written: bool,
    pub dry_run: bool,
}

/// Fetch issues, merge them into the target file and write it back.
///
/// The profile is resolved before anything is fetched. A run that fetches no
/// issues leaves the file alone. With `dry_run` the merge is computed and
/// reported but nothing is written.
pub fn run(
    request: &SyncRequest<'_>,
    source: &dyn IssueSource,
    registry: &ProfileRegistry,
) -> Result<SyncReport, SyncError> {
    let profile = resolve_profile(registry, request.profile)?;
    tracing::info!(profile = %profile.name, "using profile");
    tracing::info!(
        "Dry Run Mode: {}",
        if request.dry_run { "Enabled" } else { "Disabled" }
    );

    let mut report = SyncReport {
        file: request.file.to_path_buf(),
        dry_run: request.dry_run,
        ..SyncReport::default()
    };

    let issues = fetch_all(source, request.scopes);
    report.fetched = issues.len();
    if issues.is_empty() {
        tracing::info!("no issues with acceptance criteria found, nothing to write");
        return Ok(report);
    }

    let loaded = test_file::load_test_file(request.file)?;
    let outcome = merge(&loaded.state, &issues, profile, request.allow_duplicates);
    report.changed = outcome.changed(&loaded.state.content) || !loaded.exists;

    for key in &outcome.updated {
        tracing::info!(key = %key, "updated existing block");
    }
    for key in &outcome.inserted {
        tracing::info!(key = %key, "inserted new block");
    }
    for key in &outcome.skipped {
        tracing::warn!(key = %key, "skipped duplicate block");
    }
    tracing::info!(
        updated = outcome.updated.len(),
        inserted = outcome.inserted.len(),
        skipped = outcome.skipped.len(),
        imports_added = outcome.imports_added.len(),
        "merge complete"
    );

    report.updated = outcome.updated;
    report.inserted = outcome.inserted;
    report.skipped = outcome.skipped;
    report.imports_added = outcome.imports_added;

    if request.dry_run {
        tracing::info!(path = %request.file.display(), "Dry Run: acceptance criteria would be written to file");
        return Ok(report);
    }
    if !report.changed {
        tracing::info!(path = %request.file.display(), "test file already up to date");
        return Ok(report);
    }

    test_file::save_test_file(request.file, &outcome.text)?;
    tracing::info!(path = %request.file.display(), "acceptance criteria written to file");
    report.written = true;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::issue::Issue;
    use crate::parse::MARKER_LINE;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    struct StaticSource(Vec<Issue>);

    impl IssueSource for StaticSource {
        fn fetch_issues(&self, _scope: &FetchScope) -> Result<Vec<Issue>, SourceError> {
            Ok(self.0.clone())
        }
    }

    fn all_scope() -> Vec<FetchScope> {
        FetchScope::cartesian(&[], &[])
    }

    fn request<'a>(file: &'a Path, scopes: &'a [FetchScope], dry_run: bool) -> SyncRequest<'a> {
        SyncRequest {
            file,
            profile: "CRM",
            scopes,
            dry_run,
            allow_duplicates: false,
        }
    }

    fn source() -> StaticSource {
        StaticSource(vec![
            Issue::new("CRM-2", "User Management", "Admins can add users"),
            Issue::new("CRM-1", "Customer Tracking", "Record visits\nShow history"),
        ])
    }

    #[test]
    fn test_run_writes_missing_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("tests").join("crm.spec.ts");
        let scopes = all_scope();
        let registry = ProfileRegistry::with_builtins();

        let report = run(&request(&file, &scopes, false), &source(), &registry).unwrap();
        assert_eq!(report.fetched, 2);
        assert_eq!(report.inserted, vec!["CRM-1", "CRM-2"]);
        assert!(report.written);

        let text = fs::read_to_string(&file).unwrap();
        assert!(text.contains("// Playwright test file"));
        assert!(text.find("@CRM-1'").unwrap() < text.find("@CRM-2'").unwrap());
    }

    #[test]
    fn test_second_run_is_noop() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("crm.spec.ts");
        let scopes = all_scope();
        let registry = ProfileRegistry::with_builtins();

        run(&request(&file, &scopes, false), &source(), &registry).unwrap();
        let first = fs::read_to_string(&file).unwrap();
        let report = run(&request(&file, &scopes, false), &source(), &registry).unwrap();

        assert_eq!(report.updated, vec!["CRM-1", "CRM-2"]);
        assert!(!report.changed);
        assert!(!report.written);
        assert_eq!(fs::read_to_string(&file).unwrap(), first);
    }

    #[test]
    fn test_dry_run_leaves_file_alone() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("crm.spec.ts");
        let original = format!("import {{ test }} from '@playwright/test';\n\n{}\n", MARKER_LINE);
        fs::write(&file, &original).unwrap();
        let scopes = all_scope();

        let report = run(
            &request(&file, &scopes, true),
            &source(),
            &ProfileRegistry::with_builtins(),
        )
        .unwrap();
        assert!(report.changed);
        assert!(!report.written);
        assert_eq!(report.inserted.len(), 2);
        assert_eq!(fs::read_to_string(&file).unwrap(), original);
    }

    #[test]
    fn test_dry_run_does_not_create_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("crm.spec.ts");
        let scopes = all_scope();
        run(
            &request(&file, &scopes, true),
            &source(),
            &ProfileRegistry::with_builtins(),
        )
        .unwrap();
        assert!(!file.exists());
    }

    #[test]
    fn test_unknown_profile_fails_before_writing() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("crm.spec.ts");
        let scopes = all_scope();
        let mut req = request(&file, &scopes, false);
        req.profile = "NOPE";

        let err = run(&req, &source(), &ProfileRegistry::with_builtins()).unwrap_err();
        assert!(matches!(err, SyncError::Render(RenderError::ProfileNotFound { .. })));
        assert!(!file.exists());
    }

    #[test]
    fn test_no_issues_no_write() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("crm.spec.ts");
        let scopes = all_scope();
        let report = run(
            &request(&file, &scopes, false),
            &StaticSource(Vec::new()),
            &ProfileRegistry::with_builtins(),
        )
        .unwrap();
        assert_eq!(report.fetched, 0);
        assert!(!report.written);
        assert!(!file.exists());
    }
}
