use std::path::PathBuf;

use crate::cli::commands::{JiraArgs, SyncArgs};
use crate::ops::sync::{SyncError, SyncRequest};
use crate::source::{FetchScope, IssueSource, JiraClient, JiraCredentials, JsonFileSource, SourceError};

/// Where a sync run gets its issues from
#[derive(Debug, Clone)]
pub enum SourceSettings {
    JsonFile(PathBuf),
    Jira {
        credentials: JiraCredentials,
        insecure: bool,
    },
}

/// Validated settings for one sync run
#[derive(Debug, Clone)]
pub struct Settings {
    pub file: PathBuf,
    pub profile: String,
    pub profiles_file: Option<PathBuf>,
    pub projects: Vec<String>,
    pub boards: Vec<String>,
    pub dry_run: bool,
    pub allow_duplicates: bool,
    pub source: SourceSettings,
}

impl Settings {
    /// Build settings from the parsed command line. Jira runs need at least
    /// one board and complete credentials; JSON runs need neither.
    pub fn from_args(args: SyncArgs) -> Result<Self, SyncError> {
        let source = match args.issues {
            Some(path) => SourceSettings::JsonFile(path),
            None => {
                if args.boards.is_empty() {
                    return Err(SyncError::Config(
                        "at least one --board is required when fetching from Jira".to_string(),
                    ));
                }
                jira_settings(args.jira)?
            }
        };
        Ok(Settings {
            file: args.file,
            profile: args.profile,
            profiles_file: args.profiles,
            projects: args.projects,
            boards: args.boards,
            dry_run: args.dry_run,
            allow_duplicates: args.allow_duplicates,
            source,
        })
    }

    pub fn scopes(&self) -> Vec<FetchScope> {
        FetchScope::cartesian(&self.projects, &self.boards)
    }

    pub fn request<'a>(&'a self, scopes: &'a [FetchScope]) -> SyncRequest<'a> {
        SyncRequest {
            file: &self.file,
            profile: &self.profile,
            scopes,
            dry_run: self.dry_run,
            allow_duplicates: self.allow_duplicates,
        }
    }

    pub fn build_source(&self) -> Result<Box<dyn IssueSource>, SourceError> {
        match &self.source {
            SourceSettings::JsonFile(path) => Ok(Box::new(JsonFileSource::new(path.clone()))),
            SourceSettings::Jira {
                credentials,
                insecure,
            } => {
                if *insecure {
                    tracing::warn!("TLS certificate verification is disabled");
                }
                Ok(Box::new(JiraClient::new(credentials.clone(), *insecure)?))
            }
        }
    }
}

fn jira_settings(jira: JiraArgs) -> Result<SourceSettings, SyncError> {
    let mut missing = Vec::new();
    let mut take = |value: Option<String>, name: &'static str| -> String {
        match value.filter(|v| !v.trim().is_empty()) {
            Some(v) => v,
            None => {
                missing.push(name);
                String::new()
            }
        }
    };
    let base_url = take(jira.url, "--jira-url/JIRA_BASE_URL");
    let username = take(jira.user, "--jira-user/JIRA_USERNAME");
    let api_token = take(jira.token, "--jira-token/JIRA_API_TOKEN");
    if !missing.is_empty() {
        return Err(SyncError::Config(format!(
            "missing Jira settings: {}",
            missing.join(", ")
        )));
    }
    Ok(SourceSettings::Jira {
        credentials: JiraCredentials {
            base_url,
            username,
            api_token,
        },
        insecure: jira.insecure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{Cli, Commands};
    use clap::Parser;

    fn sync_args(argv: &[&str]) -> SyncArgs {
        let mut full = vec!["acgen", "sync"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Sync(args) => args,
            _ => panic!("expected sync"),
        }
    }

    #[test]
    fn test_json_source_needs_no_board() {
        let settings = Settings::from_args(sync_args(&["--issues", "issues.json", "-p", "CRM"])).unwrap();
        assert!(matches!(settings.source, SourceSettings::JsonFile(_)));
        assert_eq!(settings.profile, "CRM");
        assert_eq!(settings.file, PathBuf::from("tests/crm.spec.ts"));
        assert_eq!(settings.scopes().len(), 1);
    }

    #[test]
    fn test_jira_requires_board() {
        let err = Settings::from_args(sync_args(&[
            "--jira-url",
            "https://jira.example.com",
            "--jira-user",
            "me",
            "--jira-token",
            "t",
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("--board"));
    }

    #[test]
    fn test_jira_requires_credentials() {
        let err = Settings::from_args(sync_args(&["-b", "7", "--jira-url", "https://jira.example.com", "--jira-user", "", "--jira-token", ""]))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("JIRA_USERNAME"));
        assert!(msg.contains("JIRA_API_TOKEN"));
        assert!(!msg.contains("JIRA_BASE_URL"));
    }

    #[test]
    fn test_jira_settings_and_scopes() {
        let settings = Settings::from_args(sync_args(&[
            "-p", "CRM", "IMS", "-b", "7", "--jira-url", "https://jira.example.com/", "--jira-user", "me",
            "--jira-token", "t", "-d", "--allow-duplicates",
        ]))
        .unwrap();
        assert!(settings.dry_run);
        assert!(settings.allow_duplicates);
        let scopes = settings.scopes();
        assert_eq!(scopes.len(), 2);
        assert_eq!(scopes[1].project.as_deref(), Some("IMS"));
        assert_eq!(scopes[1].board.as_deref(), Some("7"));
        let request = settings.request(&scopes);
        assert!(request.dry_run);
        assert_eq!(request.profile, "CRM");
    }

    #[test]
    fn test_dup_alias_allows_duplicates() {
        let settings = Settings::from_args(sync_args(&["--issues", "issues.json", "--dup"])).unwrap();
        assert!(settings.allow_duplicates);
    }
}
