use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::model::issue::Issue;
use crate::model::profile::Profile;
use crate::model::registry::ProfileRegistry;
use crate::parse::scan;
use crate::render::render_block;

/// Error type for profile loading
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse profiles file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("profile '{name}' renders blocks the locator cannot find again: {reason}")]
    Unmatchable { name: String, reason: String },
}

/// Top level of a profiles TOML file: a list of `[[profile]]` tables
#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default, rename = "profile")]
    profiles: Vec<Profile>,
}

/// Parse profiles from TOML text, validating each one.
pub fn parse_profiles(text: &str) -> Result<Vec<Profile>, ProfileError> {
    let file: ProfileFile = toml::from_str(text)?;
    for profile in &file.profiles {
        validate_profile(profile)?;
    }
    Ok(file.profiles)
}

/// Read profiles from a TOML file.
pub fn load_profiles(path: &Path) -> Result<Vec<Profile>, ProfileError> {
    let text = fs::read_to_string(path).map_err(|e| ProfileError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_profiles(&text)
}

/// Built-in profiles, overlaid with the profiles in `path` when given.
pub fn build_registry(path: Option<&Path>) -> Result<ProfileRegistry, ProfileError> {
    let mut registry = ProfileRegistry::with_builtins();
    if let Some(path) = path {
        for profile in load_profiles(path)? {
            let name = profile.name.clone();
            if registry.insert(profile).is_some() {
                tracing::debug!(profile = %name, "profile file overrides built-in profile");
            }
        }
    }
    Ok(registry)
}

/// A profile is usable only if the blocks it renders are found again by the
/// locator, byte for byte. Otherwise re-runs would stack up new blocks.
pub fn validate_profile(profile: &Profile) -> Result<(), ProfileError> {
    let sample = Issue::new("ACGEN-1", "Sample title", "First step\nSecond step");
    let rendered = render_block(&sample, profile);
    let state = scan(&rendered);
    match state.block_text(&sample.key) {
        Some(found) if found == rendered => Ok(()),
        Some(_) => Err(ProfileError::Unmatchable {
            name: profile.name.clone(),
            reason: "block closes before the end of the rendered text".to_string(),
        }),
        None => Err(ProfileError::Unmatchable {
            name: profile.name.clone(),
            reason: format!(
                "header '{}' must be a column-zero describe ending in ' @KEY' and braces must balance",
                profile.describe_header("Sample title", &sample.key)
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[[profile]]
name = "SHOP"
timeout = 30000
retries = 1

[[profile.imports]]
names = ["test", "expect"]
module = "@playwright/test"

[profile.hooks.before_each]
args = "{ page }"
body = ["await page.goto('/');"]

[[profile]]
name = "CRM"
retries = 0
"#;

    #[test]
    fn test_parse_profiles() {
        let profiles = parse_profiles(SAMPLE).unwrap();
        assert_eq!(profiles.len(), 2);
        let shop = &profiles[0];
        assert_eq!(shop.name, "SHOP");
        assert_eq!(shop.timeout, 30000);
        assert_eq!(shop.retries, 1);
        assert_eq!(
            shop.import_lines(),
            vec!["import { test, expect } from '@playwright/test';"]
        );
        assert!(shop.hooks.before_each.is_some());
        assert!(shop.hooks.after_all.is_none());
        // Defaults fill unspecified templates
        assert_eq!(shop.describe, Profile::new("x").describe);
    }

    #[test]
    fn test_build_registry_overrides_builtin() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("profiles.toml");
        fs::write(&path, SAMPLE).unwrap();

        let registry = build_registry(Some(&path)).unwrap();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.get("CRM").unwrap().retries, 0);
        assert!(registry.get("CRM").unwrap().imports.is_empty());
        assert!(registry.get("SHOP").is_some());
    }

    #[test]
    fn test_build_registry_without_file() {
        let registry = build_registry(None).unwrap();
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_unmatchable_header_rejected() {
        let text = r#"
[[profile]]
name = "BAD"
describe = "  describe('{title}', () => {"
"#;
        let err = parse_profiles(text).unwrap_err();
        assert!(matches!(err, ProfileError::Unmatchable { .. }));
    }

    #[test]
    fn test_unbalanced_hook_rejected() {
        let text = r#"
[[profile]]
name = "BAD"

[profile.hooks.before_all]
body = ["});"]
"#;
        let err = parse_profiles(text).unwrap_err();
        assert!(matches!(err, ProfileError::Unmatchable { .. }));
    }

    #[test]
    fn test_builtins_validate() {
        for profile in Profile::builtin() {
            validate_profile(&profile).unwrap();
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_profiles(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ProfileError::ReadError { .. }));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_profiles("[[profile]]\nretries = \"many\"").unwrap_err();
        assert!(matches!(err, ProfileError::ParseError(_)));
    }
}
