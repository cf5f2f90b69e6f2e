use serde::Serialize;

use crate::model::file_state::FileState;
use crate::model::issue::Issue;
use crate::model::profile::Profile;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct BlockJson {
    pub key: String,
    /// 1-based line of the describe header
    pub start_line: usize,
    /// 1-based line of the closing `});`
    pub end_line: usize,
}

#[derive(Serialize)]
pub struct ScanJson {
    pub file: String,
    pub imports: Vec<String>,
    pub blocks: Vec<BlockJson>,
    /// 1-based line of the marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_line: Option<usize>,
}

#[derive(Serialize)]
pub struct ProfileJson {
    pub name: String,
    pub imports: Vec<String>,
    pub hooks: Vec<String>,
    pub timeout: u64,
    pub retries: u32,
}

#[derive(Serialize)]
pub struct RenderedJson {
    pub key: String,
    pub block: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn scan_to_json(file: &str, state: &FileState) -> ScanJson {
    ScanJson {
        file: file.to_string(),
        imports: state.imports.iter().cloned().collect(),
        blocks: state
            .blocks
            .iter()
            .map(|(key, span)| BlockJson {
                key: key.clone(),
                start_line: span.line_range.start + 1,
                end_line: span.line_range.end,
            })
            .collect(),
        marker_line: marker_line_number(state),
    }
}

/// 1-based line number of the marker, if any.
pub fn marker_line_number(state: &FileState) -> Option<usize> {
    state
        .marker
        .map(|offset| state.content[..offset].matches('\n').count() + 1)
}

pub fn profile_to_json(profile: &Profile) -> ProfileJson {
    ProfileJson {
        name: profile.name.clone(),
        imports: profile.import_lines(),
        hooks: profile
            .hooks
            .in_order()
            .into_iter()
            .map(|(kind, _)| kind.method().to_string())
            .collect(),
        timeout: profile.timeout,
        retries: profile.retries,
    }
}

pub fn rendered_to_json(issue: &Issue, block: String) -> RenderedJson {
    RenderedJson {
        key: issue.key.clone(),
        block,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::scan;

    #[test]
    fn test_scan_to_json_lines() {
        let text = "import { test } from '@playwright/test';\n\ntest.describe('A @X-1', () => {\n  test('a', async () => {});\n});\n\n// @TESTGEN - for AI generated scaffolding\n";
        let json = scan_to_json("a.spec.ts", &scan(text));
        assert_eq!(json.imports, vec!["import { test } from '@playwright/test';"]);
        assert_eq!(json.blocks.len(), 1);
        assert_eq!(json.blocks[0].key, "X-1");
        assert_eq!(json.blocks[0].start_line, 3);
        assert_eq!(json.blocks[0].end_line, 5);
        assert_eq!(json.marker_line, Some(7));
    }

    #[test]
    fn test_profile_to_json() {
        let profile = Profile::builtin().into_iter().next().unwrap();
        let json = profile_to_json(&profile);
        assert_eq!(json.name, "CRM");
        assert_eq!(json.timeout, 20_000);
        assert_eq!(json.retries, 2);
        assert!(!json.imports.is_empty());
    }
}
