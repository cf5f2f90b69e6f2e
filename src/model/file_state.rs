use indexmap::{IndexMap, IndexSet};

use crate::parse::span::BlockSpan;

/// Content used when the target test file does not exist yet
pub const PLACEHOLDER_DOCUMENT: &str = "// Playwright test file\n";

/// Everything the anchor locator learned about a test file
#[derive(Debug, Clone, Default)]
pub struct FileState {
    /// Raw file text
    pub content: String,
    /// Generated blocks by issue key (last occurrence wins)
    pub blocks: IndexMap<String, BlockSpan>,
    /// Import lines of the leading import region, in file order
    pub imports: IndexSet<String>,
    /// Byte offset where the leading import region ends
    pub import_end: usize,
    /// Byte offset of the start of the `@TESTGEN` marker line
    pub marker: Option<usize>,
}

impl FileState {
    /// Verbatim text of the block for `key`, if one was found.
    pub fn block_text(&self, key: &str) -> Option<&str> {
        self.blocks.get(key).map(|span| span.slice(&self.content))
    }

    /// The marker line itself (without newline), if present.
    pub fn marker_line(&self) -> Option<&str> {
        let start = self.marker?;
        self.content[start..].lines().next()
    }
}
