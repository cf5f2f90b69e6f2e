use std::sync::LazyLock;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;

use crate::model::file_state::FileState;
use crate::parse::span::BlockSpan;

/// Literal token identifying the insertion marker comment
pub const MARKER_TOKEN: &str = "@TESTGEN";

/// Canonical form of the marker line
pub const MARKER_LINE: &str = "// @TESTGEN - for AI generated scaffolding";

/// Column-zero describe header whose title ends in ` @KEY`.
/// Group 1 is the issue key.
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[\w$.]*describe[\w.]*\s*\(\s*['"`](?:.*\s)?@([A-Za-z][A-Za-z0-9_]*-\d+)['"`]\s*,"#)
        .expect("header pattern is valid")
});

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^import\s+(?:[\w*${}\s,]+\s+from\s+)?['"][^'"]+['"];?\s*$"#)
        .expect("import pattern is valid")
});

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*//\s*{}\b", regex::escape(MARKER_TOKEN)))
        .expect("marker pattern is valid")
});

/// One line of the source with its byte offset
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    start: usize,
    /// Line content without `\n` / `\r\n`
    text: &'a str,
}

fn split_lines(source: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for raw in source.split_inclusive('\n') {
        let text = raw.trim_end_matches('\n').trim_end_matches('\r');
        lines.push(Line {
            start: offset,
            text,
        });
        offset += raw.len();
    }
    lines
}

/// Scan raw test file text for generated blocks, imports and the marker.
/// Never fails: text that does not fit a pattern is simply not indexed.
pub fn scan(source: &str) -> FileState {
    let lines = split_lines(source);
    let (imports, import_end) = find_imports(&lines, source.len());
    let state = FileState {
        content: source.to_string(),
        blocks: find_blocks(&lines),
        imports,
        import_end,
        marker: find_marker(&lines),
    };
    tracing::debug!(
        blocks = state.blocks.len(),
        imports = state.imports.len(),
        marker = ?state.marker,
        "scanned test file"
    );
    state
}

/// Issue key of a column-zero generated block header, if `line` is one.
pub fn header_key(line: &str) -> Option<&str> {
    HEADER_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn is_import_line(line: &str) -> bool {
    IMPORT_RE.is_match(line)
}

pub fn is_marker_line(line: &str) -> bool {
    MARKER_RE.is_match(line)
}

fn find_blocks(lines: &[Line<'_>]) -> IndexMap<String, BlockSpan> {
    let mut blocks: IndexMap<String, BlockSpan> = IndexMap::new();
    let mut idx = 0;
    while idx < lines.len() {
        let Some(key) = header_key(lines[idx].text) else {
            idx += 1;
            continue;
        };
        match block_end(lines, idx) {
            Some(end) => {
                let span = BlockSpan::new(
                    lines[idx].start..lines[end].start + lines[end].text.len(),
                    idx..end + 1,
                );
                if blocks.contains_key(key) {
                    tracing::warn!(key, "duplicate generated block in file, using the last one");
                    blocks.shift_remove(key);
                }
                blocks.insert(key.to_string(), span);
                idx = end + 1;
            }
            None => {
                tracing::debug!(key, line = idx + 1, "unterminated block left as plain text");
                idx += 1;
            }
        }
    }
    blocks
}

/// Index of the line closing the block opened at `header`, or `None` when
/// the block is malformed (never balances, closes off column zero, or runs
/// into another header first).
fn block_end(lines: &[Line<'_>], header: usize) -> Option<usize> {
    let mut counter = BraceCounter::default();
    for (idx, line) in lines.iter().enumerate().skip(header) {
        if idx > header && header_key(line.text).is_some() {
            return None;
        }
        if !counter.feed(line.text) {
            return None;
        }
        if counter.opened && counter.depth == 0 {
            return (idx > header && line.text.starts_with('}')).then_some(idx);
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LexState {
    #[default]
    Code,
    BlockComment,
    Template,
}

/// Brace depth tracker that ignores braces inside strings and comments.
#[derive(Debug, Default)]
struct BraceCounter {
    depth: usize,
    opened: bool,
    state: LexState,
}

impl BraceCounter {
    /// Feed one line. Returns `false` if a closing brace has no opener.
    fn feed(&mut self, line: &str) -> bool {
        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            let next = bytes.get(i + 1).copied();
            match self.state {
                LexState::BlockComment => {
                    if b == b'*' && next == Some(b'/') {
                        self.state = LexState::Code;
                        i += 1;
                    }
                }
                LexState::Template => match b {
                    b'\\' => i += 1,
                    b'`' => self.state = LexState::Code,
                    _ => {}
                },
                LexState::Code => match b {
                    b'/' if next == Some(b'/') => break,
                    b'/' if next == Some(b'*') => {
                        self.state = LexState::BlockComment;
                        i += 1;
                    }
                    b'\'' | b'"' => {
                        i += 1;
                        while i < bytes.len() && bytes[i] != b {
                            if bytes[i] == b'\\' {
                                i += 1;
                            }
                            i += 1;
                        }
                    }
                    b'`' => self.state = LexState::Template,
                    b'{' => {
                        self.depth += 1;
                        self.opened = true;
                    }
                    b'}' => {
                        if self.depth == 0 {
                            return false;
                        }
                        self.depth -= 1;
                    }
                    _ => {}
                },
            }
            i += 1;
        }
        true
    }
}

/// Imports of the leading import region plus the byte offset where that
/// region ends. The region is the run of import, blank and `//` comment lines
/// at the top of the file; import-shaped lines below it are ordinary code.
fn find_imports(lines: &[Line<'_>], source_len: usize) -> (IndexSet<String>, usize) {
    let mut imports = IndexSet::new();
    for line in lines {
        if is_import_line(line.text) {
            imports.insert(line.text.trim_end().to_string());
        } else if !is_leading_trivia(line.text) {
            return (imports, line.start);
        }
    }
    (imports, source_len)
}

/// Blank or `//` comment line that may sit between imports. The marker ends
/// the region.
fn is_leading_trivia(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || (trimmed.starts_with("//") && !is_marker_line(line))
}

fn find_marker(lines: &[Line<'_>]) -> Option<usize> {
    lines
        .iter()
        .find(|line| is_marker_line(line.text))
        .map(|line| line.start)
}
