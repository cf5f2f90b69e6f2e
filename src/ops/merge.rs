use indexmap::IndexMap;

use crate::model::file_state::FileState;
use crate::model::issue::Issue;
use crate::model::profile::Profile;
use crate::ops::duplicate::is_duplicate_in;
use crate::parse::{is_import_line, is_marker_line};
use crate::render::render_block;

/// What a merge did, per issue key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Final file text
    pub text: String,
    /// Keys whose existing block was replaced in place
    pub updated: Vec<String>,
    /// Keys inserted as new blocks
    pub inserted: Vec<String>,
    /// Keys dropped by the duplicate guard
    pub skipped: Vec<String>,
    /// Import lines appended to the import block
    pub imports_added: Vec<String>,
}

impl MergeOutcome {
    /// Whether the merged text differs from `original`.
    pub fn changed(&self, original: &str) -> bool {
        self.text != original
    }
}

/// Collapse repeated keys (last value wins, first position kept), then sort
/// by the key's numeric suffix. The sort is stable, so equal suffixes keep
/// fetch order; keys without a number go last.
pub fn order_batch(issues: &[Issue]) -> Vec<&Issue> {
    let mut by_key: IndexMap<&str, &Issue> = IndexMap::new();
    for issue in issues {
        if by_key.insert(issue.key.as_str(), issue).is_some() {
            tracing::debug!(key = %issue.key, "repeated key in batch, keeping the later one");
        }
    }
    let mut ordered: Vec<&Issue> = by_key.into_values().collect();
    ordered.sort_by_key(|issue| issue.number().unwrap_or(u64::MAX));
    ordered
}

/// Reconcile the scanned file with a batch of issues.
///
/// Issues whose key already has a block are re-rendered in place (never
/// duplicate-checked). Other issues pass through the duplicate guard and are
/// inserted before the marker line, or at the end when there is no marker.
/// Profile imports are merged into the existing import block. Feeding the
/// result back in with the same issues and profile returns identical text.
pub fn merge(
    state: &FileState,
    issues: &[Issue],
    profile: &Profile,
    allow_duplicates: bool,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    let eol = line_ending(&state.content);

    // Classify
    let mut replacements = Vec::new();
    let mut candidates = Vec::new();
    for issue in order_batch(issues) {
        let rendered = with_line_ending(&render_block(issue, profile), eol);
        match state.blocks.get(&issue.key) {
            Some(span) => {
                replacements.push((span.byte_range.clone(), rendered));
                outcome.updated.push(issue.key.clone());
            }
            None => candidates.push((issue.key.clone(), rendered)),
        }
    }

    // Replace in place, back to front so earlier offsets stay valid
    let mut replaced = state.content.clone();
    replacements.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));
    for (range, rendered) in &replacements {
        replaced.replace_range(range.clone(), rendered);
    }

    // Stage new blocks
    let mut staged: Vec<String> = Vec::new();
    for (key, rendered) in candidates {
        if is_duplicate_in(&rendered, &replaced, &staged, allow_duplicates) {
            tracing::debug!(key = %key, "skipping duplicate block");
            outcome.skipped.push(key);
            continue;
        }
        staged.push(rendered);
        outcome.inserted.push(key);
    }

    // Imports: existing order first, profile imports appended
    let mut imports = state.imports.clone();
    for line in profile.import_lines() {
        if imports.insert(line.clone()) {
            outcome.imports_added.push(line);
        }
    }

    // Body: the import region minus its import lines, then the rest verbatim.
    // Blocks never start inside the import region, so its offset still holds.
    let (head, tail) = replaced.split_at(state.import_end.min(replaced.len()));
    let mut body: String = head
        .split_inclusive('\n')
        .filter(|line| !is_import_line(strip_line_ending(line)))
        .collect();
    body.push_str(tail);

    let marker = line_starts(&body).find(|&(_, line)| is_marker_line(strip_line_ending(line)));
    let (pre, post) = match marker {
        Some((offset, _)) => body.split_at(offset),
        None => (body.as_str(), ""),
    };

    let import_block = imports.iter().map(String::as_str).collect::<Vec<_>>().join(eol);
    let blank_line = format!("{eol}{eol}");
    let staged_block = staged.join(blank_line.as_str());
    let sections = [
        import_block.as_str(),
        trim_blank_lines(pre),
        staged_block.as_str(),
        trim_blank_lines(post),
    ];
    let mut text = sections
        .iter()
        .copied()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(blank_line.as_str());
    if !text.is_empty() {
        text.push_str(eol);
    }
    outcome.text = text;

    tracing::debug!(
        updated = outcome.updated.len(),
        inserted = outcome.inserted.len(),
        skipped = outcome.skipped.len(),
        imports_added = outcome.imports_added.len(),
        "merge computed"
    );
    outcome
}

/// Line ending of the first line; files without one use `\n`.
fn line_ending(text: &str) -> &'static str {
    match text.find('\n') {
        Some(i) if text[..i].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

fn with_line_ending(text: &str, eol: &str) -> String {
    if eol == "\n" {
        text.to_string()
    } else {
        text.replace('\n', eol)
    }
}

fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}

/// Lines with their endings, paired with their byte offset.
fn line_starts(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_inclusive('\n').scan(0, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line))
    })
}

/// Drop leading and trailing whitespace-only lines and the final line
/// ending. Everything in between is returned verbatim.
fn trim_blank_lines(text: &str) -> &str {
    let start: usize = text
        .split_inclusive('\n')
        .take_while(|line| line.trim().is_empty())
        .map(str::len)
        .sum();
    let rest = &text[start..];
    let trailing: usize = rest
        .split_inclusive('\n')
        .rev()
        .take_while(|line| line.trim().is_empty())
        .map(str::len)
        .sum();
    strip_line_ending(&rest[..rest.len() - trailing])
}
