/// Whether `candidate` (trimmed) already appears verbatim in `current`.
/// Always `false` when duplicates are allowed.
pub fn is_duplicate(candidate: &str, current: &str, allow_duplicates: bool) -> bool {
    if allow_duplicates {
        return false;
    }
    current.contains(candidate.trim())
}

/// Like [`is_duplicate`], checking the file text and any blocks already
/// staged for insertion in this run.
pub fn is_duplicate_in(
    candidate: &str,
    current: &str,
    staged: &[String],
    allow_duplicates: bool,
) -> bool {
    is_duplicate(candidate, current, allow_duplicates)
        || staged
            .iter()
            .any(|block| is_duplicate(candidate, block, allow_duplicates))
}
