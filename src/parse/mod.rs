pub mod anchor;
pub mod span;

pub use anchor::{MARKER_LINE, MARKER_TOKEN, header_key, is_import_line, is_marker_line, scan};
pub use span::BlockSpan;
