pub mod formatter;

pub use formatter::{RenderError, format, render_block, resolve_profile};
