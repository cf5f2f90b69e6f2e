pub mod duplicate;
pub mod merge;
pub mod sync;
