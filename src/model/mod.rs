pub mod file_state;
pub mod issue;
pub mod profile;
pub mod registry;

pub use file_state::*;
pub use issue::*;
pub use profile::*;
pub use registry::*;
