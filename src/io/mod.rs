pub mod logging;
pub mod profile_io;
pub mod test_file;
