use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::file_state::{FileState, PLACEHOLDER_DOCUMENT};
use crate::parse::scan;

/// Error type for test file I/O
#[derive(Debug, thiserror::Error)]
pub enum TestFileError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// A scanned target file plus whether it existed on disk
#[derive(Debug, Clone)]
pub struct LoadedTestFile {
    pub path: PathBuf,
    pub exists: bool,
    pub state: FileState,
}

/// Read the target test file, or the placeholder document if it is missing.
pub fn read_test_file(path: &Path) -> Result<(String, bool), TestFileError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok((text, true)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "test file not found, starting from an empty document");
            Ok((PLACEHOLDER_DOCUMENT.to_string(), false))
        }
        Err(e) => Err(TestFileError::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Read and scan the target test file.
pub fn load_test_file(path: &Path) -> Result<LoadedTestFile, TestFileError> {
    let (text, exists) = read_test_file(path)?;
    Ok(LoadedTestFile {
        path: path.to_path_buf(),
        exists,
        state: scan(&text),
    })
}

/// Write `content` to `path` atomically using a temp file + rename.
/// Missing parent directories are created.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Persist merged text to the target file.
pub fn save_test_file(path: &Path, content: &str) -> Result<(), TestFileError> {
    atomic_write(path, content.as_bytes()).map_err(|e| TestFileError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
