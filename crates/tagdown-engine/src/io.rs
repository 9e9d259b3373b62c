//! File reading and writing for the conversion pipeline, in blocking and
//! suspending flavors. A missing input file is surfaced as its own error
//! variant so callers can distinguish it from transport failures.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn read_input(path: &Path) -> Result<String, IoError> {
    std::fs::read_to_string(path).map_err(|source| classify_read_error(path, source))
}

pub async fn read_input_async(path: &Path) -> Result<String, IoError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| classify_read_error(path, source))
}

/// Fully replaces any prior content at `path`.
pub fn write_output(path: &Path, contents: &str) -> Result<(), IoError> {
    std::fs::write(path, contents).map_err(IoError::Io)
}

pub async fn write_output_async(path: &Path, contents: &str) -> Result<(), IoError> {
    tokio::fs::write(path, contents).await.map_err(IoError::Io)
}

fn classify_read_error(path: &Path, source: std::io::Error) -> IoError {
    if source.kind() == std::io::ErrorKind::NotFound {
        IoError::InputNotFound(path.to_path_buf())
    } else {
        IoError::Io(source)
    }
}
