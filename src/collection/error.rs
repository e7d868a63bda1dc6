use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("Collection document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read collection document {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Collection document {} is not valid UTF-8: {}", .0.display(), .1)]
    InvalidUtf8(PathBuf, #[source] std::str::Utf8Error),
}

impl CollectionError {
    pub(super) fn from_io(err: std::io::Error, path: &Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            CollectionError::NotFound(path.to_path_buf())
        } else {
            CollectionError::Io(path.to_path_buf(), err)
        }
    }
}
