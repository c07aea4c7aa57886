use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong in response to a user action. None of these
/// are fatal: the caller reports the message and the viewer keeps its state.
#[derive(Debug, Error)]
pub enum Error {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a supported image format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("could not decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not move to trash: {0}")]
    Trash(#[from] trash::Error),

    #[error("a file named \"{0}\" already exists")]
    NameConflict(String),

    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    #[error("rename failed: {0}")]
    RenameFailed(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
