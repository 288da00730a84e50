use std::error::Error;
use thiserror::Error;

use crate::dao::path::StorePath;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or failed.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Backend description of the failure.
        message: String,
        /// Underlying backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The path does not address anything inside a room document.
    #[error("unsupported store path `{path}`")]
    UnsupportedPath {
        /// Offending path.
        path: StorePath,
    },
    /// A write could not be applied to the node found at the path.
    #[error("cannot write at `{path}`")]
    InvalidWrite {
        /// Target of the write.
        path: StorePath,
        /// Why the tree rejected it.
        #[source]
        source: TreeError,
    },
    /// Stored data did not match the expected shape.
    #[error("malformed value at `{path}`")]
    Malformed {
        /// Where the value was read.
        path: StorePath,
        /// Decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// Concurrent writers kept invalidating the revision we read.
    #[error("write to `{path}` kept conflicting after {attempts} attempt(s)")]
    Conflict {
        /// Target of the write.
        path: StorePath,
        /// Attempts made before giving up.
        attempts: u32,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Failure while walking or editing a JSON tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// An array was addressed with a non-numeric segment.
    #[error("segment `{segment}` is not an array index")]
    InvalidIndex {
        /// Offending segment.
        segment: String,
    },
    /// An array position beyond its end was addressed.
    #[error("index {index} is past the end of an array of length {len}")]
    IndexOutOfRange {
        /// Requested position.
        index: usize,
        /// Length of the array.
        len: usize,
    },
}
