//! Disk I/O errors.

use std::io;
use std::path::PathBuf;

use strata_common::PageId;
use thiserror::Error;

/// Result type for disk operations.
pub type DiskResult<T> = Result<T, DiskError>;

/// Errors that can occur during page I/O.
#[derive(Debug, Error)]
pub enum DiskError {
    /// The database file could not be opened.
    #[error("failed to open database file {path}: {source}")]
    Open {
        /// Path of the database file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A page could not be read.
    #[error("failed to read page {page_id}: {source}")]
    Read {
        /// Page being read.
        page_id: PageId,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A page could not be written.
    #[error("failed to write page {page_id}: {source}")]
    Write {
        /// Page being written.
        page_id: PageId,
        /// Underlying I/O error.
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DiskError::Read {
            page_id: PageId::new(3),
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "eof"),
        };
        assert!(err.to_string().contains("page 3"));
    }
}
