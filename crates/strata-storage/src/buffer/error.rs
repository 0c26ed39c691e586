//! Buffer pool errors.

use thiserror::Error;

use crate::disk::DiskError;

/// Result type for buffer pool operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer pool operations.
#[derive(Debug, Error)]
pub enum BufferError {
    /// No frame can be acquired: every page is pinned.
    #[error("no free frames available, all pages are pinned")]
    NoFreeFrames,

    /// Page I/O failed.
    #[error(transparent)]
    Disk(#[from] DiskError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert!(BufferError::NoFreeFrames.to_string().contains("pinned"));
        assert!(BufferError::Config("num_frames must be > 0")
            .to_string()
            .contains("num_frames"));
    }
}
