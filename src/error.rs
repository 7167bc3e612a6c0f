//! .

use std::{io, path::PathBuf};

pub type Result<T> = std::result::Result<T, CopyError>;

/// Which side of the copy a handle belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Source => f.write_str("source"),
            Side::Destination => f.write_str("destination"),
        }
    }
}

/// Crate error. Every variant is terminal for the session.
#[derive(thiserror::Error, Debug)]
pub enum CopyError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("cannot open {side} {}: {source}", .path.display())]
    OpenFailed {
        side: Side,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot query size of {side} {}: {source}", .path.display())]
    SizeQueryFailed {
        side: Side,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("destination ({destination} bytes) is smaller than source ({source_len} bytes)")]
    SizeValidationFailed { source_len: u64, destination: u64 },
    #[error("cannot allocate {size} byte block buffers")]
    BufferAllocationFailed { size: usize },
    #[error("source read failed at block {block} (offset {offset}): {source}")]
    SourceReadFailed {
        block: u64,
        offset: u64,
        #[source]
        source: io::Error,
    },
    #[error("destination read failed at block {block} (offset {offset}): {source}")]
    DestinationReadFailed {
        block: u64,
        offset: u64,
        #[source]
        source: io::Error,
    },
    #[error(
        "destination too short at block {block} (offset {offset}): expected {expected} bytes, got {actual}"
    )]
    DestinationTooShort {
        block: u64,
        offset: u64,
        expected: usize,
        actual: usize,
    },
    #[error("destination seek by {delta} failed at block {block} (offset {offset}): {source}")]
    DestinationSeekFailed {
        block: u64,
        offset: u64,
        delta: i64,
        #[source]
        source: io::Error,
    },
    #[error("destination write failed at block {block} (offset {offset}): {source}")]
    DestinationWriteFailed {
        block: u64,
        offset: u64,
        #[source]
        source: io::Error,
    },
    #[error("interrupted after {blocks_read} blocks ({blocks_written} written)")]
    Interrupted { blocks_read: u64, blocks_written: u64 },
}

impl CopyError {
    /// Block index the failure happened at, for mid-loop errors.
    pub fn block(&self) -> Option<u64> {
        match self {
            CopyError::SourceReadFailed { block, .. }
            | CopyError::DestinationReadFailed { block, .. }
            | CopyError::DestinationTooShort { block, .. }
            | CopyError::DestinationSeekFailed { block, .. }
            | CopyError::DestinationWriteFailed { block, .. } => Some(*block),
            _ => None,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, CopyError::Interrupted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_errors_carry_their_block() {
        let err = CopyError::DestinationTooShort {
            block: 7,
            offset: 7 * 512,
            expected: 512,
            actual: 100,
        };
        assert_eq!(err.block(), Some(7));

        let err = CopyError::DestinationWriteFailed {
            block: 3,
            offset: 3 * 512,
            source: io::Error::other("disk gone"),
        };
        assert_eq!(err.block(), Some(3));
        assert_eq!(
            err.to_string(),
            "destination write failed at block 3 (offset 1536): disk gone"
        );
    }

    #[test]
    fn setup_errors_have_no_block() {
        let err = CopyError::SizeValidationFailed {
            source_len: 10,
            destination: 5,
        };
        assert_eq!(err.block(), None);
        assert!(!err.is_interrupted());
        let err = CopyError::Interrupted {
            blocks_read: 4,
            blocks_written: 1,
        };
        assert_eq!(err.block(), None);
        assert!(err.is_interrupted());
    }
}
