//! Size checks performed before anything is written.

use crate::error::{CopyError, Result, Side};
use std::{fs, path::Path};
use tracing::{debug, warn};

/// Outcome of a successful preflight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Preflight {
    pub source_len: u64,
    /// 0 when the size cannot be known from metadata (block devices).
    pub destination_len: u64,
    pub block_size: usize,
}

impl Preflight {
    /// Estimated number of source blocks, `None` if the source reports no size.
    pub fn source_blocks(&self) -> Option<u64> {
        blocks(self.source_len, self.block_size)
    }

    pub fn destination_blocks(&self) -> Option<u64> {
        blocks(self.destination_len, self.block_size)
    }
}

fn blocks(len: u64, block_size: usize) -> Option<u64> {
    (len > 0).then(|| len.div_ceil(block_size as u64))
}

/// Reject a destination known to be smaller than the source.
///
/// A destination length of 0 means "unknown" and always passes.
pub fn validate_sizes(source_len: u64, destination_len: u64) -> Result<()> {
    if destination_len == 0 {
        warn!("destination size unknown, skipping size validation");
        return Ok(());
    }
    if destination_len < source_len {
        return Err(CopyError::SizeValidationFailed {
            source_len,
            destination: destination_len,
        });
    }
    Ok(())
}

/// Query both sizes and validate them. Touches nothing.
pub fn preflight(source: &Path, destination: &Path, block_size: usize) -> Result<Preflight> {
    if block_size == 0 {
        return Err(CopyError::InvalidConfiguration(
            "block size must be greater than zero".into(),
        ));
    }
    let source_len = size_of(Side::Source, source)?;
    let destination_len = size_of(Side::Destination, destination)?;
    debug!(source_len, destination_len, block_size, "preflight sizes");

    validate_sizes(source_len, destination_len)?;
    Ok(Preflight {
        source_len,
        destination_len,
        block_size,
    })
}

fn size_of(side: Side, path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|source| CopyError::SizeQueryFailed {
            side,
            path: path.to_path_buf(),
            source,
        })
}
