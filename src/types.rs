//! .

use crate::error::{CopyError, Result};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

/// Default block size, 1 MiB.
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Unit of transfer and comparison (bytes). Must be > 0.
    pub block_size: usize,
    /// Cap on blocks processed; 0 runs until the source is exhausted.
    pub count_limit: u64,
    /// Emit a progress observation every this many blocks.
    pub progress_interval: u64,
    /// Estimated source length in blocks, used for percentages only.
    pub expected_blocks: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }
}

impl Config {
    /// Config for `block_size` with the default progress cadence
    /// (roughly every 5 MB processed, at least every block).
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            block_size,
            count_limit: 0,
            progress_interval: default_progress_interval(block_size),
            expected_blocks: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(CopyError::InvalidConfiguration(
                "block size must be greater than zero".into(),
            ));
        }
        if self.progress_interval == 0 {
            return Err(CopyError::InvalidConfiguration(
                "progress interval must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn default_progress_interval(block_size: usize) -> u64 {
    const MARK_BYTES: u64 = 10_000 * 512;
    match block_size as u64 {
        0 => 1,
        bs => (MARK_BYTES / bs).max(1),
    }
}

/// Why the copy loop stopped without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    SourceExhausted,
    CountLimit,
}

/// Summary of a finished copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyResult {
    pub blocks_read: u64,
    pub blocks_written: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub elapsed: Duration,
    pub stop: StopReason,
}

/// Progress observation handed to a `ProgressSink`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockProgress {
    pub blocks_read: u64,
    pub blocks_written: u64,
    /// Blocks written since the previous observation.
    pub written_since_last: u64,
    pub expected_blocks: Option<u64>,
}

impl BlockProgress {
    /// Percentage of the estimated total, if the total is known.
    pub fn percent(&self) -> Option<f64> {
        match self.expected_blocks {
            Some(total) if total > 0 => Some(self.blocks_read as f64 / total as f64 * 100.0),
            _ => None,
        }
    }
}

/// Shared cancellation flag, checked by the engine at every block boundary.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
