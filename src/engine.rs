//! Differential block-copy loop.

use crate::{
    error::{CopyError, Result},
    progress::{NoProgress, ProgressSink},
    types::{BlockProgress, CancelToken, Config, CopyResult, StopReason},
};

use std::{
    io::{self, ErrorKind, Read, Seek, SeekFrom, Write},
    time::Instant,
};
use tracing::{debug, trace, warn};

/// Compare-skip-or-write engine.
///
/// Owns the two block buffers for the lifetime of a session. The same engine can
/// `run` several times; counters are per run.
pub struct Engine<P> {
    cfg: Config,
    progress: P,
    cancel: CancelToken,
    source_buf: Vec<u8>,
    dest_buf: Vec<u8>,
}

impl Engine<NoProgress> {
    /// Engine that reports no progress.
    pub fn silent(cfg: Config) -> Result<Self> {
        Self::new(cfg, NoProgress)
    }
}

impl<P: ProgressSink> Engine<P> {
    /// Validate `cfg` and allocate both block buffers.
    pub fn new(cfg: Config, progress: P) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            source_buf: alloc_block(cfg.block_size)?,
            dest_buf: alloc_block(cfg.block_size)?,
            cancel: CancelToken::new(),
            cfg,
            progress,
        })
    }

    /// Stop at the next block boundary once `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.set_cancel(cancel);
        self
    }

    pub fn set_cancel(&mut self, cancel: CancelToken) {
        self.cancel = cancel;
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Copy `source` onto the destination, writing only blocks that differ.
    ///
    /// * `dest_reader` and `dest_writer` must both start at offset 0 of the same
    ///   storage, with independent cursors.
    /// * The writer is only ever moved forward, by the distance between the end of
    ///   the last write and the next differing block.
    /// * Errors stop the loop immediately. Blocks already written stay written.
    pub fn run<S, R, W>(
        &mut self,
        source: &mut S,
        dest_reader: &mut R,
        dest_writer: &mut W,
    ) -> Result<CopyResult>
    where
        S: Read + ?Sized,
        R: Read + ?Sized,
        W: Write + Seek + ?Sized,
    {
        let started = Instant::now();
        let block_size = self.cfg.block_size as u64;

        let mut blocks_read = 0u64;
        let mut blocks_written = 0u64;
        let mut bytes_read = 0u64;
        let mut bytes_written = 0u64;
        // where the writer currently sits
        let mut last_write_end = 0u64;
        let mut written_since_last = 0u64;
        let mut since_observation = 0u64;

        let stop = loop {
            // 1) Stop conditions
            if self.cfg.count_limit != 0 && blocks_read >= self.cfg.count_limit {
                break StopReason::CountLimit;
            }
            if self.cancel.is_cancelled() {
                warn!(blocks_read, blocks_written, "copy interrupted");
                return Err(CopyError::Interrupted {
                    blocks_read,
                    blocks_written,
                });
            }

            let block = blocks_read;
            let offset = block * block_size;

            // 2) Source block; zero bytes means we are done
            let len = read_block(source, &mut self.source_buf).map_err(|source| {
                CopyError::SourceReadFailed {
                    block,
                    offset,
                    source,
                }
            })?;
            if len == 0 {
                break StopReason::SourceExhausted;
            }

            // 3) Matching destination block, never past what the source produced
            let dest_len = read_block(dest_reader, &mut self.dest_buf[..len]).map_err(|source| {
                CopyError::DestinationReadFailed {
                    block,
                    offset,
                    source,
                }
            })?;
            if dest_len < len {
                return Err(CopyError::DestinationTooShort {
                    block,
                    offset,
                    expected: len,
                    actual: dest_len,
                });
            }

            // 4) Compare, 5) seek forward and write on mismatch
            let wrote = self.source_buf[..len] != self.dest_buf[..len];
            if wrote {
                let delta = offset - last_write_end;
                if delta != 0 {
                    let rel = i64::try_from(delta).map_err(|_| CopyError::DestinationSeekFailed {
                        block,
                        offset,
                        delta: i64::MAX,
                        source: io::Error::new(ErrorKind::InvalidInput, "seek delta out of range"),
                    })?;
                    dest_writer
                        .seek(SeekFrom::Current(rel))
                        .map_err(|source| CopyError::DestinationSeekFailed {
                            block,
                            offset,
                            delta: rel,
                            source,
                        })?;
                }
                dest_writer
                    .write_all(&self.source_buf[..len])
                    .map_err(|source| CopyError::DestinationWriteFailed {
                        block,
                        offset,
                        source,
                    })?;
                last_write_end = offset + len as u64;
                debug!(block, offset, len, "block rewritten");
            } else {
                trace!(block, offset, "block unchanged");
            }

            // 6) Counters
            blocks_read += 1;
            bytes_read += len as u64;
            if wrote {
                blocks_written += 1;
                bytes_written += len as u64;
                written_since_last += 1;
            }

            // 7) Report progress
            since_observation += 1;
            if since_observation >= self.cfg.progress_interval {
                since_observation = 0;
                self.progress.observe(&BlockProgress {
                    blocks_read,
                    blocks_written,
                    written_since_last,
                    expected_blocks: self.cfg.expected_blocks,
                });
                written_since_last = 0;
            }
        };

        dest_writer
            .flush()
            .map_err(|source| CopyError::DestinationWriteFailed {
                block: blocks_read,
                offset: last_write_end,
                source,
            })?;

        Ok(CopyResult {
            blocks_read,
            blocks_written,
            bytes_read,
            bytes_written,
            elapsed: started.elapsed(),
            stop,
        })
    }
}

/// One-shot copy without progress reporting or cancellation.
pub fn run<S, R, W>(
    source: &mut S,
    dest_reader: &mut R,
    dest_writer: &mut W,
    block_size: usize,
    count_limit: u64,
) -> Result<CopyResult>
where
    S: Read + ?Sized,
    R: Read + ?Sized,
    W: Write + Seek + ?Sized,
{
    let cfg = Config {
        count_limit,
        ..Config::with_block_size(block_size)
    };
    Engine::silent(cfg)?.run(source, dest_reader, dest_writer)
}

/// Reserve and zero one block buffer.
///
/// Only the reservation is fallible. Under memory overcommit a huge block size can
/// pass it and still fail later, when the pages are first touched.
fn alloc_block(size: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|_| CopyError::BufferAllocationFailed { size })?;
    buf.resize(size, 0);
    Ok(buf)
}

/// Fill `buf` unless the stream ends first. Returns the byte count, 0 at end of stream.
fn read_block<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
