//! A copy session: preflight, handles, buffers and the engine, released together.

use crate::{
    engine::Engine,
    error::{CopyError, Result, Side},
    preflight::{Preflight, preflight},
    progress::ProgressSink,
    types::{CancelToken, Config, CopyResult},
};

use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Everything one copy owns. Dropping it closes the three handles and frees the
/// block buffers, whichever way the copy ended.
pub struct CopySession<P> {
    source_path: PathBuf,
    destination_path: PathBuf,
    preflight: Preflight,
    source: File,
    dest_reader: File,
    dest_writer: File,
    engine: Engine<P>,
}

impl<P: ProgressSink> CopySession<P> {
    /// Validate sizes, then open the source read-only and the destination twice:
    /// once for verification reads and once for writes.
    ///
    /// Nothing is opened for writing unless preflight passed.
    pub fn open(
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
        mut config: Config,
        progress: P,
    ) -> Result<Self> {
        let (source, destination) = (source.as_ref(), destination.as_ref());
        config.validate()?;
        let preflight = preflight(source, destination, config.block_size)?;
        if config.expected_blocks.is_none() {
            config.expected_blocks = preflight.source_blocks();
        }

        let source_file = File::open(source).map_err(|e| open_failed(Side::Source, source, e))?;
        let dest_reader =
            File::open(destination).map_err(|e| open_failed(Side::Destination, destination, e))?;
        let dest_writer = OpenOptions::new()
            .read(true)
            .write(true)
            .open(destination)
            .map_err(|e| open_failed(Side::Destination, destination, e))?;

        let engine = Engine::new(config, progress)?;
        debug!(source = %source.display(), destination = %destination.display(), "session opened");

        Ok(Self {
            source_path: source.to_path_buf(),
            destination_path: destination.to_path_buf(),
            preflight,
            source: source_file,
            dest_reader,
            dest_writer,
            engine,
        })
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.engine.set_cancel(cancel);
        self
    }

    pub fn preflight(&self) -> &Preflight {
        &self.preflight
    }

    pub fn config(&self) -> &Config {
        self.engine.config()
    }

    /// Run the copy to completion. Consumes the session so its resources are
    /// released as soon as this returns.
    pub fn run(mut self) -> Result<CopyResult> {
        info!(
            source = %self.source_path.display(),
            destination = %self.destination_path.display(),
            block_size = self.engine.config().block_size,
            "differential copy started"
        );
        let result = self
            .engine
            .run(&mut self.source, &mut self.dest_reader, &mut self.dest_writer)?;
        info!(
            blocks_read = result.blocks_read,
            blocks_written = result.blocks_written,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "differential copy finished"
        );
        Ok(result)
    }
}

impl<P> Drop for CopySession<P> {
    fn drop(&mut self) {
        debug!(destination = %self.destination_path.display(), "session released");
    }
}

fn open_failed(side: Side, path: &Path, source: std::io::Error) -> CopyError {
    CopyError::OpenFailed {
        side,
        path: path.to_path_buf(),
        source,
    }
}
