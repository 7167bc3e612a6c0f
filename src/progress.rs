//! Progress sinks and summary formatting.
//!
//! The engine only calls [`ProgressSink::observe`]; what an observation looks like on
//! screen is up to the sink. [`DotProgress`] is the classic terminal rendering:
//! one `#` per interval in which something was written, one `.` per interval that
//! was fully skipped, and a ` [read/total] (pct%)` banner every 80 marks.

use crate::types::BlockProgress;
use std::{io::Write, time::Duration};

/// Receiver of periodic progress observations.
pub trait ProgressSink {
    fn observe(&mut self, progress: &BlockProgress);
}

/// Sink that ignores every observation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn observe(&mut self, _: &BlockProgress) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(&BlockProgress),
{
    fn observe(&mut self, progress: &BlockProgress) {
        self(progress)
    }
}

const MARKS_PER_LINE: usize = 80;

/// Dot/hash progress line written to `out`.
pub struct DotProgress<W: Write> {
    out: W,
    marks: usize,
}

impl<W: Write> DotProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out, marks: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, p: &BlockProgress) -> std::io::Result<()> {
        let mark = if p.written_since_last > 0 { b"#" } else { b"." };
        self.out.write_all(mark)?;
        self.marks += 1;
        if self.marks >= MARKS_PER_LINE {
            self.marks = 0;
            match (p.expected_blocks, p.percent()) {
                (Some(total), Some(pct)) => {
                    writeln!(self.out, " [{}/{}] ({:.2}%)", p.blocks_read, total, pct)?
                }
                _ => writeln!(self.out, " [{}/?]", p.blocks_read)?,
            }
        }
        self.out.flush()
    }
}

impl<W: Write> ProgressSink for DotProgress<W> {
    fn observe(&mut self, progress: &BlockProgress) {
        // progress output is cosmetic; a closed stdout must not stop the copy
        if let Err(e) = self.render(progress) {
            tracing::debug!(error = %e, "progress output failed");
        }
    }
}

/// `Xh Ym Zs`, whole seconds.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}
