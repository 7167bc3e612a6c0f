//! `diffcopy` – differential block copy onto an existing destination.
//!
//! High‑level rules:
//! * Source and destination are read in lockstep, one fixed-size block at a time. A block is written
//!   only when its bytes differ from what the destination already holds.
//! * The write cursor follows the last physical write and is moved forward by the gap to the next
//!   differing block; unchanged regions are never touched.
//! * Preflight refuses a destination known to be smaller than the source. A destination reporting
//!   size 0 (e.g. a block device) is treated as unknown and the copy proceeds.
//! * Any error ends the session. Blocks already written stay written; re-running resumes naturally.
//!
//! SPDX‑License‑Identifier: Apache‑2.0 OR MIT

mod engine;
mod error;
mod preflight;
mod progress;
mod session;
mod size;
mod types;

pub use engine::{Engine, run};
pub use error::{CopyError, Result, Side};
pub use preflight::{Preflight, preflight, validate_sizes};
pub use progress::{DotProgress, NoProgress, ProgressSink, format_elapsed};
pub use session::CopySession;
pub use size::{parse_block_size, parse_size};
pub use types::{BlockProgress, CancelToken, Config, CopyResult, DEFAULT_BLOCK_SIZE, StopReason};
