mod cli;

use clap::Parser;
use diffcopy::{
    CancelToken, CopyResult, CopySession, DotProgress, NoProgress, ProgressSink, StopReason,
    format_elapsed,
};
use std::{future::Future, io, process::ExitCode};
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, prelude::*};

/// Exit status after an interrupt, as a shell reports SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Args::parse_from(cli::normalize_args(std::env::args_os()));
    init_tracing(args.verbose);

    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, on_signal).await {
            // a read or write may be stuck on the device; stop waiting for it
            eprintln!("diffcopy: interrupted again, exiting");
            std::process::exit(EXIT_INTERRUPTED.into());
        }
    });

    // blocking I/O stays off the runtime threads
    let quiet = args.quiet;
    let task = tokio::task::spawn_blocking(move || {
        if quiet {
            copy(&args, NoProgress, cancel)
        } else {
            copy(&args, DotProgress::new(io::stdout()), cancel)
        }
    });

    match task.await {
        Ok(Ok(result)) => {
            if !quiet {
                print_summary(&result);
            }
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            if let Some(block) = e.block() {
                error!(block, "copy stopped; blocks before this one are up to date");
            }
            eprintln!("diffcopy: {e}");
            if e.is_interrupted() {
                ExitCode::from(EXIT_INTERRUPTED)
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!(error = %e, "copy task failed");
            ExitCode::FAILURE
        }
    }
}

/// Cancel the copy on the first interrupt. Returns `true` on a second one.
///
/// Returns `false` if interrupts cannot be listened for.
async fn watch_interrupts<F, Fut>(mut interrupt: F, cancel: CancelToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(e) = interrupt().await {
        warn!(error = %e, "cannot listen for interrupts");
        return false;
    }
    warn!("interrupt received, stopping at the next block");
    cancel.cancel();
    interrupt().await.is_ok()
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn copy<P: ProgressSink>(
    args: &cli::Args,
    progress: P,
    cancel: CancelToken,
) -> diffcopy::Result<CopyResult> {
    let session = CopySession::open(&args.source, &args.destination, args.config(), progress)?
        .with_cancel(cancel);

    if !args.quiet {
        let pf = session.preflight();
        let count = |n: Option<u64>| n.map_or_else(|| "unknown".to_string(), |n| n.to_string());
        println!("Block size [bytes]: {}", pf.block_size);
        println!(
            "input block count: {}  |  output block count: {}",
            count(pf.source_blocks()),
            count(pf.destination_blocks())
        );
    }
    session.run()
}

fn print_summary(result: &CopyResult) {
    println!();
    match result.stop {
        StopReason::SourceExhausted => println!("Finished reading source"),
        StopReason::CountLimit => println!("Block count limit reached"),
    }
    println!(
        "blocks read: {}  |  blocks written: {}",
        result.blocks_read, result.blocks_written
    );
    println!("Time consumed: {}", format_elapsed(result.elapsed));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Interrupt source replaying `events`; pending forever once they run out.
    fn replay(
        events: Vec<io::Result<()>>,
    ) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = io::Result<()>>>> {
        let mut events = VecDeque::from(events);
        move || match events.pop_front() {
            Some(ev) => Box::pin(std::future::ready(ev)),
            None => Box::pin(std::future::pending()),
        }
    }

    #[tokio::test]
    async fn second_interrupt_forces_exit() {
        let cancel = CancelToken::new();
        let forced = watch_interrupts(replay(vec![Ok(()), Ok(())]), cancel.clone()).await;
        assert!(forced);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn failed_listener_neither_cancels_nor_exits() {
        let cancel = CancelToken::new();
        let forced =
            watch_interrupts(replay(vec![Err(io::Error::other("no signals"))]), cancel.clone())
                .await;
        assert!(!forced);
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn first_interrupt_only_cancels() {
        let cancel = CancelToken::new();
        let watcher = watch_interrupts(replay(vec![Ok(())]), cancel.clone());
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(20), watcher)
            .await
            .is_err();
        assert!(timed_out);
        assert!(cancel.is_cancelled());
    }
}
