use clap::{ArgAction, Parser};
use diffcopy::{Config, parse_block_size};
use std::{ffi::OsString, path::PathBuf};

/// Copy SOURCE onto an existing DEST, rewriting only the blocks that differ.
///
/// The dd-style operands `if=SOURCE of=DEST bs=SIZE count=N` are accepted as well.
#[derive(Parser, Debug)]
#[command(name = "diffcopy", version, about)]
pub struct Args {
    /// Source file or block device
    #[arg(short = 'i', long = "if", value_name = "SOURCE")]
    pub source: PathBuf,

    /// Existing destination, at least as large as the source
    #[arg(short = 'o', long = "of", value_name = "DEST")]
    pub destination: PathBuf,

    /// Block size in bytes; K, M and G multiply by 1024, 1024² and 1024³
    #[arg(short = 'b', long = "bs", value_name = "SIZE", default_value = "1M", value_parser = block_size_arg)]
    pub block_size: usize,

    /// Stop after this many blocks (0 copies everything)
    #[arg(short = 'c', long = "count", value_name = "BLOCKS", default_value_t = 0)]
    pub count: u64,

    /// Print nothing but errors
    #[arg(short, long)]
    pub quiet: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn config(&self) -> Config {
        Config {
            count_limit: self.count,
            ..Config::with_block_size(self.block_size)
        }
    }
}

fn block_size_arg(text: &str) -> Result<usize, String> {
    parse_block_size(text).map_err(|e| e.to_string())
}

const OPERANDS: [&str; 4] = ["if=", "of=", "bs=", "count="];

/// Rewrite dd-style `key=value` operands into `--key=value`.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args = args.into_iter();
    let mut out: Vec<OsString> = args.next().into_iter().collect();
    out.extend(args.map(|arg| {
        let long = arg
            .to_str()
            .filter(|s| OPERANDS.iter().any(|op| s.starts_with(op)))
            .map(|s| format!("--{s}"));
        long.map_or(arg, OsString::from)
    }));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(normalize_args(args.iter().map(OsString::from)))
    }

    #[test]
    fn dd_operands() {
        let args = parse(&["diffcopy", "if=a.img", "of=/dev/sdz", "bs=4M", "count=10"]).unwrap();
        assert_eq!(args.source, PathBuf::from("a.img"));
        assert_eq!(args.destination, PathBuf::from("/dev/sdz"));
        assert_eq!(args.block_size, 4 << 20);
        assert_eq!(args.config().count_limit, 10);
    }

    #[test]
    fn flags_and_defaults() {
        let args = parse(&["diffcopy", "-i", "a", "-o", "b", "-q", "-vv"]).unwrap();
        assert_eq!(args.block_size, 1 << 20);
        assert_eq!(args.count, 0);
        assert!(args.quiet);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn paths_are_required() {
        assert!(parse(&["diffcopy", "if=a"]).is_err());
        assert!(parse(&["diffcopy", "of=b"]).is_err());
    }

    #[test]
    fn bad_block_sizes_are_rejected() {
        assert!(parse(&["diffcopy", "if=a", "of=b", "bs=0"]).is_err());
        assert!(parse(&["diffcopy", "if=a", "of=b", "bs=4X"]).is_err());
    }

    #[test]
    fn operand_lookalikes_are_left_alone() {
        let out = normalize_args(["diffcopy", "--if=x", "iff=y"].map(OsString::from));
        assert_eq!(out, ["diffcopy", "--if=x", "iff=y"].map(OsString::from));
    }
}
