use assert_cmd::Command;
use predicates::prelude::*;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

fn diffcopy() -> Command {
    Command::new(env!("CARGO_BIN_EXE_diffcopy"))
}

fn images(src: &[u8], dst: &[u8]) -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let (s, d) = (dir.path().join("src.img"), dir.path().join("dst.img"));
    fs::write(&s, src).unwrap();
    fs::write(&d, dst).unwrap();
    (dir, s, d)
}

fn operand(key: &str, path: &std::path::Path) -> String {
    format!("{key}={}", path.display())
}

#[test]
fn dd_style_copy_rewrites_changed_blocks() {
    let src: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
    let mut dst = src.clone();
    dst[5000] ^= 0xFF;
    dst[40_000] ^= 0xFF;
    let (_dir, s, d) = images(&src, &dst);

    diffcopy()
        .args([operand("if", &s), operand("of", &d), "bs=4K".into()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Block size [bytes]: 4096"))
        .stdout(predicate::str::contains("input block count: 16"))
        .stdout(predicate::str::contains("blocks read: 16  |  blocks written: 2"))
        .stdout(predicate::str::contains("Time consumed: 0h 0m"));

    assert_eq!(fs::read(&d).unwrap(), src);
}

#[test]
fn flags_and_count_limit() {
    let (_dir, s, d) = images(&[7; 8192], &[0; 8192]);

    diffcopy()
        .arg("-i")
        .arg(&s)
        .arg("-o")
        .arg(&d)
        .args(["-b", "1k", "-c", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Block count limit reached"));

    let out = fs::read(&d).unwrap();
    assert_eq!(&out[..3072], &[7; 3072]);
    assert!(out[3072..].iter().all(|&b| b == 0));
}

#[test]
fn quiet_prints_nothing() {
    let (_dir, s, d) = images(&[1; 1000], &[1; 1000]);

    diffcopy()
        .args([operand("if", &s), operand("of", &d), "bs=512".into(), "-q".into()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn smaller_destination_fails_without_writing() {
    let (_dir, s, d) = images(&[1; 4096], &[0; 1024]);

    diffcopy()
        .args([operand("if", &s), operand("of", &d), "bs=512".into()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("smaller than source"));

    assert_eq!(fs::read(&d).unwrap(), vec![0; 1024]);
}

#[test]
fn missing_destination_fails() {
    let (dir, s, _) = images(&[1; 10], &[]);
    let absent = dir.path().join("absent.img");

    diffcopy()
        .args([operand("if", &s), operand("of", &absent)])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot query size of destination"));
}

#[test]
fn invalid_block_size_is_a_usage_error() {
    diffcopy()
        .args(["if=a", "of=b", "bs=12Q"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown unit"));
}

#[test]
fn missing_operands_are_a_usage_error() {
    diffcopy().arg("bs=1M").assert().failure();
}
