#![allow(deprecated)]

use assert_cmd::Command;
use devtree_abi::HEADER_SIZE;
use devtree_abi::layout::entry;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const BOARD: &str = r#"{
    "devices": [
        {
            "name": "uart0",
            "type": "UART",
            "flags": ["MMIO"],
            "mem": { "base": "0x10000000", "size": "0x1000" },
            "irq": { "lane": 33, "flags": ["EDGE_TRIGGER"], "priority": 1 },
            "aux": { "clock_hz": 24000000 }
        },
        {
            "name": "rtc",
            "type": "RTC",
            "flags": ["MMIO"],
            "mem": { "base": "0x10001000", "size": "0x1000" }
        }
    ]
}"#;

fn devtreec() -> Command {
    Command::cargo_bin("devtreec").unwrap()
}

fn write_board(dir: &TempDir, text: &str) -> std::path::PathBuf {
    let path = dir.path().join("board.json");
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn compile_then_dump() {
    let dir = TempDir::new().unwrap();
    let board = write_board(&dir, BOARD);
    let out = dir.path().join("devtree.odtb");

    devtreec()
        .arg("compile")
        .arg(&board)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let bytes = fs::read(&out).unwrap();
    assert_eq!(&bytes[..8], b"odtr3\0\0\0");
    assert_eq!(bytes.len(), 24 + 2 * 72 + "uart0\0rtc\0".len());

    devtreec()
        .arg("dump")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("entries: 2"))
        .stdout(predicate::str::contains("[0] uart0 UART"))
        .stdout(predicate::str::contains("clock_hz: 24000000"))
        .stdout(predicate::str::contains("[1] rtc RTC"));
}

#[test]
fn check_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let board = write_board(&dir, BOARD);

    devtreec()
        .arg("check")
        .arg(&board)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 devices"));

    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn misaligned_mmio_fails_and_creates_no_file() {
    let dir = TempDir::new().unwrap();
    let board = write_board(
        &dir,
        r#"{"devices":[{"name":"uart0","type":"UART","flags":["MMIO"],"mem":{"base":"0x10000010","size":16}}]}"#,
    );
    let out = dir.path().join("devtree.odtb");

    devtreec()
        .arg("compile")
        .arg(&board)
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not aligned"));

    assert!(!out.exists());
}

#[test]
fn smaller_alignment_can_be_configured() {
    let dir = TempDir::new().unwrap();
    let board = write_board(
        &dir,
        r#"{"devices":[{"name":"uart0","type":"UART","flags":["MMIO"],"mem":{"base":"0x10000010","size":16}}]}"#,
    );

    devtreec()
        .args(["check", "--mmio-align", "0x10"])
        .arg(&board)
        .assert()
        .success();
}

#[test]
fn dump_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.odtb");
    fs::write(&path, [0u8; 64]).unwrap();

    devtreec()
        .arg("dump")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("signature mismatch"))
        .stderr(predicate::str::contains("signature mismatch: signature mismatch").not());
}

#[test]
fn dump_fails_on_corrupt_entry_name() {
    let dir = TempDir::new().unwrap();
    let board = write_board(&dir, BOARD);
    let out = dir.path().join("devtree.odtb");

    devtreec()
        .arg("compile")
        .arg(&board)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let mut bytes = fs::read(&out).unwrap();
    let off = HEADER_SIZE + entry::REL_NAME_OFFSET.offset;
    bytes[off..off + 4].copy_from_slice(&999u32.to_le_bytes());
    fs::write(&out, &bytes).unwrap();

    devtreec()
        .arg("dump")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("name offset 999 lies outside the name table"));
}

#[test]
fn missing_board_file() {
    devtreec()
        .args(["check", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load board"));
}
