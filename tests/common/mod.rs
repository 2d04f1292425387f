#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use assert_cmd::Command;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates an isolated spendbook home directory.
pub fn test_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// The CLI binary in script mode, reading and writing under `home`.
pub fn script_cli(home: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("spendbook_cli").expect("binary built");
    cmd.env("SPENDBOOK_CLI_SCRIPT", "1")
        .env("SPENDBOOK_HOME", home)
        .env_remove("RUST_LOG");
    cmd
}
