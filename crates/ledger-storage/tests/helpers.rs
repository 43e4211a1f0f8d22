#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{tempdir, TempDir};

pub const TEST_DIFFICULTY: u32 = 2;

pub fn create_temp_dir() -> (TempDir, PathBuf) {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

/// Path of a not-yet-existing chain file inside a fresh temp dir.
pub fn temp_chain_file() -> (TempDir, PathBuf) {
    let (temp_dir, dir) = create_temp_dir();
    (temp_dir, dir.join("blockchain_data.json"))
}

pub fn copy_fixture(name: &str, to: &Path) {
    let from = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::copy(from, to).expect("Failed to copy fixture");
}

pub fn remove_temp_dir(temp_dir: TempDir) {
    let path = temp_dir.path().to_path_buf();
    temp_dir.close().expect("Failed to delete temp dir");
    assert!(!path.exists(), "Temp directory should be removed");
}
