use std::fs;

use studio_engine::{ensure_dir, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_download_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("artifacts").join("j1");
    assert!(!new_dir.exists());
    ensure_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("report.md", b"hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "report.md");
    assert_eq!(fs::read(&first).unwrap(), b"hello");

    let second = writer.write("report.md", b"world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"world");
}

#[test]
fn no_partial_file_when_target_is_a_file() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("report.md", b"data").is_err());
    assert!(!file_path.with_file_name("report.md").exists());
}
