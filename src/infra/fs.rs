//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides utilities for file system operations, such as creating
//! the execution-scoped report directory and writing report files atomically.
//!
//! 此模块提供文件系统操作的实用功能，
//! 如创建执行范围的报告目录以及原子地写入报告文件。

use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Creates a fresh `execution_<YYYYmmdd_HHMMSS>` directory under `base_dir`.
/// If the name is already taken, a numeric suffix is added, so a directory
/// from an earlier process is never reused.
///
/// # Arguments
/// * `base_dir` - Directory holding all executions; created if missing
/// * `started_at` - Start time of this execution
///
/// # Returns
/// The execution id (the directory name) and the directory path
pub fn create_execution_dir(base_dir: &Path, started_at: DateTime<Local>) -> io::Result<(String, PathBuf)> {
    fs::create_dir_all(base_dir)?;
    let stem = format!("execution_{}", started_at.format("%Y%m%d_%H%M%S"));

    let mut attempt = 0u32;
    loop {
        let id = if attempt == 0 {
            stem.clone()
        } else {
            format!("{stem}_{attempt}")
        };
        let path = base_dir.join(&id);
        match fs::create_dir(&path) {
            Ok(()) => return Ok((id, path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

/// Writes `contents` to `path` through a temporary file in the same directory
/// followed by a rename, so readers see either the old or the new file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_data()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Appends one line to `path`, creating the file if needed.
pub fn append_line(path: &Path, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")
}
