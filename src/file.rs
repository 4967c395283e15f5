// src/file.rs

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::Path,
};

use serde::{de::DeserializeOwned, Serialize};

use crate::csv::write_row;
use crate::errors::{RelayError, Result};

/// Read a JSON file. `Ok(None)` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&text)?))
}

/// Pretty JSON, written to `<path>.tmp` then renamed over `path`.
/// Readers never see a half-written file.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let persistence = |reason: String| RelayError::Persistence { path: path.display().to_string(), reason };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent).map_err(|e| persistence(e.to_string()))?;
        }
    }
    let raw = serde_json::to_vec_pretty(value).map_err(|e| persistence(format!("encoding: {e}")))?;

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, raw).map_err(|e| persistence(format!("writing {}: {e}", tmp_path.display())))?;
    fs::rename(&tmp_path, path).map_err(|e| persistence(format!("replacing: {e}")))?;
    Ok(())
}

/// Ensure parent dir exists; create/truncate file; optionally write header.
pub fn write_rows_start(path: &Path, headers: Option<&[String]>, sep: char) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    let file = File::create(path)?; // truncate/overwrite
    let mut out = BufWriter::new(file);
    if let Some(h) = headers {
        write_row(&mut out, h, sep)?;
    }
    out.flush()?;
    Ok(())
}

/// Append rows to an existing CSV file (must be created already).
pub fn append_rows(path: &Path, rows: &[Vec<String>], sep: char) -> Result<()> {
    let file = OpenOptions::new().append(true).open(path)?;
    let mut out = BufWriter::new(file);
    for row in rows {
        write_row(&mut out, row, sep)?;
    }
    out.flush()?;
    Ok(())
}

pub fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(RelayError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Path exists but is not a directory: {}", dir.display()),
        )));
    }
    if !dir.exists() { fs::create_dir_all(dir)?; }
    Ok(())
}
