//! Output file placement; existing files are never overwritten

use anyhow::{Context, Result};
use log::info;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// `base_N.ext` for the `n`th collision
fn numbered(path: &Path, n: u32) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };
    path.with_file_name(file_name)
}

/// First of `path`, `base_1.ext`, `base_2.ext`, ... that does not exist
pub fn unique_output_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    (1..)
        .map(|n| numbered(path, n))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Write `contents` to the first free name derived from `path`
pub fn write_document(path: &Path, contents: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let mut candidate = unique_output_path(path);
    let mut next = 1;
    loop {
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut file) => {
                file.write_all(contents.as_bytes())
                    .with_context(|| format!("Failed to write output file: {}", candidate.display()))?;
                info!("Wrote {}", candidate.display());
                return Ok(candidate);
            }
            // Created by someone else since the existence check
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                while numbered(path, next).exists() {
                    next += 1;
                }
                candidate = numbered(path, next);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create output file: {}", candidate.display()));
            }
        }
    }
}
