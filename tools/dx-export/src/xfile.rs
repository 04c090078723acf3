//! In-memory .x document with deferred commit
//!
//! Chunks are appended in output order and only reach the disk through
//! [`XFile::save`], after the whole export has succeeded.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{ExportError, Result};
use crate::formats::HEADER;

#[derive(Debug, Default, Clone)]
pub struct XFile {
    chunks: Vec<String>,
}

impl XFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: impl Into<String>) {
        self.chunks.push(chunk.into());
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Header followed by every chunk.
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(HEADER.as_bytes())?;
        for chunk in &self.chunks {
            w.write_all(chunk.as_bytes())?;
        }
        w.flush()
    }

    /// The complete document as text.
    pub fn to_text(&self) -> String {
        let mut out = String::from(HEADER);
        for chunk in &self.chunks {
            out.push_str(chunk);
        }
        out
    }

    /// Write the document to `path` (normalised to carry a `.x` extension).
    ///
    /// Returns the path actually written.
    pub fn save(&self, path: &Path) -> Result<PathBuf> {
        let path = normalize_path(path);
        let io_err = |source| ExportError::Io {
            path: path.clone(),
            source,
        };

        let file = File::create(&path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer).map_err(io_err)?;

        tracing::info!("Wrote {:?} ({} chunks)", path, self.chunks.len());
        Ok(path)
    }
}

/// Trim the file name and append `.x` unless it already ends with it.
pub fn normalize_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().trim().to_string())
        .unwrap_or_default();

    let name = if name.to_ascii_lowercase().ends_with(".x") {
        name
    } else {
        format!("{}.x", name)
    };
    path.with_file_name(name)
}
