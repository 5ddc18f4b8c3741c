use crate::util::{create_with_backoff, replace_file_atomic_backoff, tmp_path_for};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// NDJSON writer that writes to a temp sibling and promotes it on `finish`.
pub struct NdjsonWriter {
    tmp: PathBuf,
    dest: PathBuf,
    w: Option<BufWriter<File>>,
}

impl NdjsonWriter {
    pub fn create(dest: &Path) -> io::Result<Self> {
        let tmp = tmp_path_for(dest);
        let f = create_with_backoff(&tmp, 16, 50)?;
        Ok(Self { tmp, dest: dest.to_path_buf(), w: Some(BufWriter::with_capacity(256 * 1024, f)) })
    }

    /// Serialize `value` as one line.
    pub fn write_value<T: Serialize>(&mut self, value: &T) -> Result<()> {
        if let Some(w) = &mut self.w {
            serde_json::to_writer(&mut *w, value)?;
            w.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Flushes and atomically promotes the temp file to the destination.
    pub fn finish(mut self) -> Result<()> {
        if let Some(mut w) = self.w.take() {
            w.flush().with_context(|| format!("flush {}", self.tmp.display()))?;
        }
        replace_file_atomic_backoff(&self.tmp, &self.dest)
    }
}
