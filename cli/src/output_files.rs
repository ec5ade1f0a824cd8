//! Writing output files to disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;

use scripture_backend::output::{deep_merge, Fetcher, OutputContent, OutputError, OutputFile};

/// Audio chapters can be large, the ureq default limit is 10 MB.
const MAX_DOWNLOAD_BYTES: u64 = 200 * 1024 * 1024;

/// Fetches lazy output contents over HTTP.
pub struct UreqFetcher;

impl Fetcher for UreqFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, OutputError> {
        let fetch_error = |message: String| OutputError::Fetch { url: url.to_string(), message };

        match ureq::get(url).call() {
            Ok(mut response) => response
                .body_mut()
                .with_config()
                .limit(MAX_DOWNLOAD_BYTES)
                .read_to_vec()
                .map_err(|e| fetch_error(format!("Failed to read response: {}", e))),
            Err(ureq::Error::StatusCode(code)) => Err(fetch_error(format!("HTTP status {}", code))),
            Err(e) => Err(fetch_error(e.to_string())),
        }
    }
}

/// Writes output files under a root directory.
pub struct OutputWriter<'a> {
    root: PathBuf,
    fetcher: &'a dyn Fetcher,
    pretty: bool,
    /// Existing mergable files on disk are merged with instead of replaced.
    merge_existing: bool,
}

impl<'a> OutputWriter<'a> {
    pub fn new(root: &Path, fetcher: &'a dyn Fetcher, pretty: bool) -> Self {
        OutputWriter { root: root.to_path_buf(), fetcher, pretty, merge_existing: false }
    }

    pub fn merge_existing(mut self, merge_existing: bool) -> Self {
        self.merge_existing = merge_existing;
        self
    }

    /// `/api/bsb/books.json` under the root.
    pub fn file_path(&self, file: &OutputFile) -> PathBuf {
        self.root.join(file.path.trim_start_matches('/'))
    }

    /// Resolve and write every file, downloads in parallel. Returns the
    /// number of files written.
    pub fn write_all(&self, files: &[OutputFile]) -> Result<usize> {
        files
            .par_iter()
            .map(|file| self.write(file))
            .collect::<Result<Vec<()>>>()?;
        Ok(files.len())
    }

    pub fn write(&self, file: &OutputFile) -> Result<()> {
        let path = self.file_path(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let bytes = match &file.content {
            OutputContent::Json(value) if file.mergable && self.merge_existing && path.exists() => {
                let existing = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let mut merged: serde_json::Value = serde_json::from_str(&existing)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                deep_merge(&mut merged, value.clone());
                let merged = OutputFile { content: OutputContent::Json(merged), ..file.clone() };
                merged.resolve(self.fetcher, self.pretty)?
            }
            _ => file
                .resolve(self.fetcher, self.pretty)
                .with_context(|| format!("Failed to resolve {}", file.path))?,
        };

        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
