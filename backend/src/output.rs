//! Output files and merging across batches.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Retrieves remote content for lazy output files.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, OutputError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputContent {
    Json(Value),
    /// Fetched from `url` when the file is written.
    Download { url: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputFile {
    pub path: String,
    pub content: OutputContent,
    /// Files with the same path are deep-merged instead of replaced.
    pub mergable: bool,
}

impl OutputFile {
    pub fn json<T: Serialize>(path: impl Into<String>, content: &T, mergable: bool) -> Result<Self, OutputError> {
        Ok(OutputFile {
            path: path.into(),
            content: OutputContent::Json(serde_json::to_value(content)?),
            mergable,
        })
    }

    pub fn download(path: impl Into<String>, url: impl Into<String>) -> Self {
        OutputFile {
            path: path.into(),
            content: OutputContent::Download { url: url.into() },
            mergable: false,
        }
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self.content, OutputContent::Download { .. })
    }

    /// The bytes to write. Downloads go through `fetcher`.
    pub fn resolve(&self, fetcher: &dyn Fetcher, pretty: bool) -> Result<Vec<u8>, OutputError> {
        match &self.content {
            OutputContent::Json(value) if pretty => Ok(serde_json::to_vec_pretty(value)?),
            OutputContent::Json(value) => Ok(serde_json::to_vec(value)?),
            OutputContent::Download { url } => fetcher.fetch(url),
        }
    }
}

/// Merge `other` into `target`: objects key by key, arrays concatenated,
/// anything else replaced.
pub fn deep_merge(target: &mut Value, other: Value) {
    match (target, other) {
        (Value::Object(target), Value::Object(other)) => {
            for (key, value) in other {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(target), Value::Array(other)) => target.extend(other),
        (target, other) => *target = other,
    }
}

/// Collects output files across batches, keeping the first-seen path order.
#[derive(Debug, Default)]
pub struct OutputMerger {
    files: Vec<OutputFile>,
    index: HashMap<String, usize>,
}

impl OutputMerger {
    pub fn new() -> Self {
        OutputMerger::default()
    }

    pub fn push(&mut self, file: OutputFile) {
        let Some(&idx) = self.index.get(&file.path) else {
            self.index.insert(file.path.clone(), self.files.len());
            self.files.push(file);
            return;
        };

        let existing = &mut self.files[idx];
        let both_json = matches!(
            (&existing.content, &file.content),
            (OutputContent::Json(_), OutputContent::Json(_))
        );
        if !(both_json && existing.mergable && file.mergable) {
            *existing = file;
            return;
        }
        if let (OutputContent::Json(target), OutputContent::Json(value)) = (&mut existing.content, file.content) {
            deep_merge(target, value);
        }
    }

    pub fn extend(&mut self, files: impl IntoIterator<Item = OutputFile>) {
        for file in files {
            self.push(file);
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn finish(self) -> Vec<OutputFile> {
        self.files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge() {
        let mut target = json!({ "a": [1], "b": { "c": 1, "d": 2 }, "e": "x" });
        deep_merge(&mut target, json!({ "a": [2], "b": { "d": 3 }, "e": "y", "f": true }));
        assert_eq!(target, json!({ "a": [1, 2], "b": { "c": 1, "d": 3 }, "e": "y", "f": true }));
    }

    #[test]
    fn test_merger_keeps_first_seen_order() {
        let mut merger = OutputMerger::new();
        merger.push(OutputFile::json("/a.json", &json!({ "items": [1] }), true).unwrap());
        merger.push(OutputFile::json("/b.json", &json!(1), false).unwrap());
        merger.push(OutputFile::json("/a.json", &json!({ "items": [2] }), true).unwrap());
        merger.push(OutputFile::json("/b.json", &json!(2), false).unwrap());

        let files = merger.finish();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].content, OutputContent::Json(json!({ "items": [1, 2] })));
        assert_eq!(files[1].content, OutputContent::Json(json!(2)));
    }

    struct FixedFetcher;

    impl Fetcher for FixedFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, OutputError> {
            Ok(url.as_bytes().to_vec())
        }
    }

    #[test]
    fn test_resolve() {
        let file = OutputFile::download("/a.mp3", "https://example.com/a.mp3");
        assert!(file.is_lazy());
        assert_eq!(file.resolve(&FixedFetcher, false).unwrap(), b"https://example.com/a.mp3");

        let file = OutputFile::json("/a.json", &json!({ "a": 1 }), false).unwrap();
        assert_eq!(file.resolve(&FixedFetcher, false).unwrap(), br#"{"a":1}"#);
    }
}
