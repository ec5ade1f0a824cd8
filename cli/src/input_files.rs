//! Loading input files from a directory tree.
//!
//! Every directory holding a `metadata.json` is one translation or
//! commentary. Its other files are the inputs, their type inferred from the
//! file extension.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use scripture_backend::input::{InputFile, InputFileType, InputMetadata};
use scripture_backend::logger::Log;

pub const METADATA_FILE_NAME: &str = "metadata.json";

/// The input files of one directory, loaded and processed as one batch.
#[derive(Debug)]
pub struct InputDirectory {
    pub path: PathBuf,
    pub metadata: InputMetadata,
    pub files: Vec<InputFile>,
}

/// Find the input directories under `root`, sorted by path.
pub fn find_input_directories(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        anyhow::bail!("Input directory does not exist: {}", root.display());
    }

    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == METADATA_FILE_NAME)
        .filter_map(|e| e.path().parent().map(Path::to_path_buf))
        .collect();

    dirs.sort();
    Ok(dirs)
}

pub fn read_metadata(dir: &Path) -> Result<InputMetadata> {
    let path = dir.join(METADATA_FILE_NAME);
    let json = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the metadata and the input files directly inside `dir`. Files with
/// no known type are skipped with a warning.
pub fn load_input_directory(dir: &Path, log: &dyn Log) -> Result<InputDirectory> {
    let metadata = read_metadata(dir)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        if !entry.file_type().is_file() || entry.file_name() == METADATA_FILE_NAME {
            continue;
        }

        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let extension = path.extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_default();
        let Some(file_type) = InputFileType::infer(&extension, &content) else {
            log.warn(&format!("Skipping {}: unknown input file type", path.display()));
            continue;
        };

        files.push(InputFile {
            name: Some(name),
            file_type,
            metadata: metadata.clone(),
            content,
            sha256: None,
        });
    }

    log.info(&format!("Loaded {} {} files from {}", files.len(), metadata.kind(), dir.display()));

    Ok(InputDirectory { path: dir.to_path_buf(), metadata, files })
}
