//! Loading of source documents from disk for bulk ingest.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// A whole source file ready to be handed to the pipeline.
///
/// `doc_id` is the file name (with extension), which keeps re-ingests of the
/// same file on the same point ids.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub doc_id: String,
    pub path: PathBuf,
    pub text: String,
}

/// Read a file as UTF-8, falling back to a lossy decode.
pub fn load_file(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            let bytes = fs::read(path)
                .map_err(|e| Error::Operation(format!("reading {}: {}", path.display(), e)))?;
            Ok(String::from_utf8_lossy(&bytes).to_string())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::NotFound(path.display().to_string()))
        }
        Err(e) => Err(Error::Operation(format!("reading {}: {}", path.display(), e))),
    }
}

#[derive(Debug, Clone)]
pub struct DocumentLoader {
    extension: String,
    limit: Option<usize>,
}

impl Default for DocumentLoader {
    fn default() -> Self { Self { extension: "txt".to_string(), limit: None } }
}

impl DocumentLoader {
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Every matching file under `root`, sorted by path.
    fn list_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(Error::NotFound(format!("directory {}", root.display())));
        }
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path().extension().and_then(|s| s.to_str()) == Some(self.extension.as_str())
            })
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();
        if let Some(limit) = self.limit {
            if files.len() > limit {
                info!(limit, found = files.len(), "limiting documents");
                files.truncate(limit);
            }
        }
        Ok(files)
    }

    /// Load all matching files under `root`. Unreadable files are skipped with a warning.
    pub fn load_directory(&self, root: &Path) -> Result<Vec<SourceDocument>> {
        let files = self.list_files(root)?;
        if files.is_empty() {
            warn!("no .{} files found under {}", self.extension, root.display());
            return Ok(Vec::new());
        }
        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            let text = match load_file(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };
            debug!(file = %path.display(), bytes = text.len(), "loaded document");
            documents.push(SourceDocument { doc_id: doc_id_for(&path), path, text });
        }
        Ok(documents)
    }
}

fn doc_id_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
