use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::chunker::RecursiveSplitter;
use crate::config::ChunkingSettings;
use crate::types::Meta;

const INGEST_EXTENSIONS: &[&str] = &["txt", "md"];

/// One chunk of a source file, ready for ingestion.
///
/// `id` is `"<source>:<chunk_index>"`, stable across runs so re-ingesting the
/// same file replaces its chunks instead of duplicating them.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunk {
    pub id: String,
    pub source: String,
    pub chunk_index: usize,
    pub content: String,
}

impl DocumentChunk {
    pub fn metadata(&self) -> Meta {
        let mut meta = Meta::new();
        meta.insert("source".into(), self.source.clone().into());
        meta.insert("chunk".into(), self.chunk_index.into());
        meta
    }
}

#[derive(Default)]
pub struct DataProcessor {
    splitter: RecursiveSplitter,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_settings(settings: &ChunkingSettings) -> Self {
        Self { splitter: RecursiveSplitter::from_settings(settings) }
    }

    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<DocumentChunk>> {
        self.process_files(data_dir, self.list_source_files(data_dir))
    }

    pub fn process_directory_limited(&self, data_dir: &Path, limit: usize) -> Result<Vec<DocumentChunk>> {
        let mut files = self.list_source_files(data_dir);
        if files.len() > limit {
            files.truncate(limit);
            info!(limit, "limited to first files");
        }
        self.process_files(data_dir, files)
    }

    pub fn process_file(&self, file_path: &Path) -> Result<Vec<DocumentChunk>> {
        let content = self.read_file_content(file_path)?;
        let source = file_path.to_string_lossy().to_string();
        Ok(self
            .splitter
            .split_text(&content)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| DocumentChunk { id: format!("{}:{}", source, chunk_index), source: source.clone(), chunk_index, content })
            .collect())
    }

    fn process_files(&self, data_dir: &Path, files: Vec<PathBuf>) -> Result<Vec<DocumentChunk>> {
        if files.is_empty() {
            info!(dir = %data_dir.display(), "no .txt/.md files found");
            return Ok(vec![]);
        }
        let mut all_chunks = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::debug!(file = %file_path.display(), "processing file {}/{}", file_index + 1, files.len());
            all_chunks.extend(self.process_file(file_path)?);
        }
        info!(files = files.len(), chunks = all_chunks.len(), "processed directory");
        Ok(all_chunks)
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn list_source_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| INGEST_EXTENSIONS.iter().any(|x| ext.eq_ignore_ascii_case(x)))
            })
            .collect();
        files.sort();
        files
    }
}
