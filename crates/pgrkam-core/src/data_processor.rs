//! Document sources: paged text files and crawler page dumps turned into chunks.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::chunker::{self, ChunkingConfig};
use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkSource};

/// Page separator emitted by `pdftotext`.
pub const PAGE_BREAK: char = '\x0c';

/// One crawled page as written by the crawler, one JSON object per line.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawledPage {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ts: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct DataProcessor {
    document: ChunkingConfig,
    web: ChunkingConfig,
}

impl Default for DataProcessor {
    fn default() -> Self { Self::new() }
}

impl DataProcessor {
    pub fn new() -> Self { Self::with_configs(ChunkingConfig::document(), ChunkingConfig::web()) }

    pub fn with_configs(document: ChunkingConfig, web: ChunkingConfig) -> Self { Self { document, web } }

    /// Chunk every `.txt` (paged document) and `.jsonl` (crawled pages) file
    /// under `data_dir`, in path order.
    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<Chunk>> {
        if !data_dir.is_dir() {
            return Err(Error::NotFound(format!("data directory {}", data_dir.display())));
        }
        let files = list_source_files(data_dir);
        if files.is_empty() {
            tracing::warn!(dir = %data_dir.display(), "no .txt or .jsonl files found");
            return Ok(vec![]);
        }
        let mut all_chunks = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::debug!("processing file {}/{}: {}", file_index + 1, files.len(), file_path.display());
            let chunks = match file_path.extension().and_then(|s| s.to_str()) {
                Some("jsonl") => self.load_pages_jsonl(file_path)?,
                _ => self.read_paged_text(file_path)?,
            };
            all_chunks.extend(chunks);
        }
        tracing::info!("processed {} files into {} chunks", files.len(), all_chunks.len());
        Ok(all_chunks)
    }

    /// Chunk an already-extracted document page by page.
    pub fn paged_document<S: AsRef<str>>(&self, name: &str, pages: &[S]) -> Result<Vec<Chunk>> {
        chunker::chunk_pages(name, pages, &self.document)
    }

    /// Read a text file whose pages are separated by form feeds.
    pub fn read_paged_text(&self, file_path: &Path) -> Result<Vec<Chunk>> {
        let content = read_file_content(file_path)?;
        let name = file_path.file_name().map_or_else(|| "document.pdf".to_string(), |n| n.to_string_lossy().to_string());
        let pages: Vec<&str> = content.split(PAGE_BREAK).collect();
        self.paged_document(&name, &pages)
    }

    /// Crawler output: each page is chunked with the web window and cited by URL.
    pub fn load_pages_jsonl(&self, file_path: &Path) -> Result<Vec<Chunk>> {
        let content = read_file_content(file_path)?;
        let mut chunks = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() { continue; }
            let page: CrawledPage = serde_json::from_str(line)
                .map_err(|e| Error::MalformedInput(format!("{}:{}: {}", file_path.display(), line_no + 1, e)))?;
            chunks.extend(self.crawled_page(&page)?);
        }
        Ok(chunks)
    }

    pub fn crawled_page(&self, page: &CrawledPage) -> Result<Vec<Chunk>> {
        if page.text.trim().is_empty() { return Ok(vec![]); }
        chunker::chunk(&page.text, &ChunkSource::from_raw(&page.url, None), &self.web)
    }
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        Err(e) => Err(e.into()),
    }
}

fn list_source_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let path = entry.path();
        if matches!(path.extension().and_then(|s| s.to_str()), Some("txt" | "jsonl")) { files.push(path.to_path_buf()); }
    }
    files.sort(); files
}
