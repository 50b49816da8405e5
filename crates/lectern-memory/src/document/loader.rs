use std::path::Path;

use super::DEFAULT_MAX_FILE_SIZE;
use super::types::PageDocument;
use crate::error::{MemoryError, Result};

/// Loads every PDF in a folder into per-page documents.
pub struct PdfCorpusLoader {
    pub max_file_size: u64,
}

impl Default for PdfCorpusLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl PdfCorpusLoader {
    /// Load all `.pdf` files in `folder`, one `PageDocument` per page.
    ///
    /// Files are processed in directory-listing order; pages are numbered
    /// from 1 in reading order. A page whose extraction yields no text
    /// produces an empty-content document rather than an error. Non-PDF
    /// entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be read, a PDF exceeds
    /// `max_file_size`, or a file fails to parse entirely.
    pub async fn load(&self, folder: &Path) -> Result<Vec<PageDocument>> {
        let mut documents = Vec::new();

        for entry in std::fs::read_dir(folder)? {
            let entry = entry?;
            let path = entry.path();
            if !is_pdf(&path) {
                continue;
            }

            let meta = entry.metadata()?;
            if meta.len() > self.max_file_size {
                return Err(MemoryError::Pdf {
                    source_file: display_name(&path),
                    reason: format!("file too large: {} bytes", meta.len()),
                });
            }

            let source = display_name(&path);
            tracing::info!("extracting text from {source}");

            let pages = {
                let path = path.clone();
                let source = source.clone();
                tokio::task::spawn_blocking(move || {
                    pdf_extract::extract_text_by_pages(&path).map_err(|e| MemoryError::Pdf {
                        source_file: source,
                        reason: e.to_string(),
                    })
                })
                .await
                .map_err(|e| MemoryError::Io(std::io::Error::other(e)))??
            };

            documents.extend(pages_to_documents(&source, pages));
        }

        Ok(documents)
    }
}

fn is_pdf(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Tag extracted page texts with source and 1-based page numbers.
fn pages_to_documents(source: &str, pages: Vec<String>) -> Vec<PageDocument> {
    pages
        .into_iter()
        .enumerate()
        .map(|(i, content)| PageDocument {
            source: source.to_owned(),
            page: i + 1,
            content,
        })
        .collect()
}
