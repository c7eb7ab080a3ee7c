//! Resume text extraction.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read resume: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to extract text from '{path}': {message}")]
    Extraction { path: String, message: String },
}

/// Turns a resume document into plain text.
///
/// `Ok(None)` when there is nothing to parse (empty path). Loader failures are errors;
/// callers decide whether to absorb them.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(&self, path: &Path) -> Result<Option<String>, ParseError>;
}

/// PDF resumes via `pdf-extract`, page by page.
pub struct PdfResumeParser;

#[async_trait]
impl DocumentParser for PdfResumeParser {
    async fn parse(&self, path: &Path) -> Result<Option<String>, ParseError> {
        if path.as_os_str().is_empty() {
            warn!("No resume path given, nothing to parse");
            return Ok(None);
        }

        let bytes = tokio::fs::read(path).await?;
        let shown = path.display().to_string();

        // CPU-bound; pdf-extract may also panic on hostile input, which surfaces as a JoinError.
        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        })
        .await
        .map_err(|e| ParseError::Extraction {
            path: shown.clone(),
            message: e.to_string(),
        })?
        .map_err(|e| ParseError::Extraction {
            path: shown.clone(),
            message: e.to_string(),
        })?;

        debug!("Parsed {} page(s) from {shown}", pages.len());
        Ok(Some(pages.concat()))
    }
}
