//! Text Source: résumé text with a write-once sidecar cache.
//!
//! The first successful extraction of `<filename>` is saved as `<filename>.txt` in the
//! cache directory; later runs read the sidecar and never re-extract.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::document::Document;
use crate::store::write_atomically;

const SIDECAR_EXTENSION: &str = "txt";

/// Raw document-to-text conversion. Failures are final for that document.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String, String>;
}

/// Extracts text from PDF files with `pdf-extract` on the blocking pool.
pub struct PdfExtractor;

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<String, String> {
        let path = path.to_path_buf();
        // pdf-extract can panic on malformed input; the join error captures that.
        tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
            .await
            .map_err(|e| format!("extraction task failed: {e}"))?
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
pub trait TextSource: Send + Sync {
    async fn text_for(&self, document: &Document) -> Result<String, AppError>;
}

/// `TextSource` that checks the sidecar cache before extracting.
pub struct CachedTextSource {
    extractor: Arc<dyn TextExtractor>,
    cache_dir: PathBuf,
}

impl CachedTextSource {
    pub fn new(extractor: Arc<dyn TextExtractor>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            extractor,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn sidecar_path(&self, document: &Document) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{SIDECAR_EXTENSION}", document.filename))
    }
}

#[async_trait]
impl TextSource for CachedTextSource {
    async fn text_for(&self, document: &Document) -> Result<String, AppError> {
        let sidecar = self.sidecar_path(document);

        match tokio::fs::read_to_string(&sidecar).await {
            Ok(text) => {
                info!("Text already extracted. Loading from {}", sidecar.display());
                return Ok(text);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let text = self
            .extractor
            .extract(&document.path)
            .await
            .map_err(|message| AppError::Extraction {
                filename: document.filename.clone(),
                message,
            })?;
        debug!(
            "Extracted {} characters from {}",
            text.len(),
            document.filename
        );

        write_atomically(&sidecar, text.as_bytes()).await?;
        info!("Extracted text from {}", document.filename);
        Ok(text)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeExtractor;
    use super::*;

    #[tokio::test]
    async fn test_extracts_once_then_reads_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = Arc::new(FakeExtractor::with(&[("jane.pdf", "Jane Doe\nRust")]));
        let source = CachedTextSource::new(extractor.clone(), dir.path());
        let doc = Document::from_filename("jane.pdf");

        assert_eq!(source.text_for(&doc).await.unwrap(), "Jane Doe\nRust");
        assert_eq!(source.text_for(&doc).await.unwrap(), "Jane Doe\nRust");
        assert_eq!(extractor.call_count(), 1);
        assert!(dir.path().join("jane.pdf.txt").exists());
    }

    #[tokio::test]
    async fn test_existing_sidecar_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bob.pdf.txt"), "cached text").unwrap();
        let extractor = Arc::new(FakeExtractor::default());
        let source = CachedTextSource::new(extractor.clone(), dir.path());

        let text = source.text_for(&Document::from_filename("bob.pdf")).await.unwrap();
        assert_eq!(text, "cached text");
        assert_eq!(extractor.call_count(), 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_reported_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let source = CachedTextSource::new(Arc::new(FakeExtractor::default()), dir.path());
        let doc = Document::from_filename("broken.pdf");

        let err = source.text_for(&doc).await.unwrap_err();
        assert!(matches!(err, AppError::Extraction { ref filename, .. } if filename == "broken.pdf"));
        assert!(!source.sidecar_path(&doc).exists());
    }

    #[tokio::test]
    async fn test_pdf_extractor_fails_on_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();
        assert!(PdfExtractor.extract(&path).await.is_err());
    }
}
