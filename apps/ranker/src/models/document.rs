use std::path::{Path, PathBuf};

use crate::errors::AppError;

/// Filename tokens that describe the document rather than the candidate.
const ROLE_NOISE_TOKENS: &[&str] = &["resume", "cv", "curriculum", "vitae"];

/// One input résumé, keyed by its filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub path: PathBuf,
    /// Candidate name guessed from the filename, lowercase. May be empty.
    pub probable_name: String,
}

impl Document {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let probable_name = probable_name_from_filename(&filename);
        Self {
            filename,
            path,
            probable_name,
        }
    }

    pub fn from_filename(filename: &str) -> Self {
        Self::from_path(PathBuf::from(filename))
    }
}

/// Filename with its extension stripped; the result store's key.
pub fn base_name(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(dot) if dot > 0 => &filename[..dot],
        _ => filename,
    }
}

/// Derives a probable candidate name from a résumé filename:
/// `Jane_Doe-Resume.pdf` → `jane doe`.
pub fn probable_name_from_filename(filename: &str) -> String {
    base_name(filename)
        .replace(['_', '-'], " ")
        .to_lowercase()
        .split_whitespace()
        .filter(|token| !ROLE_NOISE_TOKENS.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lists `*.pdf` files in `dir`, sorted by filename so discovery order is stable.
pub async fn discover_documents(dir: &Path) -> Result<Vec<Document>, AppError> {
    let mut documents = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf && entry.file_type().await?.is_file() {
            documents.push(Document::from_path(path));
        }
    }
    documents.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(documents)
}

/// The job description every résumé in a run is scored against.
#[derive(Debug, Clone)]
pub struct JobDescription {
    text: String,
}

impl JobDescription {
    pub fn new(text: String) -> Self {
        Self { text }
    }

    pub async fn load(path: &Path) -> Result<Self, AppError> {
        let text = tokio::fs::read_to_string(path).await?;
        Ok(Self::new(text))
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
