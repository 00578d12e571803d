use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted outcome of scoring one résumé.
/// On disk: `{id, name, score, reason, original_filename}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: Uuid,
    pub name: String,
    pub score: f64, // 0 – 100
    pub reason: String,
    #[serde(rename = "original_filename")]
    pub source_filename: String,
}

impl ScoreRecord {
    pub fn new(name: String, score: f64, reason: String, source_filename: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            score,
            reason,
            source_filename,
        }
    }

    /// Field equality ignoring the generated `id`.
    #[cfg(test)]
    pub fn same_content(&self, other: &ScoreRecord) -> bool {
        self.name == other.name
            && self.score == other.score
            && self.reason == other.reason
            && self.source_filename == other.source_filename
    }
}

/// Every stored record at aggregation time, highest score first.
#[derive(Debug, Clone)]
pub struct AggregateResult {
    pub records: Vec<ScoreRecord>,
    pub location: PathBuf,
}
