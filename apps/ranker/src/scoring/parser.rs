//! Response Parser: turns the model's free-text reply into `ScoreRecord`s.
//!
//! Rules, in order, for every record:
//! 1. fewer than two commas → rejected
//! 2. score must be a finite number in 0–100 → otherwise rejected
//! 3. a name of more than 5 words is presumed polluted → keep the last 3 words
//! 4. a name sharing no significant word with the filename → `ConflictResolver` decides
//!
//! Rejections are values, not errors: they are logged and never retried.

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::document::Document;
use crate::models::score::ScoreRecord;
use crate::scoring::conflict::{names_conflict, ConflictResolver, NameConflict};
use crate::scoring::wire::{flatten, split_batch, split_record};

const MAX_NAME_WORDS: usize = 5;
const RECOVERED_NAME_WORDS: usize = 3;
const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    #[error("expected 'name,score,reason' but found fewer than two commas in: {raw}")]
    MissingFields { raw: String },

    #[error("score '{score}' is not a finite number in: {raw}")]
    InvalidScore { score: String, raw: String },

    #[error("score {score} is outside 0-100 in: {raw}")]
    ScoreOutOfRange { score: f64, raw: String },

    #[error("candidate name is empty in: {raw}")]
    EmptyName { raw: String },

    #[error("batch reply has {received} records for {expected} resumes; no record can be trusted")]
    BatchMisaligned { expected: usize, received: usize },
}

/// Result of parsing one record.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Scored(ScoreRecord),
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    resolver: ConflictResolver,
}

impl ResponseParser {
    pub fn new(resolver: ConflictResolver) -> Self {
        Self { resolver }
    }

    /// Parses a single-mode reply for `document`.
    pub fn parse(&self, raw: &str, document: &Document) -> ParseOutcome {
        let flattened = flatten(raw);
        debug!("Raw response for {}: {}", document.filename, flattened);
        let outcome = self.parse_segment(&flattened, document);
        log_rejection(&outcome, document);
        outcome
    }

    /// Parses a batch reply. Segments pair with `documents` by position; the returned
    /// outcomes are aligned with `documents`. A reply whose record count differs from the
    /// batch size rejects every document, since a dropped record shifts all later ones.
    pub fn parse_batch(&self, raw: &str, documents: &[Document]) -> Vec<ParseOutcome> {
        let flattened = flatten(raw);
        debug!("Raw batch response for {} resumes: {}", documents.len(), flattened);

        let segments = split_batch(&flattened);
        if segments.len() != documents.len() {
            warn!(
                "Batch reply has {} records for {} resumes, rejecting the batch: {}",
                segments.len(),
                documents.len(),
                flattened
            );
            let reason = RejectReason::BatchMisaligned {
                expected: documents.len(),
                received: segments.len(),
            };
            return documents
                .iter()
                .map(|document| {
                    let outcome = ParseOutcome::Rejected(reason.clone());
                    log_rejection(&outcome, document);
                    outcome
                })
                .collect();
        }

        documents
            .iter()
            .zip(segments)
            .map(|(document, segment)| {
                let outcome = self.parse_segment(segment, document);
                log_rejection(&outcome, document);
                outcome
            })
            .collect()
    }

    fn parse_segment(&self, segment: &str, document: &Document) -> ParseOutcome {
        let Some(fields) = split_record(segment) else {
            return ParseOutcome::Rejected(RejectReason::MissingFields {
                raw: segment.to_string(),
            });
        };

        let score = match fields.score.parse::<f64>() {
            Ok(score) if score.is_finite() => score,
            _ => {
                return ParseOutcome::Rejected(RejectReason::InvalidScore {
                    score: fields.score.to_string(),
                    raw: segment.to_string(),
                })
            }
        };
        if !(0.0..=MAX_SCORE).contains(&score) {
            return ParseOutcome::Rejected(RejectReason::ScoreOutOfRange {
                score,
                raw: segment.to_string(),
            });
        }

        let mut name = recover_name(fields.name);
        if name.is_empty() {
            return ParseOutcome::Rejected(RejectReason::EmptyName {
                raw: segment.to_string(),
            });
        }

        if names_conflict(&name, &document.probable_name) {
            name = self.resolver.resolve(&NameConflict {
                filename: &document.filename,
                extracted: &name,
                probable: &document.probable_name,
            });
        }

        ParseOutcome::Scored(ScoreRecord::new(
            name,
            score,
            fields.reason.to_string(),
            document.filename.clone(),
        ))
    }
}

/// Keeps the last three words of a name that is too long to be only a name.
fn recover_name(raw_name: &str) -> String {
    let words: Vec<&str> = raw_name.split_whitespace().collect();
    if words.len() > MAX_NAME_WORDS {
        let recovered = words[words.len() - RECOVERED_NAME_WORDS..].join(" ");
        debug!("Name too long, likely contains extra text: '{raw_name}' -> '{recovered}'");
        recovered
    } else {
        words.join(" ")
    }
}

fn log_rejection(outcome: &ParseOutcome, document: &Document) {
    if let ParseOutcome::Rejected(reason) = outcome {
        warn!("Rejected reply for {}: {reason}", document.filename);
    }
}
