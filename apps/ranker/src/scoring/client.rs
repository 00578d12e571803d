//! Scoring Client: builds scoring requests and sends them through `LlmClient`.
//!
//! Failure handling differs by mode. A single-résumé request that exhausts its retries
//! yields `SCORING_FAILED_SENTINEL` and the run continues. A batch request that exhausts
//! its retries returns the error so the pipeline can halt. A batch request answered with
//! an unusable reply yields an empty reply, which the parser rejects per document.

use tracing::{error, warn};

use crate::llm_client::prompts::{
    batch_user_message, single_user_message, BATCH_SCORING_SYSTEM, SINGLE_SCORING_SYSTEM,
};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::document::{Document, JobDescription};

/// Returned in place of a model reply when a single-mode request fails.
/// Contains no field delimiter, so the parser can never mistake it for a record.
pub const SCORING_FAILED_SENTINEL: &str = "Error: scoring request failed after all retries";

pub fn is_failure_sentinel(reply: &str) -> bool {
    reply == SCORING_FAILED_SENTINEL
}

#[derive(Clone)]
pub struct ScoringClient {
    llm: LlmClient,
}

impl ScoringClient {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Scores one résumé. Never fails: returns the sentinel when the request cannot complete.
    pub async fn score_single(
        &self,
        job: &JobDescription,
        additional_criteria: Option<&str>,
        document: &Document,
        resume_text: &str,
    ) -> String {
        let user = single_user_message(job, document, resume_text, additional_criteria);
        match self.llm.complete(SINGLE_SCORING_SYSTEM, &user).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Scoring request for {} failed: {e}", document.filename);
                SCORING_FAILED_SENTINEL.to_string()
            }
        }
    }

    /// Scores several résumés in one request. `items` order defines reply order.
    /// Returns `Err` only for `LlmError::Exhausted`.
    pub async fn score_batch(
        &self,
        job: &JobDescription,
        additional_criteria: Option<&str>,
        items: &[(&Document, &str)],
    ) -> Result<String, LlmError> {
        let user = batch_user_message(job, items, additional_criteria);
        let filenames = || {
            items
                .iter()
                .map(|(d, _)| d.filename.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self.llm.complete(BATCH_SCORING_SYSTEM, &user).await {
            Ok(reply) => Ok(reply),
            Err(e @ LlmError::Exhausted { .. }) => {
                error!("Batch scoring request failed for [{}]: {e}", filenames());
                Err(e)
            }
            Err(e) => {
                warn!("Unusable batch reply for [{}]: {e}", filenames());
                Ok(String::new())
            }
        }
    }
}
