//! Pipeline Controller: drives unprocessed résumés through extraction, scoring, parsing
//! and persistence, then rebuilds the aggregate.
//!
//! States: Idle → SelectingInputs → ExtractingText → Scoring → Parsing → Persisting
//! → Aggregating → Done. `Failed` is reachable only from Scoring when a batch request
//! exhausts its retries. Every other failure is recorded against its document and the
//! run moves on.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::models::document::{Document, JobDescription};
use crate::models::score::{AggregateResult, ScoreRecord};
use crate::scoring::client::{is_failure_sentinel, ScoringClient};
use crate::scoring::parser::{ParseOutcome, RejectReason, ResponseParser};
use crate::scoring::text_source::TextSource;
use crate::store::aggregate::aggregate;
use crate::store::ResultStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    SelectingInputs,
    ExtractingText,
    Scoring,
    Parsing,
    Persisting,
    Aggregating,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// 1 = one request per résumé; larger values batch résumés into one request.
    pub batch_size: usize,
    pub single_cooldown: Duration,
    pub batch_cooldown: Duration,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            single_cooldown: config.single_cooldown,
            batch_cooldown: config.batch_cooldown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FailureKind {
    Extraction(String),
    ScoringFailed,
    Rejected(RejectReason),
    Persist(String),
}

/// A document that ended the run without a stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFailure {
    pub filename: String,
    pub kind: FailureKind,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub discovered: usize,
    pub already_scored: usize,
    pub selected: usize,
    pub scored: usize,
    pub failures: Vec<DocumentFailure>,
    pub aggregate: AggregateResult,
    pub final_state: PipelineState,
}

/// Mutable bookkeeping for one run.
struct RunState {
    state: PipelineState,
    scored: usize,
    failures: Vec<DocumentFailure>,
}

impl RunState {
    fn new() -> Self {
        Self {
            state: PipelineState::Idle,
            scored: 0,
            failures: Vec::new(),
        }
    }

    fn enter(&mut self, next: PipelineState) {
        debug!("Pipeline state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, document: &Document, kind: FailureKind) {
        warn!("Failed to process {}: {:?}", document.filename, kind);
        self.failures.push(DocumentFailure {
            filename: document.filename.clone(),
            kind,
        });
    }
}

pub struct Pipeline {
    text_source: Arc<dyn TextSource>,
    client: ScoringClient,
    parser: ResponseParser,
    store: ResultStore,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        text_source: Arc<dyn TextSource>,
        client: ScoringClient,
        parser: ResponseParser,
        store: ResultStore,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            text_source,
            client,
            parser,
            store,
            settings,
        }
    }

    /// Runs the pipeline over `discovered`. Returns `Err` only for I/O failures of the
    /// aggregate itself or a batch that exhausted its retries.
    pub async fn run(
        &self,
        discovered: &[Document],
        job: &JobDescription,
        additional_criteria: Option<&str>,
    ) -> Result<RunReport, AppError> {
        let mut run = RunState::new();

        run.enter(PipelineState::SelectingInputs);
        let selected = select_unprocessed(&self.store, discovered).await;
        info!(
            "Found {} resume files that need processing out of {} total",
            selected.len(),
            discovered.len()
        );
        if selected.is_empty() {
            info!("No new resumes to process. All files have stored results.");
        }

        if self.settings.batch_size <= 1 {
            self.score_individually(&selected, job, additional_criteria, &mut run)
                .await;
        } else {
            self.score_in_batches(&selected, job, additional_criteria, &mut run)
                .await?;
        }
        info!("Processed {} out of {} resumes", run.scored, selected.len());

        run.enter(PipelineState::Aggregating);
        let aggregate = aggregate(&self.store).await?;
        run.enter(PipelineState::Done);

        Ok(RunReport {
            discovered: discovered.len(),
            already_scored: discovered.len() - selected.len(),
            selected: selected.len(),
            scored: run.scored,
            failures: run.failures,
            aggregate,
            final_state: run.state,
        })
    }

    async fn score_individually(
        &self,
        documents: &[Document],
        job: &JobDescription,
        additional_criteria: Option<&str>,
        run: &mut RunState,
    ) {
        let total = documents.len();
        for (index, document) in documents.iter().enumerate() {
            info!("Processing {} ({}/{})", document.filename, index + 1, total);

            run.enter(PipelineState::ExtractingText);
            let text = match self.text_source.text_for(document).await {
                Ok(text) => text,
                Err(e) => {
                    run.fail(document, FailureKind::Extraction(e.to_string()));
                    continue;
                }
            };

            run.enter(PipelineState::Scoring);
            let reply = self
                .client
                .score_single(job, additional_criteria, document, &text)
                .await;
            if is_failure_sentinel(&reply) {
                run.fail(document, FailureKind::ScoringFailed);
                continue;
            }

            run.enter(PipelineState::Parsing);
            let outcome = self.parser.parse(&reply, document);
            self.persist(document, outcome, run).await;

            if index + 1 < total {
                tokio::time::sleep(self.settings.single_cooldown).await;
            }
        }
    }

    async fn score_in_batches(
        &self,
        documents: &[Document],
        job: &JobDescription,
        additional_criteria: Option<&str>,
        run: &mut RunState,
    ) -> Result<(), AppError> {
        let batches: Vec<&[Document]> = documents.chunks(self.settings.batch_size).collect();
        let total = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            info!(
                "Processing batch {}/{} ({} resumes)",
                index + 1,
                total,
                batch.len()
            );

            run.enter(PipelineState::ExtractingText);
            let mut ready = Vec::with_capacity(batch.len());
            let mut texts = Vec::with_capacity(batch.len());
            for document in batch {
                match self.text_source.text_for(document).await {
                    Ok(text) => {
                        ready.push(document.clone());
                        texts.push(text);
                    }
                    Err(e) => run.fail(document, FailureKind::Extraction(e.to_string())),
                }
            }
            if ready.is_empty() {
                continue;
            }

            run.enter(PipelineState::Scoring);
            let items: Vec<(&Document, &str)> = ready
                .iter()
                .zip(&texts)
                .map(|(document, text)| (document, text.as_str()))
                .collect();
            let reply = match self
                .client
                .score_batch(job, additional_criteria, &items)
                .await
            {
                Ok(reply) => reply,
                Err(source) => {
                    run.enter(PipelineState::Failed);
                    error!(
                        "Stopping run: batch {}/{} could not be scored; {} resumes saved so far",
                        index + 1,
                        total,
                        run.scored
                    );
                    return Err(AppError::BatchAborted {
                        filenames: ready.iter().map(|d| d.filename.clone()).collect(),
                        source,
                    });
                }
            };

            run.enter(PipelineState::Parsing);
            let outcomes = self.parser.parse_batch(&reply, &ready);
            for (document, outcome) in ready.iter().zip(outcomes) {
                self.persist(document, outcome, run).await;
            }

            if index + 1 < total {
                tokio::time::sleep(self.settings.batch_cooldown).await;
            }
        }
        Ok(())
    }

    async fn persist(&self, document: &Document, outcome: ParseOutcome, run: &mut RunState) {
        let record: ScoreRecord = match outcome {
            ParseOutcome::Scored(record) => record,
            ParseOutcome::Rejected(reason) => {
                run.fail(document, FailureKind::Rejected(reason));
                return;
            }
        };

        run.enter(PipelineState::Persisting);
        match self.store.save(&record).await {
            Ok(_) => {
                run.scored += 1;
                info!(
                    "Scored {}: {} - {}",
                    document.filename, record.name, record.score
                );
            }
            Err(e) => run.fail(document, FailureKind::Persist(e.to_string())),
        }
    }
}

/// Documents without a stored record, in discovery order.
pub async fn select_unprocessed(store: &ResultStore, discovered: &[Document]) -> Vec<Document> {
    let mut selected = Vec::new();
    for document in discovered {
        if store.exists(&document.filename).await {
            debug!(
                "Skipping {} as it already has a stored result",
                document.filename
            );
        } else {
            selected.push(document.clone());
        }
    }
    selected
}
