mod config;
mod errors;
mod llm_client;
mod models;
mod scoring;
mod store;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{HttpTransport, LlmClient};
use crate::models::document::{discover_documents, JobDescription};
use crate::scoring::client::ScoringClient;
use crate::scoring::criteria::sanitize_criteria;
use crate::scoring::parser::ResponseParser;
use crate::scoring::pipeline::{Pipeline, PipelineSettings};
use crate::scoring::text_source::{CachedTextSource, PdfExtractor};
use crate::scoring::wire::WIRE_FORMAT_VERSION;
use crate::store::ResultStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), config.log_level()))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ranker v{}", env!("CARGO_PKG_VERSION"));

    for dir in [&config.resume_dir, &config.job_desc_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Could not create {}", dir.display()))?;
    }

    let job_path = config.job_description_path();
    if !tokio::fs::try_exists(&job_path).await.unwrap_or(false) {
        anyhow::bail!(
            "Job description file not found at {}. Create it and try again.",
            job_path.display()
        );
    }
    let job = JobDescription::load(&job_path).await?;
    info!(
        "Loaded job description from {} ({} bytes)",
        job_path.display(),
        job.text().len()
    );

    let criteria = config.additional_criteria.as_deref().map(sanitize_criteria);
    if let Some(criteria) = &criteria {
        for sentence in &criteria.stripped {
            warn!("Dropped additional criteria sentence that may override the output format: '{sentence}'");
        }
        match criteria.as_deref() {
            Some(kept) => info!("Additional criteria: '{kept}'"),
            None => warn!("All additional criteria were filtered out; continuing without them"),
        }
    }

    // Initialize LLM client
    let transport = HttpTransport::new(
        config.api_url.clone(),
        config.api_key.clone(),
        config.request_timeout,
    )?;
    let llm = LlmClient::new(Arc::new(transport), config.model.clone());
    info!(
        "LLM client initialized (model: {}, wire format v{})",
        llm.model(),
        WIRE_FORMAT_VERSION
    );

    let store = ResultStore::open(&config.result_dir).await?;
    let text_source = CachedTextSource::new(Arc::new(PdfExtractor), &config.result_dir);
    let pipeline = Pipeline::new(
        Arc::new(text_source),
        ScoringClient::new(llm),
        ResponseParser::new(config.conflict_policy),
        store,
        PipelineSettings::from(&config),
    );

    let documents = discover_documents(&config.resume_dir).await?;
    let report = pipeline
        .run(
            &documents,
            &job,
            criteria.as_ref().and_then(|c| c.as_deref()),
        )
        .await?;

    for failure in &report.failures {
        warn!("Not scored: {} ({:?})", failure.filename, failure.kind);
    }
    info!(
        "Run {:?}: {} discovered, {} already scored, {}/{} newly scored, {} failed",
        report.final_state,
        report.discovered,
        report.already_scored,
        report.scored,
        report.selected,
        report.failures.len()
    );

    println!("Ranking ({}):", report.aggregate.location.display());
    for (rank, record) in report.aggregate.records.iter().enumerate() {
        println!(
            "{:>3}. {:<30} {:>6.1}  {}",
            rank + 1,
            record.name,
            record.score,
            record.reason
        );
    }

    Ok(())
}
