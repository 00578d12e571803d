use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::scoring::conflict::ConflictResolver;

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const JOB_DESCRIPTION_FILE: &str = "job_description.md";

/// Run configuration, loaded once from environment variables (and `.env`).
/// Core components receive it by reference and never read the environment themselves.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub resume_dir: PathBuf,
    pub job_desc_dir: PathBuf,
    pub result_dir: PathBuf,
    pub batch_size: usize,
    pub debug: bool,
    pub additional_criteria: Option<String>,
    /// `extracted` (or `model`), `filename`, `interactive` (or `prompt`).
    pub conflict_policy: ConflictResolver,
    pub single_cooldown: Duration,
    pub batch_cooldown: Duration,
    pub request_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. `from_env` is the production caller.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_key = lookup("OPENROUTER_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .context("Required environment variable 'OPENROUTER_API_KEY' is not set")?;

        let batch_size = var("BATCH_SIZE", "1")
            .trim()
            .parse::<usize>()
            .context("BATCH_SIZE must be a positive integer")?;
        if batch_size == 0 {
            bail!("BATCH_SIZE must be at least 1");
        }

        let conflict_policy = var("NAME_CONFLICT_POLICY", "extracted")
            .parse::<ConflictResolver>()
            .context("NAME_CONFLICT_POLICY is invalid")?;

        Ok(Config {
            api_key,
            model: var("OPENROUTER_MODEL", DEFAULT_MODEL),
            api_url: var("OPENROUTER_API_URL", DEFAULT_API_URL),
            resume_dir: PathBuf::from(var("RESUME_FOLDER", "resumes")),
            job_desc_dir: PathBuf::from(var("JOB_DESC_FOLDER", "job_descriptions")),
            result_dir: PathBuf::from(var("RESULT_FOLDER", "results")),
            batch_size,
            debug: parse_flag(&var("DEBUG", "false")),
            additional_criteria: lookup("ADDITIONAL_CRITERIA").filter(|c| !c.trim().is_empty()),
            conflict_policy,
            single_cooldown: millis(&var("SINGLE_COOLDOWN_MS", "1000"), "SINGLE_COOLDOWN_MS")?,
            batch_cooldown: millis(&var("BATCH_COOLDOWN_MS", "2000"), "BATCH_COOLDOWN_MS")?,
            request_timeout: Duration::from_secs(
                var("REQUEST_TIMEOUT_SECS", "120")
                    .trim()
                    .parse::<u64>()
                    .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            rust_log: var("RUST_LOG", "info"),
        })
    }

    pub fn job_description_path(&self) -> PathBuf {
        self.job_desc_dir.join(JOB_DESCRIPTION_FILE)
    }

    /// Effective log level: `debug` when DEBUG is on, otherwise RUST_LOG.
    pub fn log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.rust_log
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "t" | "yes"
    )
}

fn millis(value: &str, key: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .with_context(|| format!("{key} must be a whole number of milliseconds"))
}
