use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::scoring::{MatchPolicy, ServiceSettings};
use crate::training::TrainingConfig;

const DEFAULT_DATASET_PATHS: &str = "job_descriptions.csv,../job_descriptions.csv,../dataset/job_descriptions.csv,../../dataset/job_descriptions.csv";

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub model_path: PathBuf,
    pub dataset_paths: Vec<PathBuf>,
    pub regression_enabled: bool,
    pub syn_interactions: usize,
    /// `None` trains on every corpus job.
    pub sample_jobs: Option<usize>,
    pub read_rows: Option<usize>,
    pub seed: u64,
    pub experience_baseline: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let experience_baseline: f64 = parse_or(&var, "JOBLENS_EXPERIENCE_BASELINE", 3.0)?;
        if !(experience_baseline.is_finite() && experience_baseline > 0.0) {
            bail!("JOBLENS_EXPERIENCE_BASELINE must be a positive number of years");
        }

        Ok(Config {
            port: parse_or(&var, "PORT", 8080)?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            model_path: var("JOBLENS_MODEL_PATH")
                .unwrap_or_else(|| "joblens_model.bin".to_string())
                .into(),
            dataset_paths: split_paths(
                &var("JOBLENS_DATASET_PATHS").unwrap_or_else(|| DEFAULT_DATASET_PATHS.to_string()),
            ),
            regression_enabled: match var("JOBLENS_REGRESSION_ENABLED") {
                Some(v) => parse_bool(&v)
                    .with_context(|| format!("JOBLENS_REGRESSION_ENABLED has invalid value '{v}'"))?,
                None => true,
            },
            syn_interactions: parse_or(&var, "JOBLENS_SYN_INTERACTIONS", 5000)?,
            sample_jobs: Some(parse_or(&var, "JOBLENS_SAMPLE_JOBS", 0usize)?).filter(|n| *n > 0),
            read_rows: var("JOBLENS_READ_NROWS")
                .map(|v| {
                    v.parse::<usize>()
                        .with_context(|| format!("JOBLENS_READ_NROWS has invalid value '{v}'"))
                })
                .transpose()?,
            seed: parse_or(&var, "JOBLENS_SEED", 42)?,
            experience_baseline,
        })
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            model_path: self.model_path.clone(),
            dataset_paths: self.dataset_paths.clone(),
            regression_enabled: self.regression_enabled,
            read_rows: self.read_rows,
            training: TrainingConfig {
                interactions: self.syn_interactions,
                seed: Some(self.seed),
                sample_jobs: self.sample_jobs,
                match_policy: MatchPolicy {
                    experience_baseline_years: self.experience_baseline,
                },
                ..TrainingConfig::default()
            },
        }
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(v) => v
            .parse::<T>()
            .with_context(|| format!("{key} has invalid value '{v}'")),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got '{other}'"),
    }
}

fn split_paths(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}
