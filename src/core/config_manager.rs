// src/core/config_manager.rs
//! Typed settings passed explicitly to every component

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::environment::EnvironmentConfig;
use crate::error::IngestError;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_SOURCE_DELAY_MS: u64 = 1500;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MODEL_CONTENT_BUDGET: usize = 15_000;
const DEFAULT_NOTIFY_MIN_SCORE: u8 = 40;
const DEFAULT_LOCAL_RUN_CAP: usize = 50;

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub database_path: PathBuf,
    pub log_path: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub scrape_api: Option<ApiSettings>,
    pub llm: Option<LlmSettings>,
    pub mail: Option<MailSettings>,
    pub site_url: String,
    pub source_delay: Duration,
    pub fetch_timeout: Duration,
    pub model_content_budget: usize,
    pub notify_min_score: u8,
    pub local_run_cap: usize,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct MailSettings {
    pub api_key: String,
    pub base_url: String,
    pub from: String,
}

impl Settings {
    /// Load from process environment, with path defaults from `config.yaml`
    pub fn load() -> Result<Self> {
        let environment = EnvironmentConfig::load()?;
        let settings = Self::from_lookup(environment, |key| std::env::var(key).ok())?;

        info!(
            "Settings loaded: scrape_api={}, llm={}, mail={}",
            settings.scrape_api.is_some(),
            settings.llm.is_some(),
            settings.mail.is_some()
        );
        Ok(settings)
    }

    pub fn from_lookup<F>(environment: EnvironmentConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("ROCKET_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .context("ROCKET_PORT must be a valid port number")?,
            None => DEFAULT_PORT,
        };

        let scrape_api = get("FIRECRAWL_API_KEY").map(|api_key| ApiSettings {
            api_key,
            base_url: get("FIRECRAWL_API_URL")
                .unwrap_or_else(|| "https://api.firecrawl.dev".to_string()),
        });

        let llm = get("LLM_API_KEY").map(|api_key| LlmSettings {
            api_key,
            base_url: get("LLM_API_URL").unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: get("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
        });

        let mail = get("RESEND_API_KEY").map(|api_key| MailSettings {
            api_key,
            base_url: get("RESEND_API_URL").unwrap_or_else(|| "https://api.resend.com".to_string()),
            from: get("MAIL_FROM").unwrap_or_else(|| "Jobs <alerts@jobs.example.co.za>".to_string()),
        });

        Ok(Self {
            port,
            database_path: get("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(environment.database_path),
            log_path: get("LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(environment.log_path),
            catalog_path: get("CATALOG_PATH")
                .map(PathBuf::from)
                .or(environment.catalog_path),
            scrape_api,
            llm,
            mail,
            site_url: get("SITE_URL").unwrap_or_else(|| "http://localhost:5173".to_string()),
            source_delay: Duration::from_millis(parse_or(
                get("SOURCE_DELAY_MS"),
                DEFAULT_SOURCE_DELAY_MS,
                "SOURCE_DELAY_MS",
            )?),
            fetch_timeout: Duration::from_secs(parse_or(
                get("FETCH_TIMEOUT_SECS"),
                DEFAULT_FETCH_TIMEOUT_SECS,
                "FETCH_TIMEOUT_SECS",
            )?),
            model_content_budget: parse_or(
                get("MODEL_CONTENT_BUDGET"),
                DEFAULT_MODEL_CONTENT_BUDGET,
                "MODEL_CONTENT_BUDGET",
            )?,
            notify_min_score: parse_or(
                get("NOTIFY_MIN_SCORE"),
                DEFAULT_NOTIFY_MIN_SCORE,
                "NOTIFY_MIN_SCORE",
            )?,
            local_run_cap: parse_or(get("LOCAL_RUN_CAP"), DEFAULT_LOCAL_RUN_CAP, "LOCAL_RUN_CAP")?,
        })
    }

    pub fn require_scrape_api(&self) -> Result<&ApiSettings, IngestError> {
        self.scrape_api
            .as_ref()
            .ok_or(IngestError::MissingApiKey("FIRECRAWL_API_KEY"))
    }

    pub fn require_llm(&self) -> Result<&LlmSettings, IngestError> {
        self.llm.as_ref().ok_or(IngestError::MissingApiKey("LLM_API_KEY"))
    }

    pub fn require_mail(&self) -> Result<&MailSettings, IngestError> {
        self.mail
            .as_ref()
            .ok_or(IngestError::MissingApiKey("RESEND_API_KEY"))
    }
}

fn parse_or<T>(raw: Option<String>, default: T, key: &str) -> Result<T>
where
    T: std::str::FromStr,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", key, value)),
        None => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_settings() -> Settings {
    Settings::from_lookup(EnvironmentConfig::default(), |key| match key {
        "SOURCE_DELAY_MS" => Some("0".to_string()),
        _ => None,
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_keys() {
        let settings = Settings::from_lookup(EnvironmentConfig::default(), lookup(&[])).unwrap();
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.source_delay, Duration::from_millis(1500));
        assert_eq!(settings.model_content_budget, 15_000);
        assert!(matches!(
            settings.require_llm(),
            Err(IngestError::MissingApiKey("LLM_API_KEY"))
        ));
        assert!(settings.require_scrape_api().is_err());
        assert!(settings.require_mail().is_err());
    }

    #[test]
    fn test_keys_and_overrides() {
        let settings = Settings::from_lookup(
            EnvironmentConfig::default(),
            lookup(&[
                ("ROCKET_PORT", "9001"),
                ("LLM_API_KEY", "sk-test"),
                ("LLM_MODEL", "small-model"),
                ("FIRECRAWL_API_KEY", "fc-test"),
                ("SOURCE_DELAY_MS", "0"),
                ("DATABASE_PATH", "/tmp/x.db"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.port, 9001);
        assert_eq!(settings.require_llm().unwrap().model, "small-model");
        assert_eq!(
            settings.require_scrape_api().unwrap().base_url,
            "https://api.firecrawl.dev"
        );
        assert_eq!(settings.source_delay, Duration::ZERO);
        assert_eq!(settings.database_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let settings =
            Settings::from_lookup(EnvironmentConfig::default(), lookup(&[("LLM_API_KEY", "  ")]))
                .unwrap();
        assert!(settings.llm.is_none());
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let result = Settings::from_lookup(
            EnvironmentConfig::default(),
            lookup(&[("NOTIFY_MIN_SCORE", "lots")]),
        );
        assert!(result.is_err());
    }
}
