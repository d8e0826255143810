// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Path defaults read from `config.yaml`, one section per environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub database_path: PathBuf,
    pub log_path: PathBuf,
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/jobs.db"),
            log_path: PathBuf::from("/tmp/job-ingest.log"),
            catalog_path: None,
        }
    }
}

impl EnvironmentConfig {
    /// Load the section matching `ENVIRONMENT`, or defaults when `config.yaml` is absent
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        let config_path = PathBuf::from("config.yaml");

        if !config_path.exists() {
            info!("No config.yaml found, using default paths");
            return Ok(Self::default());
        }

        info!("Loading configuration for environment: {}", environment);
        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config.yaml")?;
        Self::from_yaml(&content, &environment)
    }

    pub fn get_environment() -> String {
        std::env::var("ENVIRONMENT")
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    pub fn from_yaml(content: &str, environment: &str) -> Result<Self> {
        let config_file: ConfigFile =
            serde_yaml::from_str(content).context("Failed to parse config.yaml")?;

        let env_config = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        };

        Ok(Self {
            database_path: Self::resolve_path(&env_config.database_path)?,
            log_path: Self::resolve_path(&env_config.log_path)?,
            catalog_path: env_config
                .catalog_path
                .as_deref()
                .map(Self::resolve_path)
                .transpose()?,
        })
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
local:
  database_path: data/jobs.db
  log_path: /tmp/local.log
production:
  database_path: /app/data/jobs.db
  log_path: /var/log/job-ingest.log
  catalog_path: /app/catalog.toml
"#;

    #[test]
    fn test_selects_environment_section() {
        let prod = EnvironmentConfig::from_yaml(YAML, "production").unwrap();
        assert_eq!(prod.database_path, PathBuf::from("/app/data/jobs.db"));
        assert_eq!(prod.catalog_path, Some(PathBuf::from("/app/catalog.toml")));

        let local = EnvironmentConfig::from_yaml(YAML, "staging").unwrap();
        assert!(local.database_path.is_absolute());
        assert!(local.database_path.ends_with("data/jobs.db"));
        assert_eq!(local.catalog_path, None);
    }
}
