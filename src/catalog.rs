// src/catalog.rs
//! Static lookup tables used by the scrapers and the synthetic publisher.
//! The built-in catalog ships with the binary; `CATALOG_PATH` can point at a
//! replacement file with the same layout.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../catalog/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    /// Country code remote listings are filed under
    pub home_country: String,
    pub remote_location: String,
    pub countries: Vec<CountryProfile>,
    #[serde(default)]
    pub remote_sources: Vec<SourceEntry>,
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
    pub job_titles: Vec<String>,
    pub skill_keywords: Vec<String>,
    pub default_benefits: Vec<String>,
    pub description_templates: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryProfile {
    pub code: String,
    pub name: String,
    pub currency: String,
    pub salary_period: String,
    pub salary_floor: i64,
    pub salary_ceiling: i64,
    pub cities: Vec<String>,
    pub companies: Vec<CompanyEntry>,
    #[serde(default)]
    pub local_sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyEntry {
    pub name: String,
    pub industry: String,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    pub key: String,
    pub name: String,
    pub url: String,
}

impl Catalog {
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_CATALOG).context("Failed to parse built-in catalog")
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse catalog: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        if self.country(&self.home_country).is_none() {
            anyhow::bail!("home_country {} has no country entry", self.home_country);
        }
        for country in &self.countries {
            if country.companies.is_empty() || country.cities.is_empty() {
                anyhow::bail!("Country {} needs at least one company and city", country.code);
            }
            if country.salary_floor <= 0 || country.salary_floor >= country.salary_ceiling {
                anyhow::bail!("Country {} has an invalid salary band", country.code);
            }
        }
        if self.job_titles.is_empty() || self.description_templates.is_empty() {
            anyhow::bail!("Catalog needs job titles and description templates");
        }
        Ok(())
    }

    /// Case-insensitive country lookup
    pub fn country(&self, code: &str) -> Option<&CountryProfile> {
        self.countries
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
    }

    pub fn category(&self, key: &str) -> Option<&CategoryEntry> {
        self.categories
            .iter()
            .find(|c| c.key.eq_ignore_ascii_case(key.trim()))
    }

    pub fn remote_source(&self, name: &str) -> Option<&SourceEntry> {
        self.remote_sources
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn country_codes(&self) -> Vec<&str> {
        self.countries.iter().map(|c| c.code.as_str()).collect()
    }
}
