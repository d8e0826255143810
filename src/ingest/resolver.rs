// src/ingest/resolver.rs
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::info;

use crate::core::database::{CompanyRepository, NewCompany};
use crate::utils::{host_of, slugify};

const LOGO_SERVICE: &str = "https://logo.clearbit.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCompany {
    pub id: String,
    pub created: bool,
}

/// Extra fields recorded only when the company row is created
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyDetails<'d> {
    pub industry: Option<&'d str>,
    pub location: Option<&'d str>,
    pub country: Option<&'d str>,
}

/// Lookup-or-create by slug, remembering answers for the lifetime of a run
pub struct CompanyResolver<'a> {
    companies: CompanyRepository<'a>,
    cache: Mutex<HashMap<String, String>>,
}

impl<'a> CompanyResolver<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self {
            companies: CompanyRepository::new(pool),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn resolve(
        &self,
        name: &str,
        website: Option<&str>,
        details: CompanyDetails<'_>,
    ) -> Result<ResolvedCompany> {
        let slug = slugify(name);
        if slug.is_empty() {
            anyhow::bail!("Company name {:?} produces an empty slug", name);
        }

        if let Some(id) = self.cache.lock().await.get(&slug) {
            return Ok(ResolvedCompany {
                id: id.clone(),
                created: false,
            });
        }

        if let Some(existing) = self.companies.find_by_slug(&slug).await? {
            self.remember(slug, &existing.id).await;
            return Ok(ResolvedCompany {
                id: existing.id,
                created: false,
            });
        }

        let company = NewCompany {
            name: name.trim().to_string(),
            industry: details.industry.map(str::to_string),
            location: details.location.map(str::to_string),
            country: details.country.map(str::to_string),
            website: website.map(str::to_string),
            description: Some(format!(
                "{} is hiring. Company details were collected automatically from public job listings.",
                name.trim()
            )),
            logo_url: Some(logo_url(&slug, website)),
            slug: slug.clone(),
        };

        // A concurrent insert of the same slug is not an error; re-select picks up the winner
        let created = self.companies.insert_if_absent(&company).await?;
        let record = self
            .companies
            .find_by_slug(&slug)
            .await?
            .with_context(|| format!("Company {} missing after insert", slug))?;

        if created {
            info!("Created company {} ({})", record.name, record.slug);
        }

        self.remember(slug, &record.id).await;
        Ok(ResolvedCompany {
            id: record.id,
            created,
        })
    }

    async fn remember(&self, slug: String, id: &str) {
        self.cache.lock().await.insert(slug, id.to_string());
    }
}

/// Logo derived from the website host, else guessed from the slug
pub fn logo_url(slug: &str, website: Option<&str>) -> String {
    let domain = website
        .and_then(host_of)
        .unwrap_or_else(|| format!("{}.com", slug.replace('-', "")));
    format!("{}/{}", LOGO_SERVICE, domain)
}
