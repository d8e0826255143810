// src/ingest/publisher.rs
//! Synthetic listings for every catalog country

use anyhow::Result;
use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::resolver::{CompanyDetails, CompanyResolver};
use crate::catalog::{Catalog, CompanyEntry, CountryProfile};
use crate::core::database::{JobRepository, NewJob};
use crate::types::{EmploymentType, ExperienceLevel, JobStatus, PublishSummary, SalaryPeriod};

/// Picks per job before a country gives up on finding unused (company, title) pairs
const ATTEMPTS_PER_JOB: usize = 20;
const MAX_AGE_MINUTES: i64 = 72 * 60;
const SOURCE_NAME: &str = "Auto-publish";

pub struct Publisher<'a, R: Rng> {
    catalog: &'a Catalog,
    resolver: CompanyResolver<'a>,
    jobs: JobRepository<'a>,
    rng: R,
}

impl<'a, R: Rng> Publisher<'a, R> {
    pub fn new(pool: &'a SqlitePool, catalog: &'a Catalog, rng: R) -> Self {
        Self {
            catalog,
            resolver: CompanyResolver::new(pool),
            jobs: JobRepository::new(pool),
            rng,
        }
    }

    pub async fn publish(&mut self, per_country: usize) -> Result<PublishSummary> {
        let catalog = self.catalog;
        let mut jobs_created = BTreeMap::new();

        for country in &catalog.countries {
            let created = self.publish_country(country, per_country).await;
            if created < per_country {
                warn!(
                    "Only {} of {} jobs published for {}; catalog combinations exhausted",
                    created, per_country, country.code
                );
            }
            jobs_created.insert(country.code.clone(), created);
        }

        let total_active_jobs = self.jobs.count_active().await?;
        let summary = PublishSummary {
            jobs_created,
            total_active_jobs,
        };

        info!(
            "Auto-publish created {} jobs, {} active in total",
            summary.total_created(),
            summary.total_active_jobs
        );
        Ok(summary)
    }

    async fn publish_country(&mut self, country: &CountryProfile, per_country: usize) -> usize {
        let mut created = 0;
        let mut attempts = 0;

        while created < per_country && attempts < per_country * ATTEMPTS_PER_JOB {
            attempts += 1;

            let Some(company) = country.companies.choose(&mut self.rng) else {
                return created;
            };
            let Some(city) = country.cities.choose(&mut self.rng) else {
                return created;
            };

            let details = CompanyDetails {
                industry: Some(company.industry.as_str()),
                location: Some(city.as_str()),
                country: Some(country.code.as_str()),
            };
            let resolved = match self
                .resolver
                .resolve(&company.name, company.website.as_deref(), details)
                .await
            {
                Ok(resolved) => resolved,
                Err(e) => {
                    warn!("Could not resolve {}: {:#}", company.name, e);
                    continue;
                }
            };

            let job = self.generate(country, company, city, &resolved.id);
            match self.jobs.insert_if_absent(&job).await {
                Ok(Some(_)) => created += 1,
                Ok(None) => debug!("{} at {} already listed, picking again", job.title, company.name),
                Err(e) => warn!("Failed to publish {} at {}: {:#}", job.title, company.name, e),
            }
        }

        created
    }

    fn generate(&mut self, country: &CountryProfile, company: &CompanyEntry, city: &str, company_id: &str) -> NewJob {
        let title = self
            .catalog
            .job_titles
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| "Software Engineer".to_string());

        let level = ExperienceLevel::from_title(&title);
        let employment_type = if self.rng.gen_bool(0.8) {
            EmploymentType::FullTime
        } else {
            EmploymentType::ALL
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(EmploymentType::FullTime)
        };

        let skill_count = self.rng.gen_range(3..=6);
        let skills: Vec<String> = self
            .catalog
            .skill_keywords
            .choose_multiple(&mut self.rng, skill_count)
            .cloned()
            .collect();
        let benefits: Vec<String> = self
            .catalog
            .default_benefits
            .choose_multiple(&mut self.rng, 3)
            .cloned()
            .collect();

        let (salary_min, salary_max) = self.salary_band(country, level);
        let description = self.describe(country, company, city, &title, &skills);
        let age = Duration::minutes(self.rng.gen_range(0..MAX_AGE_MINUTES));

        NewJob {
            company_id: company_id.to_string(),
            description,
            location: Some(format!("{}, {}", city, country.name)),
            country: country.code.clone(),
            is_remote: self.rng.gen_bool(0.15),
            employment_type: employment_type.as_str().to_string(),
            experience_level: Some(level.as_str().to_string()),
            salary_min: Some(salary_min),
            salary_max: Some(salary_max),
            salary_currency: Some(country.currency.clone()),
            salary_period: country
                .salary_period
                .parse::<SalaryPeriod>()
                .ok()
                .map(|p| p.as_str().to_string()),
            skills,
            benefits,
            status: JobStatus::Active,
            source_name: Some(SOURCE_NAME.to_string()),
            source_url: None,
            posted_at: Utc::now() - age,
            title,
        }
    }

    /// The country band is split into one slice per seniority step.
    /// `min` is rounded to the thousand; `max` is 10-40% above it and always greater.
    fn salary_band(&mut self, country: &CountryProfile, level: ExperienceLevel) -> (i64, i64) {
        let steps = ExperienceLevel::ALL.len() as i64;
        let rank = i64::from(level.rank());
        let span = country.salary_ceiling - country.salary_floor;

        let low = country.salary_floor + span * rank / steps;
        let high = (country.salary_floor + span * (rank + 1) / steps).max(low + 1);

        let min = (self.rng.gen_range(low..high) / 1000 * 1000).max(1000);
        let uplift = self.rng.gen_range(10..=40);
        let max = ((min + min * uplift / 100) / 1000 * 1000).max(min + 1000);

        (min, max)
    }

    fn describe(
        &mut self,
        country: &CountryProfile,
        company: &CompanyEntry,
        city: &str,
        title: &str,
        skills: &[String],
    ) -> String {
        let template = self
            .catalog
            .description_templates
            .choose(&mut self.rng)
            .map(String::as_str)
            .unwrap_or("{company} is hiring a {title} in {city}.");

        let skill_text = match skills {
            [] => "modern tooling".to_string(),
            [only] => only.clone(),
            [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
        };

        template
            .replace("{company}", &company.name)
            .replace("{title}", title)
            .replace("{city}", city)
            .replace("{country}", &country.name)
            .replace("{industry}", &company.industry)
            .replace("{skills}", &skill_text)
    }
}
