// src/ingest/writer.rs
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::core::database::{JobRepository, NewJob};
use crate::types::{CandidateJob, EmploymentType, JobStatus};

use super::Source;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Created(String),
    Duplicate,
    Failed(String),
}

impl WriteOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, WriteOutcome::Created(_))
    }
}

/// Persists candidates, skipping any (company, title) pair already stored
pub struct JobWriter<'a> {
    jobs: JobRepository<'a>,
    benefits: Vec<String>,
}

impl<'a> JobWriter<'a> {
    pub fn new(pool: &'a SqlitePool, benefits: &[String]) -> Self {
        Self {
            jobs: JobRepository::new(pool),
            benefits: benefits.to_vec(),
        }
    }

    pub async fn write(&self, candidate: &CandidateJob, company_id: &str, source: &Source) -> WriteOutcome {
        let job = self.to_new_job(candidate, company_id, source);

        match self.jobs.insert_if_absent(&job).await {
            Ok(Some(id)) => {
                debug!("Created job {} '{}'", id, job.title);
                WriteOutcome::Created(id)
            }
            Ok(None) => {
                debug!("Skipped duplicate '{}' for company {}", job.title, company_id);
                WriteOutcome::Duplicate
            }
            Err(e) => {
                warn!("Failed to write job '{}': {:#}", job.title, e);
                WriteOutcome::Failed(e.to_string())
            }
        }
    }

    fn to_new_job(&self, candidate: &CandidateJob, company_id: &str, source: &Source) -> NewJob {
        let title = candidate.title.trim().to_string();
        let description = candidate
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("{} at {}.", title, candidate.company.trim()));

        NewJob {
            company_id: company_id.to_string(),
            description,
            location: candidate
                .location
                .clone()
                .or_else(|| Some(source.default_location.clone())),
            country: source.country.clone(),
            is_remote: candidate.is_remote || source.remote,
            employment_type: candidate
                .employment_type
                .unwrap_or(EmploymentType::FullTime)
                .as_str()
                .to_string(),
            experience_level: candidate.experience_level.map(|l| l.as_str().to_string()),
            salary_min: candidate.salary_min,
            salary_max: candidate.salary_max,
            salary_currency: candidate.salary_currency.clone(),
            salary_period: candidate.salary_period.map(|p| p.as_str().to_string()),
            skills: candidate.skills.clone(),
            benefits: self.benefits.clone(),
            status: JobStatus::Active,
            source_name: Some(source.name.clone()),
            source_url: candidate.source_url.clone().or_else(|| Some(source.url.clone())),
            posted_at: candidate.posted_at.unwrap_or_else(Utc::now),
            title,
        }
    }
}
