// src/ingest_cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::core::database::{JobRecord, JobRepository};
use crate::core::Settings;
use crate::ingest::runs::{
    AppContext, DEFAULT_HEURISTIC_LIMIT, DEFAULT_JOBS_PER_COUNTRY, DEFAULT_TARGET_COUNT,
};

#[derive(Parser)]
#[command(name = "ingest-cli")]
#[command(about = "Run job ingestion and export listings from the shell")]
pub struct IngestCli {
    #[command(subcommand)]
    pub command: IngestCommand,

    /// Overrides the database path from the environment
    #[arg(long)]
    pub database_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum IngestCommand {
    /// Scrape the local job boards of one country
    ScrapeLocal {
        #[arg(long, default_value = "ZA")]
        country: String,
    },
    /// Scrape remote boards through the language model
    ScrapeRemote {
        #[arg(long, default_value_t = DEFAULT_TARGET_COUNT)]
        target: usize,
        /// Board names from the catalog; all boards when omitted
        #[arg(long = "source")]
        sources: Vec<String>,
    },
    /// Scrape remote category pages with the heuristic parser
    ScrapeHeuristic {
        #[arg(long, default_value_t = DEFAULT_HEURISTIC_LIMIT)]
        limit: usize,
        #[arg(long = "category")]
        categories: Vec<String>,
    },
    /// Generate sample listings for every catalog country
    AutoPublish {
        #[arg(long, default_value_t = DEFAULT_JOBS_PER_COUNTRY)]
        per_country: usize,
    },
    /// Write all active jobs to a CSV file
    Export {
        #[arg(long)]
        out: PathBuf,
    },
    /// Create the database and apply the schema
    Init,
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: &'a str,
    title: &'a str,
    company_id: &'a str,
    country: &'a str,
    location: &'a str,
    is_remote: bool,
    employment_type: &'a str,
    experience_level: &'a str,
    salary_min: Option<i64>,
    salary_max: Option<i64>,
    salary_currency: &'a str,
    salary_period: &'a str,
    skills: String,
    source_name: &'a str,
    source_url: &'a str,
    posted_at: String,
}

impl<'a> From<&'a JobRecord> for ExportRow<'a> {
    fn from(job: &'a JobRecord) -> Self {
        Self {
            id: &job.id,
            title: &job.title,
            company_id: &job.company_id,
            country: &job.country,
            location: job.location.as_deref().unwrap_or(""),
            is_remote: job.is_remote,
            employment_type: &job.employment_type,
            experience_level: job.experience_level.as_deref().unwrap_or(""),
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            salary_currency: job.salary_currency.as_deref().unwrap_or(""),
            salary_period: job.salary_period.as_deref().unwrap_or(""),
            skills: job.skill_list().join("; "),
            source_name: job.source_name.as_deref().unwrap_or(""),
            source_url: job.source_url.as_deref().unwrap_or(""),
            posted_at: job.posted_at.to_rfc3339(),
        }
    }
}

pub async fn handle_ingest_command(cli: IngestCli) -> Result<()> {
    let mut settings = Settings::load()?;
    if let Some(path) = cli.database_path {
        settings.database_path = path;
    }
    let ctx = AppContext::from_settings(settings).await?;

    match cli.command {
        IngestCommand::ScrapeLocal { country } => match ctx.scrape_local_jobs(&country).await {
            Ok(summary) => {
                info!("✅ Local scrape finished for {}", summary.country);
                print_sources(&summary.report);
                info!("   Jobs created: {}", summary.jobs_created);
            }
            Err(e) => error!("❌ Local scrape failed: {}", e),
        },

        IngestCommand::ScrapeRemote { target, sources } => {
            match ctx.scrape_remote_jobs_with_model(target, &sources).await {
                Ok(summary) => {
                    info!("✅ Remote scrape finished (target {})", summary.target_count);
                    print_sources(&summary.report);
                    info!("   Jobs created: {}", summary.jobs_created);
                }
                Err(e) => error!("❌ Remote scrape failed: {}", e),
            }
        }

        IngestCommand::ScrapeHeuristic { limit, categories } => {
            match ctx.scrape_remote_jobs_heuristic(limit, &categories).await {
                Ok(report) => {
                    info!("✅ Category scrape finished");
                    print_sources(&report);
                    info!(
                        "   Jobs created: {} ({} duplicates, {} new companies)",
                        report.jobs_created, report.duplicates, report.companies_created
                    );
                }
                Err(e) => error!("❌ Category scrape failed: {}", e),
            }
        }

        IngestCommand::AutoPublish { per_country } => {
            match ctx.auto_publish_jobs(per_country).await {
                Ok(summary) => {
                    info!("✅ Auto-publish finished");
                    for (country, created) in &summary.jobs_created {
                        info!("   {:<4} {}", country, created);
                    }
                    info!("   Active jobs: {}", summary.total_active_jobs);
                }
                Err(e) => error!("❌ Auto-publish failed: {}", e),
            }
        }

        IngestCommand::Export { out } => {
            let jobs = JobRepository::new(ctx.db.pool()).list_active().await?;
            let written = export_jobs(&jobs, &out)?;
            info!("✅ Exported {} active jobs to {}", written, out.display());
        }

        IngestCommand::Init => {
            info!(
                "✅ Database initialized at: {}",
                ctx.settings.database_path.display()
            );
            info!("   Tables: companies, jobs, profiles");
            info!("   Catalog countries: {}", ctx.catalog.country_codes().join(", "));
        }
    }

    Ok(())
}

fn print_sources(report: &crate::types::RunReport) {
    for source in &report.sources {
        match &source.error {
            Some(e) => info!("   ⚠️  {:<28} {}", source.name, e),
            None => info!(
                "   {:<28} found {:>3}, created {:>3}",
                source.name, source.jobs_found, source.jobs_created
            ),
        }
    }
}

/// Returns the number of rows written
pub fn export_jobs(jobs: &[JobRecord], out: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(out)
        .with_context(|| format!("Failed to create {}", out.display()))?;

    for job in jobs {
        writer
            .serialize(ExportRow::from(job))
            .with_context(|| format!("Failed to write job {}", job.id))?;
    }
    writer.flush().context("Failed to flush CSV export")?;

    Ok(jobs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::core::config_manager::test_settings;
    use crate::core::Database;

    #[test]
    fn test_cli_parses_repeated_sources() {
        let cli = IngestCli::parse_from([
            "ingest-cli",
            "scrape-remote",
            "--target",
            "7",
            "--source",
            "We Work Remotely",
            "--source",
            "Remotive",
        ]);

        match cli.command {
            IngestCommand::ScrapeRemote { target, sources } => {
                assert_eq!(target, 7);
                assert_eq!(sources, vec!["We Work Remotely", "Remotive"]);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_cli_defaults() {
        let cli = IngestCli::parse_from(["ingest-cli", "auto-publish"]);
        assert!(matches!(
            cli.command,
            IngestCommand::AutoPublish { per_country } if per_country == DEFAULT_JOBS_PER_COUNTRY
        ));
        assert!(cli.database_path.is_none());
    }

    #[tokio::test]
    async fn test_export_writes_header_and_rows() {
        let ctx = AppContext::new(
            Database::in_memory().await.unwrap(),
            test_settings(),
            Catalog::builtin().unwrap(),
        );
        ctx.auto_publish_jobs(1).await.unwrap();
        let jobs = JobRepository::new(ctx.db.pool()).list_active().await.unwrap();

        let out = std::env::temp_dir().join(format!("export-{}.csv", uuid::Uuid::new_v4()));
        let written = export_jobs(&jobs, &out).unwrap();
        assert_eq!(written, jobs.len());

        let mut reader = csv::Reader::from_path(&out).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some("id"));
        assert_eq!(headers.get(1), Some("title"));
        assert_eq!(reader.records().count(), jobs.len());

        std::fs::remove_file(out).ok();
    }
}
