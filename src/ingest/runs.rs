// src/ingest/runs.rs
//! The admin-triggered runs, wiring settings and catalog into the pipeline

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use super::extractor::{HeuristicExtractor, ModelExtractor};
use super::fetcher::{DirectFetcher, ScrapeApiFetcher, SourceFetcher};
use super::orchestrator::RunOrchestrator;
use super::publisher::Publisher;
use super::tracker::{RunKind, RunTracker};
use super::Source;
use crate::catalog::Catalog;
use crate::core::{ChatCompletionClient, Database, Settings};
use crate::error::{IngestError, IngestResult};
use crate::notify::{NotificationService, ResendMailer};
use crate::types::{
    LocalScrapeSummary, ModelScrapeSummary, NotificationSummary, PublishSummary, RunReport,
};

pub const DEFAULT_TARGET_COUNT: usize = 20;
pub const DEFAULT_HEURISTIC_LIMIT: usize = 30;
pub const DEFAULT_JOBS_PER_COUNTRY: usize = 3;

const MAX_TARGET_COUNT: usize = 200;
const MAX_JOBS_PER_COUNTRY: usize = 50;

/// Everything a run needs; shared by the web server and the CLI
pub struct AppContext {
    pub db: Database,
    pub settings: Settings,
    pub catalog: Catalog,
    pub tracker: RunTracker,
}

impl AppContext {
    pub fn new(db: Database, settings: Settings, catalog: Catalog) -> Self {
        Self {
            db,
            settings,
            catalog,
            tracker: RunTracker::new(),
        }
    }

    /// Open the database and load the catalog named by the settings
    pub async fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let catalog = match &settings.catalog_path {
            Some(path) => Catalog::load(path).await?,
            None => Catalog::builtin()?,
        };
        let db = Database::new(&settings.database_path).await?;
        Ok(Self::new(db, settings, catalog))
    }

    /// Scrape the local job boards of one catalog country
    pub async fn scrape_local_jobs(&self, country: &str) -> IngestResult<LocalScrapeSummary> {
        self.tracker.start(RunKind::LocalScrape);
        let result = self.run_local_scrape(country).await;
        self.finish(RunKind::LocalScrape, &result, |s| s.jobs_created);
        result
    }

    /// Remote boards read by the language model, up to `target_count` new jobs
    pub async fn scrape_remote_jobs_with_model(
        &self,
        target_count: usize,
        sources: &[String],
    ) -> IngestResult<ModelScrapeSummary> {
        self.tracker.start(RunKind::RemoteModelScrape);
        let result = self.run_model_scrape(target_count, sources).await;
        self.finish(RunKind::RemoteModelScrape, &result, |s| s.jobs_created);
        result
    }

    /// Remote category pages parsed heuristically, up to `limit` new jobs
    pub async fn scrape_remote_jobs_heuristic(
        &self,
        limit: usize,
        categories: &[String],
    ) -> IngestResult<RunReport> {
        self.tracker.start(RunKind::RemoteHeuristicScrape);
        let result = self.run_heuristic_scrape(limit, categories).await;
        self.finish(RunKind::RemoteHeuristicScrape, &result, |r| r.jobs_created);
        result
    }

    pub async fn auto_publish_jobs(&self, jobs_per_country: usize) -> IngestResult<PublishSummary> {
        self.tracker.start(RunKind::AutoPublish);
        let per_country = jobs_per_country.min(MAX_JOBS_PER_COUNTRY);
        let mut publisher = Publisher::new(self.db.pool(), &self.catalog, StdRng::from_entropy());
        let result = publisher.publish(per_country).await.map_err(IngestError::from);
        self.finish(RunKind::AutoPublish, &result, PublishSummary::total_created);
        result
    }

    /// Alert every opted-in profile that matches the job
    pub async fn send_job_notification(&self, job_id: &str) -> IngestResult<NotificationSummary> {
        self.tracker.start(RunKind::Notification);
        let result = self.run_job_notification(job_id).await;
        self.finish(RunKind::Notification, &result, |s| s.notified);
        result
    }

    pub async fn send_test_notification(&self, email: &str) -> IngestResult<NotificationSummary> {
        self.tracker.start(RunKind::Notification);
        let result = self.run_test_notification(email).await;
        self.finish(RunKind::Notification, &result, |s| s.notified);
        result
    }

    async fn run_local_scrape(&self, country: &str) -> IngestResult<LocalScrapeSummary> {
        let profile = self
            .catalog
            .country(country)
            .ok_or_else(|| IngestError::UnknownCountry(country.trim().to_string()))?;

        let fetcher: Box<dyn SourceFetcher> = match &self.settings.scrape_api {
            Some(api) => Box::new(ScrapeApiFetcher::new(api, self.settings.fetch_timeout)?),
            None => {
                info!("No scrape API configured; fetching {} boards directly", profile.code);
                Box::new(DirectFetcher::new(self.settings.fetch_timeout)?)
            }
        };
        let extractor = HeuristicExtractor::new(&self.catalog.skill_keywords)?;

        let sources: Vec<Source> = profile
            .local_sources
            .iter()
            .map(|s| Source::local(&s.name, &s.url, &profile.code, &profile.name))
            .collect();

        let report = self
            .orchestrator(fetcher.as_ref(), &extractor)
            .run(&sources, Some(self.settings.local_run_cap))
            .await;

        Ok(LocalScrapeSummary {
            country: profile.code.clone(),
            jobs_created: report.jobs_created,
            report,
        })
    }

    async fn run_model_scrape(
        &self,
        target_count: usize,
        sources: &[String],
    ) -> IngestResult<ModelScrapeSummary> {
        let api = self.settings.require_scrape_api()?;
        let llm = self.settings.require_llm()?;
        let target_count = target_count.min(MAX_TARGET_COUNT);
        let sources = self.remote_sources(sources)?;

        let fetcher = ScrapeApiFetcher::new(api, self.settings.fetch_timeout)?;
        let model = ChatCompletionClient::new(llm, self.settings.fetch_timeout)?;
        let extractor = ModelExtractor::new(Box::new(model), self.settings.model_content_budget)?;

        let report = self
            .orchestrator(&fetcher, &extractor)
            .run(&sources, Some(target_count))
            .await;

        Ok(ModelScrapeSummary {
            target_count,
            jobs_created: report.jobs_created,
            report,
        })
    }

    async fn run_heuristic_scrape(&self, limit: usize, categories: &[String]) -> IngestResult<RunReport> {
        let api = self.settings.require_scrape_api()?;
        let limit = limit.min(MAX_TARGET_COUNT);
        let sources = self.category_sources(categories)?;

        let fetcher = ScrapeApiFetcher::new(api, self.settings.fetch_timeout)?;
        let extractor = HeuristicExtractor::new(&self.catalog.skill_keywords)?;

        Ok(self
            .orchestrator(&fetcher, &extractor)
            .run(&sources, Some(limit))
            .await)
    }

    async fn run_job_notification(&self, job_id: &str) -> IngestResult<NotificationSummary> {
        let mail = self.settings.require_mail()?;
        let mailer = ResendMailer::new(mail, self.settings.fetch_timeout)?;
        NotificationService::new(self.db.pool(), &mailer, &self.settings)
            .notify_job(job_id)
            .await
    }

    async fn run_test_notification(&self, email: &str) -> IngestResult<NotificationSummary> {
        let mail = self.settings.require_mail()?;
        let mailer = ResendMailer::new(mail, self.settings.fetch_timeout)?;
        NotificationService::new(self.db.pool(), &mailer, &self.settings)
            .send_test(email)
            .await
    }

    fn orchestrator<'a>(
        &'a self,
        fetcher: &'a dyn SourceFetcher,
        extractor: &'a dyn super::Extractor,
    ) -> RunOrchestrator<'a> {
        RunOrchestrator::new(
            self.db.pool(),
            fetcher,
            extractor,
            &self.catalog.default_benefits,
            self.settings.source_delay,
        )
    }

    /// Catalog boards by name, or ad-hoc URLs; every remote board when none are named
    fn remote_sources(&self, requested: &[String]) -> IngestResult<Vec<Source>> {
        let remote = |name: &str, url: &str| {
            Source::remote(name, url, &self.catalog.home_country, &self.catalog.remote_location)
        };

        if requested.is_empty() {
            return Ok(self
                .catalog
                .remote_sources
                .iter()
                .map(|s| remote(&s.name, &s.url))
                .collect());
        }

        requested
            .iter()
            .map(|entry| {
                let entry = entry.trim();
                if let Some(known) = self.catalog.remote_source(entry) {
                    Ok(remote(&known.name, &known.url))
                } else if entry.starts_with("http://") || entry.starts_with("https://") {
                    Ok(remote(entry, entry))
                } else {
                    Err(IngestError::InvalidRequest(format!("Unknown source: {}", entry)))
                }
            })
            .collect()
    }

    fn category_sources(&self, requested: &[String]) -> IngestResult<Vec<Source>> {
        let categories = if requested.is_empty() {
            self.catalog.categories.iter().collect::<Vec<_>>()
        } else {
            requested
                .iter()
                .map(|key| {
                    self.catalog
                        .category(key)
                        .ok_or_else(|| IngestError::InvalidRequest(format!("Unknown category: {}", key)))
                })
                .collect::<IngestResult<Vec<_>>>()?
        };

        Ok(categories
            .into_iter()
            .map(|c| {
                Source::remote(
                    &c.name,
                    &c.url,
                    &self.catalog.home_country,
                    &self.catalog.remote_location,
                )
            })
            .collect())
    }

    fn finish<T>(&self, kind: RunKind, result: &IngestResult<T>, created: impl Fn(&T) -> usize) {
        match result {
            Ok(summary) => {
                let count = created(summary);
                self.tracker.succeed(kind, count, format!("{} created", count));
            }
            Err(e) => self.tracker.fail(kind, e.to_string()),
        }
    }
}
