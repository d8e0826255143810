// src/ingest/orchestrator.rs
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{info, warn};

use super::extractor::Extractor;
use super::fetcher::SourceFetcher;
use super::resolver::{CompanyDetails, CompanyResolver};
use super::writer::{JobWriter, WriteOutcome};
use super::Source;
use crate::types::{RunReport, SourceReport};

/// Visits sources one after another: fetch, extract, resolve, write
pub struct RunOrchestrator<'a> {
    fetcher: &'a dyn SourceFetcher,
    extractor: &'a dyn Extractor,
    resolver: CompanyResolver<'a>,
    writer: JobWriter<'a>,
    delay: Duration,
}

impl<'a> RunOrchestrator<'a> {
    pub fn new(
        pool: &'a SqlitePool,
        fetcher: &'a dyn SourceFetcher,
        extractor: &'a dyn Extractor,
        benefits: &[String],
        delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            resolver: CompanyResolver::new(pool),
            writer: JobWriter::new(pool, benefits),
            delay,
        }
    }

    /// Process `sources` in order, stopping once `target` jobs were created.
    /// Source failures are recorded in the report and never abort the run.
    pub async fn run(&self, sources: &[Source], target: Option<usize>) -> RunReport {
        let mut report = RunReport::default();
        let reached = |report: &RunReport| target.is_some_and(|t| report.jobs_created >= t);

        for (index, source) in sources.iter().enumerate() {
            if reached(&report) {
                break;
            }

            let mut source_report = SourceReport {
                name: source.name.clone(),
                url: source.url.clone(),
                ..Default::default()
            };

            match self.process_source(source, target, &mut report, &mut source_report).await {
                Ok(()) => info!(
                    "Source {}: {} found, {} created",
                    source.name, source_report.jobs_found, source_report.jobs_created
                ),
                Err(e) => {
                    warn!("Source {} failed: {:#}", source.name, e);
                    source_report.error = Some(e.to_string());
                }
            }
            report.sources.push(source_report);

            let is_last = index + 1 == sources.len();
            if !is_last && !reached(&report) && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(
            "Run finished: {} found, {} created, {} duplicates, {} companies created, {} failed sources",
            report.jobs_found,
            report.jobs_created,
            report.duplicates,
            report.companies_created,
            report.failed_sources()
        );
        report
    }

    async fn process_source(
        &self,
        source: &Source,
        target: Option<usize>,
        report: &mut RunReport,
        source_report: &mut SourceReport,
    ) -> anyhow::Result<()> {
        let content = self.fetcher.fetch(&source.url).await?;
        let candidates = self.extractor.extract(&content, source).await?;

        source_report.jobs_found = candidates.len();
        report.jobs_found += candidates.len();

        for candidate in candidates.iter().filter(|c| c.is_complete()) {
            if target.is_some_and(|t| report.jobs_created >= t) {
                break;
            }

            let details = CompanyDetails {
                industry: None,
                location: candidate.location.as_deref(),
                country: Some(source.country.as_str()),
            };
            let company = match self
                .resolver
                .resolve(&candidate.company, candidate.company_website.as_deref(), details)
                .await
            {
                Ok(company) => company,
                Err(e) => {
                    warn!("Skipping '{}': company '{}' unresolved: {:#}", candidate.title, candidate.company, e);
                    continue;
                }
            };
            if company.created {
                report.companies_created += 1;
            }

            match self.writer.write(candidate, &company.id, source).await {
                WriteOutcome::Created(_) => {
                    report.jobs_created += 1;
                    source_report.jobs_created += 1;
                }
                WriteOutcome::Duplicate => report.duplicates += 1,
                WriteOutcome::Failed(_) => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::database::JobRepository;
    use crate::core::Database;
    use crate::types::CandidateJob;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Serves canned pages; unknown URLs fail
    struct FakeFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl SourceFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("HTTP error 503 for {}", url))
        }
    }

    /// One candidate per `title|company` line
    struct LineExtractor;

    #[async_trait]
    impl Extractor for LineExtractor {
        async fn extract(&self, content: &str, _source: &Source) -> Result<Vec<CandidateJob>> {
            Ok(content
                .lines()
                .filter_map(|line| line.split_once('|'))
                .map(|(title, company)| CandidateJob::new(title, company))
                .collect())
        }
    }

    fn source(name: &str) -> Source {
        Source::remote(name, &format!("https://{}.example/jobs", name), "ZA", "Remote - Worldwide")
    }

    fn fetcher(pages: &[(&str, &str)]) -> FakeFetcher {
        FakeFetcher {
            pages: pages
                .iter()
                .map(|(name, body)| (source(name).url, body.to_string()))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_failing_source_does_not_stop_the_next() {
        let db = Database::in_memory().await.unwrap();
        let fetcher = fetcher(&[("b", "Rust Engineer|Acme\nData Analyst|Globex")]);
        let orchestrator = RunOrchestrator::new(db.pool(), &fetcher, &LineExtractor, &[], Duration::ZERO);

        let report = orchestrator.run(&[source("a"), source("b")], None).await;

        assert_eq!(report.jobs_created, 2);
        assert_eq!(report.companies_created, 2);
        assert_eq!(report.sources.len(), 2);
        assert!(report.sources[0].error.is_some());
        assert_eq!(report.sources[0].jobs_created, 0);
        assert_eq!(report.sources[1].jobs_created, 2);
        assert_eq!(report.failed_sources(), 1);
    }

    #[tokio::test]
    async fn test_target_is_a_ceiling() {
        let db = Database::in_memory().await.unwrap();
        let fetcher = fetcher(&[
            ("a", "Rust Engineer|Acme\nData Analyst|Acme\nQA Tester|Acme"),
            ("b", "Product Designer|Globex"),
        ]);
        let orchestrator = RunOrchestrator::new(db.pool(), &fetcher, &LineExtractor, &[], Duration::ZERO);

        let report = orchestrator.run(&[source("a"), source("b")], Some(2)).await;

        assert_eq!(report.jobs_created, 2);
        assert_eq!(report.sources.len(), 1);
        assert_eq!(JobRepository::new(db.pool()).count_active().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicates_are_not_counted_as_created() {
        let db = Database::in_memory().await.unwrap();
        let fetcher = fetcher(&[
            ("a", "Rust Engineer|Acme"),
            ("b", "Rust Engineer|Acme\nRust Engineer|ACME\n|Nameless"),
        ]);
        let orchestrator = RunOrchestrator::new(db.pool(), &fetcher, &LineExtractor, &[], Duration::ZERO);

        let report = orchestrator.run(&[source("a"), source("b")], None).await;

        assert_eq!(report.jobs_found, 4);
        assert_eq!(report.jobs_created, 1);
        assert_eq!(report.duplicates, 2);
        assert_eq!(report.companies_created, 1);
        assert_eq!(JobRepository::new(db.pool()).count_active().await.unwrap(), 1);
    }
}
