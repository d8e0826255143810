// src/types/response.rs
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of one source within a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub name: String,
    pub url: String,
    pub jobs_found: usize,
    pub jobs_created: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Transient result of an orchestrated run; never persisted
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub jobs_found: usize,
    pub jobs_created: usize,
    pub companies_created: usize,
    pub duplicates: usize,
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.error.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalScrapeSummary {
    pub country: String,
    pub jobs_created: usize,
    #[serde(skip)]
    pub report: RunReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelScrapeSummary {
    pub target_count: usize,
    pub jobs_created: usize,
    #[serde(skip)]
    pub report: RunReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishSummary {
    pub jobs_created: BTreeMap<String, usize>,
    pub total_active_jobs: i64,
}

impl PublishSummary {
    pub fn total_created(&self) -> usize {
        self.jobs_created.values().sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotificationSummary {
    pub notified: usize,
    pub total: usize,
}
