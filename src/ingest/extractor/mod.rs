// src/ingest/extractor/mod.rs
use anyhow::Result;
use async_trait::async_trait;

pub mod heuristic;
pub mod model;

pub use heuristic::HeuristicExtractor;
pub use model::ModelExtractor;

use super::Source;
use crate::types::CandidateJob;

/// Turns raw page content into candidate jobs.
/// Implementations only guarantee that returned candidates have a title and a company.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, content: &str, source: &Source) -> Result<Vec<CandidateJob>>;
}
