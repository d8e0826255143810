// src/ingest/mod.rs
//! Fetch → extract → resolve → write pipeline and the runs built on it

pub mod extractor;
pub mod fetcher;
pub mod orchestrator;
pub mod publisher;
pub mod resolver;
pub mod runs;
pub mod tracker;
pub mod writer;

pub use extractor::{Extractor, HeuristicExtractor, ModelExtractor};
pub use fetcher::{DirectFetcher, ScrapeApiFetcher, SourceFetcher};
pub use orchestrator::RunOrchestrator;
pub use publisher::Publisher;
pub use resolver::{CompanyResolver, ResolvedCompany};
pub use runs::AppContext;
pub use tracker::{RunKind, RunState, RunStatus, RunTracker};
pub use writer::{JobWriter, WriteOutcome};

/// A job board page visited during a run
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub name: String,
    pub url: String,
    /// Country code jobs from this page are filed under
    pub country: String,
    /// Location used when a listing does not state one
    pub default_location: String,
    pub remote: bool,
}

impl Source {
    pub fn local(name: &str, url: &str, country: &str, default_location: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            country: country.to_string(),
            default_location: default_location.to_string(),
            remote: false,
        }
    }

    pub fn remote(name: &str, url: &str, country: &str, default_location: &str) -> Self {
        Self {
            remote: true,
            ..Self::local(name, url, country, default_location)
        }
    }
}
