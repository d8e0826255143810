// src/lib.rs
pub mod catalog;
pub mod core;
pub mod environment;
pub mod error;
pub mod ingest;
pub mod ingest_cli;
pub mod matching;
pub mod notify;
pub mod types;
pub mod utils;
pub mod web;

pub use crate::catalog::Catalog;
pub use crate::core::{Database, Settings};
pub use crate::error::{IngestError, IngestResult};
pub use crate::ingest::runs::AppContext;
pub use crate::ingest::tracker::{RunKind, RunTracker};
pub use crate::web::start_web_server;
