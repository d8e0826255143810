// src/core/mod.rs
//! Shared services: settings, storage and outbound HTTP

pub mod completion_client;
pub mod config_manager;
pub mod database;
pub mod service_client;

pub use completion_client::{ChatCompletionClient, LanguageModel};
pub use config_manager::Settings;
pub use database::Database;
pub use service_client::ServiceClient;
