// src/web/types.rs
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};

use std::collections::BTreeMap;

use crate::error::IngestError;
use crate::ingest::tracker::{RunKind, RunStatus};

// ===== Requests =====

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ScrapeLocalRequest {
    pub country: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ScrapeRemoteRequest {
    pub target_count: Option<usize>,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ScrapeCategoriesRequest {
    pub limit: Option<usize>,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct AutoPublishRequest {
    pub jobs_per_country: Option<usize>,
}

/// Either a job to announce or an address for a test mail
#[derive(Debug, Default, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct NotificationRequest {
    pub job_id: Option<String>,
    pub test_email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct MatchScoreRequest {
    pub profile_id: String,
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub status: String,
}

// ===== Responses =====

/// `{ "success": true, ...payload }`
#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct MatchScore {
    pub score: u8,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct StatusUpdate {
    pub id: String,
    pub status: String,
}

/// Badge state of every run kind
#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct RunsOverview {
    pub runs: BTreeMap<RunKind, RunStatus>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Error,
}

impl StandardErrorResponse {
    pub fn new(error: String, error_code: String, suggestions: Vec<String>) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
        }
    }
}

pub type ApiError = (Status, Json<StandardErrorResponse>);
pub type ApiResult<T> = Result<Json<SuccessResponse<T>>, ApiError>;

/// Bad input is the caller's fault; missing configuration is the server's
pub fn error_response(error: IngestError) -> ApiError {
    let status = match &error {
        IngestError::InvalidRequest(_) | IngestError::UnknownCountry(_) => Status::BadRequest,
        IngestError::NotFound(_) => Status::NotFound,
        IngestError::MissingApiKey(_) | IngestError::Database(_) | IngestError::Internal(_) => {
            Status::InternalServerError
        }
    };

    (
        status,
        Json(StandardErrorResponse::new(
            error.to_string(),
            error.error_code().to_string(),
            error.suggestions(),
        )),
    )
}
