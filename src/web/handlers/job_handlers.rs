// src/web/handlers/job_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

use crate::core::database::{JobRepository, ProfileRepository};
use crate::error::IngestError;
use crate::ingest::runs::AppContext;
use crate::matching;
use crate::types::{JobStatus, NotificationSummary};
use crate::web::types::{
    error_response, ApiResult, MatchScore, MatchScoreRequest, NotificationRequest,
    StatusUpdate, StatusUpdateRequest, SuccessResponse,
};

pub async fn send_job_notification_handler(
    request: Json<NotificationRequest>,
    ctx: &State<AppContext>,
) -> ApiResult<NotificationSummary> {
    let result = match (&request.test_email, &request.job_id) {
        (Some(email), _) => ctx.send_test_notification(email).await,
        (None, Some(job_id)) => ctx.send_job_notification(job_id).await,
        (None, None) => Err(IngestError::InvalidRequest(
            "Provide either jobId or testEmail".to_string(),
        )),
    };

    result.map(SuccessResponse::new).map_err(error_response)
}

pub async fn match_score_handler(
    request: Json<MatchScoreRequest>,
    ctx: &State<AppContext>,
) -> ApiResult<MatchScore> {
    let pool = ctx.db.pool();

    let profile = ProfileRepository::new(pool)
        .find_by_id(&request.profile_id)
        .await
        .map_err(|e| error_response(e.into()))?
        .ok_or_else(|| error_response(IngestError::NotFound(format!("Profile {}", request.profile_id))))?;

    let job = JobRepository::new(pool)
        .find_by_id(&request.job_id)
        .await
        .map_err(|e| error_response(e.into()))?
        .ok_or_else(|| error_response(IngestError::NotFound(format!("Job {}", request.job_id))))?;

    let score = matching::score(&profile, &job);
    Ok(SuccessResponse::new(MatchScore {
        score,
        label: matching::label(score),
    }))
}

pub async fn update_job_status_handler(
    id: &str,
    request: Json<StatusUpdateRequest>,
    ctx: &State<AppContext>,
) -> ApiResult<StatusUpdate> {
    let status: JobStatus = request
        .status
        .parse()
        .map_err(|_| error_response(IngestError::InvalidRequest(format!("Unknown status: {}", request.status))))?;

    let updated = JobRepository::new(ctx.db.pool())
        .set_status(id, status)
        .await
        .map_err(|e| error_response(e.into()))?;

    if !updated {
        return Err(error_response(IngestError::NotFound(format!("Job {}", id))));
    }

    info!("Admin set job {} to {}", id, status);
    Ok(SuccessResponse::new(StatusUpdate {
        id: id.to_string(),
        status: status.to_string(),
    }))
}
