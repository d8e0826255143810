// src/web/handlers/system_handlers.rs
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::error;

use crate::ingest::runs::AppContext;
use crate::web::types::{RunsOverview, SuccessResponse};

pub async fn health_handler(ctx: &State<AppContext>) -> Result<Json<&'static str>, Status> {
    match ctx.db.health_check().await {
        Ok(()) => Ok(Json("OK")),
        Err(e) => {
            error!("Health check failed: {:#}", e);
            Err(Status::ServiceUnavailable)
        }
    }
}

pub async fn runs_handler(ctx: &State<AppContext>) -> Json<SuccessResponse<RunsOverview>> {
    SuccessResponse::new(RunsOverview {
        runs: ctx.tracker.snapshot(),
    })
}
