// src/web/handlers/ingest_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

use crate::ingest::runs::{
    AppContext, DEFAULT_HEURISTIC_LIMIT, DEFAULT_JOBS_PER_COUNTRY, DEFAULT_TARGET_COUNT,
};
use crate::types::{LocalScrapeSummary, ModelScrapeSummary, PublishSummary, RunReport};
use crate::web::types::{
    error_response, ApiResult, AutoPublishRequest, ScrapeCategoriesRequest, ScrapeLocalRequest,
    ScrapeRemoteRequest, SuccessResponse,
};

pub async fn scrape_local_jobs_handler(
    request: Json<ScrapeLocalRequest>,
    ctx: &State<AppContext>,
) -> ApiResult<LocalScrapeSummary> {
    info!("Local scrape requested for {}", request.country);

    ctx.scrape_local_jobs(&request.country)
        .await
        .map(SuccessResponse::new)
        .map_err(error_response)
}

pub async fn scrape_remote_jobs_handler(
    request: Json<ScrapeRemoteRequest>,
    ctx: &State<AppContext>,
) -> ApiResult<ModelScrapeSummary> {
    let target_count = request.target_count.unwrap_or(DEFAULT_TARGET_COUNT);
    info!(
        "Model-assisted remote scrape requested: target {}, {} named sources",
        target_count,
        request.sources.len()
    );

    ctx.scrape_remote_jobs_with_model(target_count, &request.sources)
        .await
        .map(SuccessResponse::new)
        .map_err(error_response)
}

pub async fn scrape_remote_categories_handler(
    request: Json<ScrapeCategoriesRequest>,
    ctx: &State<AppContext>,
) -> ApiResult<RunReport> {
    let limit = request.limit.unwrap_or(DEFAULT_HEURISTIC_LIMIT);
    info!(
        "Heuristic remote scrape requested: limit {}, categories {:?}",
        limit, request.categories
    );

    ctx.scrape_remote_jobs_heuristic(limit, &request.categories)
        .await
        .map(SuccessResponse::new)
        .map_err(error_response)
}

pub async fn auto_publish_jobs_handler(
    request: Json<AutoPublishRequest>,
    ctx: &State<AppContext>,
) -> ApiResult<PublishSummary> {
    let per_country = request.jobs_per_country.unwrap_or(DEFAULT_JOBS_PER_COUNTRY);
    info!("Auto-publish requested: {} jobs per country", per_country);

    ctx.auto_publish_jobs(per_country)
        .await
        .map(SuccessResponse::new)
        .map_err(error_response)
}
