// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use types::*;

use crate::ingest::runs::AppContext;
use crate::types::{LocalScrapeSummary, ModelScrapeSummary, NotificationSummary, PublishSummary, RunReport};
use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, get, options, patch, post, routes, Build, Request, Response, Rocket, State};
use tracing::info;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PATCH, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "authorization, x-client-info, apikey, content-type",
        ));
    }
}

// Ingestion runs

#[post("/scrape-sa-jobs", data = "<request>")]
pub async fn scrape_sa_jobs(
    request: Json<ScrapeLocalRequest>,
    ctx: &State<AppContext>,
) -> ApiResult<LocalScrapeSummary> {
    handlers::scrape_local_jobs_handler(request, ctx).await
}

#[post("/scrape-remote-jobs", data = "<request>")]
pub async fn scrape_remote_jobs(
    request: Json<ScrapeRemoteRequest>,
    ctx: &State<AppContext>,
) -> ApiResult<ModelScrapeSummary> {
    handlers::scrape_remote_jobs_handler(request, ctx).await
}

#[post("/scrape-remote-jobs-firecrawl", data = "<request>")]
pub async fn scrape_remote_jobs_firecrawl(
    request: Json<ScrapeCategoriesRequest>,
    ctx: &State<AppContext>,
) -> ApiResult<RunReport> {
    handlers::scrape_remote_categories_handler(request, ctx).await
}

#[post("/auto-publish-jobs", data = "<request>")]
pub async fn auto_publish_jobs(
    request: Json<AutoPublishRequest>,
    ctx: &State<AppContext>,
) -> ApiResult<PublishSummary> {
    handlers::auto_publish_jobs_handler(request, ctx).await
}

// Jobs and alerts

#[post("/send-job-notification", data = "<request>")]
pub async fn send_job_notification(
    request: Json<NotificationRequest>,
    ctx: &State<AppContext>,
) -> ApiResult<NotificationSummary> {
    handlers::send_job_notification_handler(request, ctx).await
}

#[post("/match-score", data = "<request>")]
pub async fn match_score(
    request: Json<MatchScoreRequest>,
    ctx: &State<AppContext>,
) -> ApiResult<MatchScore> {
    handlers::match_score_handler(request, ctx).await
}

#[patch("/jobs/<id>/status", data = "<request>")]
pub async fn update_job_status(
    id: &str,
    request: Json<StatusUpdateRequest>,
    ctx: &State<AppContext>,
) -> ApiResult<StatusUpdate> {
    handlers::update_job_status_handler(id, request, ctx).await
}

// System

#[get("/runs")]
pub async fn runs(ctx: &State<AppContext>) -> Json<SuccessResponse<RunsOverview>> {
    handlers::runs_handler(ctx).await
}

#[get("/health")]
pub async fn health(ctx: &State<AppContext>) -> Result<Json<&'static str>, Status> {
    handlers::health_handler(ctx).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Route not found".to_string(),
        "NOT_FOUND".to_string(),
        vec!["Check the endpoint path and method".to_string()],
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body does not match the expected shape".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Field names are camelCase, e.g. jobsPerCountry".to_string(),
        ],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
    ))
}

pub fn build_rocket(ctx: AppContext) -> Rocket<Build> {
    let figment = rocket::Config::figment().merge(("port", ctx.settings.port));

    rocket::custom(figment)
        .attach(Cors)
        .manage(ctx)
        .register(
            "/api",
            catchers![bad_request, not_found, unprocessable, internal_error],
        )
        .mount(
            "/api",
            routes![
                scrape_sa_jobs,
                scrape_remote_jobs,
                scrape_remote_jobs_firecrawl,
                auto_publish_jobs,
                send_job_notification,
                match_score,
                update_job_status,
                runs,
                health,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(ctx: AppContext) -> Result<()> {
    info!("Starting job ingestion API server on port {}", ctx.settings.port);
    info!("Database: {}", ctx.settings.database_path.display());
    info!(
        "Catalog: {} countries, {} remote boards, {} categories",
        ctx.catalog.countries.len(),
        ctx.catalog.remote_sources.len(),
        ctx.catalog.categories.len()
    );

    let _rocket = build_rocket(ctx).launch().await?;

    Ok(())
}
