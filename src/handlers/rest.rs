//! REST API for impression ingestion.
//!
//! Endpoints:
//! - `POST /api/v1/impressions` - record one impression
//! - `GET /api/v1/impressions` - list every indexed impression
//! - `GET /health` - liveness probe

use std::future::Future;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::error::ApiError;
use crate::model::{Impression, ImpressionRequest};
use crate::service::ImpressionService;

/// Collection route for impressions.
pub const IMPRESSIONS_PATH: &str = "/api/v1/impressions";
/// Liveness route.
pub const HEALTH_PATH: &str = "/health";
/// Body message returned after a successful record.
pub const RECORDED_MESSAGE: &str = "Impression recorded.";

/// Start the REST server on `addr`, stopping when `shutdown` resolves.
///
/// When the port is 0, the OS assigns an ephemeral port. The actual bound
/// address is always logged so it can be discovered.
pub async fn serve<F>(
    service: ImpressionService,
    addr: &str,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    info!(address = %local, "impressions REST API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("impressions REST API stopped");
    Ok(())
}

/// Build the axum router (separated for testing).
pub fn router(service: ImpressionService) -> Router {
    Router::new()
        .route(
            IMPRESSIONS_PATH,
            get(list_impressions).post(record_impression),
        )
        .route(HEALTH_PATH, get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

#[derive(Debug, Serialize)]
struct RecordedResponse {
    message: &'static str,
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn record_impression(
    State(service): State<ImpressionService>,
    payload: Result<Json<ImpressionRequest>, JsonRejection>,
) -> Result<Json<RecordedResponse>, ApiError> {
    let Json(request) = payload?;
    service.record(request).await?;
    Ok(Json(RecordedResponse {
        message: RECORDED_MESSAGE,
    }))
}

async fn list_impressions(
    State(service): State<ImpressionService>,
) -> Result<Json<Vec<Impression>>, ApiError> {
    let impressions = service.list_all().await?;
    Ok(Json(impressions))
}
