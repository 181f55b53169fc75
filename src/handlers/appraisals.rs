use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tracing::info;

use super::common::{created_response, success_response, validate_input};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::appraisals::{AppraisalFilter, NewAppraisalCycle},
};

async fn list_cycles(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.appraisals.cycles().await?))
}

async fn create_cycle(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewAppraisalCycle>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let cycle = state.services.appraisals.create_cycle(payload).await?;

    info!("Appraisal cycle created: {}", cycle.name);
    Ok(created_response(cycle))
}

/// Runs the initiation flow for a cycle. Safe to repeat.
async fn initiate_cycle(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state.services.appraisals.initiate(&name).await?;
    Ok(success_response(outcome))
}

async fn list_appraisals(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AppraisalFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.appraisals.appraisals(&filter).await?,
    ))
}

pub fn appraisal_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/appraisals", get(list_appraisals))
        .route("/appraisals/cycles", get(list_cycles).post(create_cycle))
        .route("/appraisals/cycles/:name/initiate", post(initiate_cycle))
}
