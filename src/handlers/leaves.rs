use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, put},
    Router,
};
use serde::Deserialize;
use tracing::info;

use super::common::{created_response, no_content_response, success_response, validate_input};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::leaves::{LeaveBalanceQuery, LeaveDecision, LeaveFilter, NewLeaveApplication},
};

#[derive(Debug, Deserialize)]
pub struct LeaveStatusRequest {
    #[serde(default)]
    pub status: String,
}

async fn list_leaves(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<LeaveFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.leaves.list(&filter).await?))
}

async fn create_leave(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewLeaveApplication>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let leave = state.services.leaves.create(payload).await?;

    info!("Leave application created: {}", leave.name);
    Ok(created_response(leave))
}

async fn update_leave_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<LeaveStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let decision = LeaveDecision::parse(&payload.status)?;
    let leave = state.services.leaves.decide(&id, decision).await?;
    Ok(success_response(leave))
}

async fn delete_leave(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.leaves.delete(&id).await?;

    info!("Leave application deleted: {}", id);
    Ok(no_content_response())
}

async fn leave_types(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.leaves.types().await?))
}

async fn leave_balance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaveBalanceQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.leaves.balance(&query).await?))
}

pub fn leave_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/leaves", get(list_leaves).post(create_leave))
        .route("/leaves/types", get(leave_types))
        .route("/leaves/balance", get(leave_balance))
        .route("/leaves/:id", delete(delete_leave))
        .route("/leaves/:id/status", put(update_leave_status))
}
