use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use tracing::info;

use super::common::{created_response, success_response, validate_input};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::recruitment::{ApplicantStatus, NewJobApplicant, NewJobOpening},
};

#[derive(Debug, Deserialize)]
pub struct ApplicantStatusRequest {
    #[serde(default)]
    pub status: String,
}

async fn recruitment_overview(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.recruitment.overview().await?,
    ))
}

async fn create_opening(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewJobOpening>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let opening = state.services.recruitment.create_opening(payload).await?;

    info!("Job opening created: {}", opening.name);
    Ok(created_response(opening))
}

async fn create_applicant(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewJobApplicant>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let applicant = state.services.recruitment.create_applicant(payload).await?;

    info!("Job applicant created: {}", applicant.name);
    Ok(created_response(applicant))
}

async fn update_applicant_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<ApplicantStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let status = ApplicantStatus::parse(&payload.status)?;
    let applicant = state
        .services
        .recruitment
        .update_applicant_status(&id, status)
        .await?;
    Ok(success_response(applicant))
}

pub fn recruitment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recruitment", get(recruitment_overview))
        .route("/recruitment/openings", post(create_opening))
        .route("/recruitment/applicants", post(create_applicant))
        .route(
            "/recruitment/applicants/:id/status",
            put(update_applicant_status),
        )
}
