use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

use super::common::{created_response, success_response, validate_input};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::payroll::{NewSalarySlip, SalarySlipFilter},
};

#[derive(Debug, Deserialize)]
pub struct PfReportQuery {
    #[serde(default)]
    pub payroll_entry: String,
}

async fn list_salary_slips(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<SalarySlipFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.payroll.list_slips(&filter).await?,
    ))
}

/// Creates a draft salary slip. A slip the ERP already holds for the same
/// employee and period is a 409.
async fn create_salary_slip(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewSalarySlip>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let slip = state.services.payroll.create_slip(payload).await?;

    info!("Salary slip created: {}", slip.name);
    Ok(created_response(slip))
}

async fn get_salary_slip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.payroll.get_slip(&id).await?))
}

async fn submit_salary_slip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let slip = state.services.payroll.submit_slip(&id).await?;

    info!("Salary slip submitted: {}", id);
    Ok(success_response(slip))
}

async fn payroll_entries(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.payroll.entries().await?))
}

async fn pf_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PfReportQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state.services.payroll.pf_report(&query.payroll_entry).await?;
    Ok(success_response(report))
}

pub fn payroll_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/salary-slip", get(list_salary_slips).post(create_salary_slip))
        .route("/salary-slip/:id", get(get_salary_slip))
        .route("/salary-slip/:id/submit", post(submit_salary_slip))
        .route("/payroll/entries", get(payroll_entries))
        .route("/payroll/pf-report", get(pf_report))
}
