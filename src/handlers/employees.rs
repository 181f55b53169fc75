use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::info;

use super::common::{created_response, no_content_response, success_response, validate_input};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::{
        bank_accounts::BankAccountInput,
        employees::{EmployeeFilter, EmployeeUpdate, NewEmployee},
    },
};

async fn list_employees(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<EmployeeFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let employees = state.services.employees.list(&filter).await?;
    Ok(success_response(employees))
}

async fn create_employee(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewEmployee>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let employee = state.services.employees.create(payload).await?;

    info!("Employee created: {}", employee.name);
    Ok(created_response(employee))
}

async fn get_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let employee = state.services.employees.get(&id).await?;
    Ok(success_response(employee))
}

async fn update_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<EmployeeUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    let employee = state.services.employees.update(&id, payload).await?;

    info!("Employee updated: {}", id);
    Ok(success_response(employee))
}

async fn delete_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.employees.delete(&id).await?;
    Ok(no_content_response())
}

async fn get_bank_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let account = state.services.bank_accounts.get(&id).await?;
    Ok(success_response(account))
}

/// Creates or updates the employee's bank account; 201 when it was created.
async fn upsert_bank_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<BankAccountInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let outcome = state.services.bank_accounts.upsert(&id, &payload).await?;
    Ok(if outcome.created {
        created_response(outcome)
    } else {
        success_response(outcome)
    })
}

async fn list_designations(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.employees.designations().await?,
    ))
}

async fn list_departments(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.employees.departments().await?))
}

pub fn employee_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route(
            "/employees/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .route(
            "/employees/:id/bank-account",
            get(get_bank_account).put(upsert_bank_account),
        )
        .route("/designations", get(list_designations))
        .route("/departments", get(list_departments))
}
