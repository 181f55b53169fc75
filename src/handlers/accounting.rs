use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde_json::Value;
use tracing::info;

use super::common::{created_response, success_response, validate_input};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    models::InvoiceKind,
    services::{
        accounting::{
            expense_claim_view, ExpenseClaimFilter, InvoiceFilter, NewExpenseClaim, NewInvoice,
        },
        company::CompanyUpdate,
    },
};

/// Receivables and payables summary. Clients and proxies may cache it for
/// `dashboard_cache_secs`.
async fn accounting_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let dashboard = state.services.accounting.dashboard().await?;
    let cache_control = format!("public, max-age={}", state.config.dashboard_cache_secs);
    Ok((
        [(header::CACHE_CONTROL, cache_control)],
        success_response(dashboard),
    ))
}

async fn list_invoices(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<InvoiceFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.accounting.list_invoices(&filter).await?,
    ))
}

async fn create_invoice(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<InvoiceFilter>,
    Json(payload): Json<NewInvoice>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let kind = filter.kind.unwrap_or(InvoiceKind::Sales);
    let invoice = state
        .services
        .accounting
        .create_invoice(kind, payload)
        .await?;

    info!("{} created: {}", kind.doctype(), invoice.id);
    Ok(created_response(invoice))
}

async fn list_expense_claims(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ExpenseClaimFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let claims = state
        .services
        .accounting
        .list_expense_claims(&filter)
        .await?;
    let views: Vec<Value> = claims.iter().map(expense_claim_view).collect();
    Ok(success_response(views))
}

async fn create_expense_claim(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewExpenseClaim>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let claim = state
        .services
        .accounting
        .create_expense_claim(payload)
        .await?;

    info!("Expense claim created: {}", claim.name);
    Ok(created_response(expense_claim_view(&claim)))
}

async fn get_company(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.company.get(&name).await?))
}

/// Updates a company, renaming it first when `company_name` changes.
async fn update_company(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(payload): Json<CompanyUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    let company = state.services.company.update(&name, payload).await?;
    Ok(success_response(company))
}

pub fn accounting_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/accounting/dashboard", get(accounting_dashboard))
        .route(
            "/accounting/invoices",
            get(list_invoices).post(create_invoice),
        )
        .route(
            "/accounting/expense-claims",
            get(list_expense_claims).post(create_expense_claim),
        )
        .route("/company/:name", get(get_company).put(update_company))
}
