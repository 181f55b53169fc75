use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Router};

use super::common::success_response;
use crate::handlers::AppState;

/// HR overview. Always 200; sections the ERP could not serve are listed
/// under `unavailable`.
async fn hr_dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    success_response(state.services.dashboard.summary().await)
}

pub fn dashboard_routes() -> Router<Arc<AppState>> {
    Router::new().route("/dashboard", get(hr_dashboard))
}
