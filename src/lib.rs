//! HRhub API Library
//!
//! HTTP front for the HR and accounting dashboard. Every record lives in a
//! Frappe/ERPNext backend; this crate validates requests, forwards them to
//! the ERP REST API and runs the few multi-step flows (appraisal cycle
//! initiation, PF report, bank account upsert, company rename).
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod erp;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod models;
pub mod services;
pub mod session;
pub mod tracing;

use std::sync::Arc;

use axum::Router;
use chrono::Utc;
use serde::Serialize;

use crate::{config::AppConfig, erp::ErpClient, handlers::AppServices};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub erp: ErpClient,
    pub services: AppServices,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, erp::ErpError> {
        let erp = ErpClient::new(&config.erp)?;
        let services = AppServices::new(&erp, &config);
        Ok(Self {
            config: Arc::new(config),
            erp,
            services,
        })
    }
}

// Common response wrappers
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}


/// Every `/api` route.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/auth", handlers::auth::auth_routes())
        .merge(handlers::dashboard::dashboard_routes())
        .merge(handlers::employees::employee_routes())
        .merge(handlers::leaves::leave_routes())
        .merge(handlers::payroll::payroll_routes())
        .merge(handlers::accounting::accounting_routes())
        .merge(handlers::recruitment::recruitment_routes())
        .merge(handlers::appraisals::appraisal_routes())
        .merge(handlers::assets::asset_routes())
}

/// Full application router with request ids and HTTP tracing.
///
/// CORS and compression are left to the binary.
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/health", handlers::health::health_routes())
        .nest("/api", api_routes())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
