use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::info;

use super::common::{created_response, success_response, validate_input};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::assets::{AssetFilter, MovementFilter, NewAssetMovement},
};

async fn list_assets(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AssetFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.assets.list(&filter).await?))
}

async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.assets.get(&id).await?))
}

async fn list_movements(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<MovementFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.assets.movements(&filter).await?,
    ))
}

async fn create_movement(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewAssetMovement>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let movement = state.services.assets.create_movement(payload).await?;

    info!("Asset movement submitted: {}", movement.name);
    Ok(created_response(movement))
}

pub fn asset_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/assets", get(list_assets))
        .route("/assets/movements", get(list_movements).post(create_movement))
        .route("/assets/:id", get(get_asset))
}
