use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use super::common::{message_response, success_response, validate_input};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::auth::{ChangePasswordRequest, LoginRequest},
    session::{self, SessionUser},
};

/// Signs the user in and sets the session cookies.
///
/// Rejected credentials return 401 before any cookie is touched.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let user = state
        .services
        .auth
        .login(&payload.email, &payload.password)
        .await?;
    let jar = user.store(jar, &state.config.session);

    Ok((jar, success_response(user)))
}

async fn logout(jar: CookieJar) -> impl IntoResponse {
    (session::clear(jar), message_response("Logged out"))
}

async fn me(user: SessionUser) -> impl IntoResponse {
    success_response(user)
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    state
        .services
        .auth
        .change_password(&user, &payload)
        .await?;

    info!(user = %user.user_id, "Password changed");
    Ok(message_response("Password updated"))
}

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/change-password", post(change_password))
}
