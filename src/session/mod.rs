//! Cookie-backed session.
//!
//! Login stores three plain cookies (`user_id`, `user_role`, `full_name`);
//! there is no server-side session store. [`SessionUser`] reads them back.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::{config::SessionConfig, errors::ServiceError, models::UserRole};

pub const USER_ID_COOKIE: &str = "user_id";
pub const USER_ROLE_COOKIE: &str = "user_role";
pub const FULL_NAME_COOKIE: &str = "full_name";

const SESSION_COOKIES: [&str; 3] = [USER_ID_COOKIE, USER_ROLE_COOKIE, FULL_NAME_COOKIE];

/// The signed-in user as recorded in the session cookies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: String,
    pub role: UserRole,
    pub full_name: String,
    /// Employee record linked to the user, when login found one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<String>,
}

impl SessionUser {
    pub fn from_jar(jar: &CookieJar) -> Option<Self> {
        let user_id = jar
            .get(USER_ID_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())?;
        let role = jar
            .get(USER_ROLE_COOKIE)
            .and_then(|c| UserRole::parse(c.value()))
            .unwrap_or(UserRole::Employee);
        let full_name = jar
            .get(FULL_NAME_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| user_id.clone());

        Some(Self {
            user_id,
            role,
            full_name,
            employee: None,
        })
    }

    /// Adds the session cookies to `jar`.
    pub fn store(&self, jar: CookieJar, config: &SessionConfig) -> CookieJar {
        let max_age = time::Duration::hours(i64::try_from(config.ttl_hours).unwrap_or(i64::MAX));
        [
            (USER_ID_COOKIE, self.user_id.clone()),
            (USER_ROLE_COOKIE, self.role.as_str().to_string()),
            (FULL_NAME_COOKIE, self.full_name.clone()),
        ]
        .into_iter()
        .fold(jar, |jar, (name, value)| {
            jar.add(
                Cookie::build((name, value))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .secure(config.secure_cookies)
                    .max_age(max_age),
            )
        })
    }
}

/// Expires every session cookie.
pub fn clear(jar: CookieJar) -> CookieJar {
    SESSION_COOKIES.into_iter().fold(jar, |jar, name| {
        jar.remove(Cookie::build(name).path("/"))
    })
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        SessionUser::from_jar(&jar)
            .ok_or_else(|| ServiceError::Unauthorized("Not authenticated".to_string()))
    }
}
