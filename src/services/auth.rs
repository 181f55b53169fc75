use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    erp::{ErpClient, ErpError, ListQuery},
    errors::ServiceError,
    models::{Employee, User, UserRole},
    session::SessionUser,
};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "current_password is required"))]
    pub current_password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "new_password is required"))]
    pub new_password: String,
}

/// Verifies credentials against the ERP and resolves dashboard sessions.
#[derive(Clone)]
pub struct AuthService {
    erp: ErpClient,
}

impl AuthService {
    pub fn new(erp: ErpClient) -> Self {
        Self { erp }
    }

    fn credential_error(err: ErpError) -> ServiceError {
        if err.is_auth_failure() {
            ServiceError::Unauthorized("Invalid email or password".to_string())
        } else {
            err.into()
        }
    }

    /// Checks the credentials and builds the session for the user.
    ///
    /// Role and linked employee are looked up after the password check; if
    /// either lookup fails the user still signs in, as a plain employee.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, ServiceError> {
        let email = email.trim();
        let login = self.erp.login(email, password).await.map_err(|err| {
            warn!(error = %err, "login rejected");
            Self::credential_error(err)
        })?;

        let (user, employee) = futures::join!(
            self.erp.find_doc::<User>(email),
            self.linked_employee(email)
        );

        let user = user.unwrap_or_else(|err| {
            warn!(error = %err, "could not load user roles");
            None
        });
        let employee = employee.unwrap_or_else(|err| {
            warn!(error = %err, "could not look up linked employee");
            None
        });

        let role = user
            .as_ref()
            .map(|u| UserRole::from_erp_roles(u.roles.iter().map(|r| r.role.as_str())))
            .unwrap_or(UserRole::Employee);
        let full_name = login
            .full_name
            .or_else(|| user.and_then(|u| u.full_name))
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.to_string());

        info!(role = role.as_str(), "user signed in");
        Ok(SessionUser {
            user_id: email.to_string(),
            role,
            full_name,
            employee,
        })
    }

    async fn linked_employee(&self, user_id: &str) -> Result<Option<String>, ErpError> {
        let employees: Vec<Employee> = self
            .erp
            .get_list(ListQuery::new().eq("user_id", user_id).fields(&["name"]).limit(1))
            .await?;
        Ok(employees.into_iter().next().map(|e| e.name))
    }

    #[instrument(skip(self, request), fields(user = %user.user_id))]
    pub async fn change_password(
        &self,
        user: &SessionUser,
        request: &ChangePasswordRequest,
    ) -> Result<(), ServiceError> {
        if request.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::BadRequest(format!(
                "new_password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if request.new_password == request.current_password {
            return Err(ServiceError::BadRequest(
                "new_password must differ from current_password".to_string(),
            ));
        }

        self.erp
            .login(&user.user_id, &request.current_password)
            .await
            .map_err(|err| match Self::credential_error(err) {
                ServiceError::Unauthorized(_) => {
                    ServiceError::Unauthorized("Current password is incorrect".to_string())
                }
                other => other,
            })?;

        self.erp
            .update::<User, _>(&user.user_id, &json!({ "new_password": request.new_password }))
            .await?;

        info!("password changed");
        Ok(())
    }
}
