use thiserror::Error;

/// Failures raised while talking to the ERP backend.
#[derive(Debug, Error)]
pub enum ErpError {
    /// The ERP answered outside the 2xx range.
    #[error("ERP responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("ERP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected ERP payload: {0}")]
    Decode(String),

    #[error("Invalid ERP url: {0}")]
    InvalidUrl(String),
}

const DUPLICATE_MARKERS: [&str; 4] = [
    "already created for this period",
    "already exists",
    "duplicate entry",
    "duplicateentryerror",
];

impl ErpError {
    /// HTTP status reported by the ERP, if the request reached it.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Status { status, body } => {
                *status == 404 || body.contains("DoesNotExistError")
            }
            _ => false,
        }
    }

    /// Frappe rejects bad credentials with 401, and some deployments with 403.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Whether the ERP refused a write because the record (or period) already exists.
    pub fn is_duplicate(&self) -> bool {
        match self {
            Self::Status { status, body } => {
                let lower = body.to_ascii_lowercase();
                *status == 409 || DUPLICATE_MARKERS.iter().any(|m| lower.contains(m))
            }
            _ => false,
        }
    }
}
