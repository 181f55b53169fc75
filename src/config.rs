use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 3000;
const CONFIG_DIR: &str = "config";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DASHBOARD_CACHE_SECS: u64 = 60;
const DEFAULT_SESSION_TTL_HOURS: u64 = 24 * 7;

/// Environment variables older deployments use for the ERP connection.
/// They win over every other source when set.
const LEGACY_OVERRIDES: [(&str, &str); 4] = [
    ("FRAPPE_URL", "erp.base_url"),
    ("NEXT_PUBLIC_FRAPPE_URL", "erp.base_url"),
    ("FRAPPE_API_KEY", "erp.api_key"),
    ("FRAPPE_API_SECRET", "erp.api_secret"),
];

/// Connection settings for the Frappe/ERPNext backend.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ErpConfig {
    /// Base URL of the ERP site, e.g. `https://erp.example.com`
    #[validate(custom = "validate_base_url")]
    pub base_url: String,

    #[validate(length(min = 1))]
    pub api_key: String,

    #[validate(length(min = 1))]
    pub api_secret: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,
}

/// Cookie session settings
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Lifetime of the session cookies
    #[serde(default = "default_session_ttl_hours")]
    #[validate(range(min = 1))]
    pub ttl_hours: u64,

    /// Mark session cookies `Secure`
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_session_ttl_hours(),
            secure_cookies: false,
        }
    }
}

/// Where payroll reports find Provident Fund figures.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayrollConfig {
    /// Deduction component holding the employee PF contribution
    #[serde(default = "default_pf_component")]
    pub pf_component: String,

    /// Custom salary slip field holding the employer PF contribution
    #[serde(default = "default_employer_pf_field")]
    pub employer_pf_field: String,

    /// Custom employee field holding the UAN
    #[serde(default = "default_uan_field")]
    pub uan_field: String,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            pf_component: default_pf_component(),
            employer_pf_field: default_employer_pf_field(),
            uan_field: default_uan_field(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[validate(length(min = 1))]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// Company used when a create request names none
    #[serde(default)]
    pub default_company: Option<String>,

    /// `max-age` advertised on the accounting dashboard
    #[serde(default = "default_dashboard_cache_secs")]
    pub dashboard_cache_secs: u64,

    #[validate]
    pub erp: ErpConfig,

    #[serde(default)]
    #[validate]
    pub session: SessionConfig,

    #[serde(default)]
    pub payroll: PayrollConfig,
}

impl AppConfig {
    /// Checks if running in production
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_deref()
            .map(|s| s.split(',').any(|o| !o.trim().is_empty()))
            .unwrap_or(false)
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.cors_allow_any_origin || self.is_development()
    }

    /// The configured default company, ignoring blank values.
    pub fn default_company(&self) -> Option<&str> {
        self.default_company
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if self.is_production() && !self.session.secure_cookies {
            let mut err = ValidationError::new("secure_cookies_required");
            err.message =
                Some("Session cookies must be Secure in production. Set APP__SESSION__SECURE_COOKIES=true".into());
            errors.add("session", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_dashboard_cache_secs() -> u64 {
    DEFAULT_DASHBOARD_CACHE_SECS
}

fn default_session_ttl_hours() -> u64 {
    DEFAULT_SESSION_TTL_HOURS
}

fn default_pf_component() -> String {
    "Provident Fund".to_string()
}

fn default_employer_pf_field() -> String {
    "employer_pf".to_string()
}

fn default_uan_field() -> String {
    "uan_number".to_string()
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_base_url(value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => {
            let mut err = ValidationError::new("base_url");
            err.message = Some("Must be an absolute http(s) URL".into());
            Err(err)
        }
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("hrhub_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration from `config/` and the process environment.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let vars: HashMap<String, String> = env::vars().collect();
    load_config_from(Path::new(CONFIG_DIR), &vars)
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (`<dir>/default.toml`)
/// 3. Environment-specific config (`<dir>/{env}.toml`)
/// 4. Docker config (`<dir>/docker.toml`) if DOCKER is set
/// 5. Environment variables (APP__*)
/// 6. Legacy FRAPPE_* variables
pub fn load_config_from(
    dir: &Path,
    vars: &HashMap<String, String>,
) -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = vars
        .get("RUN_ENV")
        .or_else(|| vars.get("APP_ENV"))
        .cloned()
        .unwrap_or_else(|| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            dir.display()
        );
    }

    // The ERP credentials have no defaults; they must come from a file or the environment.
    let mut builder = Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::from(dir.join("default")).required(false))
        .add_source(File::from(dir.join(&run_env)).required(false));

    if vars.contains_key("DOCKER") {
        info!("Docker environment detected");
        builder = builder.add_source(File::from(dir.join("docker")).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .separator("__")
            .source(Some(vars.clone())),
    );

    for (var, key) in LEGACY_OVERRIDES {
        let value = vars.get(var).filter(|v| !v.trim().is_empty()).cloned();
        builder = builder.set_override_option(key, value)?;
    }

    let config = builder.build()?;

    for key in ["erp.base_url", "erp.api_key", "erp.api_secret"] {
        if config.get_string(key).is_err() {
            error!(
                "{} is not configured. Set APP__{} (or the matching FRAPPE_* variable).",
                key,
                key.replace('.', "__").to_uppercase()
            );
            return Err(AppConfigError::Load(ConfigError::NotFound(format!(
                "{} is required but not configured",
                key
            ))));
        }
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
pub(crate) fn test_config(erp_base_url: &str) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: DEFAULT_PORT,
        environment: "test".into(),
        log_level: DEFAULT_LOG_LEVEL.into(),
        log_json: false,
        cors_allowed_origins: None,
        cors_allow_any_origin: true,
        default_company: None,
        dashboard_cache_secs: DEFAULT_DASHBOARD_CACHE_SECS,
        erp: ErpConfig {
            base_url: erp_base_url.into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            request_timeout_secs: 5,
        },
        session: SessionConfig::default(),
        payroll: PayrollConfig::default(),
    }
}
