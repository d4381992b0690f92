use domain::models::PlanTerms;
use serde::Deserialize;
use shared::jwt::{JwtConfig, JwtError, MIN_SECRET_LENGTH};
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    /// Bearer token verification
    pub jwt: JwtAuthConfig,
    /// Payment gateway and plan terms
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Base of the share links handed out for forms.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn pool_config(&self) -> persistence::db::DatabaseConfig {
        persistence::db::DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_secs: self.connect_timeout_secs,
            idle_timeout_secs: self.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Requests per minute for users without an active subscription. 0 disables rate limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Requests per minute for subscribers. 0 falls back to the standard limit.
    #[serde(default = "default_subscriber_rate_limit")]
    pub subscriber_rate_limit_per_minute: u32,

    /// Only enable behind TLS termination.
    #[serde(default)]
    pub hsts_enabled: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            rate_limit_per_minute: default_rate_limit(),
            subscriber_rate_limit_per_minute: default_subscriber_rate_limit(),
            hsts_enabled: false,
        }
    }
}

/// JWT verification settings.
///
/// Either `public_key` (RS256, verify only) or `secret` (HS256) must be set;
/// the public key wins when both are present.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtAuthConfig {
    #[serde(default)]
    pub secret: String,

    #[serde(default)]
    pub public_key: String,

    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: i64,

    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

impl JwtAuthConfig {
    pub fn build(&self) -> Result<JwtConfig, JwtError> {
        if !self.public_key.is_empty() {
            JwtConfig::from_rsa_public_key(&self.public_key, self.leeway_secs)
        } else {
            JwtConfig::from_secret(
                &self.secret,
                self.access_token_expiry_secs,
                self.leeway_secs,
            )
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsConfig {
    /// Shared secret the gateway signs webhook bodies with
    #[serde(default)]
    pub webhook_secret: String,

    /// Plan price in the currency's minor unit
    #[serde(default = "default_plan_amount_minor")]
    pub plan_amount_minor: i64,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_plan_duration_days")]
    pub plan_duration_days: i64,
}

impl PaymentsConfig {
    pub fn plan_terms(&self) -> PlanTerms {
        PlanTerms {
            amount_minor: self.plan_amount_minor,
            currency: self.currency.clone(),
            duration_days: self.plan_duration_days,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Periodic expiry sweep. Lazy expiry keeps access correct without it.
    #[serde(default)]
    pub expiry_sweep_enabled: bool,

    #[serde(default = "default_expiry_sweep_interval")]
    pub expiry_sweep_interval_minutes: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            expiry_sweep_enabled: false,
            expiry_sweep_interval_minutes: default_expiry_sweep_interval(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    1_048_576
}
fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    60
}
fn default_subscriber_rate_limit() -> u32 {
    300
}
fn default_access_token_expiry() -> i64 {
    3600
}
fn default_jwt_leeway() -> u64 {
    shared::jwt::DEFAULT_LEEWAY_SECS
}
fn default_plan_amount_minor() -> i64 {
    500_000
}
fn default_currency() -> String {
    "NGN".to_string()
}
fn default_plan_duration_days() -> i64 {
    30
}
fn default_expiry_sweep_interval() -> u64 {
    60
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with FL__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("FL").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = ""

            [logging]
            level = "info"
            format = "json"

            [jwt]
            secret = ""

            [payments]
            webhook_secret = ""
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "FL__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.jwt.public_key.is_empty() {
            if self.jwt.secret.is_empty() {
                return Err(ConfigValidationError::MissingRequired(
                    "FL__JWT__SECRET or FL__JWT__PUBLIC_KEY must be set".to_string(),
                ));
            }
            if self.jwt.secret.len() < MIN_SECRET_LENGTH {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "jwt.secret must be at least {} bytes",
                    MIN_SECRET_LENGTH
                )));
            }
        }

        if self.payments.webhook_secret.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "FL__PAYMENTS__WEBHOOK_SECRET environment variable must be set".to_string(),
            ));
        }

        if self.payments.plan_amount_minor <= 0 || self.payments.plan_duration_days <= 0 {
            return Err(ConfigValidationError::InvalidValue(
                "plan_amount_minor and plan_duration_days must be positive".to_string(),
            ));
        }

        if self.jobs.expiry_sweep_enabled && self.jobs.expiry_sweep_interval_minutes == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "expiry_sweep_interval_minutes cannot be 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigValidationError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|_| {
                ConfigValidationError::InvalidValue(format!(
                    "Invalid listen address {}:{}",
                    self.server.host, self.server.port
                ))
            })
    }
}
