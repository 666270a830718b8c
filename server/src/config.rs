use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::auth::google::GOOGLE_CERTS_URL;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0} is required but not set")]
    Missing(&'static str),
    #[error("Failed to read prompt template {path}: {source}")]
    TemplateIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse prompt template: {0}")]
    TemplateParse(#[from] serde_yaml::Error),
    #[error("Prompt template must contain at least one activity")]
    NoActivities,
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Server configuration, read from flags or the environment
#[derive(Debug, Clone, Parser)]
#[command(about, version)]
pub struct ServerConfig {
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub addr: String,

    /// OAuth client id expected as the audience of Google ID tokens
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub google_client_id: Option<String>,

    #[arg(long, env = "GOOGLE_CERTS_URL", default_value = GOOGLE_CERTS_URL)]
    pub google_certs_url: String,

    #[arg(long, env = "JWKS_CACHE_SECS", default_value_t = 3600)]
    pub jwks_cache_secs: u64,

    /// Enables locally issued access tokens when set
    #[arg(long, env = "JWT_SECRET_KEY", hide_env_values = true)]
    pub jwt_secret_key: Option<String>,

    #[arg(long, env = "ACCESS_TOKEN_EXPIRE_MINUTES", default_value_t = 30)]
    pub access_token_expire_minutes: u64,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    #[arg(long, env = "PROMPTS_PATH", default_value = "config/prompts.yaml")]
    pub prompts_path: PathBuf,

    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 60)]
    pub upstream_timeout_secs: u64,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 120)]
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_secs)
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_expire_minutes.saturating_mul(60))
    }

    pub fn openai_api_key(&self) -> Result<&str, ConfigError> {
        required(&self.openai_api_key, "OPENAI_API_KEY")
    }
}

/// Returns the trimmed value of an optional setting, treating blank as unset.
pub fn required<'a>(
    value: &'a Option<String>,
    name: &'static str,
) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}
