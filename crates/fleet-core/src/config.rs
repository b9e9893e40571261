use std::env;
use std::path::PathBuf;

use dirs::config_dir;
use thiserror::Error;

const CONFIG_DIR_NAME: &str = "fleetwatch";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_TOKEN_SCOPE: &str = "https://tapi.dvsa.gov.uk/.default";
pub const DEFAULT_MOT_API_URL: &str = "https://history.mot.api.gov.uk/v1/trade/vehicles/registration";
pub const DEFAULT_DIST_DIR: &str = "dist";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    Invalid { var: String, message: String },
}

/// Credentials and endpoint for the OAuth2 client-credentials exchange.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub scope: String,
    pub token_url: String,
}

impl TokenSettings {
    /// Builds settings that target the Microsoft identity platform for `tenant_id`.
    pub fn for_tenant(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        let tenant_id = tenant_id.into();
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: default_token_url(&tenant_id),
            tenant_id,
            scope: DEFAULT_TOKEN_SCOPE.to_string(),
        }
    }
}

/// Vehicle-history endpoint plus the API key it requires.
#[derive(Debug, Clone)]
pub struct MotApiSettings {
    pub base_url: String,
    pub api_key: String,
}

impl MotApiSettings {
    pub fn vehicle_url(&self, registration: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), registration)
    }
}

/// Backend configuration, sourced from the process environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub token: TokenSettings,
    pub mot_api: MotApiSettings,
    pub dist_dir: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Resolves the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port = match value("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|err| ConfigError::Invalid {
                var: "PORT".to_string(),
                message: err.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let tenant_id = value("TENANT_ID").unwrap_or_default();
        let token_url = value("TOKEN_URL").unwrap_or_else(|| default_token_url(&tenant_id));

        Ok(Self {
            port,
            token: TokenSettings {
                client_id: value("CLIENT_ID").unwrap_or_default(),
                client_secret: value("CLIENT_SECRET").unwrap_or_default(),
                tenant_id,
                scope: value("TOKEN_SCOPE").unwrap_or_else(|| DEFAULT_TOKEN_SCOPE.to_string()),
                token_url,
            },
            mot_api: MotApiSettings {
                base_url: value("MOT_API_URL").unwrap_or_else(|| DEFAULT_MOT_API_URL.to_string()),
                api_key: value("API_KEY").unwrap_or_default(),
            },
            dist_dir: value("DIST_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DIST_DIR)),
        })
    }

    /// Names of credential variables that were not provided.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.token.client_id.is_empty() {
            missing.push("CLIENT_ID");
        }
        if self.token.client_secret.is_empty() {
            missing.push("CLIENT_SECRET");
        }
        if self.token.tenant_id.is_empty() {
            missing.push("TENANT_ID");
        }
        if self.mot_api.api_key.is_empty() {
            missing.push("API_KEY");
        }
        missing
    }
}

fn default_token_url(tenant_id: &str) -> String {
    format!("https://login.microsoftonline.com/{tenant_id}/oauth2/v2.0/token")
}

/// Path to the per-user configuration directory.
pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}
