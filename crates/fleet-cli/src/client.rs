use fleet_core::VehicleSource;
use fleet_core::error::{error_field, reason_phrase};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Backend { status: StatusCode, message: String },
}

/// HTTP client for the fleet backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches `GET /api/vehicle/{registration}`.
    ///
    /// A non-success reply becomes [`ClientError::Backend`] whose message is the body's `error`
    /// field, or the status reason phrase when there isn't one.
    pub async fn vehicle(&self, registration: &str) -> Result<Value, ClientError> {
        let url = format!(
            "{}/api/vehicle/{}",
            self.base_url,
            urlencoding::encode(registration)
        );
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = error_field(&body).unwrap_or_else(|| reason_phrase(status));
            warn!(%registration, %status, %message, "Backend rejected vehicle lookup");
            return Err(ClientError::Backend { status, message });
        }

        debug!(%registration, "Vehicle lookup succeeded");
        Ok(response.json().await?)
    }

    pub async fn ping(&self) -> Result<String, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/ping", self.base_url))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Backend {
                status,
                message: reason_phrase(status),
            });
        }
        Ok(response.text().await?)
    }
}

impl VehicleSource for BackendClient {
    async fn fetch_vehicle(&self, registration: &str) -> Result<Value, String> {
        self.vehicle(registration)
            .await
            .map_err(|err| err.to_string())
    }
}
