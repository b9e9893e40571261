//! Vehicle lookup proxy: token, then history API, relaying the JSON untouched.

use std::future::Future;

use reqwest::Client;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::{MotApiSettings, ServerConfig};
use crate::error::ProxyError;
use crate::token::TokenProvider;

/// Anything that can resolve a registration to the history API's vehicle JSON.
///
/// The error is the short user-facing message reported for a failed lookup.
pub trait VehicleSource {
    fn fetch_vehicle(&self, registration: &str)
    -> impl Future<Output = Result<Value, String>> + Send;
}

#[derive(Debug, Clone)]
pub struct VehicleLookup {
    client: Client,
    tokens: TokenProvider,
    mot_api: MotApiSettings,
}

impl VehicleLookup {
    pub fn new(client: Client, tokens: TokenProvider, mot_api: MotApiSettings) -> Self {
        Self {
            client,
            tokens,
            mot_api,
        }
    }

    pub fn from_config(client: Client, config: &ServerConfig) -> Self {
        let tokens = TokenProvider::new(client.clone(), config.token.clone());
        Self::new(client, tokens, config.mot_api.clone())
    }

    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    /// Looks up `registration` exactly as given; no format validation happens here.
    ///
    /// A rejected token request or a reply without a token is reported as
    /// [`ProxyError::AuthFailure`], and the history API is not called in that case.
    pub async fn lookup_vehicle(&self, registration: &str) -> Result<Value, ProxyError> {
        let token = match self.tokens.acquire_token().await {
            Ok(token) => token,
            Err(ProxyError::Internal(err)) => return Err(ProxyError::Internal(err)),
            Err(err) => {
                warn!(%registration, error = %err, "No access token for vehicle lookup");
                return Err(ProxyError::AuthFailure);
            }
        };

        let response = self
            .client
            .get(self.mot_api.vehicle_url(registration))
            .bearer_auth(&token.access_token)
            .header("x-api-key", self.mot_api.api_key.as_str())
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() {
            error!(%registration, %status, body = %body, "MOT API error");
            return Err(ProxyError::UpstreamLookup { status, body });
        }

        info!(%registration, "Vehicle lookup succeeded");
        Ok(body)
    }
}

impl VehicleSource for VehicleLookup {
    async fn fetch_vehicle(&self, registration: &str) -> Result<Value, String> {
        self.lookup_vehicle(registration)
            .await
            .map_err(|err| err.client_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenSettings;
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn lookup_for(server: &MockServer) -> VehicleLookup {
        let mut token = TokenSettings::for_tenant("id", "secret", "tenant");
        token.token_url = format!("{}/token", server.uri());
        let mot_api = MotApiSettings {
            base_url: format!("{}/v1/trade/vehicles/registration", server.uri()),
            api_key: "api-key".to_string(),
        };
        let client = Client::new();
        VehicleLookup::new(client.clone(), TokenProvider::new(client, token), mot_api)
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok-123" })),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn upstream_not_found_carries_status_and_body() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        let body = json!({ "errorCode": "MOTH-NP-01", "errorMessage": "No data found" });
        Mock::given(method("GET"))
            .and(path("/v1/trade/vehicles/registration/ZZ99ZZZ"))
            .and(header("authorization", "Bearer tok-123"))
            .and(header("x-api-key", "api-key"))
            .respond_with(ResponseTemplate::new(404).set_body_json(body.clone()))
            .mount(&server)
            .await;

        match lookup_for(&server).lookup_vehicle("ZZ99ZZZ").await {
            Err(ProxyError::UpstreamLookup { status, body: got }) => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(got, body);
            }
            other => panic!("expected UpstreamLookup, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_upstream_body_is_internal_error() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let err = lookup_for(&server)
            .lookup_vehicle("DF04BEY")
            .await
            .expect_err("lookup should fail");
        assert!(matches!(err, ProxyError::Internal(_)));
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[tokio::test]
    async fn vehicle_source_reports_client_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_request" })))
            .mount(&server)
            .await;

        let message = lookup_for(&server)
            .fetch_vehicle("DF04BEY")
            .await
            .expect_err("lookup should fail");
        assert_eq!(message, "Failed to obtain access token");
    }
}
