//! OAuth2 client-credentials exchange against the identity provider.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::config::TokenSettings;
use crate::error::ProxyError;

/// Raw identity-provider reply, kept intact for passthrough.
#[derive(Debug, Clone)]
pub struct TokenExchange {
    pub status: StatusCode,
    pub body: Value,
}

impl TokenExchange {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Stateless token source; every call performs a fresh grant.
#[derive(Debug, Clone)]
pub struct TokenProvider {
    client: Client,
    settings: TokenSettings,
}

impl TokenProvider {
    pub fn new(client: Client, settings: TokenSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Sends the client-credentials grant and returns whatever the identity provider said.
    pub async fn exchange(&self) -> Result<TokenExchange, ProxyError> {
        let form = [
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("scope", self.settings.scope.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .client
            .post(&self.settings.token_url)
            .form(&form)
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if status.is_success() {
            debug!(%status, "Token request succeeded");
        } else {
            error!(%status, body = %body, "Token request failed");
        }

        Ok(TokenExchange { status, body })
    }

    /// Exchanges credentials for a bearer token.
    ///
    /// A non-success status becomes [`ProxyError::UpstreamAuth`] carrying the upstream body. A
    /// success reply that lacks `access_token` is [`ProxyError::AuthFailure`].
    pub async fn acquire_token(&self) -> Result<AccessToken, ProxyError> {
        let exchange = self.exchange().await?;
        if !exchange.is_success() {
            return Err(ProxyError::UpstreamAuth {
                status: exchange.status,
                body: exchange.body,
            });
        }

        serde_json::from_value::<AccessToken>(exchange.body)
            .ok()
            .filter(|token| !token.access_token.is_empty())
            .ok_or(ProxyError::AuthFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> TokenSettings {
        let mut settings = TokenSettings::for_tenant("client", "s3cret", "tenant");
        settings.token_url = format!("{}/tenant/oauth2/v2.0/token", server.uri());
        settings
    }

    #[tokio::test]
    async fn acquire_token_posts_client_credentials_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant/oauth2/v2.0/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client"))
            .and(body_string_contains("client_secret=s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "abc.def"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = TokenProvider::new(Client::new(), settings(&server));
        let token = provider.acquire_token().await.expect("token");
        assert_eq!(token.access_token, "abc.def");
        assert_eq!(token.expires_in, Some(3599));
    }

    #[tokio::test]
    async fn rejected_credentials_surface_upstream_body() {
        let server = MockServer::start().await;
        let body = json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided."
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(body.clone()))
            .mount(&server)
            .await;

        let provider = TokenProvider::new(Client::new(), settings(&server));
        match provider.acquire_token().await {
            Err(ProxyError::UpstreamAuth { status, body: got }) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(got, body);
            }
            other => panic!("expected UpstreamAuth, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_without_access_token_is_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token_type": "Bearer" })))
            .mount(&server)
            .await;

        let provider = TokenProvider::new(Client::new(), settings(&server));
        assert!(matches!(
            provider.acquire_token().await,
            Err(ProxyError::AuthFailure)
        ));
    }

    #[tokio::test]
    async fn exchange_is_not_cached_between_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "t" })))
            .expect(2)
            .mount(&server)
            .await;

        let provider = TokenProvider::new(Client::new(), settings(&server));
        provider.acquire_token().await.expect("first");
        provider.acquire_token().await.expect("second");
    }
}
