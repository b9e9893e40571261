use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub const AUTH_FAILURE_MESSAGE: &str = "Failed to obtain access token";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Failures of the token exchange and the vehicle lookup proxy.
///
/// Upstream variants keep the remote status and JSON body untouched so the HTTP layer can relay
/// them verbatim.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("identity provider responded with {status}")]
    UpstreamAuth { status: StatusCode, body: Value },
    #[error("Failed to obtain access token")]
    AuthFailure,
    #[error("vehicle history API responded with {status}")]
    UpstreamLookup { status: StatusCode, body: Value },
    #[error("Internal server error: {0}")]
    Internal(#[from] reqwest::Error),
}

impl ProxyError {
    /// Short message suitable for an end user, mirroring what the HTTP surface reports.
    pub fn client_message(&self) -> String {
        match self {
            ProxyError::UpstreamAuth { status, body } | ProxyError::UpstreamLookup { status, body } => {
                error_field(body).unwrap_or_else(|| reason_phrase(*status))
            }
            ProxyError::AuthFailure => AUTH_FAILURE_MESSAGE.to_string(),
            ProxyError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

/// The `error` string of a JSON error body, if it has one.
pub fn error_field(body: &Value) -> Option<String> {
    body.get("error")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

pub fn reason_phrase(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_message_prefers_error_field() {
        let err = ProxyError::UpstreamLookup {
            status: StatusCode::NOT_FOUND,
            body: json!({ "error": "No vehicle found" }),
        };
        assert_eq!(err.client_message(), "No vehicle found");
    }

    #[test]
    fn client_message_falls_back_to_reason_phrase() {
        let err = ProxyError::UpstreamLookup {
            status: StatusCode::NOT_FOUND,
            body: json!({ "errorCode": "MOTH-NF-01", "errorMessage": "not found" }),
        };
        assert_eq!(err.client_message(), "Not Found");
        assert_eq!(
            ProxyError::AuthFailure.client_message(),
            "Failed to obtain access token"
        );
    }
}
