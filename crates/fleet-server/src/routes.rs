use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Path as UrlPath, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{MethodRouter, any, get, post};
use axum::{Json, Router};
use fleet_core::error::{AUTH_FAILURE_MESSAGE, INTERNAL_ERROR_MESSAGE};
use fleet_core::{ProxyError, VehicleLookup};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, warn};

pub const PING_MESSAGE: &str = "✅ Backend is up!";

#[derive(Clone)]
pub struct HttpContext {
    lookup: Arc<VehicleLookup>,
}

impl HttpContext {
    pub fn new(lookup: VehicleLookup) -> Self {
        Self {
            lookup: Arc::new(lookup),
        }
    }
}

#[derive(Clone)]
struct SpaContext {
    index_html: PathBuf,
}

#[derive(Debug)]
pub struct ApiError(ProxyError);

impl From<ProxyError> for ApiError {
    fn from(value: ProxyError) -> Self {
        Self(value)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            ProxyError::UpstreamAuth { status, body } | ProxyError::UpstreamLookup { status, body } => {
                (relay_status(status.as_u16()), Json(body)).into_response()
            }
            ProxyError::AuthFailure => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: AUTH_FAILURE_MESSAGE,
                }),
            )
                .into_response(),
            ProxyError::Internal(err) => {
                error!(error = %err, "Upstream request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: INTERNAL_ERROR_MESSAGE,
                    }),
                )
                    .into_response()
            }
        }
    }
}

// reqwest and axum may sit on different `http` versions, so status crosses over as a number.
fn relay_status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY)
}

async fn ping_handler() -> &'static str {
    PING_MESSAGE
}

async fn token_handler(State(ctx): State<HttpContext>) -> Result<Response, ApiError> {
    let exchange = ctx.lookup.tokens().exchange().await?;
    Ok((relay_status(exchange.status.as_u16()), Json(exchange.body)).into_response())
}

async fn vehicle_handler(
    State(ctx): State<HttpContext>,
    UrlPath(registration): UrlPath<String>,
) -> Result<Json<Value>, ApiError> {
    let vehicle = ctx.lookup.lookup_vehicle(&registration).await?;
    Ok(Json(vehicle))
}

/// Serves the SPA entry document for extension-less `GET`s outside `/api`.
async fn spa_entry(State(spa): State<SpaContext>, method: Method, uri: Uri) -> Response {
    if !serves_spa_entry(&method, uri.path()) {
        return StatusCode::NOT_FOUND.into_response();
    }

    match tokio::fs::read_to_string(&spa.index_html).await {
        Ok(contents) => Html(contents).into_response(),
        Err(err) => {
            error!(path = %spa.index_html.display(), error = %err, "Failed to read SPA entry");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn serves_spa_entry(method: &Method, path: &str) -> bool {
    if method != Method::GET || path.starts_with("/api") {
        return false;
    }
    let last_segment = path.rsplit('/').next().unwrap_or_default();
    Path::new(last_segment).extension().is_none()
}

/// Builds the full HTTP surface. Static assets and the SPA fallback are only attached when
/// `dist_dir/index.html` exists.
pub fn build_router(ctx: HttpContext, dist_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let api = Router::new()
        .route("/api/token", post(token_handler))
        .route("/api/vehicle/:reg", get(vehicle_handler))
        .route("/api/ping", get(ping_handler))
        .with_state(ctx);

    let index_html = dist_dir.join("index.html");
    let router = if index_html.is_file() {
        let fallback: MethodRouter = any(spa_entry).with_state(SpaContext { index_html });
        let assets = ServeDir::new(dist_dir)
            .call_fallback_on_method_not_allowed(true)
            .fallback(fallback);
        api.fallback_service(assets)
    } else {
        warn!(path = %index_html.display(), "SPA entry not found; frontend won't be served");
        api
    };

    router.layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use fleet_core::{MotApiSettings, TokenProvider, TokenSettings};
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context_for(server_uri: &str) -> HttpContext {
        let mut token = TokenSettings::for_tenant("id", "secret", "tenant");
        token.token_url = format!("{server_uri}/token");
        let mot_api = MotApiSettings {
            base_url: format!("{server_uri}/vehicles"),
            api_key: "key".to_string(),
        };
        let client = reqwest::Client::new();
        HttpContext::new(VehicleLookup::new(
            client.clone(),
            TokenProvider::new(client, token),
            mot_api,
        ))
    }

    fn offline_router() -> Router {
        build_router(
            context_for("http://127.0.0.1:9"),
            Path::new("/nonexistent/dist"),
        )
    }

    async fn send(router: Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body")
            .to_vec();
        (status, body)
    }

    fn json_body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).expect("json body")
    }

    #[tokio::test]
    async fn ping_reports_backend_up() {
        let (status, body) = send(offline_router(), "GET", "/api/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(String::from_utf8(body).expect("utf8"), PING_MESSAGE);
    }

    #[tokio::test]
    async fn vehicle_route_relays_upstream_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "t" })))
            .mount(&server)
            .await;
        let vehicle = json!({ "registration": "DF04BEY", "make": "FORD", "motTests": [] });
        Mock::given(method("GET"))
            .and(path("/vehicles/DF04BEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vehicle.clone()))
            .mount(&server)
            .await;

        let router = build_router(context_for(&server.uri()), Path::new("/nonexistent/dist"));
        let (status, body) = send(router, "GET", "/api/vehicle/DF04BEY").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), vehicle);
    }

    #[tokio::test]
    async fn vehicle_route_mirrors_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "t" })))
            .mount(&server)
            .await;
        let upstream = json!({ "errorCode": "MOTH-NP-01", "errorMessage": "No data found" });
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(upstream.clone()))
            .mount(&server)
            .await;

        let router = build_router(context_for(&server.uri()), Path::new("/nonexistent/dist"));
        let (status, body) = send(router, "GET", "/api/vehicle/ZZ99ZZZ").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(&body), upstream);
    }

    #[tokio::test]
    async fn vehicle_route_reports_missing_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid_client" })),
            )
            .mount(&server)
            .await;

        let router = build_router(context_for(&server.uri()), Path::new("/nonexistent/dist"));
        let (status, body) = send(router, "GET", "/api/vehicle/DF04BEY").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(&body),
            json!({ "error": "Failed to obtain access token" })
        );
    }

    #[tokio::test]
    async fn unreachable_upstream_is_internal_error() {
        let (status, body) = send(offline_router(), "GET", "/api/vehicle/DF04BEY").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(&body), json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn token_route_mirrors_identity_provider() {
        let server = MockServer::start().await;
        let rejection = json!({ "error": "invalid_client", "error_codes": [7000215] });
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(rejection.clone()))
            .mount(&server)
            .await;

        let router = build_router(context_for(&server.uri()), Path::new("/nonexistent/dist"));
        let (status, body) = send(router, "POST", "/api/token").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(&body), rejection);
    }

    #[tokio::test]
    async fn spa_fallback_serves_index_for_client_routes() {
        let dist = tempfile::tempdir().expect("tempdir");
        std::fs::write(dist.path().join("index.html"), "<html>fleet</html>").expect("index");
        std::fs::write(dist.path().join("app.js"), "console.log(1)").expect("asset");

        let router = || build_router(context_for("http://127.0.0.1:9"), dist.path());

        let (status, body) = send(router(), "GET", "/vehicles/DF04BEY").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<html>fleet</html>");

        let (status, body) = send(router(), "GET", "/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"console.log(1)");

        let (status, _) = send(router(), "GET", "/missing.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(router(), "GET", "/api/unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(router(), "POST", "/drivers").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(router(), "DELETE", "/app.js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn spa_entry_rules() {
        assert!(serves_spa_entry(&Method::GET, "/"));
        assert!(serves_spa_entry(&Method::GET, "/drivers"));
        assert!(!serves_spa_entry(&Method::GET, "/logo.svg"));
        assert!(!serves_spa_entry(&Method::GET, "/api/anything"));
        assert!(!serves_spa_entry(&Method::POST, "/drivers"));
    }
}
