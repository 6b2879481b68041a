use crate::config::GuardConfig;
use crate::create_app;
use crate::state::tests::create_test_state;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::header::{AsHeaderName, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tower::ServiceExt;

/// Test fixture wrapping the full application router.
///
/// The fixture builds an [`AppState`] from [`GuardConfig::default`] (optionally adjusted),
/// using the RSA key pair shared by the whole test binary, and drives requests through the
/// router with `oneshot`, so no socket is ever bound.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new();
///     let token = fixture.issue_token("https://mcp.example.com", "files:read");
///
///     let response = fixture.get_with_token("/tools/list", &token).await;
///
///     response.assert_ok();
///     let tools = response.json_as::<ToolListResponse>();
///     assert_eq!(tools.tools.len(), 1);
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// State behind the router, for direct access to keys and issuer
    pub state: AppState,
}

impl TestFixture {
    /// Creates a fixture with the default configuration
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Creates a fixture after letting `configure` adjust the default configuration
    pub fn with_config(configure: impl FnOnce(&mut GuardConfig)) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let mut config = GuardConfig::default();
        configure(&mut config);

        let state = create_test_state(config);
        let app = create_app(state.clone());

        Self { app, state }
    }

    /// Initializes the test logger with customized settings.
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Mints an access token through the fixture's own issuer
    pub fn issue_token(&self, resource: &str, scope: &str) -> String {
        self.state
            .issuer
            .issue(Some(resource), Some(scope))
            .expect("Failed to issue test token")
            .access_token
    }

    /// Creates a request builder with a JSON content type and, if given, a bearer token
    pub fn request_builder(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        token: Option<&str>,
    ) -> http::request::Builder {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri.as_ref())
            .header(CONTENT_TYPE, "application/json");

        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
    }

    /// Sends an unauthenticated GET request
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        self.send_raw(Method::GET, uri, None, "").await
    }

    /// Sends a GET request carrying `token`
    pub async fn get_with_token(&self, uri: impl AsRef<str>, token: &str) -> TestResponse {
        self.send_raw(Method::GET, uri, Some(token), "").await
    }

    /// Sends an unauthenticated POST request with a JSON body
    pub async fn post<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        let json_body = serde_json::to_string(body).expect("Failed to serialize body to JSON");
        self.send_raw(Method::POST, uri, None, &json_body).await
    }

    /// Sends a POST request with a JSON body carrying `token`
    pub async fn post_with_token<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        body: &T,
        token: &str,
    ) -> TestResponse {
        let json_body = serde_json::to_string(body).expect("Failed to serialize body to JSON");
        self.send_raw(Method::POST, uri, Some(token), &json_body)
            .await
    }

    /// Sends `body` verbatim, for requests that are not valid JSON
    pub async fn send_raw(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        token: Option<&str>,
        body: &str,
    ) -> TestResponse {
        let request = self
            .request_builder(method, uri, token)
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a request and returns a TestResponse.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Try to parse as JSON, defaulting to empty object if parsing fails or empty body
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }
}

/// Response from a test request that provides convenient access to status and JSON body.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match the expected value.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    /// Asserts that the response status is OK (200).
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Returns a header value as a string, if present and valid
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Converts the response body to the specified type.
    ///
    /// # Panics
    ///
    /// Panics if deserialization fails.
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}
