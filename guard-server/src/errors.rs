use crate::authz::Rejection;
use crate::oauth::IssueError;

use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;
use axum::Json;
use http::header::WWW_AUTHENTICATE;
use http::{HeaderValue, StatusCode};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// OAuth-style error body shared by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub error_description: String,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub error: String,
    pub error_description: String,
    pub status_code: StatusCode,
    /// Value for the `WWW-Authenticate` header, if any
    pub challenge: Option<String>,
}

impl ApiError {
    /// Create a new ApiError with an error code, description and status code
    pub fn new<E: ToString, D: ToString>(error: E, description: D, status_code: StatusCode) -> Self {
        Self {
            error: error.to_string(),
            error_description: description.to_string(),
            status_code,
            challenge: None,
        }
    }

    /// Create new Bad Request Error (400) with code `invalid_request`
    pub fn invalid_request<D: ToString>(description: D) -> Self {
        Self::new("invalid_request", description, StatusCode::BAD_REQUEST)
    }

    /// Create new Internal Server Error (500) with code `server_error`
    pub fn internal<D: ToString>(description: D) -> Self {
        Self::new("server_error", description, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Create new Not Found Error (404) for an unknown tool
    pub fn tool_not_found(name: &str) -> Self {
        Self::new(
            "tool_not_found",
            format!("Tool not found: {name}"),
            StatusCode::NOT_FOUND,
        )
    }

    pub fn with_challenge(mut self, challenge: impl Into<String>) -> Self {
        self.challenge = Some(challenge.into());
        self
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        Self::new(rejection.error, rejection.description, rejection.status)
            .with_challenge(rejection.challenge)
    }
}

impl From<IssueError> for ApiError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::MissingResource => Self::invalid_request(err),
            IssueError::ScopeRejected(_) => Self::new("invalid_scope", err, StatusCode::BAD_REQUEST),
            IssueError::ExpiryOverflow(_) | IssueError::Signing(_) => {
                error!("{}", err);
                Self::internal("Failed to issue access token")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorBody {
            error: self.error,
            error_description: self.error_description,
        };
        let mut response = (self.status_code, Json(body)).into_response();

        if let Some(challenge) = self.challenge {
            match HeaderValue::from_str(&challenge) {
                Ok(value) => {
                    response.headers_mut().insert(WWW_AUTHENTICATE, value);
                }
                Err(e) => warn!("failed to set WWW-Authenticate header: {e}"),
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = ApiError::invalid_request("resource parameter is required").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "error": "invalid_request",
                "error_description": "resource parameter is required"
            })
        );
    }

    #[tokio::test]
    async fn test_rejection_carries_challenge() {
        let response =
            ApiError::from(Rejection::insufficient_scope("mcp.example.com", "files:read"))
                .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers()[WWW_AUTHENTICATE],
            r#"Bearer realm="mcp.example.com", error="insufficient_scope", scope="files:read""#
        );
        assert_eq!(body_json(response).await["error"], "insufficient_scope");
    }

    #[test]
    fn test_issue_error_mapping() {
        let missing = ApiError::from(IssueError::MissingResource);
        assert_eq!(missing.status_code, StatusCode::BAD_REQUEST);
        assert_eq!(missing.error, "invalid_request");
        assert_eq!(missing.error_description, "resource parameter is required");

        let rejected = ApiError::from(IssueError::ScopeRejected("files:delete".to_string()));
        assert_eq!(rejected.status_code, StatusCode::BAD_REQUEST);
        assert_eq!(rejected.error, "invalid_scope");

        let overflow = ApiError::from(IssueError::ExpiryOverflow(u64::MAX));
        assert_eq!(overflow.status_code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(overflow.error, "server_error");
        assert_eq!(overflow.error_description, "Failed to issue access token");
    }
}
