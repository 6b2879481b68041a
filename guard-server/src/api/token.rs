use crate::errors::{ApiError, ErrorBody};
use crate::headers::presets;
use crate::oauth::IssuedToken;
use crate::openapi::OAUTH_TAG;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use log::warn;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Access token request. `resource` is the RFC 8707 resource indicator.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub(crate) struct TokenRequest {
    /// URI of the resource server the token is for
    #[serde(default)]
    pub resource: Option<String>,
    /// Requested scopes (space-separated)
    #[serde(default)]
    pub scope: Option<String>,
}

/// Access token response (RFC 6749 section 5.1)
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
    /// Granted scopes (space-separated)
    pub scope: String,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            access_token: issued.access_token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            scope: issued.scope,
        }
    }
}

#[utoipa::path(
    post,
    path = "/token",
    tag = OAUTH_TAG,
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Access token bound to the requested resource", body = TokenResponse),
        (status = 400, description = "Missing resource or malformed request", body = ErrorBody),
        (status = 500, description = "Signing failure", body = ErrorBody)
    )
)]
pub(super) async fn token_handler(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Response {
    let result = payload.map_err(ApiError::from).and_then(|Json(request)| {
        state
            .issuer
            .issue(request.resource.as_deref(), request.scope.as_deref())
            .map_err(ApiError::from)
    });

    let mut response = match result {
        Ok(issued) => (StatusCode::OK, Json(TokenResponse::from(issued))).into_response(),
        Err(err) => {
            // 5xx causes are logged when converted into ApiError
            if err.status_code.is_client_error() {
                warn!("Token request rejected: {}", err.error_description);
            }
            err.into_response()
        }
    };
    presets::no_store().apply(&mut response);
    response
}

pub(super) fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(token_handler))
}
