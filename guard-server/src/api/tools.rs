use crate::authz::Rejection;
use crate::errors::{ApiError, ErrorBody};
use crate::openapi::TOOLS_TAG;
use crate::state::AppState;
use crate::tools::{Elicitation, ExecutionOutcome};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ToolSummary {
    pub name: String,
    pub description: String,
}

/// Tools the caller holds the scope for
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ToolListResponse {
    pub tools: Vec<ToolSummary>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ToolCallRequest {
    #[serde(default)]
    pub tool_name: Option<String>,
    /// Arbitrary tool parameters, passed to the sandbox unchanged
    #[serde(default)]
    #[schema(value_type = Object)]
    pub params: Value,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub(crate) enum ToolCallResponse {
    Success {
        #[schema(value_type = Object)]
        result: Value,
    },
    PausedForConfirmation {
        elicitation: Elicitation,
    },
    Error {
        error: String,
        message: String,
    },
}

#[utoipa::path(
    get,
    path = "/tools/list",
    tag = TOOLS_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Tools available to the caller", body = ToolListResponse),
        (status = 401, description = "Missing, invalid or foreign token", body = ErrorBody)
    )
)]
pub(super) async fn list_tools(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ToolListResponse>, ApiError> {
    let principal = state.gate.authorize_headers(&headers, None).into_result()?;

    let tools = state
        .registry
        .list_for(&principal.scopes)
        .map(|tool| ToolSummary {
            name: tool.name.clone(),
            description: tool.description.clone(),
        })
        .collect();

    Ok(Json(ToolListResponse { tools }))
}

#[utoipa::path(
    post,
    path = "/tools/call",
    tag = TOOLS_TAG,
    request_body = ToolCallRequest,
    params(
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Tool executed, or paused for confirmation", body = ToolCallResponse),
        (status = 400, description = "Malformed request body", body = ErrorBody),
        (status = 401, description = "Missing, invalid or foreign token", body = ErrorBody),
        (status = 403, description = "Token lacks the tool's scope", body = ErrorBody),
        (status = 404, description = "Unknown tool", body = ErrorBody),
        (status = 500, description = "Sandbox execution failed", body = ToolCallResponse)
    )
)]
pub(super) async fn call_tool(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ToolCallRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let principal = state.gate.authorize_headers(&headers, None).into_result()?;
    let Json(request) = payload?;

    let outcome = state
        .controller
        .invoke(&principal, request.tool_name.as_deref(), &request.params)
        .await;

    let response = match outcome {
        ExecutionOutcome::Success(result) => {
            (StatusCode::OK, Json(ToolCallResponse::Success { result })).into_response()
        }
        ExecutionOutcome::PendingConfirmation(elicitation) => (
            StatusCode::OK,
            Json(ToolCallResponse::PausedForConfirmation { elicitation }),
        )
            .into_response(),
        ExecutionOutcome::ScopeDenied { missing_scope, .. } => {
            return Err(Rejection::insufficient_scope(state.gate.realm(), &missing_scope).into())
        }
        ExecutionOutcome::ToolNotFound { name } => return Err(ApiError::tool_not_found(&name)),
        ExecutionOutcome::SandboxError { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ToolCallResponse::Error {
                error: "sandbox_error".to_string(),
                message,
            }),
        )
            .into_response(),
    };
    Ok(response)
}

pub(super) fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_tools))
        .routes(routes!(call_tool))
}
