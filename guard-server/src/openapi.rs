use crate::state::AppState;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const OAUTH_TAG: &str = "Authorization Server";
pub(crate) const METADATA_TAG: &str = "Discovery";
pub(crate) const TOOLS_TAG: &str = "Tools API";

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = OAUTH_TAG, description = "Audience-bound access token issuance"),
        (name = METADATA_TAG, description = "Authorization server and protected resource metadata"),
        (name = TOOLS_TAG, description = "Scope-gated tool listing and invocation"),
    ),
    info(
        title = "Audience Guard API",
        description = "Resource-indicator bound token issuance and scope-gated tool execution",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;

/// Creates a router serving the generated document and its interactive viewer
pub(crate) fn router(api_doc: utoipa::openapi::OpenApi) -> Router<AppState> {
    let document = api_doc.clone();
    Router::new()
        .route(
            "/openapi.json",
            get(move || {
                let document = document.clone();
                async move { Json(document) }
            }),
        )
        .merge(Scalar::with_url("/scalar", api_doc))
}
