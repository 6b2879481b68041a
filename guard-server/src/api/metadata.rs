//! Discovery documents for the authorization server and the protected resource

use crate::headers::presets;
use crate::keys::Jwk;
use crate::openapi::METADATA_TAG;
use crate::state::AppState;
use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

const METADATA_MAX_AGE: u32 = 300;

/// Authorization server metadata (RFC 8414)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AuthorizationServerMetadata {
    pub issuer: String,
    pub token_endpoint: String,
    pub jwks_uri: String,
    pub grant_types_supported: Vec<String>,
    pub token_endpoint_auth_methods_supported: Vec<String>,
}

/// JSON Web Key Set (RFC 7517)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// Protected resource metadata (RFC 9728)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProtectedResourceMetadata {
    pub resource_server: String,
    pub resource: String,
    pub authorization_servers: Vec<String>,
    pub scopes_supported: Vec<String>,
    pub bearer_methods_supported: Vec<String>,
}

fn cacheable(body: impl Serialize) -> Response {
    let mut response = Json(body).into_response();
    presets::public_cache(METADATA_MAX_AGE).apply(&mut response);
    response
}

#[utoipa::path(
    get,
    path = "/.well-known/oauth-authorization-server",
    tag = METADATA_TAG,
    responses(
        (status = 200, description = "Authorization server metadata", body = AuthorizationServerMetadata)
    )
)]
pub(super) async fn authorization_server_metadata(State(state): State<AppState>) -> Response {
    let oauth = &state.config.oauth;
    cacheable(AuthorizationServerMetadata {
        issuer: oauth.issuer.clone(),
        token_endpoint: oauth.token_endpoint(),
        jwks_uri: oauth.jwks_uri(),
        grant_types_supported: vec!["client_credentials".to_string()],
        token_endpoint_auth_methods_supported: vec!["none".to_string()],
    })
}

#[utoipa::path(
    get,
    path = "/.well-known/jwks.json",
    tag = METADATA_TAG,
    responses(
        (status = 200, description = "Public keys used to verify access tokens", body = JwkSet)
    )
)]
pub(super) async fn jwks(State(state): State<AppState>) -> Response {
    cacheable(JwkSet {
        keys: vec![state.keys.jwk().clone()],
    })
}

#[utoipa::path(
    get,
    path = "/.well-known/protected-resource",
    tag = METADATA_TAG,
    responses(
        (status = 200, description = "Protected resource metadata", body = ProtectedResourceMetadata)
    )
)]
pub(super) async fn protected_resource_metadata(State(state): State<AppState>) -> Response {
    let resource = &state.config.resource;
    cacheable(ProtectedResourceMetadata {
        resource_server: resource.uri.clone(),
        resource: resource.uri.clone(),
        authorization_servers: vec![resource.trusted_issuer.clone()],
        scopes_supported: state.registry.scopes_supported(),
        bearer_methods_supported: vec!["header".to_string()],
    })
}

/// Routes served by the authorization server
pub(super) fn authorization_server_router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(authorization_server_metadata))
        .routes(routes!(jwks))
}

/// Routes served by the resource server
pub(super) fn resource_router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(protected_resource_metadata))
        .route(
            "/.well-known/oauth-protected-resource",
            get(protected_resource_metadata),
        )
}
