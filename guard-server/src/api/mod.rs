pub(crate) mod health;
pub(crate) mod metadata;
pub(crate) mod token;
pub(crate) mod tools;

use crate::state::AppState;
use log::warn;
use utoipa_axum::router::OpenApiRouter;

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> OpenApiRouter<AppState> {
    let root = OpenApiRouter::new()
        .merge(health::router())
        .merge(metadata::resource_router())
        .merge(tools::router());

    if state.config.oauth.enabled {
        root.merge(token::router())
            .merge(metadata::authorization_server_router())
    } else {
        warn!("Authorization server routes are disabled");
        root
    }
}
