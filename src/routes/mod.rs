//! Router assembly.

pub mod common;
pub mod inventory;
pub mod user;

pub use common::common_routes;
pub use inventory::inventory_routes;
pub use user::user_routes;

use crate::config::AppConfig;
use crate::state::AppState;
use axum::http::{header, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::map_response_body::MapResponseBodyLayer;
use tower_http::trace::TraceLayer;

pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.allowed_origin_headers()))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// The full application: common routes, inventory and user APIs, CORS, body limit and
/// request tracing.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api/inventory", inventory_routes(state.clone()))
        .nest("/api/user", user_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config))
                .layer(MapResponseBodyLayer::new(axum::body::Body::new))
                .layer(RequestBodyLimitLayer::new(config.body_limit_bytes)),
        )
}
