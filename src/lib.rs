// Library crate for the temporary environment dashboard
// Exports modules for use by the server binary and tests

pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod middlewares;
pub mod models;
pub mod provisioning;
pub mod repositories;
pub mod state;
pub mod workflow;

use axum::{
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handlers::{
    create_environment, delete_environment, health, list_environments, update_test_result,
};
use crate::middlewares::{api_key_middleware, ip_allow_middleware, API_KEY_HEADER};
use crate::state::AppState;

/// Build the application router with the given state
pub fn build_router(state: AppState) -> Router {
    // Dashboard routes (API key and IP allow list)
    let dashboard_routes = Router::new()
        .route(
            "/",
            get(list_environments)
                .post(create_environment)
                .put(update_test_result)
                .delete(delete_environment),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        // Added last so it runs first
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            ip_allow_middleware,
        ));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health))
        .merge(dashboard_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = config.cors_allow_origin.trim();
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origin
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
}
