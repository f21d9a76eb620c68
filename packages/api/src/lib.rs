use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use middleware::jwt::jwt_middleware;
use state::State;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, decompression::RequestDecompressionLayer,
};

pub mod entity;
mod middleware;
mod routes;

pub mod config;
pub mod error;
pub mod gallery_access;
pub mod openapi;
pub mod orders;
pub mod payment;
pub mod schema;
pub mod state;
pub mod validation;

pub use axum;
pub mod auth {
    use crate::middleware;
    pub use middleware::jwt::{AppUser, Claims};
}

pub use sea_orm;

pub fn construct_router(state: Arc<State>) -> Router {
    let upload_limit = state.config.max_upload_request_size;

    let router = Router::new()
        .nest("/health", routes::health::routes())
        .nest("/gallery-by-code", routes::client::routes())
        .nest("/galleries", routes::galleries::routes())
        .route(
            "/upload",
            post(routes::upload::upload_images).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/checkout", post(routes::checkout::checkout))
        .route("/webhook/stripe", post(routes::webhook::stripe_webhook))
        .route("/openapi.json", get(openapi::openapi_json))
        .with_state(state.clone())
        .layer(from_fn_with_state(state.clone(), jwt_middleware))
        .layer(CorsLayer::permissive())
        .layer(
            ServiceBuilder::new()
                .layer(RequestDecompressionLayer::new())
                .layer(CompressionLayer::new()),
        );

    Router::new().nest("/api/v1", router)
}
