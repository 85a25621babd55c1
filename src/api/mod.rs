//! API 模块
//!
//! 聊天页面和 REST API。

pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::api::app_state::AppState;
use crate::api::handlers::dataset_handler::{app_script, health_check, index_page, metrics};
use crate::api::middleware::{cors_layer, security_headers_middleware};
use crate::observability::metrics_middleware;

pub fn create_router(app_state: AppState, cors_origins: &[String]) -> Router {
    let api = Router::new()
        .merge(routes::session_routes::create_session_router())
        .merge(routes::dataset_routes::create_dataset_router());

    let router = Router::new()
        .route("/", get(index_page))
        .route("/app.js", get(app_script))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .nest("/api/v1", api)
        .layer(axum::middleware::from_fn_with_state(
            app_state.metrics.clone(),
            metrics_middleware,
        ))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http());

    let router = match cors_layer(cors_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.with_state(app_state)
}
