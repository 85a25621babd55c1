use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse},
};

use crate::{
    api::{app_state::AppState, dto::dataset_dto::*},
    observability::HealthStatus,
};

const INDEX_HTML: &str = include_str!("../ui/index.html");
const APP_JS: &str = include_str!("../ui/app.js");

/// 聊天页面
pub async fn index_page() -> impl IntoResponse {
    Html(INDEX_HTML)
}

pub async fn app_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        APP_JS,
    )
}

pub async fn dataset_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(DatasetInfoResponse {
        source: state.dataset.source().display().to_string(),
        rows: state.dataset.len(),
        columns: state.dataset.columns().to_vec(),
    })
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthStatus::healthy(
        &state.version,
        state.started_at,
        &state.model_name,
        state.dataset.len(),
        state.sessions.len(),
    ))
}

/// Prometheus 指标端点
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.gather(state.sessions.len()),
    )
}
