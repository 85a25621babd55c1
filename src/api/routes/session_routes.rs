//! Session Routes
//!
//! 会话、提问和历史记录的路由。

use crate::api::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

/// 创建会话路由器
pub fn create_session_router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session))
        .route("/sessions/:id/queries", post(submit_query))
        .route("/sessions/:id/history", get(list_history))
        .route("/sessions/:id/history/:index", get(get_history_entry))
}
