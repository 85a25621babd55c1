//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod dataset_handler;
pub mod query_handler;
pub mod session_handler;

pub use dataset_handler::*;
pub use query_handler::*;
pub use session_handler::*;

use std::sync::Arc;

use uuid::Uuid;

use crate::api::app_state::AppState;
use crate::error::AppError;
use crate::session::ChatSession;

/// 按路径中的 id 查找会话
pub(crate) fn find_session(state: &AppState, id: &str) -> Result<Arc<ChatSession>, AppError> {
    Uuid::parse_str(id)
        .ok()
        .and_then(|uuid| state.sessions.get(&uuid))
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {}", id)))
}
