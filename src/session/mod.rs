//! 聊天会话：问答历史、单请求状态机和会话表

pub mod history;
pub mod state;
pub mod store;

use thiserror::Error;

use crate::agent::AgentError;

pub use history::{HistoryEntry, HistoryLog};
pub use state::{ChatSession, SessionSnapshot, SessionState};
pub use store::SessionStore;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("查询内容不能为空")]
    EmptyQuery,

    #[error("上一个问题仍在处理中: {pending}")]
    Busy { pending: String },

    #[error("历史记录 {index} 不存在 (共 {len} 条)")]
    HistoryIndex { index: usize, len: usize },

    #[error(transparent)]
    Agent(#[from] AgentError),
}
