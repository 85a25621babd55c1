//! 会话 DTO

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::{HistoryEntry, SessionSnapshot, SessionState};

/// 创建会话响应
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// 会话详情，包括当前状态和全部历史
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub state: SessionState,
    pub history: Vec<HistoryEntry>,
}

impl From<SessionSnapshot> for SessionResponse {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            id: snapshot.id,
            created_at: snapshot.created_at,
            state: snapshot.state,
            history: snapshot.history,
        }
    }
}

/// 历史列表中的一项，只含问题
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryItem {
    pub index: usize,
    pub question: String,
    pub created_at: DateTime<Utc>,
}

impl From<&HistoryEntry> for HistoryItem {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            index: entry.index,
            question: entry.question.clone(),
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryListResponse {
    pub session_id: Uuid,
    pub items: Vec<HistoryItem>,
    pub total: usize,
}
