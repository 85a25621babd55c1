//! 只追加的问答历史

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::Answer;

/// 一次完成的问答
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 在会话中的序号，从 0 开始
    pub index: usize,
    pub id: Uuid,
    pub question: String,
    pub answer: Answer,
    /// 生成该答案时执行的查询表达式
    pub expression: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 会话历史，只能追加，不能修改或删除
#[derive(Debug, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        question: impl Into<String>,
        answer: Answer,
        expression: Option<String>,
    ) -> HistoryEntry {
        let entry = HistoryEntry {
            index: self.entries.len(),
            id: Uuid::new_v4(),
            question: question.into(),
            answer,
            expression,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        entry
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
