//! 问答 DTO

use serde::{Deserialize, Serialize};

use crate::session::HistoryEntry;

/// 提交问题请求
#[derive(Debug, Deserialize)]
pub struct SubmitQueryRequest {
    pub query: String,
}

/// 提交问题响应，`entry` 与写入历史的记录相同
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitQueryResponse {
    pub entry: HistoryEntry,
    pub elapsed_ms: u64,
}
