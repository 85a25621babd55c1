//! 表格查询语言
//!
//! 模型生成的查询不会被当作通用代码执行，而是写成一门受限的小语言，
//! 由本模块的解释器求值：
//!
//! ```text
//! one where name == "Jane Doe"
//! all where city == "austin" and `current_company:name` contains "acme" limit 20
//! count where recommendations_count >= 3
//! ```
//!
//! - `one` 返回第一条匹配记录，`all` 返回记录列表，`count` 返回数量
//! - 比较运算：`==` `!=` `contains` `startswith` `endswith` `<` `<=` `>` `>=`
//! - 组合：`and` / `or` / `not` / 括号；空值检查：`is null` / `is not null`
//! - 文本比较一律忽略大小写

pub mod ast;
pub mod executor;
pub mod parser;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::ProfileRecord;

pub use ast::Expression;
pub use executor::{evaluate, execute};
pub use parser::parse;

/// 查询错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("表达式为空")]
    EmptyExpression,

    #[error("表达式语法错误（位置 {offset}）: {message}")]
    Parse { offset: usize, message: String },

    #[error("未知列 '{field}'，可用列: {available}")]
    UnknownField { field: String, available: String },
}

impl QueryError {
    pub fn parse(offset: usize, message: impl Into<String>) -> Self {
        QueryError::Parse {
            offset,
            message: message.into(),
        }
    }
}

/// 查询结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum QueryResult {
    /// 单个人员的完整档案
    Record(ProfileRecord),
    /// 满足条件的人员列表
    Records(Vec<ProfileRecord>),
    /// `one` 查询没有匹配
    NotFound,
    /// `count` 查询的结果
    Count(usize),
}

impl QueryResult {
    /// 用于日志的简短描述
    pub fn summary(&self) -> String {
        match self {
            QueryResult::Record(_) => "1 record".to_string(),
            QueryResult::Records(rows) => format!("{} records", rows.len()),
            QueryResult::NotFound => "no match".to_string(),
            QueryResult::Count(n) => format!("count {n}"),
        }
    }

    /// 以 JSON 文本呈现，供 agent 作为观察结果
    pub fn to_pretty_json(&self) -> String {
        let value = match self {
            QueryResult::Record(row) => serde_json::to_value(row),
            QueryResult::Records(rows) => serde_json::to_value(rows),
            QueryResult::NotFound => Ok(serde_json::Value::Null),
            QueryResult::Count(n) => Ok(serde_json::Value::from(*n)),
        };
        value
            .and_then(|v| serde_json::to_string_pretty(&v))
            .unwrap_or_else(|_| self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_serialization_is_tagged() {
        let record: ProfileRecord = [("name", json!("Jane Doe"))].into_iter().collect();
        assert_eq!(
            serde_json::to_value(QueryResult::Record(record)).unwrap(),
            json!({"kind": "record", "value": {"name": "Jane Doe"}})
        );
        assert_eq!(
            serde_json::to_value(QueryResult::NotFound).unwrap(),
            json!({"kind": "not_found"})
        );
        assert_eq!(
            serde_json::to_value(QueryResult::Count(2)).unwrap(),
            json!({"kind": "count", "value": 2})
        );
    }

    #[test]
    fn test_pretty_json_observation() {
        let record: ProfileRecord = [("city", json!("Austin"))].into_iter().collect();
        let text = QueryResult::Records(vec![record]).to_pretty_json();
        assert!(text.starts_with('['));
        assert!(text.contains("\"city\": \"Austin\""));
        assert_eq!(QueryResult::NotFound.to_pretty_json(), "null");
    }
}
