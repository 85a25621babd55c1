//! 错误处理模块
//!
//! 定义应用程序的错误类型和错误处理逻辑。
//!
//! 启动阶段的错误（[`StartupError`]）会让进程在接受任何查询前退出；
//! 单次查询的错误（[`AppError`]）在 HTTP 边界渲染给用户，不写入历史。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::agent::AgentError;
use crate::llm::LlmError;
use crate::query::QueryError;
use crate::session::SessionError;
use crate::tool::ToolError;
use crate::translator::TranslateError;

/// 启动错误，出现即终止进程
#[derive(Error, Debug)]
pub enum StartupError {
    /// 找不到 API 密钥文件，或文件为空
    #[error("API 密钥文件 '{}' 不存在或为空，请先创建", path.display())]
    MissingCredential { path: PathBuf },

    /// 找不到数据集文件
    #[error("数据文件不存在: {}", path.display())]
    MissingDataset { path: PathBuf },

    /// 数据集解析失败
    #[error("数据文件解析失败 '{}': {source}", path.display())]
    DatasetParse {
        path: PathBuf,
        #[source]
        source: crate::dataset::DatasetError,
    },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 语言模型客户端初始化失败
    #[error("语言模型客户端初始化失败: {0}")]
    Llm(#[from] LlmError),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for StartupError {
    fn from(e: figment::Error) -> Self {
        StartupError::Config(e.to_string())
    }
}

impl From<crate::config::loader::ConfigValidationError> for StartupError {
    fn from(e: crate::config::loader::ConfigValidationError) -> Self {
        StartupError::Config(e.to_string())
    }
}

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 资源不存在
    #[error("资源不存在: {0}")]
    NotFound(String),

    /// 参数验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    /// 会话正在处理另一个查询
    #[error("会话正忙: {0}")]
    Busy(String),

    /// 查询表达式无法解析或执行
    #[error("查询失败: {0}")]
    Query(String),

    /// 语言模型服务错误
    #[error("语言模型服务错误: {0}")]
    Upstream(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        AppError::Query(e.to_string())
    }
}

impl From<TranslateError> for AppError {
    fn from(e: TranslateError) -> Self {
        match e {
            TranslateError::Llm(inner) => inner.into(),
            other => AppError::Query(other.to_string()),
        }
    }
}

impl From<ToolError> for AppError {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::Translate(inner) => inner.into(),
            other => AppError::Query(other.to_string()),
        }
    }
}

impl From<AgentError> for AppError {
    fn from(e: AgentError) -> Self {
        match e {
            AgentError::Llm(inner) => inner.into(),
            AgentError::Tool(inner) => inner.into(),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        let message = e.to_string();
        match e {
            SessionError::EmptyQuery => AppError::Validation(message),
            SessionError::Busy { .. } => AppError::Busy(message),
            SessionError::HistoryIndex { .. } => AppError::NotFound(message),
            SessionError::Agent(inner) => inner.into(),
        }
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let body = Json(ErrorResponse::new(&code, &self.to_string()));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,
    /// 错误消息
    pub message: String,
    /// 详细信息
    pub details: Option<String>,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        }
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::NotFound(_) => (404, "NOT_FOUND".to_string()),
            AppError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            AppError::Busy(_) => (409, "BUSY".to_string()),
            AppError::Query(_) => (422, "QUERY_FAILED".to_string()),
            AppError::Upstream(_) => (502, "UPSTREAM_ERROR".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;
