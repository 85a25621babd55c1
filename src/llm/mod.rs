//! 语言模型服务
//!
//! 模型被视为不透明的请求/响应服务：输入一组对话消息，返回一段文本。
//! 具体后端由配置中的 `llm.backend` 选择。

pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::config::LlmConfig;
use crate::credential::ApiKey;

pub use gemini::GeminiModel;
pub use openai::OpenAiModel;

/// 语言模型错误
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("模型服务返回 {status}: {body}")]
    Status { status: u16, body: String },

    #[error("模型服务没有返回任何内容")]
    EmptyResponse,

    #[error("模型配置错误: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// 一条对话消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// 发送对话并返回模型的文本回复
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    fn model_name(&self) -> &str;
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()?)
}

/// 读取非 2xx 响应的正文并转换为错误
pub(crate) async fn status_error(response: reqwest::Response) -> LlmError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    LlmError::Status { status, body }
}

pub fn create_language_model(
    config: &LlmConfig,
    api_key: ApiKey,
) -> Result<Arc<dyn LanguageModel>, LlmError> {
    match config.backend.as_str() {
        "gemini" => Ok(Arc::new(GeminiModel::new(config, api_key)?)),
        "openai" => Ok(Arc::new(OpenAiModel::new(config, api_key)?)),
        other => Err(LlmError::Config(format!("unknown backend '{other}'"))),
    }
}
