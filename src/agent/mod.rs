//! Agent 编排
//!
//! 对外只暴露 [`Orchestrator::answer`]：输入用户问题，输出最终答案。
//! 是否调用查询工具、调用几次、何时停止，都由具体实现决定。

pub mod prompt;
pub mod react;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::config::AgentConfig;
use crate::llm::{LanguageModel, LlmError};
use crate::query::QueryResult;
use crate::tool::{ProfileQueryTool, ToolError};

pub use react::ReActAgent;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("推理步数超过上限 ({0})")]
    MaxIterations(usize),
}

/// 最终答案：自然语言文本，或直接透传的结构化查询结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Answer {
    Text(String),
    Data(QueryResult),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentReply {
    pub answer: Answer,
    /// 最后一次执行的查询表达式
    pub expression: Option<String>,
    /// 调用语言模型的推理步数
    pub steps: usize,
}

#[async_trait]
pub trait Orchestrator: Send + Sync {
    async fn answer(&self, query: &str) -> Result<AgentReply, AgentError>;
}

/// 不经过推理循环，问题直接交给查询工具
pub struct DirectAgent {
    tool: Arc<ProfileQueryTool>,
}

impl DirectAgent {
    pub fn new(tool: Arc<ProfileQueryTool>) -> Self {
        Self { tool }
    }
}

#[async_trait]
impl Orchestrator for DirectAgent {
    async fn answer(&self, query: &str) -> Result<AgentReply, AgentError> {
        let output = self.tool.call(query).await?;
        Ok(AgentReply {
            answer: Answer::Data(output.result),
            expression: Some(output.expression),
            steps: 1,
        })
    }
}

pub fn create_orchestrator(
    config: &AgentConfig,
    model: Arc<dyn LanguageModel>,
    tool: Arc<ProfileQueryTool>,
) -> Arc<dyn Orchestrator> {
    match config.mode.as_str() {
        "direct" => Arc::new(DirectAgent::new(tool)),
        _ => Arc::new(ReActAgent::new(model, tool, config.max_iterations)),
    }
}
