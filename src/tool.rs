//! 人员档案查询工具
//!
//! 把翻译器和解释器组合成 agent 可以调用的一个工具。

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::query::{self, QueryError, QueryResult};
use crate::translator::{QueryTranslator, TranslateError};

pub const PROFILE_TOOL_NAME: &str = "linkedin_profiles_data";

pub const PROFILE_TOOL_DESCRIPTION: &str = "This tool provides information about LinkedIn profiles based on their city and other attributes. \
Use this tool for any query involving the LinkedIn people profiles dataset. \
Input is the question in plain English; output is the matching profile record(s) as JSON.";

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("查询翻译失败: {0}")]
    Translate(#[from] TranslateError),

    #[error("表达式 `{expression}` 执行失败: {source}")]
    Query {
        expression: String,
        #[source]
        source: QueryError,
    },
}

/// 工具元数据，出现在 agent 的系统提示中
#[derive(Debug, Clone, Serialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    /// 为真时 agent 直接把工具结果作为最终答案
    pub return_direct: bool,
}

/// 一次工具调用的输出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    pub expression: String,
    pub result: QueryResult,
}

impl ToolOutput {
    /// agent 记录中的观察文本
    pub fn observation(&self) -> String {
        self.result.to_pretty_json()
    }
}

pub struct ProfileQueryTool {
    metadata: ToolMetadata,
    translator: QueryTranslator,
}

impl ProfileQueryTool {
    pub fn new(translator: QueryTranslator, return_direct: bool) -> Self {
        Self {
            metadata: ToolMetadata {
                name: PROFILE_TOOL_NAME.to_string(),
                description: PROFILE_TOOL_DESCRIPTION.to_string(),
                return_direct,
            },
            translator,
        }
    }

    pub fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    /// 翻译问题并在数据集上执行
    pub async fn call(&self, input: &str) -> Result<ToolOutput, ToolError> {
        let expression = self.translator.translate(input).await?.into_string();
        let result = query::execute(self.translator.dataset(), &expression).map_err(|source| ToolError::Query {
            expression: expression.clone(),
            source,
        })?;

        info!(
            tool = %self.metadata.name,
            expression = %expression,
            result = %result.summary(),
            "Profile query executed"
        );
        Ok(ToolOutput { expression, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::llm::{ChatMessage, LanguageModel, LlmError};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedModel(&'static str);

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn tool(reply: &'static str) -> ProfileQueryTool {
        let csv = "name,city\nJane Doe,Austin\nJohn Roe,Austin\nAnn Poe,Dallas\n";
        let dataset = Arc::new(Dataset::from_reader(csv.as_bytes(), "memory").unwrap());
        let translator = QueryTranslator::new(Arc::new(FixedModel(reply)), dataset, 5);
        ProfileQueryTool::new(translator, false)
    }

    #[tokio::test]
    async fn test_call_returns_expression_and_result() {
        let output = tool("all where city == 'AUSTIN'")
            .call("list people from Austin")
            .await
            .unwrap();
        assert_eq!(output.expression, "all where city == 'AUSTIN'");
        match &output.result {
            QueryResult::Records(rows) => assert_eq!(rows.len(), 2),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(output.observation().contains("John Roe"));
    }

    #[tokio::test]
    async fn test_non_conforming_expression_fails() {
        let err = tool("df[df['city'].str.lower() == 'austin']")
            .call("list people from Austin")
            .await
            .unwrap_err();
        match err {
            ToolError::Query { expression, source } => {
                assert!(expression.starts_with("df["));
                assert!(matches!(source, QueryError::Parse { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_metadata() {
        let tool = tool("all");
        assert_eq!(tool.metadata().name, "linkedin_profiles_data");
        assert!(!tool.metadata().return_direct);
    }
}
