//! ReAct 推理循环
//!
//! 每一步调用一次语言模型，按 Thought / Action / Action Input / Answer
//! 的文本协议解析回复。工具结果以 `Observation:` 消息回填，直到模型给出
//! 最终答案或达到步数上限。

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::agent::prompt::system_prompt;
use crate::agent::{AgentError, AgentReply, Answer, Orchestrator};
use crate::llm::{ChatMessage, LanguageModel};
use crate::tool::ProfileQueryTool;

static ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Action:\s*(?P<tool>[^\n]+?)\s*\n+\s*Action Input:\s*(?P<input>.*)")
        .expect("valid regex")
});

static ANSWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)Answer:\s*(?P<answer>.*)").expect("valid regex"));

/// 解析出的一步推理
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Action { tool: String, input: String },
    Answer(String),
}

/// 解析模型回复，Action 优先于 Answer
pub fn parse_step(reply: &str) -> Step {
    // 模型有时会自己编造观察结果，截掉
    let reply = reply.split("Observation:").next().unwrap_or(reply).trim();

    if !reply.contains("Thought:") && !reply.contains("Action:") {
        return Step::Answer(reply.to_string());
    }

    if let Some(caps) = ACTION.captures(reply) {
        let tool = caps["tool"].trim().trim_matches('`').to_string();
        let input = caps["input"]
            .split("\nAnswer:")
            .next()
            .and_then(|s| s.split("\nThought:").next())
            .unwrap_or_default();
        let input = action_input(input.trim());
        return Step::Action { tool, input };
    }

    if let Some(caps) = ANSWER.captures(reply) {
        return Step::Answer(caps["answer"].trim().to_string());
    }

    Step::Answer(reply.to_string())
}

/// 取出 Action Input 中的问题文本：`{"input": ".."}`、JSON 字符串或原文
fn action_input(raw: &str) -> String {
    let raw = raw
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => map
            .get("input")
            .or_else(|| map.values().next())
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| raw.to_string()),
        Ok(serde_json::Value::String(s)) => s,
        _ => raw.to_string(),
    }
}

pub struct ReActAgent {
    model: Arc<dyn LanguageModel>,
    tool: Arc<ProfileQueryTool>,
    max_iterations: usize,
}

impl ReActAgent {
    pub fn new(model: Arc<dyn LanguageModel>, tool: Arc<ProfileQueryTool>, max_iterations: usize) -> Self {
        Self {
            model,
            tool,
            max_iterations,
        }
    }
}

#[async_trait]
impl Orchestrator for ReActAgent {
    async fn answer(&self, query: &str) -> Result<AgentReply, AgentError> {
        let started = Instant::now();
        let metadata = self.tool.metadata();
        let mut messages = vec![
            ChatMessage::system(system_prompt(&[metadata])),
            ChatMessage::user(query),
        ];
        let mut last_expression = None;

        for step in 1..=self.max_iterations {
            let reply = self.model.complete(&messages).await?;
            debug!(step, reply = %reply, "Agent step");

            match parse_step(&reply) {
                Step::Answer(text) => {
                    info!(
                        steps = step,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Agent answered"
                    );
                    return Ok(AgentReply {
                        answer: Answer::Text(text),
                        expression: last_expression,
                        steps: step,
                    });
                }
                Step::Action { tool, input } => {
                    messages.push(ChatMessage::assistant(reply.trim()));

                    let observation = if tool == metadata.name {
                        let output = self.tool.call(&input).await?;
                        if metadata.return_direct {
                            info!(steps = step, "Returning tool output directly");
                            return Ok(AgentReply {
                                answer: Answer::Data(output.result),
                                expression: Some(output.expression),
                                steps: step,
                            });
                        }
                        let observation = output.observation();
                        last_expression = Some(output.expression);
                        observation
                    } else {
                        warn!(tool = %tool, "Agent requested unknown tool");
                        format!(
                            "Error: there is no tool named '{tool}'. Available tools: {}",
                            metadata.name
                        )
                    };

                    messages.push(ChatMessage::user(format!("Observation: {observation}")));
                }
            }
        }

        Err(AgentError::MaxIterations(self.max_iterations))
    }
}
