//! 查询翻译器
//!
//! 把自然语言问题连同数据集预览和固定的指令一起发给语言模型，
//! 得到一条表格查询表达式。这里只做文本清理，不做语义校验。

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::dataset::Dataset;
use crate::llm::{ChatMessage, LanguageModel, LlmError};

/// 模型输出的表达式规则
pub const INSTRUCTIONS: &str = r#"1. If the query requests information about a single person (e.g. 'give me details of John Doe'), write an expression that starts with `one` so it returns the complete record of that person.
2. If the query asks for a list of people matching some criteria (e.g. 'give a list of people from New York'), write an expression that starts with `all` so it returns the complete record of every matching person. Use `count` only when the query asks how many people match.
3. Write exactly one expression on a single line. No statements, no explanations.
4. Matching ignores case for every column, so copy values as the user wrote them.
5. Only output the final expression without quotation marks or code fences.
6. Expression grammar:
   one|count [where <condition>]
   all [where <condition>] [limit <n>]
   condition: <column> <op> <value>, combined with and / or / not and parentheses
   op: == != contains startswith endswith < <= > >=, or `<column> is null` / `<column> is not null`
   value: a quoted string ("..." or '...'), a number, true or false
   Columns containing ':' may be written bare or in backquotes, e.g. `current_company:name`.
7. The columns in the table are: 'timestamp', 'id', 'name', 'city', 'country_code', 'region', 'current_company:company_id', 'current_company:name', 'position', 'following', 'about', 'posts', 'groups', 'current_company', 'experience', 'url', 'people_also_viewed', 'educations_details', 'education', 'avatar', 'languages', 'certifications', 'recommendations', 'recommendations_count', 'volunteer_experience', 'courses'.
8. Column 'city' refers to where the person is located.
9. Column 'current_company:name' refers to the company.
10. Column 'about' refers to the about section of the person.
11. Column 'experience' refers to the work experience.
12. Column 'url' refers to the LinkedIn profile.
13. Column 'education' refers to the qualifications.
14. Column 'educations_details' refers to the education information.
15. Column 'languages' refers to the language proficiency or languages known.
16. Column 'certifications' refers to the skills or certifications.
17. Column 'recommendations' refers to the recommendations.
Examples:
   give me details of Jane Doe -> one where name == "jane doe"
   list people from Austin working at Acme -> all where city == "austin" and current_company:name contains "acme"
   how many people speak German -> count where languages contains "german""#;

const PROMPT_TEMPLATE: &str = "\
You are working with a table of LinkedIn profiles named `profiles`.
This is the result of printing the first rows of the table:
{preview}

Follow these instructions:
{instructions}

Query: {query}

Expression: ";

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*(.*?)\s*```$").expect("valid regex"));

/// 翻译错误
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("模型没有生成表达式，原始回复: {raw:?}")]
    EmptyExpression { raw: String },
}

/// 模型生成的表格查询表达式（已清理，未校验）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabularExpression(String);

impl TabularExpression {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TabularExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct QueryTranslator {
    model: Arc<dyn LanguageModel>,
    dataset: Arc<Dataset>,
    preview_rows: usize,
}

impl QueryTranslator {
    pub fn new(model: Arc<dyn LanguageModel>, dataset: Arc<Dataset>, preview_rows: usize) -> Self {
        Self {
            model,
            dataset,
            preview_rows,
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// 填充提示词模板
    pub fn build_prompt(&self, query: &str) -> String {
        PROMPT_TEMPLATE
            .replace("{preview}", &self.dataset.preview(self.preview_rows))
            .replace("{instructions}", INSTRUCTIONS)
            .replace("{query}", query.trim())
    }

    pub async fn translate(&self, query: &str) -> Result<TabularExpression, TranslateError> {
        let prompt = self.build_prompt(query);
        let raw = self.model.complete(&[ChatMessage::user(prompt)]).await?;
        let expression = clean_expression(&raw);
        debug!(query = %query, expression = %expression, "Query translated");

        if expression.is_empty() {
            return Err(TranslateError::EmptyExpression { raw });
        }
        Ok(TabularExpression(expression))
    }
}

/// 去掉模型回复中的代码块、标签和外层引号
pub fn clean_expression(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(inner) = CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        text = inner.as_str().trim();
    }

    for label in ["Expression:", "expression:"] {
        if let Some(rest) = text.strip_prefix(label) {
            text = rest.trim();
        }
    }

    // 只取第一行
    text = text.lines().next().unwrap_or("").trim();

    for quote in ['`', '"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            let inner = &text[1..text.len() - 1];
            // 整体被一对引号包住时才剥掉
            if !inner.contains(quote) {
                text = inner.trim();
                break;
            }
        }
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rstest::rstest;

    struct EchoModel {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for EchoModel {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
            self.prompts
                .lock()
                .extend(messages.iter().map(|m| m.content.clone()));
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn translator(reply: &str) -> (QueryTranslator, Arc<EchoModel>) {
        let model = Arc::new(EchoModel {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        });
        let dataset = Dataset::from_reader("name,city\nJane Doe,Austin\n".as_bytes(), "memory").unwrap();
        (
            QueryTranslator::new(model.clone(), Arc::new(dataset), 5),
            model,
        )
    }

    #[rstest]
    #[case("one where name == 'x'", "one where name == 'x'")]
    #[case("  \"all where city == 'austin'\"\n", "all where city == 'austin'")]
    #[case("`all`", "all")]
    #[case("```text\nall where city == \"austin\"\n```", "all where city == \"austin\"")]
    #[case("Expression: count", "count")]
    #[case("all where name == \"a\"\nThis returns everyone named a", "all where name == \"a\"")]
    #[case("'a' == 'b'", "'a' == 'b'")]
    fn test_clean_expression(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean_expression(raw), expected);
    }

    #[tokio::test]
    async fn test_prompt_contains_preview_instructions_and_query() {
        let (translator, model) = translator("one where name == \"jane doe\"");
        let expression = translator.translate("give me details of Jane Doe").await.unwrap();
        assert_eq!(expression.as_str(), "one where name == \"jane doe\"");

        let prompts = model.prompts.lock();
        assert_eq!(prompts.len(), 1);
        let prompt = &prompts[0];
        assert!(prompt.contains("Jane Doe"));
        assert!(prompt.contains("Austin"));
        assert!(prompt.contains("Matching ignores case"));
        assert!(prompt.contains("Query: give me details of Jane Doe"));
        assert!(prompt.trim_end().ends_with("Expression:"));
    }

    #[tokio::test]
    async fn test_blank_reply_is_an_error() {
        let (translator, _) = translator("```\n```");
        let err = translator.translate("anything").await.unwrap_err();
        assert!(matches!(err, TranslateError::EmptyExpression { .. }));
    }
}
