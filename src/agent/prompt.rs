//! Agent 系统提示模板

use crate::tool::ToolMetadata;

/// Agent 的用途说明
pub const AGENT_CONTEXT: &str = "\
Purpose: The primary role of this agent is to assist users by providing accurate and \
comprehensive information about LinkedIn profiles of people. \
The agent should be able to handle complex queries related to any of the fields in the profiles dataset \
and return the complete information of the person or a list of people as JSON-like structures \
based on the query criteria.";

const SYSTEM_PROMPT_TEMPLATE: &str = r#"{context}

## Tools

You have access to the following tools:
{tools}

## Output Format

To answer the question, please use the following format.

```
Thought: I need to use a tool to help me answer the question.
Action: tool name (one of {tool_names}) if using a tool.
Action Input: the input to the tool, in a JSON format representing the kwargs (e.g. {"input": "people from Austin"})
```

Please ALWAYS start with a Thought.

Please use a valid JSON format for the Action Input. Do NOT do this {'input': 'people from Austin'}.

If this format is used, the user will respond in the following format:

```
Observation: tool response
```

You should keep repeating the above format until you have enough information to answer the question without using any more tools. At that point, you MUST respond in one of the following two formats:

```
Thought: I can answer without using any more tools.
Answer: [your answer here]
```

```
Thought: I cannot answer the question with the provided tools.
Answer: Sorry, I cannot answer your query.
```

When the tool returns profile records, include the relevant fields of every returned record in your answer.
"#;

/// 生成系统提示
pub fn system_prompt(tools: &[&ToolMetadata]) -> String {
    let tool_list = tools
        .iter()
        .map(|t| format!("> Tool Name: {}\nTool Description: {}\nTool Args: {{\"input\": \"string\"}}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n\n");
    let tool_names = tools
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    SYSTEM_PROMPT_TEMPLATE
        .replace("{context}", AGENT_CONTEXT)
        .replace("{tools}", &tool_list)
        .replace("{tool_names}", &tool_names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_lists_tools() {
        let metadata = ToolMetadata {
            name: "linkedin_profiles_data".into(),
            description: "profiles".into(),
            return_direct: false,
        };
        let prompt = system_prompt(&[&metadata]);
        assert!(prompt.starts_with("Purpose:"));
        assert!(prompt.contains("> Tool Name: linkedin_profiles_data"));
        assert!(prompt.contains("(one of linkedin_profiles_data)"));
        assert!(!prompt.contains("{tools}"));
    }
}
