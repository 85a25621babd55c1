//! Jobbot - 人员档案问答机器人
//!
//! 用户在网页聊天界面中用自然语言提问，agent 借助语言模型把问题翻译成
//! 受限的表格查询表达式，在内存中的档案数据集上执行并返回结果。
//! 每个会话的问答历史只保存在内存中。

pub mod agent;
pub mod api;
pub mod bootstrap;
pub mod config;
pub mod credential;
pub mod dataset;
pub mod error;
pub mod llm;
pub mod observability;
pub mod query;
pub mod session;
pub mod tool;
pub mod translator;
