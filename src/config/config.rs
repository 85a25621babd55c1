use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 允许跨域的来源（为空则不启用 CORS）
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8501,
            cors_origins: Vec::new(),
        }
    }
}

/// 数据文件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// 人员档案 CSV 路径
    pub dataset_path: PathBuf,
    /// API 密钥文件路径
    pub credential_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("data/profiles.csv"),
            credential_path: PathBuf::from("key.txt"),
        }
    }
}

/// 语言模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// 后端类型: "gemini" 或 "openai"
    pub backend: String,
    /// 模型名称
    pub model: String,
    /// 服务地址（为空时使用后端默认地址）
    pub base_url: Option<String>,
    /// 请求超时（秒）
    pub timeout_secs: u64,
    /// 采样温度
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: "gemini".into(),
            model: "gemini-2.5-flash".into(),
            base_url: None,
            timeout_secs: 60,
            temperature: 0.0,
        }
    }
}

/// Agent 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// 运行模式: "react" 或 "direct"
    pub mode: String,
    /// 推理循环最大步数
    pub max_iterations: usize,
    /// 提示词中展示的样例行数
    pub preview_rows: usize,
    /// 工具结果是否直接作为最终答案返回
    pub return_direct: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mode: "react".into(),
            max_iterations: 10,
            preview_rows: 5,
            return_direct: false,
        }
    }
}

/// 会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 内存中保留的最大会话数
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_sessions: 1000 }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            structured: false,
            log_dir: None,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 数据文件配置
    pub data: DataConfig,
    /// 语言模型配置
    pub llm: LlmConfig,
    /// Agent 配置
    pub agent: AgentConfig,
    /// 会话配置
    pub session: SessionConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 应用名称
    pub app_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            data: DataConfig::default(),
            llm: LlmConfig::default(),
            agent: AgentConfig::default(),
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
            app_name: "jobbot".into(),
        }
    }
}

impl AppConfig {
    /// 监听地址
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
