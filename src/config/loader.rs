use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "JOBBOT_";

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "JOBBOT_CONFIG";

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 加载顺序（后者覆盖前者）：
    /// 1. 内置默认值
    /// 2. `$JOBBOT_CONFIG` 指向的文件，否则 ./jobbot.toml
    /// 3. `JOBBOT_` 前缀的环境变量，层级用 `__` 分隔
    pub fn load() -> Result<AppConfig, figment::Error> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path());
        Self::load_from(&path)
    }

    /// 从指定路径加载配置
    pub fn load_from(path: &Path) -> Result<AppConfig, figment::Error> {
        Self::figment(path).extract()
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__"))
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if !matches!(config.llm.backend.as_str(), "gemini" | "openai") {
            return Err(ConfigValidationError::UnknownBackend(
                config.llm.backend.clone(),
            ));
        }

        if config.llm.model.trim().is_empty() {
            return Err(ConfigValidationError::MissingModel);
        }

        if !matches!(config.agent.mode.as_str(), "react" | "direct") {
            return Err(ConfigValidationError::UnknownAgentMode(
                config.agent.mode.clone(),
            ));
        }

        if config.agent.max_iterations == 0 {
            return Err(ConfigValidationError::InvalidMaxIterations);
        }

        if config.session.max_sessions == 0 {
            return Err(ConfigValidationError::InvalidMaxSessions);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("未知的语言模型后端: {0}")]
    UnknownBackend(String),

    #[error("语言模型名称未配置")]
    MissingModel,

    #[error("未知的 agent 模式: {0}")]
    UnknownAgentMode(String),

    #[error("推理步数上限必须大于 0")]
    InvalidMaxIterations,

    #[error("会话数上限必须大于 0")]
    InvalidMaxSessions,
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("jobbot.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = ConfigLoader::load_from(Path::new("/nonexistent/jobbot.toml")).unwrap();
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.llm.backend, "gemini");
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.agent.max_iterations, 10);
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[llm]\nbackend = \"openai\"\nmodel = \"gpt-4o-mini\"\n\n[agent]\nmode = \"direct\""
        )
        .unwrap();

        let config = ConfigLoader::load_from(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.llm.backend, "openai");
        assert_eq!(config.agent.mode, "direct");
        assert_eq!(config.agent.preview_rows, 5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidPort)
        );

        let mut config = AppConfig::default();
        config.llm.backend = "bard".into();
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::UnknownBackend("bard".into()))
        );

        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidMaxIterations)
        );
    }
}
