//! 启动装配
//!
//! 按固定顺序加载密钥、数据集并构建 agent。任何一步失败都直接返回
//! [`StartupError`]，此时还没有发出任何语言模型请求。

use std::sync::Arc;

use tracing::info;

use crate::agent::create_orchestrator;
use crate::api::app_state::AppState;
use crate::config::{AppConfig, ConfigLoader};
use crate::credential::load_api_key;
use crate::dataset::loader::load_dataset;
use crate::error::StartupError;
use crate::llm::create_language_model;
use crate::session::SessionStore;
use crate::tool::ProfileQueryTool;
use crate::translator::QueryTranslator;

pub fn bootstrap(config: &AppConfig) -> Result<AppState, StartupError> {
    ConfigLoader::validate(config)?;

    let api_key = load_api_key(&config.data.credential_path)?;
    info!(path = %config.data.credential_path.display(), "Credential loaded");

    let dataset = Arc::new(load_dataset(&config.data.dataset_path)?);

    let model = create_language_model(&config.llm, api_key)?;
    info!(
        backend = %config.llm.backend,
        model = %model.model_name(),
        "Language model client initialized"
    );

    let translator = QueryTranslator::new(model.clone(), dataset.clone(), config.agent.preview_rows);
    let tool = Arc::new(ProfileQueryTool::new(translator, config.agent.return_direct));
    let orchestrator = create_orchestrator(&config.agent, model.clone(), tool);
    info!(
        mode = %config.agent.mode,
        max_iterations = config.agent.max_iterations,
        return_direct = config.agent.return_direct,
        "Agent initialized"
    );

    Ok(AppState::new(
        dataset,
        orchestrator,
        SessionStore::new(config.session.max_sessions),
        model.model_name(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn config_with(dir: &TempDir, credential: Option<&str>, dataset: Option<&str>) -> AppConfig {
        let mut config = AppConfig::default();
        config.data.credential_path = dir.path().join("key.txt");
        config.data.dataset_path = dir.path().join("profiles.csv");
        if let Some(key) = credential {
            std::fs::write(&config.data.credential_path, key).unwrap();
        }
        if let Some(csv) = dataset {
            std::fs::write(&config.data.dataset_path, csv).unwrap();
        }
        config
    }

    #[test]
    fn test_missing_credential_halts() {
        let dir = TempDir::new().unwrap();
        let config = config_with(&dir, None, Some("name,city\nJane Doe,Austin\n"));

        assert!(matches!(
            bootstrap(&config),
            Err(StartupError::MissingCredential { .. })
        ));
    }

    #[test]
    fn test_missing_dataset_halts() {
        let dir = TempDir::new().unwrap();
        let config = config_with(&dir, Some("secret"), None);

        assert!(matches!(
            bootstrap(&config),
            Err(StartupError::MissingDataset { .. })
        ));
    }

    #[test]
    fn test_invalid_config_halts_before_loading_files() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "secret").unwrap();
        let mut config = AppConfig::default();
        config.data.credential_path = file.path().to_path_buf();
        config.agent.max_iterations = 0;

        assert!(matches!(bootstrap(&config), Err(StartupError::Config(_))));
    }

    #[test]
    fn test_bootstrap_builds_state() {
        let dir = TempDir::new().unwrap();
        let config = config_with(
            &dir,
            Some("secret\n"),
            Some("name,city\nJane Doe,Austin\nJohn Roe,Austin\n"),
        );

        let state = bootstrap(&config).unwrap();
        assert_eq!(state.dataset.len(), 2);
        assert_eq!(state.model_name, "gemini-2.5-flash");
        assert!(state.sessions.is_empty());
    }
}
