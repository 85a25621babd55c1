use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::agent::Orchestrator;
use crate::dataset::Dataset;
use crate::observability::AppMetrics;
use crate::session::SessionStore;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Profile table, read-only after startup
    pub dataset: Arc<Dataset>,
    /// Agent that turns a question into an answer
    pub orchestrator: Arc<dyn Orchestrator>,
    /// In-memory chat sessions
    pub sessions: Arc<SessionStore>,
    pub metrics: AppMetrics,
    /// Name of the language model behind the agent
    pub model_name: String,
    pub started_at: DateTime<Utc>,
    pub version: String,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("dataset_rows", &self.dataset.len())
            .field("orchestrator", &"Arc<dyn Orchestrator>")
            .field("sessions", &self.sessions.len())
            .field("model_name", &self.model_name)
            .field("version", &self.version)
            .finish()
    }
}

impl AppState {
    /// Create new application state
    pub fn new(
        dataset: Arc<Dataset>,
        orchestrator: Arc<dyn Orchestrator>,
        sessions: SessionStore,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            dataset,
            orchestrator,
            sessions: Arc::new(sessions),
            metrics: AppMetrics::default(),
            model_name: model_name.into(),
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
