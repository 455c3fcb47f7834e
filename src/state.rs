use std::sync::Arc;
use chrono::{DateTime, Utc};
use crate::config::Config;
use crate::services::Repository;

// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub config: Arc<Config>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(repo: Repository, config: Config) -> Self {
        Self {
            repo,
            config: Arc::new(config),
            started_at: Utc::now(),
        }
    }
}
