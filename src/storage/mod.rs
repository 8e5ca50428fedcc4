//! Task persistence backends
//!
//! Tasks live either in on-device storage or in a remote document, depending
//! on whether a session is active. Categories and the theme always stay local.

mod local;
mod remote;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Task;

pub use local::{CATEGORIES_KEY, LocalBackend, LocalStorage, Preferences, TASKS_KEY, THEME_KEY};
pub use remote::RemoteBackend;

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum StorageError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error("remote document not found: {0}")]
    NotFound(String),
    #[error("local storage failure: {0}")]
    Local(String),
}

impl StorageError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Auth(_) => "AUTH_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Local(_) => "LOCAL_STORAGE_ERROR",
        }
    }
}

/// Whole-list task persistence.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn load(&self) -> Result<Vec<Task>, StorageError>;

    async fn save(&self, tasks: &[Task]) -> Result<(), StorageError>;
}

/// Parses a persisted task array; anything unreadable counts as no data.
pub(crate) fn parse_tasks(raw: &str, source: &str) -> Vec<Task> {
    match serde_json::from_str::<Vec<Task>>(raw) {
        Ok(tasks) => tasks,
        Err(err) => {
            tracing::warn!("ignoring malformed task list from {source}: {err}");
            Vec::new()
        }
    }
}
