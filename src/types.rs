use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Filter pseudo-category; never stored as a real category.
pub const ALL_FILTER: &str = "All";

/// Fallback category for tasks whose category was removed.
pub const UNCATEGORIZED: &str = "Uncategorized";

pub const DEFAULT_CATEGORIES: [&str; 3] = ["Work", "Personal", "Shopping"];

pub type TaskId = Uuid;

/// A single to-do item.
///
/// Documents written before tasks carried an `id` still deserialize; they
/// receive a fresh id on load.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Task {
    #[serde(default = "Uuid::new_v4")]
    pub id: TaskId,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            category: category.into(),
            completed: false,
        }
    }
}

/// Basic profile of the signed-in account.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
}
