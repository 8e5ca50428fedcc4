//! UI selection and sync status state

use crate::storage::StorageError;
use crate::types::TaskId;

/// Selection state that is not part of the task data.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct UiState {
    /// Task whose category dropdown is open; at most one at a time.
    pub open_dropdown: Option<TaskId>,
}

impl UiState {
    pub fn is_open(&self, id: TaskId) -> bool {
        self.open_dropdown == Some(id)
    }

    /// Opens the dropdown for `id`, or closes it if it is already open.
    pub fn toggle_dropdown(&mut self, id: TaskId) {
        self.open_dropdown = if self.is_open(id) { None } else { Some(id) };
    }

    /// Returns whether a dropdown was open.
    pub fn close_dropdown(&mut self) -> bool {
        self.open_dropdown.take().is_some()
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub enum SyncStatus {
    #[default]
    Idle,
    Synced,
    Failed {
        code: &'static str,
        message: String,
    },
}

impl SyncStatus {
    pub fn failed(err: &StorageError) -> Self {
        Self::Failed {
            code: err.code(),
            message: err.to_string(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn label(&self) -> String {
        match self {
            Self::Idle => String::new(),
            Self::Synced => "Synced".to_string(),
            Self::Failed { message, .. } => format!("Sync failed: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_toggle_dropdown_keeps_single_open() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let mut ui = UiState::default();

        ui.toggle_dropdown(first);
        assert!(ui.is_open(first));
        ui.toggle_dropdown(second);
        assert!(ui.is_open(second));
        assert!(!ui.is_open(first));
        ui.toggle_dropdown(second);
        assert_eq!(ui.open_dropdown, None);
        assert!(!ui.close_dropdown());
    }

    #[test]
    fn test_failed_status_label() {
        let status = SyncStatus::failed(&StorageError::Network("timed out".to_string()));
        assert!(status.is_failed());
        assert_eq!(status.label(), "Sync failed: network failure: timed out");
        assert_eq!(SyncStatus::Idle.label(), "");
    }
}
