use async_trait::async_trait;

use crate::drive::DriveClient;
use crate::types::Task;

use super::{StorageError, TaskBackend};

/// Tasks stored in the signed-in user's Drive document.
#[derive(Debug)]
pub struct RemoteBackend {
    client: DriveClient,
}

impl RemoteBackend {
    pub fn new(client: DriveClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn load(&self) -> Result<Vec<Task>, StorageError> {
        self.client.load_remote().await
    }

    async fn save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        self.client.save_remote(tasks).await
    }
}
