//! Identity session for remote sync
//!
//! The OAuth redirect happens elsewhere; this module takes the issued access
//! token, resolves the profile, and remembers both between runs.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::drive::{DriveClient, DriveConfig};
use crate::storage::{RemoteBackend, StorageError};
use crate::types::Profile;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct StoredSession {
    pub access_token: String,
    pub profile: Profile,
}

impl StoredSession {
    pub fn load(path: &Path) -> Option<Self> {
        let contents = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<Self>(&contents) {
            Ok(session) if !session.access_token.trim().is_empty() => Some(session),
            Ok(_) => None,
            Err(err) => {
                warn!("ignoring malformed session file '{}': {}", path.display(), err);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow!("invalid session file path"))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
        let contents = serde_json::to_string_pretty(self).context("failed to serialize session")?;

        let tmp_path = path.with_extension("json.tmp");
        let _ = fs::remove_file(&tmp_path);
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        // The file holds a bearer token: owner read/write only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&tmp_path)
            .with_context(|| format!("failed to open '{}'", tmp_path.display()))?;
        file.write_all(contents.as_bytes())
            .and_then(|()| file.sync_all())
            .with_context(|| format!("failed to write '{}'", tmp_path.display()))?;
        drop(file);

        fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to replace session file '{}'", path.display()))
    }

    pub fn clear(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to remove session file '{}'", path.display())),
        }
    }

    /// Rebuilds the remote backend without another profile round trip.
    pub fn resume(&self, config: DriveConfig) -> Result<RemoteBackend, StorageError> {
        let client = DriveClient::new(config, self.access_token.clone())?;
        Ok(RemoteBackend::new(client))
    }
}

/// Validates `access_token` by fetching the profile it belongs to.
pub async fn sign_in(
    config: DriveConfig,
    access_token: &str,
) -> Result<(StoredSession, RemoteBackend), StorageError> {
    let token = access_token.trim();
    if token.is_empty() {
        return Err(StorageError::Auth("access token is empty".to_string()));
    }

    let client = DriveClient::new(config, token)?;
    let profile = client.fetch_profile().await?;
    info!(name = %profile.name, "signed in");

    let session = StoredSession {
        access_token: token.to_string(),
        profile,
    };
    Ok((session, RemoteBackend::new(client)))
}
