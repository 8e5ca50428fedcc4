//! Google Drive client for the synced task document
//!
//! The whole task list lives in a single `tasks.json` file inside the
//! application-private `appDataFolder`. Reads fetch the file wholesale; writes
//! overwrite it wholesale. There is no version check, so the last write wins.

mod multipart;

use std::sync::Mutex;
use std::time::Duration;

use reqwest::{Method, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::settings::SyncSettings;
use crate::storage::{StorageError, parse_tasks};
use crate::types::{Profile, Task};

pub const TASKS_FILE_NAME: &str = "tasks.json";
pub const APP_DATA_FOLDER: &str = "appDataFolder";

const JSON_MIME_TYPE: &str = "application/json";
const DEFAULT_PROFILE_NAME: &str = "Google user";

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DriveConfig {
    pub api_base: String,
    pub userinfo_url: String,
    pub request_timeout: Duration,
}

impl DriveConfig {
    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self {
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            userinfo_url: settings.userinfo_url.clone(),
            request_timeout: Duration::from_millis(settings.request_timeout_ms),
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self::from_settings(&SyncSettings::default())
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug)]
pub struct DriveClient {
    http: reqwest::Client,
    config: DriveConfig,
    access_token: String,
    file_id: Mutex<Option<String>>,
}

impl DriveClient {
    pub fn new(config: DriveConfig, access_token: impl Into<String>) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| StorageError::Network(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            config,
            access_token: access_token.into(),
            file_id: Mutex::new(None),
        })
    }

    /// Identifier of the remote document once it has been found or created.
    pub fn cached_file_id(&self) -> Option<String> {
        self.file_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_file_id(&self, id: Option<String>) {
        *self
            .file_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = id;
    }

    pub async fn fetch_profile(&self) -> Result<Profile, StorageError> {
        let url = parse_url(&self.config.userinfo_url)?;
        let response = self.send(Method::GET, url, None, "fetch profile").await?;
        let info: UserInfo = decode_json(response, "fetch profile").await?;

        Ok(Profile {
            name: info
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string()),
            picture: info.picture,
        })
    }

    /// Reads the task document; a missing document is an empty list.
    pub async fn load_remote(&self) -> Result<Vec<Task>, StorageError> {
        let Some(id) = self.find_tasks_file().await? else {
            debug!("no remote task document yet");
            return Ok(Vec::new());
        };
        self.set_file_id(Some(id.clone()));

        let body = match self.download(&id).await {
            Ok(body) => body,
            Err(err @ StorageError::NotFound(_)) => {
                self.set_file_id(None);
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        let tasks = parse_tasks(&body, "remote document");
        info!(count = tasks.len(), "loaded tasks from remote document");
        Ok(tasks)
    }

    /// Overwrites the task document, creating it on first save.
    pub async fn save_remote(&self, tasks: &[Task]) -> Result<(), StorageError> {
        let content = serde_json::to_string(tasks)
            .map_err(|err| StorageError::Local(format!("failed to serialize tasks: {err}")))?;

        if let Some(id) = self.cached_file_id() {
            match self.update_file(&id, &content).await {
                Ok(()) => {
                    debug!(count = tasks.len(), "updated remote task document");
                    return Ok(());
                }
                Err(StorageError::NotFound(_)) => {
                    warn!("remote task document {id} disappeared; creating a new one");
                    self.set_file_id(None);
                }
                Err(err) => return Err(err),
            }
        }

        let id = self.create_file(&content).await?;
        info!("created remote task document {id}");
        self.set_file_id(Some(id));
        Ok(())
    }

    async fn find_tasks_file(&self) -> Result<Option<String>, StorageError> {
        let query = format!("name='{TASKS_FILE_NAME}'");
        let url = Url::parse_with_params(
            &format!("{}/drive/v3/files", self.config.api_base),
            &[
                ("spaces", APP_DATA_FOLDER),
                ("fields", "files(id, name)"),
                ("q", query.as_str()),
            ],
        )
        .map_err(|err| StorageError::Network(format!("invalid Drive API URL: {err}")))?;

        let response = self.send(Method::GET, url, None, "list files").await?;
        let list: FileList = decode_json(response, "list files").await?;
        Ok(list.files.into_iter().next().map(|file| file.id))
    }

    async fn download(&self, id: &str) -> Result<String, StorageError> {
        let url = Url::parse_with_params(
            &format!(
                "{}/drive/v3/files/{}",
                self.config.api_base,
                urlencoding::encode(id)
            ),
            &[("alt", "media")],
        )
        .map_err(|err| StorageError::Network(format!("invalid Drive API URL: {err}")))?;

        let response = self.send(Method::GET, url, None, "download file").await?;
        response
            .text()
            .await
            .map_err(|err| StorageError::Network(format!("download file: {err}")))
    }

    async fn create_file(&self, content: &str) -> Result<String, StorageError> {
        let metadata = json!({
            "name": TASKS_FILE_NAME,
            "mimeType": JSON_MIME_TYPE,
            "parents": [APP_DATA_FOLDER],
        });
        let url = self.upload_url(None)?;
        let body = multipart::related_body(&metadata, content);

        let response = self
            .send(Method::POST, url, Some(body), "create file")
            .await?;
        let created: FileEntry = decode_json(response, "create file").await?;
        Ok(created.id)
    }

    async fn update_file(&self, id: &str, content: &str) -> Result<(), StorageError> {
        // Drive rejects `parents` on update; the file already lives in the folder.
        let metadata = json!({
            "name": TASKS_FILE_NAME,
            "mimeType": JSON_MIME_TYPE,
        });
        let url = self.upload_url(Some(id))?;
        let body = multipart::related_body(&metadata, content);

        self.send(Method::PATCH, url, Some(body), "update file")
            .await?;
        Ok(())
    }

    fn upload_url(&self, id: Option<&str>) -> Result<Url, StorageError> {
        let base = match id {
            Some(id) => format!(
                "{}/upload/drive/v3/files/{}",
                self.config.api_base,
                urlencoding::encode(id)
            ),
            None => format!("{}/upload/drive/v3/files", self.config.api_base),
        };
        Url::parse_with_params(&base, &[("uploadType", "multipart")])
            .map_err(|err| StorageError::Network(format!("invalid Drive API URL: {err}")))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        multipart_body: Option<String>,
        action: &str,
    ) -> Result<Response, StorageError> {
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&self.access_token);
        if let Some(body) = multipart_body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, multipart::content_type())
                .body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| StorageError::Network(format!("{action}: {err}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response.text().await.unwrap_or_default();
        Err(classify_status(status, action, detail.trim()))
    }
}

fn parse_url(raw: &str) -> Result<Url, StorageError> {
    Url::parse(raw).map_err(|err| StorageError::Network(format!("invalid URL '{raw}': {err}")))
}

async fn decode_json<T: serde::de::DeserializeOwned>(
    response: Response,
    action: &str,
) -> Result<T, StorageError> {
    response
        .json::<T>()
        .await
        .map_err(|err| StorageError::Network(format!("{action}: unexpected response: {err}")))
}

fn classify_status(status: StatusCode, action: &str, detail: &str) -> StorageError {
    let message = if detail.is_empty() {
        format!("{action} returned HTTP {}", status.as_u16())
    } else {
        format!("{action} returned HTTP {}: {detail}", status.as_u16())
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StorageError::Auth(message),
        StatusCode::NOT_FOUND => StorageError::NotFound(message),
        _ => StorageError::Network(message),
    }
}
