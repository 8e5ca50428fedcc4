use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;

use taskmaster::app::{App, SignedInSession, SyncStatus};
use taskmaster::cli::{self, CliEnvironment, LoginArgs, RootCommand, TaskAddArgs, TaskCommand};
use taskmaster::drive::{DriveClient, DriveConfig};
use taskmaster::session::{self, StoredSession};
use taskmaster::settings::Settings;
use taskmaster::storage::{LocalStorage, StorageError};
use taskmaster::types::Task;

const GOOD_TOKEN: &str = "good-token";
const BOUNDARY: &str = "-------314159265358979323846";

#[derive(Default)]
struct MockDrive {
    files: HashMap<String, String>,
    next_id: usize,
    creates: usize,
    updates: usize,
    list_queries: Vec<HashMap<String, String>>,
    patch_metadata: Vec<String>,
}

type SharedDrive = Arc<Mutex<MockDrive>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(format!("Bearer {GOOD_TOKEN}").as_str())
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "invalid credentials").into_response()
}

/// Splits a multipart/related upload into (metadata, content).
fn split_related(headers: &HeaderMap, body: &str) -> Option<(String, String)> {
    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    if content_type != format!("multipart/related; boundary={BOUNDARY}") {
        return None;
    }
    let parts: Vec<&str> = body.split(&format!("--{BOUNDARY}")).collect();
    let part = |raw: &str| {
        raw.split_once("\r\n\r\n")
            .map(|(_, payload)| payload.trim_end_matches("\r\n").to_string())
    };
    Some((part(parts.get(1)?)?, part(parts.get(2)?)?))
}

async fn list_files(
    State(drive): State<SharedDrive>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut drive = drive.lock().expect("mock lock");
    drive.list_queries.push(params);
    let files = drive
        .files
        .keys()
        .map(|id| json!({ "id": id, "name": "tasks.json" }))
        .collect::<Vec<_>>();
    Json(json!({ "files": files })).into_response()
}

async fn get_file(
    State(drive): State<SharedDrive>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if params.get("alt").map(String::as_str) != Some("media") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    match drive.lock().expect("mock lock").files.get(&id) {
        Some(content) => content.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_file(
    State(drive): State<SharedDrive>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let Some((metadata, content)) = split_related(&headers, &body) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    if !metadata.contains("appDataFolder") {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let mut drive = drive.lock().expect("mock lock");
    drive.next_id += 1;
    drive.creates += 1;
    let id = format!("file-{}", drive.next_id);
    drive.files.insert(id.clone(), content);
    Json(json!({ "id": id })).into_response()
}

async fn update_file(
    State(drive): State<SharedDrive>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: String,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let Some((metadata, content)) = split_related(&headers, &body) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let mut drive = drive.lock().expect("mock lock");
    if !drive.files.contains_key(&id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    drive.updates += 1;
    drive.patch_metadata.push(metadata);
    drive.files.insert(id.clone(), content);
    Json(json!({ "id": id })).into_response()
}

async fn userinfo(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "name": "Ada Lovelace",
        "picture": "https://example.com/ada.png"
    }))
    .into_response()
}

async fn start_mock() -> (SocketAddr, SharedDrive) {
    let drive = SharedDrive::default();
    let router = Router::new()
        .route("/drive/v3/files", get(list_files))
        .route("/drive/v3/files/{id}", get(get_file))
        .route("/upload/drive/v3/files", post(create_file))
        .route("/upload/drive/v3/files/{id}", patch(update_file))
        .route("/userinfo", get(userinfo))
        .with_state(drive.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("mock listener should bind");
    let addr = listener.local_addr().expect("mock address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });
    (addr, drive)
}

fn config(addr: SocketAddr) -> DriveConfig {
    DriveConfig {
        api_base: format!("http://{addr}"),
        userinfo_url: format!("http://{addr}/userinfo"),
        request_timeout: Duration::from_secs(5),
    }
}

fn client(addr: SocketAddr, token: &str) -> DriveClient {
    DriveClient::new(config(addr), token).expect("client should build")
}

#[tokio::test]
async fn test_first_save_creates_then_later_saves_patch() {
    let (addr, drive) = start_mock().await;
    let drive_client = client(addr, GOOD_TOKEN);

    assert!(drive_client.load_remote().await.expect("load").is_empty());
    assert_eq!(drive_client.cached_file_id(), None);

    let tasks = vec![Task::new("Pay rent", "Work")];
    drive_client.save_remote(&tasks).await.expect("first save");
    assert_eq!(drive_client.cached_file_id().as_deref(), Some("file-1"));

    let mut updated = tasks.clone();
    updated[0].completed = true;
    drive_client.save_remote(&updated).await.expect("second save");

    {
        let drive = drive.lock().expect("mock lock");
        assert_eq!(drive.creates, 1);
        assert_eq!(drive.updates, 1);
        assert!(!drive.patch_metadata[0].contains("parents"));

        let query = &drive.list_queries[0];
        assert_eq!(query.get("spaces").map(String::as_str), Some("appDataFolder"));
        assert_eq!(query.get("q").map(String::as_str), Some("name='tasks.json'"));
    }

    let reloaded = client(addr, GOOD_TOKEN)
        .load_remote()
        .await
        .expect("reload");
    assert_eq!(reloaded, updated);
}

#[tokio::test]
async fn test_vanished_document_is_recreated_on_save() {
    let (addr, drive) = start_mock().await;
    let drive_client = client(addr, GOOD_TOKEN);

    drive_client
        .save_remote(&[Task::new("a", "Work")])
        .await
        .expect("first save");
    drive.lock().expect("mock lock").files.clear();

    drive_client
        .save_remote(&[Task::new("b", "Work")])
        .await
        .expect("save after deletion");

    let drive = drive.lock().expect("mock lock");
    assert_eq!(drive.creates, 2);
    assert_eq!(drive.files.len(), 1);
    assert_eq!(drive_client.cached_file_id().as_deref(), Some("file-2"));
}

#[tokio::test]
async fn test_malformed_and_legacy_documents() {
    let (addr, drive) = start_mock().await;
    drive
        .lock()
        .expect("mock lock")
        .files
        .insert("broken".to_string(), "{not json".to_string());

    let tasks = client(addr, GOOD_TOKEN).load_remote().await.expect("load");
    assert!(tasks.is_empty());

    {
        let mut drive = drive.lock().expect("mock lock");
        drive.files.clear();
        drive.files.insert(
            "legacy".to_string(),
            r#"[{"title":"Old","category":"Work","completed":true}]"#.to_string(),
        );
    }
    let tasks = client(addr, GOOD_TOKEN).load_remote().await.expect("load");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Old");
    assert!(tasks[0].completed);
}

#[tokio::test]
async fn test_rejected_token_is_an_auth_error() {
    let (addr, _drive) = start_mock().await;

    let err = client(addr, "expired")
        .load_remote()
        .await
        .expect_err("load should fail");
    assert!(matches!(err, StorageError::Auth(_)));
    assert_eq!(err.code(), "AUTH_ERROR");

    let err = session::sign_in(config(addr), "expired")
        .await
        .expect_err("sign in should fail");
    assert!(matches!(err, StorageError::Auth(_)));
}

#[tokio::test]
async fn test_unreachable_api_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);

    let err = client(addr, GOOD_TOKEN)
        .load_remote()
        .await
        .expect_err("load should fail");
    assert_eq!(err.code(), "NETWORK_ERROR");
}

#[tokio::test]
async fn test_signed_in_app_writes_through_to_drive() {
    let (addr, drive) = start_mock().await;
    let temp_dir = TempDir::new().expect("temp dir should be created");
    let storage = LocalStorage::open(temp_dir.path().join("local_storage.json"));

    let (stored, backend) = session::sign_in(config(addr), GOOD_TOKEN)
        .await
        .expect("sign in");
    assert_eq!(stored.profile.name, "Ada Lovelace");

    let defaults = ["Work", "Personal", "Shopping"].map(String::from);
    let mut app = App::start(
        storage,
        &defaults,
        Some(SignedInSession {
            profile: stored.profile.clone(),
            backend: Box::new(backend),
        }),
    )
    .await;
    assert_eq!(app.backend_name(), "remote");
    assert!(app.frame().contains("Ada Lovelace"));

    app.add_task("Pay rent", "Work").await;
    assert_eq!(app.sync_status(), &SyncStatus::Synced);

    let drive = drive.lock().expect("mock lock");
    let document = drive.files.values().next().expect("document should exist");
    let saved: Vec<Task> = serde_json::from_str(document).expect("document should parse");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].title, "Pay rent");
}

#[tokio::test]
async fn test_cli_login_then_add_syncs_remotely() {
    let (addr, drive) = start_mock().await;
    let temp_dir = TempDir::new().expect("temp dir should be created");
    let mut settings = Settings::default();
    settings.sync.api_base = format!("http://{addr}");
    settings.sync.userinfo_url = format!("http://{addr}/userinfo");
    let env = CliEnvironment::in_dir(temp_dir.path(), settings);

    let login = cli::execute(
        &env,
        RootCommand::Login(LoginArgs {
            token: GOOD_TOKEN.to_string(),
        }),
    )
    .await
    .expect("login should succeed");
    assert_eq!(login.data["profile"]["name"], "Ada Lovelace");
    assert!(StoredSession::load(&env.session_path).is_some());

    cli::execute(
        &env,
        RootCommand::Task {
            command: TaskCommand::Add(TaskAddArgs {
                title: "Synced".to_string(),
                category: None,
            }),
        },
    )
    .await
    .expect("task add should succeed");
    assert_eq!(drive.lock().expect("mock lock").creates, 1);

    let logout = cli::execute(&env, RootCommand::Logout)
        .await
        .expect("logout should succeed");
    assert_eq!(logout.data["signed_out"], true);
    assert!(StoredSession::load(&env.session_path).is_none());

    let sync = cli::execute(&env, RootCommand::Sync)
        .await
        .expect("sync should succeed");
    assert_eq!(sync.data["backend"], "local");
    assert_eq!(sync.data["tasks"], 0);
}

#[tokio::test]
async fn test_cli_reports_sync_failure_with_exit_code() {
    let (addr, _drive) = start_mock().await;
    let temp_dir = TempDir::new().expect("temp dir should be created");
    let mut settings = Settings::default();
    settings.sync.api_base = format!("http://{addr}");
    let env = CliEnvironment::in_dir(temp_dir.path(), settings);

    StoredSession {
        access_token: "expired".to_string(),
        profile: taskmaster::types::Profile {
            name: "Ada".to_string(),
            picture: None,
        },
    }
    .save(&env.session_path)
    .expect("session should save");

    let err = cli::execute(&env, RootCommand::Sync)
        .await
        .expect_err("sync should fail");
    assert_eq!(err.exit_code, 5);
    assert_eq!(err.code, "AUTH_ERROR");
}
