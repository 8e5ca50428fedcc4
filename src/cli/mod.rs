mod prompt;

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use clap::{Args, Subcommand};
use serde_json::{Value, json};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    app::{App, Prompter, ScriptedPrompter, SignedInSession, SyncStatus, UiEvent},
    drive::DriveConfig,
    paths,
    server::{self, StaticServerConfig},
    session::{self, StoredSession},
    settings::Settings,
    storage::{LocalStorage, StorageError},
    store::Filter,
    types::{Task, TaskId},
    view::TaskRow,
};

pub use prompt::TerminalPrompter;

const SCHEMA_VERSION: &str = "cli.v1";

#[derive(Debug, Clone, Subcommand)]
pub enum RootCommand {
    /// Add, list, complete, move and remove tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
    /// Manage the category list
    Category {
        #[command(subcommand)]
        command: CategoryCommand,
    },
    /// Show or switch the light/dark theme
    Theme {
        #[command(subcommand)]
        command: ThemeCommand,
    },
    /// Start syncing tasks to Google Drive with an OAuth access token
    Login(LoginArgs),
    /// Stop syncing and return to local storage
    Logout,
    /// Reload tasks from the active backend and report sync status
    Sync,
    /// Print or write the rendered page
    Render(RenderArgs),
    /// Serve static files with a single-page fallback
    Serve(ServeArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum TaskCommand {
    List(TaskListArgs),
    Add(TaskAddArgs),
    Toggle(TaskIdArgs),
    Move(TaskMoveArgs),
    Remove(TaskRemoveArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum CategoryCommand {
    List,
    Add(CategoryNameArgs),
    Remove(CategoryNameArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum ThemeCommand {
    Show,
    Toggle,
}

#[derive(Debug, Clone, Args)]
pub struct TaskListArgs {
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TaskAddArgs {
    #[arg(long, value_name = "TEXT")]
    pub title: String,

    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TaskIdArgs {
    #[arg(long, value_name = "TASK_ID")]
    pub id: String,
}

#[derive(Debug, Clone, Args)]
pub struct TaskMoveArgs {
    #[arg(long, value_name = "TASK_ID")]
    pub id: String,

    #[arg(long, value_name = "CATEGORY")]
    pub category: String,
}

#[derive(Debug, Clone, Args)]
pub struct TaskRemoveArgs {
    #[arg(long, value_name = "TASK_ID")]
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CategoryNameArgs {
    #[arg(long, value_name = "TEXT")]
    pub name: String,
}

#[derive(Debug, Clone, Args)]
pub struct LoginArgs {
    #[arg(long, value_name = "TOKEN")]
    pub token: String,
}

#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Open the served page in the default browser
    #[arg(long)]
    pub open: bool,
}

/// Where the CLI keeps its state; tests point this at a temp directory.
#[derive(Debug, Clone)]
pub struct CliEnvironment {
    pub settings: Settings,
    pub local_storage_path: PathBuf,
    pub session_path: PathBuf,
}

impl CliEnvironment {
    pub fn from_system() -> Self {
        Self {
            settings: Settings::load(),
            local_storage_path: paths::local_storage_path(),
            session_path: paths::session_path(),
        }
    }

    pub fn in_dir(dir: &Path, settings: Settings) -> Self {
        Self {
            settings,
            local_storage_path: dir.join("local_storage.json"),
            session_path: dir.join("session.json"),
        }
    }

    fn drive_config(&self) -> DriveConfig {
        DriveConfig::from_settings(&self.settings.sync)
    }
}

pub async fn run(env: &CliEnvironment, command: RootCommand, json_output: bool, quiet: bool) -> i32 {
    match execute(env, command).await {
        Ok(output) => {
            print_success(output, json_output, quiet);
            0
        }
        Err(err) => {
            print_error(&err, json_output);
            err.exit_code
        }
    }
}

#[derive(Debug)]
pub struct CommandOutput {
    pub command: &'static str,
    pub data: Value,
    pub text: String,
}

#[derive(Debug)]
pub struct CliError {
    pub exit_code: i32,
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

type CliResult<T> = Result<T, CliError>;

pub async fn execute(env: &CliEnvironment, command: RootCommand) -> CliResult<CommandOutput> {
    match command {
        RootCommand::Task { command } => {
            let mut app = open_app(env).await?;
            execute_task_command(&mut app, command).await
        }
        RootCommand::Category { command } => {
            let mut app = open_app(env).await?;
            execute_category_command(&mut app, command).await
        }
        RootCommand::Theme { command } => {
            let mut app = open_app(env).await?;
            execute_theme_command(&mut app, command)
        }
        RootCommand::Login(args) => login(env, args).await,
        RootCommand::Logout => logout(env).await,
        RootCommand::Sync => sync(env).await,
        RootCommand::Render(args) => render(env, args).await,
        RootCommand::Serve(args) => serve(env, args).await,
    }
}

async fn open_app(env: &CliEnvironment) -> CliResult<App> {
    let storage = LocalStorage::open(&env.local_storage_path);
    let session = match StoredSession::load(&env.session_path) {
        Some(stored) => {
            let backend = stored
                .resume(env.drive_config())
                .map_err(storage_error)?;
            Some(SignedInSession {
                profile: stored.profile,
                backend: Box::new(backend),
            })
        }
        None => None,
    };

    let app = App::start(storage, &env.settings.default_categories, session).await;
    ensure_synced(&app)?;
    Ok(app)
}

async fn execute_task_command(app: &mut App, command: TaskCommand) -> CliResult<CommandOutput> {
    match command {
        TaskCommand::List(args) => task_list(app, args),
        TaskCommand::Add(args) => task_add(app, args).await,
        TaskCommand::Toggle(args) => task_toggle(app, args).await,
        TaskCommand::Move(args) => task_move(app, args).await,
        TaskCommand::Remove(args) => task_remove(app, args).await,
    }
}

async fn execute_category_command(
    app: &mut App,
    command: CategoryCommand,
) -> CliResult<CommandOutput> {
    match command {
        CategoryCommand::List => Ok(category_list(app)),
        CategoryCommand::Add(args) => category_add(app, args).await,
        CategoryCommand::Remove(args) => category_remove(app, args).await,
    }
}

fn execute_theme_command(app: &mut App, command: ThemeCommand) -> CliResult<CommandOutput> {
    let command_name = match command {
        ThemeCommand::Show => "theme show",
        ThemeCommand::Toggle => {
            app.toggle_theme();
            "theme toggle"
        }
    };

    let theme = app.theme().as_str();
    Ok(CommandOutput {
        command: command_name,
        data: json!({ "theme": theme }),
        text: format!("theme: {theme}"),
    })
}

fn task_list(app: &mut App, args: TaskListArgs) -> CliResult<CommandOutput> {
    if let Some(category) = args.category.as_deref() {
        let filter = Filter::parse(category);
        if let Filter::Category(name) = &filter
            && !app.store().selectable_categories().contains(name)
            && !app.store().tasks().iter().any(|task| task.category == *name)
        {
            return Err(not_found_error(
                "CATEGORY_NOT_FOUND",
                format!("category '{name}' not found"),
            ));
        }
        app.set_filter(filter);
    }

    let page = app.page();
    let rows = page.task_list.rows();
    let data = json!({
        "filter": app.store().filter().label(),
        "tasks": rows.iter().map(row_json).collect::<Vec<_>>()
    });

    Ok(CommandOutput {
        command: "task list",
        data,
        text: render_task_list_text(rows),
    })
}

fn render_task_list_text(rows: &[TaskRow]) -> String {
    if rows.is_empty() {
        return crate::view::EMPTY_PLACEHOLDER.to_string();
    }

    let headers = ["ID", "Done", "Category", "Title"];
    let rows = rows
        .iter()
        .map(|row| {
            let id = row.id.to_string();
            vec![
                id.chars().take(8).collect::<String>(),
                if row.completed { "x" } else { " " }.to_string(),
                row.category.clone(),
                row.title.replace('\n', " "),
            ]
        })
        .collect::<Vec<_>>();

    render_text_table(&headers, &rows)
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();

    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let border = format!(
        "+{}+",
        widths
            .iter()
            .map(|width| "-".repeat(*width + 2))
            .collect::<Vec<_>>()
            .join("+")
    );
    let format_row = |cells: Vec<&str>| {
        format!(
            "| {} |",
            cells
                .iter()
                .enumerate()
                .map(|(index, cell)| format!("{cell:<width$}", width = widths[index]))
                .collect::<Vec<_>>()
                .join(" | ")
        )
    };

    let mut lines = vec![border.clone(), format_row(headers.to_vec()), border.clone()];
    for row in rows {
        lines.push(format_row(row.iter().map(String::as_str).collect()));
    }
    lines.push(border);
    lines.join("\n")
}

async fn task_add(app: &mut App, args: TaskAddArgs) -> CliResult<CommandOutput> {
    if args.title.trim().is_empty() {
        return Err(usage_error("TASK_TITLE_REQUIRED", "task title cannot be empty"));
    }

    let options = app.store().selectable_categories();
    let category = match args.category {
        Some(category) if options.contains(&category) => category,
        Some(category) => {
            return Err(not_found_error(
                "CATEGORY_NOT_FOUND",
                format!("category '{category}' not found"),
            ));
        }
        None => options
            .first()
            .cloned()
            .unwrap_or_else(|| crate::types::UNCATEGORIZED.to_string()),
    };

    let before: HashSet<TaskId> = app.store().tasks().iter().map(|task| task.id).collect();
    app.handle(
        UiEvent::SubmitTask {
            title: args.title,
            category,
        },
        &mut ScriptedPrompter::default(),
    )
    .await;

    let created = app
        .store()
        .tasks()
        .iter()
        .find(|task| !before.contains(&task.id))
        .cloned()
        .ok_or_else(|| runtime_error("task was not created"))?;
    ensure_synced(app)?;

    Ok(CommandOutput {
        command: "task add",
        data: json!({ "task": task_json(&created) }),
        text: format!("added task {} ({})", created.title, created.id),
    })
}

async fn task_toggle(app: &mut App, args: TaskIdArgs) -> CliResult<CommandOutput> {
    let id = resolve_task_id_selector(app, &args.id)?;
    app.handle(UiEvent::ToggleComplete(id), &mut ScriptedPrompter::default())
        .await;
    ensure_synced(app)?;

    let task = find_task(app, id)?;
    let state = if task.completed { "completed" } else { "open" };
    Ok(CommandOutput {
        command: "task toggle",
        data: json!({ "task": task_json(&task) }),
        text: format!("marked task {} as {state}", task.title),
    })
}

async fn task_move(app: &mut App, args: TaskMoveArgs) -> CliResult<CommandOutput> {
    let id = resolve_task_id_selector(app, &args.id)?;
    let mut prompter = ScriptedPrompter::default();

    app.handle(UiEvent::CategoryIndicator(id), &mut prompter).await;
    let offered = app
        .page()
        .task_list
        .rows()
        .iter()
        .find(|row| row.id == id)
        .and_then(|row| row.dropdown.clone())
        .unwrap_or_default();

    if !offered.contains(&args.category) {
        app.handle(UiEvent::DocumentClick, &mut prompter).await;
        return Err(conflict_error(
            "CATEGORY_NOT_OFFERED",
            format!("task cannot be moved to '{}'", args.category),
            Some(json!({ "options": offered })),
        ));
    }

    app.handle(
        UiEvent::SelectCategoryOption {
            task: id,
            category: args.category,
        },
        &mut prompter,
    )
    .await;
    ensure_synced(app)?;

    let task = find_task(app, id)?;
    Ok(CommandOutput {
        command: "task move",
        data: json!({ "task": task_json(&task) }),
        text: format!("moved task {} to {}", task.title, task.category),
    })
}

async fn task_remove(app: &mut App, args: TaskRemoveArgs) -> CliResult<CommandOutput> {
    let id = resolve_task_id_selector(app, &args.id)?;
    let task = find_task(app, id)?;

    let mut scripted = ScriptedPrompter::confirming(true);
    let mut terminal = TerminalPrompter;
    let prompter: &mut dyn Prompter = if args.yes { &mut scripted } else { &mut terminal };
    app.handle(UiEvent::RemoveTask(id), prompter).await;

    let removed = app.store().task(id).is_none();
    if removed {
        ensure_synced(app)?;
    }

    Ok(CommandOutput {
        command: "task remove",
        data: json!({ "removed": removed, "task": task_json(&task) }),
        text: if removed {
            format!("removed task {}", task.title)
        } else {
            format!("kept task {}", task.title)
        },
    })
}

fn category_list(app: &App) -> CommandOutput {
    let categories = app.store().categories();
    let counts = categories
        .iter()
        .map(|name| {
            app.store()
                .tasks()
                .iter()
                .filter(|task| task.category == *name)
                .count()
        })
        .collect::<Vec<_>>();

    let data = json!({
        "categories": categories
            .iter()
            .zip(&counts)
            .map(|(name, count)| json!({ "name": name, "tasks": count }))
            .collect::<Vec<_>>()
    });

    let text = if categories.is_empty() {
        "No categories.".to_string()
    } else {
        let rows = categories
            .iter()
            .zip(&counts)
            .map(|(name, count)| vec![name.clone(), count.to_string()])
            .collect::<Vec<_>>();
        render_text_table(&["Name", "Tasks"], &rows)
    };

    CommandOutput {
        command: "category list",
        data,
        text,
    }
}

async fn category_add(app: &mut App, args: CategoryNameArgs) -> CliResult<CommandOutput> {
    let name = args.name.trim();
    let before = app.store().categories().len();
    let mut prompter = ScriptedPrompter::answering(name);
    app.handle(UiEvent::AddCategory, &mut prompter).await;

    if app.store().categories().len() == before {
        return Err(conflict_error(
            "CATEGORY_REJECTED",
            format!("category '{name}' is empty, reserved, or already exists"),
            None,
        ));
    }

    Ok(CommandOutput {
        command: "category add",
        data: json!({ "category": name }),
        text: format!("added category {name}"),
    })
}

async fn category_remove(app: &mut App, args: CategoryNameArgs) -> CliResult<CommandOutput> {
    let name = args.name.trim().to_string();
    if !app.store().categories().contains(&name) {
        return Err(not_found_error(
            "CATEGORY_NOT_FOUND",
            format!("category '{name}' not found"),
        ));
    }

    let moved = app
        .store()
        .tasks()
        .iter()
        .filter(|task| task.category == name)
        .count();
    app.handle(
        UiEvent::RemoveCategory(name.clone()),
        &mut ScriptedPrompter::default(),
    )
    .await;
    ensure_synced(app)?;

    Ok(CommandOutput {
        command: "category remove",
        data: json!({ "category": name, "reassigned_tasks": moved }),
        text: format!(
            "removed category {name} ({moved} task(s) moved to {})",
            crate::types::UNCATEGORIZED
        ),
    })
}

async fn login(env: &CliEnvironment, args: LoginArgs) -> CliResult<CommandOutput> {
    let (stored, backend) = session::sign_in(env.drive_config(), &args.token)
        .await
        .map_err(storage_error)?;
    stored
        .save(&env.session_path)
        .map_err(|err| runtime_error(format!("{err:#}")))?;

    let storage = LocalStorage::open(&env.local_storage_path);
    let mut app = App::new(storage, &env.settings.default_categories);
    app.on_signed_in(stored.profile.clone(), Box::new(backend))
        .await;
    ensure_synced(&app)?;

    Ok(CommandOutput {
        command: "login",
        data: json!({
            "profile": stored.profile,
            "tasks": app.store().tasks().len()
        }),
        text: format!(
            "signed in as {} ({} task(s) in Drive)",
            stored.profile.name,
            app.store().tasks().len()
        ),
    })
}

async fn logout(env: &CliEnvironment) -> CliResult<CommandOutput> {
    let was_signed_in = StoredSession::load(&env.session_path).is_some();
    StoredSession::clear(&env.session_path).map_err(|err| runtime_error(format!("{err:#}")))?;

    let storage = LocalStorage::open(&env.local_storage_path);
    let mut app = App::new(storage, &env.settings.default_categories);
    app.on_signed_out();

    Ok(CommandOutput {
        command: "logout",
        data: json!({ "signed_out": was_signed_in }),
        text: if was_signed_in {
            "signed out; tasks are stored locally again".to_string()
        } else {
            "not signed in".to_string()
        },
    })
}

async fn sync(env: &CliEnvironment) -> CliResult<CommandOutput> {
    let app = open_app(env).await?;
    let backend = app.backend_name();
    let count = app.store().tasks().len();

    Ok(CommandOutput {
        command: "sync",
        data: json!({
            "backend": backend,
            "signed_in": app.is_signed_in(),
            "tasks": count
        }),
        text: format!("loaded {count} task(s) from {backend} storage"),
    })
}

async fn render(env: &CliEnvironment, args: RenderArgs) -> CliResult<CommandOutput> {
    let app = open_app(env).await?;
    let html = app.frame().to_string();

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(runtime_error)?;
            }
            fs::write(&path, &html).map_err(runtime_error)?;
            Ok(CommandOutput {
                command: "render",
                data: json!({ "output": path.display().to_string(), "bytes": html.len() }),
                text: format!("wrote {}", path.display()),
            })
        }
        None => Ok(CommandOutput {
            command: "render",
            data: json!({ "html": html }),
            text: html,
        }),
    }
}

async fn serve(env: &CliEnvironment, args: ServeArgs) -> CliResult<CommandOutput> {
    let config = StaticServerConfig {
        root: args.root.unwrap_or_else(|| env.settings.server.root.clone()),
        entry: env.settings.server.entry.clone(),
        port: env.settings.effective_port(args.port),
    };

    let listener = server::bind(config.port)
        .await
        .map_err(|err| runtime_error(format!("{err:#}")))?;
    let url = format!("http://localhost:{}", config.port);
    println!("Server running at {url}");
    if args.open
        && let Err(err) = open::that(&url)
    {
        warn!("failed to open browser: {err}");
    }

    server::serve_on(listener, config.root.clone(), &config.entry)
        .await
        .map_err(|err| runtime_error(format!("{err:#}")))?;

    Ok(CommandOutput {
        command: "serve",
        data: json!({ "port": config.port, "root": config.root.display().to_string() }),
        text: String::new(),
    })
}

fn ensure_synced(app: &App) -> CliResult<()> {
    match app.sync_status() {
        SyncStatus::Failed { code, message } => Err(CliError {
            exit_code: 5,
            code: *code,
            message: message.clone(),
            details: Some(json!({ "backend": app.backend_name() })),
        }),
        _ => Ok(()),
    }
}

fn find_task(app: &App, id: TaskId) -> CliResult<Task> {
    app.store()
        .task(id)
        .cloned()
        .ok_or_else(|| not_found_error("TASK_NOT_FOUND", format!("task {id} not found")))
}

fn resolve_task_id_selector(app: &App, selector: &str) -> CliResult<TaskId> {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return Err(usage_error("TASK_ID_REQUIRED", "task id cannot be empty"));
    }

    if let Ok(parsed) = Uuid::parse_str(trimmed)
        && app.store().task(parsed).is_some()
    {
        return Ok(parsed);
    }

    let needle = trimmed.to_ascii_lowercase();
    let matches = app
        .store()
        .tasks()
        .iter()
        .filter(|task| {
            task.id.to_string().starts_with(&needle)
                || task.id.as_simple().to_string().starts_with(&needle)
        })
        .map(|task| task.id)
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [single] => Ok(*single),
        [] => Err(not_found_error(
            "TASK_NOT_FOUND",
            format!("task '{selector}' not found"),
        )),
        many => Err(conflict_error(
            "TASK_ID_AMBIGUOUS",
            format!(
                "task id prefix '{selector}' matches {} tasks; use a longer id",
                many.len()
            ),
            Some(json!({
                "matches": many.iter().map(|id| id.to_string()).collect::<Vec<_>>()
            })),
        )),
    }
}

fn task_json(task: &Task) -> Value {
    json!({
        "id": task.id,
        "title": task.title,
        "category": task.category,
        "completed": task.completed
    })
}

fn row_json(row: &TaskRow) -> Value {
    json!({
        "id": row.id,
        "index": row.index,
        "title": row.title,
        "category": row.category,
        "completed": row.completed
    })
}

fn usage_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError {
        exit_code: 2,
        code,
        message: message.into(),
        details: None,
    }
}

fn not_found_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError {
        exit_code: 3,
        code,
        message: message.into(),
        details: None,
    }
}

fn conflict_error(
    code: &'static str,
    message: impl Into<String>,
    details: Option<Value>,
) -> CliError {
    CliError {
        exit_code: 4,
        code,
        message: message.into(),
        details,
    }
}

fn runtime_error(err: impl std::fmt::Display) -> CliError {
    CliError {
        exit_code: 5,
        code: "RUNTIME_ERROR",
        message: err.to_string(),
        details: None,
    }
}

fn storage_error(err: StorageError) -> CliError {
    CliError {
        exit_code: 5,
        code: err.code(),
        message: err.to_string(),
        details: None,
    }
}

fn print_success(output: CommandOutput, json_output: bool, quiet: bool) {
    if json_output {
        let payload = json!({
            "schema_version": SCHEMA_VERSION,
            "command": output.command,
            "data": output.data
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(value) => println!("{value}"),
            Err(_) => println!("{}", payload),
        }
        return;
    }

    if quiet {
        return;
    }

    if output.text.is_empty() {
        println!("ok");
    } else {
        println!("{}", output.text);
    }
}

fn print_error(err: &CliError, json_output: bool) {
    error!(
        code = err.code,
        message = %err.message,
        details = ?err.details,
        "cli command failed"
    );

    if json_output {
        let payload = json!({
            "schema_version": SCHEMA_VERSION,
            "error": {
                "code": err.code,
                "message": err.message,
                "details": err.details
            }
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(value) => eprintln!("{value}"),
            Err(_) => eprintln!("{}", payload),
        }
        return;
    }

    eprintln!("error[{}]: {}", err.code, err.message);
}
