//! Application controller
//!
//! `App` owns the task store, the selection state and the active persistence
//! backend. Every mutation is written through to the backend and followed by
//! a full re-render of the page.

pub mod interaction;
pub mod state;

use tracing::{debug, info, warn};

use crate::storage::{LocalBackend, LocalStorage, Preferences, TaskBackend};
use crate::store::{Filter, TaskStore};
use crate::theme::ThemeMode;
use crate::types::{Profile, TaskId};
use crate::view::icons::{GlyphIcons, IconResolver};
use crate::view::{self, Page, RenderContext, html};

pub use interaction::{Prompter, ScriptedPrompter, UiEvent};
pub use state::{SyncStatus, UiState};

pub struct App {
    store: TaskStore,
    ui: UiState,
    prefs: Preferences,
    local: LocalStorage,
    backend: Box<dyn TaskBackend>,
    /// Set once the active backend has loaded; saves are refused before that.
    loaded: bool,
    profile: Option<Profile>,
    sync_status: SyncStatus,
    theme: ThemeMode,
    icons: Box<dyn IconResolver>,
    frame: String,
    render_count: u64,
}

/// An authenticated session handed to the app at startup or sign-in.
pub struct SignedInSession {
    pub profile: Profile,
    pub backend: Box<dyn TaskBackend>,
}

impl App {
    /// Builds the app from local preferences without loading tasks.
    pub fn new(storage: LocalStorage, default_categories: &[String]) -> Self {
        let prefs = Preferences::new(storage.clone());
        let store = TaskStore::new(prefs.categories(default_categories));
        let theme = prefs.theme();

        let mut app = Self {
            store,
            ui: UiState::default(),
            prefs,
            backend: Box::new(LocalBackend::new(storage.clone())),
            local: storage,
            loaded: false,
            profile: None,
            sync_status: SyncStatus::Idle,
            theme,
            icons: Box::new(GlyphIcons),
            frame: String::new(),
            render_count: 0,
        };
        app.rerender();
        app
    }

    /// Startup sequence: restore the session if there is one, otherwise show
    /// the signed-out page and load local tasks.
    pub async fn start(
        storage: LocalStorage,
        default_categories: &[String],
        session: Option<SignedInSession>,
    ) -> Self {
        let mut app = Self::new(storage, default_categories);
        match session {
            Some(session) => app.on_signed_in(session.profile, session.backend).await,
            None => {
                app.on_signed_out();
                app.load_tasks().await;
            }
        }
        app
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.profile.is_some()
    }

    pub fn sync_status(&self) -> &SyncStatus {
        &self.sync_status
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Markup of the most recent render, icons resolved.
    pub fn frame(&self) -> &str {
        &self.frame
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn page(&self) -> Page {
        view::render(
            &self.store,
            &self.ui,
            RenderContext {
                theme: self.theme,
                profile: self.profile.as_ref(),
                sync_status: &self.sync_status,
            },
        )
    }

    fn rerender(&mut self) {
        let markup = html::to_html(&self.page());
        self.frame = self.icons.resolve(&markup);
        self.render_count += 1;
    }

    /// Replaces the in-memory tasks with the backend's copy.
    ///
    /// On failure the current tasks stay as they are and the page shows the
    /// error; retrying is up to the user.
    pub async fn load_tasks(&mut self) {
        match self.backend.load().await {
            Ok(tasks) => {
                debug!(backend = self.backend.name(), count = tasks.len(), "loaded tasks");
                self.store.replace_tasks(tasks);
                if let Some(open) = self.ui.open_dropdown
                    && self.store.task(open).is_none()
                {
                    self.ui.close_dropdown();
                }
                self.loaded = true;
                self.sync_status = self.synced_status();
            }
            Err(err) => {
                warn!(backend = self.backend.name(), code = err.code(), "failed to load tasks: {err}");
                self.sync_status = SyncStatus::failed(&err);
            }
        }
        self.rerender();
    }

    /// Writes the tasks to the active backend and reports whether they landed.
    ///
    /// Until the backend has loaded once, the in-memory list is not its
    /// document, so nothing is written.
    async fn persist_tasks(&mut self) -> bool {
        if !self.loaded {
            warn!(backend = self.backend.name(), "skipping save until tasks have loaded");
            return false;
        }
        match self.backend.save(self.store.tasks()).await {
            Ok(()) => {
                self.sync_status = self.synced_status();
                true
            }
            Err(err) => {
                warn!(backend = self.backend.name(), code = err.code(), "failed to save tasks: {err}");
                self.sync_status = SyncStatus::failed(&err);
                false
            }
        }
    }

    fn persist_categories(&self) {
        if let Err(err) = self.prefs.save_categories(self.store.categories()) {
            warn!("failed to save categories: {err:#}");
        }
    }

    fn synced_status(&self) -> SyncStatus {
        if self.is_signed_in() {
            SyncStatus::Synced
        } else {
            SyncStatus::Idle
        }
    }

    pub async fn add_task(&mut self, title: &str, category: &str) -> Option<TaskId> {
        let id = self.store.add_task(title, category)?;
        self.persist_tasks().await;
        self.rerender();
        Some(id)
    }

    pub async fn toggle_complete(&mut self, id: TaskId) -> bool {
        if !self.store.toggle_complete(id) {
            return false;
        }
        self.persist_tasks().await;
        self.rerender();
        true
    }

    pub async fn reassign_category(&mut self, id: TaskId, category: &str) -> bool {
        if !self.store.reassign_category(id, category) {
            return false;
        }
        self.ui.close_dropdown();
        self.persist_tasks().await;
        self.rerender();
        true
    }

    /// Removes a task; callers are responsible for confirming first.
    pub async fn remove_task(&mut self, id: TaskId) -> bool {
        if !self.store.remove_task(id) {
            return false;
        }
        if self.ui.is_open(id) {
            self.ui.close_dropdown();
        }
        self.persist_tasks().await;
        self.rerender();
        true
    }

    pub fn add_category(&mut self, name: &str) -> bool {
        if !self.store.add_category(name) {
            return false;
        }
        self.persist_categories();
        self.rerender();
        true
    }

    /// Drops a category after moving its tasks to the fallback category.
    pub async fn remove_category(&mut self, name: &str) -> bool {
        let affected = self
            .store
            .tasks()
            .iter()
            .any(|task| task.category == name);
        if !self.store.remove_category(name) {
            return false;
        }
        if *self.store.filter() == Filter::Category(name.to_string()) {
            self.store.set_filter(Filter::All);
        }
        // The category list only changes on disk once the reassigned tasks have.
        let saved = !affected || self.persist_tasks().await;
        if saved {
            self.persist_categories();
        }
        self.rerender();
        true
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.store.set_filter(filter);
        self.rerender();
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        if let Err(err) = self.prefs.save_theme(self.theme) {
            warn!("failed to save theme: {err:#}");
        }
        self.rerender();
    }

    /// Identity callback: switches to the remote backend and loads from it.
    ///
    /// Local tasks are dropped from memory; if the load fails the list stays
    /// empty and read-only until a later load succeeds.
    pub async fn on_signed_in(&mut self, profile: Profile, backend: Box<dyn TaskBackend>) {
        info!(name = %profile.name, backend = backend.name(), "session started");
        self.profile = Some(profile);
        self.backend = backend;
        self.loaded = false;
        self.store.clear_tasks();
        self.ui.close_dropdown();
        self.rerender();
        self.load_tasks().await;
    }

    /// Identity callback: back to local storage with an empty task list.
    pub fn on_signed_out(&mut self) {
        if self.profile.take().is_some() {
            info!("session ended");
        }
        self.backend = Box::new(LocalBackend::new(self.local.clone()));
        self.loaded = false;
        self.store.clear_tasks();
        self.ui.close_dropdown();
        self.sync_status = SyncStatus::Idle;
        self.rerender();
    }
}
