//! Page projection of the task store
//!
//! `render` is a pure function of store, selection and session state. The
//! result is turned into markup by [`html::to_html`] and icon placeholders are
//! filled in afterwards by an [`icons::IconResolver`].

pub mod html;
pub mod icons;

use crate::app::state::{SyncStatus, UiState};
use crate::store::{Filter, TaskStore};
use crate::theme::ThemeMode;
use crate::types::{Profile, TaskId};

pub const EMPTY_PLACEHOLDER: &str = "No tasks in this category.";
pub const REMOVE_TASK_CONFIRMATION: &str = "Delete this task?";
pub const ADD_CATEGORY_PROMPT: &str = "Enter new category name:";

#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub theme: ThemeMode,
    pub profile: Option<&'a Profile>,
    pub sync_status: &'a SyncStatus,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Page {
    pub theme: ThemeMode,
    pub profile: ProfileArea,
    pub sync_status: SyncStatus,
    pub category_bar: Vec<CategoryButton>,
    pub category_select: Vec<String>,
    pub task_list: TaskList,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ProfileArea {
    SignedOut,
    SignedIn {
        name: String,
        picture: Option<String>,
    },
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CategoryButton {
    pub label: String,
    pub filter: Filter,
    pub active: bool,
    /// False only for the "All" pseudo-button.
    pub removable: bool,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TaskList {
    Empty { placeholder: &'static str },
    Rows(Vec<TaskRow>),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TaskRow {
    pub id: TaskId,
    /// Position within the filtered list.
    pub index: usize,
    pub title: String,
    pub category: String,
    pub completed: bool,
    /// Other categories to move to; present only while the dropdown is open.
    pub dropdown: Option<Vec<String>>,
}

impl TaskList {
    pub fn rows(&self) -> &[TaskRow] {
        match self {
            Self::Empty { .. } => &[],
            Self::Rows(rows) => rows,
        }
    }
}

impl Page {
    pub fn open_dropdowns(&self) -> usize {
        self.task_list
            .rows()
            .iter()
            .filter(|row| row.dropdown.is_some())
            .count()
    }
}

pub fn render(store: &TaskStore, ui: &UiState, context: RenderContext<'_>) -> Page {
    Page {
        theme: context.theme,
        profile: match context.profile {
            Some(profile) => ProfileArea::SignedIn {
                name: profile.name.clone(),
                picture: profile.picture.clone(),
            },
            None => ProfileArea::SignedOut,
        },
        sync_status: context.sync_status.clone(),
        category_bar: category_bar(store),
        category_select: store.selectable_categories(),
        task_list: task_list(store, ui),
    }
}

fn category_bar(store: &TaskStore) -> Vec<CategoryButton> {
    let active = store.filter();
    let mut buttons = Vec::with_capacity(store.categories().len() + 1);
    buttons.push(CategoryButton {
        label: Filter::All.label().to_string(),
        filter: Filter::All,
        active: *active == Filter::All,
        removable: false,
    });
    for name in store.categories() {
        let filter = Filter::Category(name.clone());
        buttons.push(CategoryButton {
            label: name.clone(),
            active: *active == filter,
            filter,
            removable: true,
        });
    }
    buttons
}

fn task_list(store: &TaskStore, ui: &UiState) -> TaskList {
    let filtered = store.filtered_tasks();
    if filtered.is_empty() {
        return TaskList::Empty {
            placeholder: EMPTY_PLACEHOLDER,
        };
    }

    let rows = filtered
        .into_iter()
        .enumerate()
        .map(|(index, task)| TaskRow {
            id: task.id,
            index,
            title: task.title.clone(),
            category: task.category.clone(),
            completed: task.completed,
            dropdown: ui.is_open(task.id).then(|| {
                store
                    .categories()
                    .iter()
                    .filter(|name| **name != task.category)
                    .cloned()
                    .collect()
            }),
        })
        .collect();
    TaskList::Rows(rows)
}
