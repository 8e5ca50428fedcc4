//! In-memory task and category collections

use crate::types::{ALL_FILTER, DEFAULT_CATEGORIES, Task, TaskId, UNCATEGORIZED};

/// Active display filter for the task list.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub enum Filter {
    #[default]
    All,
    Category(String),
}

impl Filter {
    pub fn parse(raw: &str) -> Self {
        if raw == ALL_FILTER {
            Self::All
        } else {
            Self::Category(raw.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => ALL_FILTER,
            Self::Category(name) => name,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Category(name) => task.category == *name,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TaskStore {
    tasks: Vec<Task>,
    categories: Vec<String>,
    filter: Filter,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES.iter().map(|name| name.to_string()).collect())
    }
}

impl TaskStore {
    /// Builds a store from a persisted category list, dropping entries that
    /// would break the category invariants.
    pub fn new(categories: Vec<String>) -> Self {
        let mut store = Self {
            tasks: Vec::new(),
            categories: Vec::with_capacity(categories.len()),
            filter: Filter::All,
        };
        for name in categories {
            store.add_category(&name);
        }
        store
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Tasks visible under the active filter, in list order.
    pub fn filtered_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| self.filter.matches(task))
            .collect()
    }

    /// Categories offered when creating a task; always includes the fallback.
    pub fn selectable_categories(&self) -> Vec<String> {
        let mut names = self.categories.clone();
        if !names.iter().any(|name| name == UNCATEGORIZED) {
            names.push(UNCATEGORIZED.to_string());
        }
        names
    }

    pub fn add_task(&mut self, title: &str, category: &str) -> Option<TaskId> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let task = Task::new(title, category);
        let id = task.id;
        self.tasks.push(task);
        Some(id)
    }

    pub fn toggle_complete(&mut self, id: TaskId) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return false;
        };
        task.completed = !task.completed;
        true
    }

    pub fn reassign_category(&mut self, id: TaskId, category: &str) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return false;
        };
        task.category = category.to_string();
        true
    }

    pub fn remove_task(&mut self, id: TaskId) -> bool {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return false;
        };
        self.tasks.remove(index);
        true
    }

    /// Adds `name` with surrounding whitespace removed, the same rule the
    /// settings apply to default categories.
    pub fn add_category(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || name == ALL_FILTER || self.has_category(name) {
            return false;
        }
        self.categories.push(name.to_string());
        true
    }

    /// Moves member tasks to the fallback category, then drops the category.
    pub fn remove_category(&mut self, name: &str) -> bool {
        if !self.has_category(name) {
            return false;
        }
        for task in self.tasks.iter_mut().filter(|task| task.category == name) {
            task.category = UNCATEGORIZED.to_string();
        }
        self.categories.retain(|existing| existing != name);
        true
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    pub fn clear_tasks(&mut self) {
        self.tasks.clear();
    }

    fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|existing| existing == name)
    }
}
