//! Page interactions dispatched into the app

use std::collections::VecDeque;

use tracing::debug;

use crate::store::Filter;
use crate::types::TaskId;
use crate::view::{ADD_CATEGORY_PROMPT, REMOVE_TASK_CONFIRMATION};

use super::App;

/// Interactive confirmation and free-text input.
pub trait Prompter {
    fn confirm(&mut self, message: &str) -> bool;

    fn prompt(&mut self, message: &str) -> Option<String>;
}

/// Answers prompts from pre-recorded responses; declines once they run out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    confirmations: VecDeque<bool>,
    answers: VecDeque<Option<String>>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn confirming(answer: bool) -> Self {
        Self {
            confirmations: VecDeque::from([answer]),
            ..Self::default()
        }
    }

    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            answers: VecDeque::from([Some(answer.into())]),
            ..Self::default()
        }
    }

    pub fn then_confirm(mut self, answer: bool) -> Self {
        self.confirmations.push_back(answer);
        self
    }

    /// Messages shown so far, in order.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, message: &str) -> bool {
        self.asked.push(message.to_string());
        self.confirmations.pop_front().unwrap_or(false)
    }

    fn prompt(&mut self, message: &str) -> Option<String> {
        self.asked.push(message.to_string());
        self.answers.pop_front().flatten()
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum UiEvent {
    ToggleTheme,
    SelectFilter(Filter),
    /// The remove affordance inside a category button.
    RemoveCategory(String),
    AddCategory,
    SubmitTask {
        title: String,
        category: String,
    },
    ToggleComplete(TaskId),
    /// Click on a task's category indicator.
    CategoryIndicator(TaskId),
    SelectCategoryOption {
        task: TaskId,
        category: String,
    },
    RemoveTask(TaskId),
    /// Click anywhere outside an interactive element.
    DocumentClick,
}

impl UiEvent {
    /// Events whose handlers keep the click from reaching the document.
    pub fn stops_propagation(&self) -> bool {
        matches!(
            self,
            Self::RemoveCategory(_)
                | Self::CategoryIndicator(_)
                | Self::SelectCategoryOption { .. }
                | Self::RemoveTask(_)
        )
    }
}

impl App {
    /// Runs the element handler for `event`, then the document-level click
    /// handler that closes any open dropdown.
    pub async fn handle(&mut self, event: UiEvent, prompter: &mut dyn Prompter) {
        debug!(?event, "ui event");
        let stops_propagation = event.stops_propagation();

        match event {
            UiEvent::ToggleTheme => self.toggle_theme(),
            UiEvent::SelectFilter(filter) => self.set_filter(filter),
            UiEvent::RemoveCategory(name) => {
                self.remove_category(&name).await;
            }
            UiEvent::AddCategory => {
                if let Some(name) = prompter.prompt(ADD_CATEGORY_PROMPT) {
                    self.add_category(&name);
                }
            }
            UiEvent::SubmitTask { title, category } => {
                self.add_task(&title, &category).await;
            }
            UiEvent::ToggleComplete(id) => {
                self.toggle_complete(id).await;
            }
            UiEvent::CategoryIndicator(id) => {
                if self.store.task(id).is_some() {
                    self.ui.toggle_dropdown(id);
                    self.rerender();
                }
            }
            UiEvent::SelectCategoryOption { task, category } => {
                self.reassign_category(task, &category).await;
            }
            UiEvent::RemoveTask(id) => {
                if self.store.task(id).is_some() && prompter.confirm(REMOVE_TASK_CONFIRMATION) {
                    self.remove_task(id).await;
                }
            }
            UiEvent::DocumentClick => {}
        }

        if !stops_propagation && self.ui.close_dropdown() {
            self.rerender();
        }
    }
}
