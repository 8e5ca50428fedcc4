use std::fmt::Write as _;

use super::{
    ADD_CATEGORY_PROMPT, CategoryButton, Page, ProfileArea, REMOVE_TASK_CONFIRMATION, TaskList,
    TaskRow,
};

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn icon(name: &str, class: Option<&str>) -> String {
    match class {
        Some(class) => format!("<i data-feather=\"{name}\" class=\"{class}\"></i>"),
        None => format!("<i data-feather=\"{name}\"></i>"),
    }
}

/// Full page markup with unresolved icon placeholders.
pub fn to_html(page: &Page) -> String {
    let mut out = String::new();
    let body_class = page
        .theme
        .body_class()
        .map(|class| format!(" class=\"{class}\""))
        .unwrap_or_default();

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("<meta charset=\"utf-8\">\n<title>TaskMaster</title>\n");
    out.push_str("<link rel=\"stylesheet\" href=\"/style.css\">\n</head>\n");
    let _ = writeln!(out, "<body{body_class}>");

    out.push_str("<header class=\"app-header\">\n");
    let _ = writeln!(
        out,
        "<button id=\"theme-toggle\" data-action=\"toggle-theme\" title=\"Toggle theme\">{}</button>",
        icon(page.theme.icon(), None)
    );
    push_profile_area(&mut out, &page.profile);
    let status = page.sync_status.label();
    if !status.is_empty() {
        let class = if page.sync_status.is_failed() {
            "sync-status error"
        } else {
            "sync-status"
        };
        let _ = writeln!(
            out,
            "<span class=\"{class}\" role=\"status\">{}</span>",
            escape_html(&status)
        );
    }
    out.push_str("</header>\n");

    out.push_str("<section class=\"categories-section\">\n<span>Categories:</span>\n");
    for button in &page.category_bar {
        push_category_button(&mut out, button);
    }
    let _ = writeln!(
        out,
        "<button class=\"category-add\" data-action=\"add-category\" data-prompt=\"{}\" title=\"Add category\">+</button>",
        escape_html(ADD_CATEGORY_PROMPT)
    );
    out.push_str("</section>\n");

    out.push_str("<form class=\"add-task\" data-action=\"submit-task\">\n");
    out.push_str("<input id=\"task-input\" name=\"title\" placeholder=\"Add a new task...\">\n");
    out.push_str("<select id=\"category-select\" name=\"category\">\n");
    for name in &page.category_select {
        let name = escape_html(name);
        let _ = writeln!(out, "<option value=\"{name}\">{name}</option>");
    }
    out.push_str("</select>\n<button id=\"add-task-btn\" type=\"submit\">Add</button>\n</form>\n");

    out.push_str("<ul id=\"task-list\">\n");
    match &page.task_list {
        TaskList::Empty { placeholder } => {
            let _ = writeln!(
                out,
                "<li class=\"task-item empty\">{}</li>",
                escape_html(placeholder)
            );
        }
        TaskList::Rows(rows) => {
            for row in rows {
                push_task_row(&mut out, row);
            }
        }
    }
    out.push_str("</ul>\n</body>\n</html>\n");
    out
}

fn push_profile_area(out: &mut String, profile: &ProfileArea) {
    out.push_str("<div id=\"profile-area\">");
    match profile {
        ProfileArea::SignedOut => {
            out.push_str("<button id=\"login-btn\" data-action=\"login\">Login with Google</button>");
        }
        ProfileArea::SignedIn { name, picture } => {
            if let Some(picture) = picture {
                let _ = write!(
                    out,
                    "<img id=\"profile-pic\" src=\"{}\" alt=\"Profile\">",
                    escape_html(picture)
                );
            }
            let _ = write!(
                out,
                "<span>{}</span><button id=\"logout-btn\" data-action=\"logout\">Logout</button>",
                escape_html(name)
            );
        }
    }
    out.push_str("</div>\n");
}

fn push_category_button(out: &mut String, button: &CategoryButton) {
    let class = if button.active {
        "category-filter active"
    } else {
        "category-filter"
    };
    let label = escape_html(&button.label);
    let _ = write!(
        out,
        "<button class=\"{class}\" data-action=\"select-filter\" data-category=\"{label}\">{label}"
    );
    if button.removable {
        let _ = write!(
            out,
            "<span class=\"remove-category\" data-action=\"remove-category\" data-category=\"{label}\" title=\"Remove category\">&minus;</span>"
        );
    }
    out.push_str("</button>\n");
}

fn push_task_row(out: &mut String, row: &TaskRow) {
    let class = if row.completed {
        "task-item completed"
    } else {
        "task-item"
    };
    let checked = if row.completed { " checked" } else { "" };
    let category = escape_html(&row.category);

    let _ = writeln!(
        out,
        "<li class=\"{class}\" data-task-id=\"{}\" data-index=\"{}\">",
        row.id, row.index
    );
    let _ = writeln!(
        out,
        "<input type=\"checkbox\" class=\"task-checkbox\" data-action=\"toggle-complete\"{checked}>"
    );
    let _ = writeln!(
        out,
        "<span class=\"task-title\">{}</span>",
        escape_html(&row.title)
    );
    let _ = write!(
        out,
        "<div class=\"task-category\" tabindex=\"0\" data-action=\"category-indicator\"><span>{category}</span> {}",
        icon("chevron-down", Some("cat-chevron"))
    );
    if let Some(options) = &row.dropdown {
        out.push_str("<div class=\"category-dropdown open\">");
        for option in options {
            let option = escape_html(option);
            let _ = write!(
                out,
                "<button data-action=\"select-category\" data-category=\"{option}\">{option}</button>"
            );
        }
        out.push_str("</div>");
    }
    out.push_str("</div>\n");
    let _ = writeln!(
        out,
        "<button class=\"remove-task-btn\" data-action=\"remove-task\" data-confirm=\"{}\" title=\"Remove task\">{}</button>",
        escape_html(REMOVE_TASK_CONFIRMATION),
        icon("minus-circle", None)
    );
    out.push_str("</li>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::{SyncStatus, UiState};
    use crate::store::TaskStore;
    use crate::theme::ThemeMode;
    use crate::view::{RenderContext, render};

    fn page_for(store: &TaskStore, ui: &UiState, status: &SyncStatus) -> Page {
        render(
            store,
            ui,
            RenderContext {
                theme: ThemeMode::Light,
                profile: None,
                sync_status: status,
            },
        )
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut store = TaskStore::default();
        store.add_task("<script>alert(1)</script>", "Work");
        let status = SyncStatus::Idle;
        let html = to_html(&page_for(&store, &UiState::default(), &status));

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn test_page_markup_sections() {
        let mut store = TaskStore::default();
        let id = store.add_task("Pay rent", "Work").expect("task should be added");
        store.toggle_complete(id);
        let ui = UiState {
            open_dropdown: Some(id),
        };
        let status = SyncStatus::failed(&crate::storage::StorageError::Auth("expired".into()));
        let html = to_html(&page_for(&store, &ui, &status));

        assert!(html.contains("<body class=\"light-mode\">"));
        assert!(html.contains("data-feather=\"sun\""));
        assert!(html.contains("Login with Google"));
        assert!(html.contains("class=\"category-filter active\" data-action=\"select-filter\" data-category=\"All\""));
        assert!(html.contains("task-item completed"));
        assert!(html.contains(" checked>"));
        assert!(html.contains("category-dropdown open"));
        assert!(html.contains("data-category=\"Shopping\">Shopping</button>"));
        assert!(html.contains("sync-status error"));
        assert!(html.contains("<option value=\"Uncategorized\">Uncategorized</option>"));
    }

    #[test]
    fn test_empty_list_markup() {
        let store = TaskStore::default();
        let status = SyncStatus::Idle;
        let html = to_html(&page_for(&store, &UiState::default(), &status));

        assert!(html.contains("<li class=\"task-item empty\">No tasks in this category.</li>"));
        assert!(!html.contains("sync-status"));
    }
}
