use tempfile::TempDir;

use taskmaster::app::{App, ScriptedPrompter, UiEvent};
use taskmaster::storage::{LocalBackend, LocalStorage, TaskBackend};
use taskmaster::store::Filter;
use taskmaster::types::{Task, UNCATEGORIZED};
use taskmaster::view::TaskList;

fn defaults() -> Vec<String> {
    ["Work", "Personal", "Shopping"].map(String::from).to_vec()
}

fn storage(temp_dir: &TempDir) -> LocalStorage {
    LocalStorage::open(temp_dir.path().join("local_storage.json"))
}

#[tokio::test]
async fn pay_rent_scenario() {
    let temp_dir = TempDir::new().expect("temp dir should be created");
    let mut app = App::start(storage(&temp_dir), &defaults(), None).await;
    let mut prompter = ScriptedPrompter::default();
    assert_eq!(app.store().filter(), &Filter::All);

    app.handle(
        UiEvent::SubmitTask {
            title: "Pay rent".to_string(),
            category: "Work".to_string(),
        },
        &mut prompter,
    )
    .await;
    let tasks = app.store().tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].category, "Work");
    assert!(!tasks[0].completed);
    let id = tasks[0].id;

    app.handle(UiEvent::ToggleComplete(id), &mut prompter).await;
    assert!(app.store().tasks()[0].completed);

    app.handle(UiEvent::RemoveCategory("Work".to_string()), &mut prompter)
        .await;
    assert_eq!(app.store().tasks()[0].category, UNCATEGORIZED);
    assert!(prompter.asked().is_empty());

    let page = app.page();
    let labels: Vec<_> = page
        .category_bar
        .iter()
        .map(|button| button.label.as_str())
        .collect();
    assert_eq!(labels, ["All", "Personal", "Shopping"]);

    let reopened = App::start(storage(&temp_dir), &defaults(), None).await;
    assert_eq!(reopened.store().tasks(), app.store().tasks());
    assert_eq!(reopened.store().categories(), ["Personal", "Shopping"]);
}

#[tokio::test]
async fn filter_shows_matching_tasks_in_order() {
    let temp_dir = TempDir::new().expect("temp dir should be created");
    let mut app = App::start(storage(&temp_dir), &defaults(), None).await;
    for (title, category) in [("a", "Work"), ("b", "Personal"), ("c", "Work")] {
        app.add_task(title, category).await;
    }

    app.set_filter(Filter::Category("Work".to_string()));
    let titles: Vec<_> = app
        .page()
        .task_list
        .rows()
        .iter()
        .map(|row| row.title.clone())
        .collect();
    assert_eq!(titles, ["a", "c"]);

    app.set_filter(Filter::Category("Shopping".to_string()));
    assert!(matches!(app.page().task_list, TaskList::Empty { .. }));

    app.set_filter(Filter::All);
    assert_eq!(app.page().task_list.rows().len(), 3);
}

#[tokio::test]
async fn local_backend_round_trip_is_field_for_field() {
    let temp_dir = TempDir::new().expect("temp dir should be created");
    let backend = LocalBackend::new(storage(&temp_dir));

    let mut done = Task::new("Buy milk", "Shopping");
    done.completed = true;
    let tasks = vec![Task::new("Pay rent", "Work"), done];

    backend.save(&tasks).await.expect("save should succeed");
    assert_eq!(backend.load().await.expect("load should succeed"), tasks);
}

#[tokio::test]
async fn malformed_local_tasks_start_empty() {
    let temp_dir = TempDir::new().expect("temp dir should be created");
    let local = storage(&temp_dir);
    local
        .set_item("tasks", "{oops")
        .expect("raw value should be stored");

    let app = App::start(local, &defaults(), None).await;
    assert!(app.store().tasks().is_empty());
    assert!(!app.sync_status().is_failed());
    assert!(app.frame().contains("No tasks in this category."));
}
