//! Plain-text views of store state and errors.

use std::fmt::Write as _;

use todo_core::{ApiError, StoreState, Todo};

/// One line per record, newest first as the server orders them. The record
/// open for editing is marked with `>`.
pub fn render_list(state: &StoreState) -> String {
    if state.list.is_empty() {
        return "No todos\n".to_string();
    }
    let mut out = String::new();
    for todo in &state.list {
        let cursor = if todo.id.is_some() && todo.id == state.editing_id {
            '>'
        } else {
            ' '
        };
        let _ = writeln!(out, "{cursor} {}", render_line(todo));
    }
    out
}

pub fn render_line(todo: &Todo) -> String {
    let mark = if todo.completed { 'x' } else { ' ' };
    let id = todo
        .id
        .map(|id| format!("#{id}"))
        .unwrap_or_else(|| "#new".to_string());
    format!("[{mark}] {id} {}: {}", todo.title, todo.description)
}

pub fn render_todo(todo: &Todo) -> String {
    let id = todo
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unsaved".to_string());
    format!(
        "id:          {id}\ntitle:       {}\ndescription: {}\ncompleted:   {}\n",
        todo.title, todo.description, todo.completed
    )
}

/// User-facing text for a failed operation. Validation failures list one
/// line per field.
pub fn render_error(err: &ApiError) -> String {
    match err {
        ApiError::Validation(errors) => {
            let mut out = String::new();
            for e in errors.errors() {
                let _ = writeln!(out, "  {}: {}", e.field, e.message);
            }
            out
        }
        ApiError::NotFound => "error: todo not found\n".to_string(),
        other => format!("error: {other}\n"),
    }
}
