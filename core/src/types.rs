//! Domain records for the todo API.
//!
//! # Design
//! A single `Todo` type serves both directions. `id` is `None` until the
//! server assigns one, which is how the service tells a new record from a
//! persisted one. The mock-server defines its own record independently;
//! integration tests catch schema drift between the two crates.

use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a todo.
pub type TodoId = i64;

/// A single todo record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TodoId>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl Todo {
    /// Build an unsaved record.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            completed: false,
        }
    }

    /// True when the record has not been persisted yet.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Borrow the record as a create payload, which never carries an id.
    pub fn payload(&self) -> TodoPayload<'_> {
        TodoPayload {
            title: &self.title,
            description: &self.description,
            completed: self.completed,
        }
    }
}

/// Request body for `POST /todos`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TodoPayload<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub completed: bool,
}
