//! Database models for todos.

use crate::api::models::todos::{TodoCreate, TodoUpdate};
use crate::types::{TodoId, UserId};

/// Database request for creating a new todo
#[derive(Debug, Clone)]
pub struct TodoCreateDBRequest {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub user_id: Option<UserId>,
}

impl From<TodoCreate> for TodoCreateDBRequest {
    fn from(api: TodoCreate) -> Self {
        Self {
            title: api.title,
            description: api.description,
            completed: api.completed,
            user_id: api.user_id,
        }
    }
}

/// Database request for updating a todo.
///
/// `None` leaves a column untouched; `Some(None)` sets a nullable column to NULL.
#[derive(Debug, Clone, Default)]
pub struct TodoUpdateDBRequest {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub user_id: Option<Option<UserId>>,
}

impl TodoUpdateDBRequest {
    /// True when no column would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none() && self.user_id.is_none()
    }
}

impl From<TodoUpdate> for TodoUpdateDBRequest {
    fn from(update: TodoUpdate) -> Self {
        Self {
            title: update.title,
            description: update.description,
            completed: update.completed,
            user_id: update.user_id,
        }
    }
}

/// Database response for a todo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoDBResponse {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub user_id: Option<UserId>,
}
