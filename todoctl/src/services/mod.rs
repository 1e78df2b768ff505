//! Business rules for users and todos.
//!
//! Services sit between the HTTP handlers and the repositories. Each one
//! borrows the caller's connection (normally the request's transaction), so
//! everything a single operation does lands in the same unit of work, and
//! services can construct each other over that same borrow.
//!
//! - [`UserService`]: conflict mapping and removal of owned todos on delete
//! - [`TodoService`]: owner existence check on create, eager loading of owners

pub mod todos;
pub mod users;

pub use todos::{TodoService, TodoWithOwner};
pub use users::UserService;

/// One page of a listing plus the number of rows matching the whole query.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}
