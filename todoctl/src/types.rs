//! Identifier types shared by the storage, service and API layers.
//!
//! Both entities use integer surrogate keys assigned by the database on insert.

/// User identifier (`users.id`).
pub type UserId = i64;

/// Todo identifier (`todos.id`).
pub type TodoId = i64;
