//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed SQLx connection (usually a transaction),
//! builds its queries at runtime with bound parameters, and returns the row
//! types from [`crate::db::models`].
//!
//! - [`Users`]: the `users` table
//! - [`Todos`]: the `todos` table

pub mod repository;
pub mod todos;
pub mod users;

pub use repository::Repository;
pub use todos::Todos;
pub use users::Users;
