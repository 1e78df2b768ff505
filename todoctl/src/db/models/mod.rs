//! Database record models matching table schemas.
//!
//! Row structs derive `sqlx::FromRow` and are returned by the repositories in
//! [`crate::db::handlers`]. Request structs carry exactly what a repository
//! needs to write, converted from the API models at the service boundary.

pub mod todos;
pub mod users;
