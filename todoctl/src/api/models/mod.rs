//! API request and response data models.
//!
//! These structures define the public API contract. They are distinct from
//! the row types in [`crate::db::models`] so storage and API representations
//! can evolve independently.
//!
//! - [`pagination`]: page-based pagination and the list envelope
//! - [`query`]: sort direction shared by list endpoints
//! - [`users`]: user bodies, responses and list query
//! - [`todos`]: todo bodies, responses and list query
//! - [`health`]: status probe payloads
//!
//! Inputs derive [`validator::Validate`]; the extractors in
//! [`crate::api::extractors`] run it before a handler sees the value.

pub mod health;
pub mod pagination;
pub mod query;
pub mod todos;
pub mod users;
