//! HTTP request handlers.
//!
//! - [`users`]: user CRUD and listing
//! - [`todos`]: todo CRUD, listing, and listing with owners embedded
//! - [`health`]: unauthenticated status probes
//!
//! Mutating handlers open a transaction, hand it to a service from
//! [`crate::services`], and commit only when the service succeeded. An early
//! return drops the transaction, which rolls it back, so a failed request
//! leaves no partial writes. List handlers use a transaction too, so the
//! total and the page are read from the same snapshot.
//!
//! Handlers return [`crate::errors::Error`], which renders as a status code
//! and a `{"detail": ...}` body.

pub mod health;
pub mod todos;
pub mod users;
