//! HTTP API surface: handlers, request/response models and validating extractors.

pub mod extractors;
pub mod handlers;
pub mod models;
