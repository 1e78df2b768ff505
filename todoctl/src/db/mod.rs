//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with SQLite.
//! It follows the Repository pattern: business rules live one level up in
//! [`crate::services`], while the repositories here only know how to turn
//! typed requests into SQL.
//!
//! ```text
//! ┌─────────────┐
//! │  Services   │  (existence checks, conflict mapping, eager loading)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - rows)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │   SQLite    │
//! └─────────────┘
//! ```
//!
//! # Transactions
//!
//! Repositories borrow a connection, so they work equally over a pooled
//! connection or an open transaction. Request handlers always hand them a
//! transaction and commit it once the operation succeeded; dropping the
//! transaction on an early return rolls it back.
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let user = Users::new(&mut tx).create(&request).await?;
//! tx.commit().await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
pub mod schema;

use std::str::FromStr;
use std::time::Duration;

use sqlx::ConnectOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::DatabaseConfig;

/// Open the connection pool described by `config`.
///
/// Foreign keys are enforced on every connection so the cascade from users to
/// todos is applied by the engine, and statement logging follows the config.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let mut options = SqliteConnectOptions::from_str(&config.url)?.foreign_keys(true);

    options = if config.log_statements {
        options.log_statements(log::LevelFilter::Debug)
    } else {
        options.disable_statement_logging()
    };
    options = options.log_slow_statements(
        log::LevelFilter::Warn,
        Duration::from_millis(config.slow_statement_threshold_ms),
    );

    let pool = &config.pool;
    SqlitePoolOptions::new()
        .max_connections(pool.max_connections)
        .min_connections(pool.min_connections)
        .acquire_timeout(Duration::from_secs(pool.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(pool.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(pool.max_lifetime_secs))
        .connect_with(options)
        .await
}
