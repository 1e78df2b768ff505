use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        table: Option<String>,
        /// Column named in the engine's message, e.g. `username` for `users.username`
        column: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation { message: String },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    let (table, column) = constrained_column(db_err.message());
                    DbError::UniqueViolation {
                        table,
                        column,
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        message: db_err.message().to_string(),
                    }
                } else {
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Pull `table.column` out of an SQLite constraint message such as
/// "UNIQUE constraint failed: users.email".
fn constrained_column(message: &str) -> (Option<String>, Option<String>) {
    let Some((_, target)) = message.split_once("failed: ") else {
        return (None, None);
    };
    // Composite constraints list several columns; the first one is enough for logging.
    let first = target.split(',').next().unwrap_or(target).trim();
    match first.split_once('.') {
        Some((table, column)) => (Some(table.to_string()), Some(column.to_string())),
        None => (None, None),
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constrained_column_parses_sqlite_message() {
        let (table, column) = constrained_column("UNIQUE constraint failed: users.email");
        assert_eq!(table.as_deref(), Some("users"));
        assert_eq!(column.as_deref(), Some("email"));
    }

    #[test]
    fn test_constrained_column_takes_first_of_composite() {
        let (table, column) = constrained_column("UNIQUE constraint failed: users.username, users.email");
        assert_eq!(table.as_deref(), Some("users"));
        assert_eq!(column.as_deref(), Some("username"));
    }

    #[test]
    fn test_constrained_column_unknown_message() {
        assert_eq!(constrained_column("disk I/O error"), (None, None));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(DbError::from(sqlx::Error::RowNotFound), DbError::NotFound));
    }
}
