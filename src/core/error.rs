//! Storage and domain errors shared by the CLI and the HTTP API

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by [`Database`](crate::core::db::Database) operations
#[derive(Debug, Error, Diagnostic)]
pub enum DbError {
    #[error("{entity} {id} not found")]
    #[diagnostic(code(sect::db::not_found))]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    #[diagnostic(code(sect::db::conflict))]
    Conflict(String),

    #[error("{0}")]
    #[diagnostic(code(sect::db::invalid))]
    Invalid(String),

    #[error("{0}")]
    #[diagnostic(code(sect::db::unauthorized))]
    Unauthorized(String),

    #[error("{0}")]
    #[diagnostic(code(sect::db::forbidden))]
    Forbidden(String),

    #[error("database schema version {found} is newer than supported version {supported}")]
    #[diagnostic(
        code(sect::db::schema),
        help("upgrade sect or point --db at a database created by this version")
    )]
    Schema { found: i32, supported: i32 },

    #[error("SQLite error: {0}")]
    #[diagnostic(code(sect::db::sqlite))]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(sect::db::io))]
    Io(#[from] std::io::Error),
}

impl DbError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        DbError::Invalid(message.into())
    }
}

pub type DbResult<T> = std::result::Result<T, DbError>;

/// Require a non-blank string field
pub fn require_text(field: &str, value: &str) -> DbResult<()> {
    if value.trim().is_empty() {
        return Err(DbError::invalid(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("supplier", 42);
        assert_eq!(err.to_string(), "supplier 42 not found");
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("name", "Bosch").is_ok());
        let err = require_text("name", "   ").unwrap_err();
        assert_eq!(err.to_string(), "name is required");
    }
}
