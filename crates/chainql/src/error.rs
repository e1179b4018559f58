//! Error types for chainql

use thiserror::Error;

/// Result type alias for chainql operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for query assembly and execution
#[derive(Debug, Error)]
pub enum DbError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error reported by tokio-postgres
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Driver-level failure with the driver's own error text and code
    #[error("Driver error{}: {message}", fmt_code(.code))]
    Driver {
        code: Option<String>,
        message: String,
    },

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// The builder state cannot produce a statement
    #[error("Validation error: {0}")]
    Validation(String),

    /// A query hook refused to let the statement run
    #[error("Query aborted: {0}")]
    Aborted(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

fn fmt_code(code: &Option<String>) -> String {
    code.as_deref()
        .map(|c| format!(" ({c})"))
        .unwrap_or_default()
}

impl DbError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a driver error from its message and optional error code
    pub fn driver(code: Option<impl Into<String>>, message: impl Into<String>) -> Self {
        Self::Driver {
            code: code.map(Into::into),
            message: message.into(),
        }
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Parse a tokio_postgres error into a more specific DbError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            return match db_err.code().code() {
                "23505" => Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => Self::ForeignKeyViolation(format!("{}: {}", constraint, message)),
                "23514" => Self::CheckViolation(format!("{}: {}", constraint, message)),
                code => Self::driver(Some(code), message),
            };
        }
        if err.is_closed() {
            return Self::Connection(err.to_string());
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for DbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;

    #[test]
    fn driver_error_shows_code_when_present() {
        let err = DbError::driver(Some("1064"), "You have an error in your SQL syntax");
        assert_eq!(
            err.to_string(),
            "Driver error (1064): You have an error in your SQL syntax"
        );

        let err = DbError::driver(None::<String>, "server has gone away");
        assert_eq!(err.to_string(), "Driver error: server has gone away");
    }

    #[test]
    fn predicates_match_variants() {
        assert!(DbError::not_found("row 3").is_not_found());
        assert!(DbError::validation("no table").is_validation());
        assert!(!DbError::Other("x".into()).is_unique_violation());
    }
}
