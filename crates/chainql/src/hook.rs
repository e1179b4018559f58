//! Statement hooks.
//!
//! A [`QueryHook`] sees every statement a builder executes: it may refuse it
//! before it reaches the driver and is told how it went afterwards.
//!
//! ```rust,ignore
//! use chainql::hook::{HookAction, QueryContext, QueryHook, QueryType};
//!
//! struct ReadOnly;
//!
//! impl QueryHook for ReadOnly {
//!     fn before_query(&self, ctx: &QueryContext) -> HookAction {
//!         match ctx.query_type {
//!             QueryType::Select => HookAction::Continue,
//!             _ => HookAction::Abort("read-only session".into()),
//!         }
//!     }
//! }
//!
//! let mut qb = QueryBuilder::new(client).with_hook(ReadOnly);
//! ```

use crate::clause::starts_with_keyword;
use std::fmt;
use std::time::Duration;

#[cfg(feature = "tracing")]
mod tracing_hook;

#[cfg(feature = "tracing")]
pub use tracing_hook::TracingSqlHook;

/// The type of SQL operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// Other SQL (e.g., DDL, custom)
    Other,
}

impl QueryType {
    /// Detect query type from the leading keyword of a SQL string.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = sql.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if starts_with_keyword(trimmed, "SELECT") {
            QueryType::Select
        } else if starts_with_keyword(trimmed, "INSERT") {
            QueryType::Insert
        } else if starts_with_keyword(trimmed, "UPDATE") {
            QueryType::Update
        } else if starts_with_keyword(trimmed, "DELETE") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }
}

/// Context information about the statement being executed.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// The SQL text handed to the driver.
    pub sql: String,
    /// Detected query type.
    pub query_type: QueryType,
    /// Optional tag taken from the builder configuration.
    pub tag: Option<String>,
}

impl QueryContext {
    pub fn new(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            query_type: QueryType::from_sql(sql),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// Maximum length for error messages in `QueryResult::Error`.
const MAX_ERROR_LEN: usize = 512;

/// Summary of a finished statement, as reported to hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    /// The statement produced a row set of this size.
    Rows(usize),
    /// The statement affected this many rows.
    Affected(u64),
    /// The driver failed (message truncated to 512 bytes).
    Error(String),
}

impl QueryResult {
    /// Create an error result, truncating the message.
    pub fn error(msg: String) -> Self {
        if msg.len() > MAX_ERROR_LEN {
            Self::Error(format!("{}...", truncate_sql_bytes(&msg, MAX_ERROR_LEN)))
        } else {
            Self::Error(msg)
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Affected(n) => write!(f, "{n} affected"),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Action to take after a hook inspects a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Let the statement run.
    Continue,
    /// Refuse the statement; the terminal call fails with `DbError::Aborted`.
    Abort(String),
}

/// Trait for hooking into statement execution.
pub trait QueryHook: Send + Sync {
    /// Called before the statement reaches the driver.
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let _ = ctx;
        HookAction::Continue
    }

    /// Called after the driver returns, on success and on failure.
    fn after_query(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_type_detection() {
        assert_eq!(QueryType::from_sql("SELECT * FROM users"), QueryType::Select);
        assert_eq!(QueryType::from_sql("  select * FROM users"), QueryType::Select);
        assert_eq!(QueryType::from_sql("(SELECT 1)"), QueryType::Select);
        assert_eq!(
            QueryType::from_sql("INSERT INTO users (name) VALUES ('a')"),
            QueryType::Insert
        );
        assert_eq!(
            QueryType::from_sql("UPDATE users SET name = 'a'"),
            QueryType::Update
        );
        assert_eq!(
            QueryType::from_sql("DELETE FROM users WHERE `id` = '1'"),
            QueryType::Delete
        );
        assert_eq!(
            QueryType::from_sql("CREATE TABLE users (id INT)"),
            QueryType::Other
        );
        assert_eq!(QueryType::from_sql("SELECTION"), QueryType::Other);
    }

    #[test]
    fn test_error_result_truncation() {
        let long = "x".repeat(600);
        match QueryResult::error(long) {
            QueryResult::Error(msg) => {
                assert_eq!(msg.len(), MAX_ERROR_LEN + 3);
                assert!(msg.ends_with("..."));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            QueryResult::error("short".into()),
            QueryResult::Error("short".into())
        );
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let s = "ééé";
        assert_eq!(truncate_sql_bytes(s, 3), "é");
        assert_eq!(truncate_sql_bytes(s, 100), s);
    }

    #[test]
    fn test_context_carries_tag() {
        let ctx = QueryContext::new("DELETE FROM t").with_tag("cleanup");
        assert_eq!(ctx.query_type, QueryType::Delete);
        assert_eq!(ctx.tag.as_deref(), Some("cleanup"));
    }
}
