use super::{HookAction, QueryContext, QueryHook, QueryResult, truncate_sql_bytes};
use std::time::Duration;
use tracing::Level;

/// A `tracing`-based hook that emits each statement the builder executes.
///
/// The statement is logged before it runs; completion (row count, affected rows
/// or error, plus elapsed time) is logged after the driver returns.
///
/// Enable via the crate feature: `chainql = { features = ["tracing"] }`.
#[derive(Debug, Clone)]
pub struct TracingSqlHook {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingSqlHook {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl TracingSqlHook {
    /// Create a new hook with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN  => tracing::warn!($($field)*),
            Level::INFO  => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

impl QueryHook for TracingSqlHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let sql = self.truncate_sql(&ctx.sql);
        let tag = ctx.tag.as_deref().unwrap_or("-");
        emit_at_level!(
            self.level,
            target: "chainql.sql",
            query_type = ?ctx.query_type,
            tag,
            sql = %sql,
        );
        HookAction::Continue
    }

    fn after_query(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let tag = ctx.tag.as_deref().unwrap_or("-");
        match result {
            QueryResult::Error(message) => tracing::warn!(
                target: "chainql.sql",
                query_type = ?ctx.query_type,
                tag,
                elapsed_us = duration.as_micros() as u64,
                error = %message,
                "statement failed"
            ),
            ok => emit_at_level!(
                self.level,
                target: "chainql.sql",
                query_type = ?ctx.query_type,
                tag,
                elapsed_us = duration.as_micros() as u64,
                result = %ok,
                "statement finished"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_is_configurable() {
        let long = "SELECT ".to_string() + &"a, ".repeat(100);
        let hook = TracingSqlHook::new().max_sql_length(10);
        assert_eq!(hook.truncate_sql(&long), "SELECT a, ...");
        assert_eq!(hook.clone().no_truncate().truncate_sql(&long), long);
    }

    #[test]
    fn never_aborts() {
        let hook = TracingSqlHook::new().level(Level::TRACE);
        let ctx = QueryContext::new("DELETE FROM t");
        assert_eq!(hook.before_query(&ctx), HookAction::Continue);
    }
}
