//! Builder configuration.

use crate::error::{DbError, DbResult};

/// Configuration for a [`QueryBuilder`](crate::QueryBuilder).
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Quote column names in WHERE/HAVING pairs unless a filter says otherwise.
    pub quote_identifiers: bool,
    /// Runtime safety policy for unfiltered writes.
    pub policy: SqlPolicy,
    /// Tag attached to every hook context.
    pub tag: Option<String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            quote_identifiers: true,
            policy: SqlPolicy::default(),
            tag: None,
        }
    }
}

impl BuilderConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether predicate columns are quoted by default.
    pub fn quote_identifiers(mut self, enabled: bool) -> Self {
        self.quote_identifiers = enabled;
        self
    }

    /// Emit predicate columns bare by default.
    pub fn no_quote_identifiers(self) -> Self {
        self.quote_identifiers(false)
    }

    /// Set the runtime SQL safety policy.
    pub fn policy(mut self, policy: SqlPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Configure how DELETE without WHERE is handled.
    pub fn delete_without_where(mut self, policy: DangerousDmlPolicy) -> Self {
        self.policy.delete_without_where = policy;
        self
    }

    /// Configure how UPDATE without WHERE is handled.
    pub fn update_without_where(mut self, policy: DangerousDmlPolicy) -> Self {
        self.policy.update_without_where = policy;
        self
    }

    /// Tag every statement for hooks and logs.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// Policy for runtime SQL safety rules.
#[derive(Debug, Clone, Default)]
pub struct SqlPolicy {
    pub delete_without_where: DangerousDmlPolicy,
    pub update_without_where: DangerousDmlPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DangerousDmlPolicy {
    #[default]
    Allow,
    Warn,
    Error,
}

pub(crate) fn handle_dangerous_dml(
    policy: DangerousDmlPolicy,
    rule: &str,
    sql: &str,
) -> DbResult<()> {
    match policy {
        DangerousDmlPolicy::Allow => Ok(()),
        DangerousDmlPolicy::Warn => {
            #[cfg(feature = "tracing")]
            tracing::warn!(target: "chainql.policy", rule, sql, "SQL policy warning");
            #[cfg(not(feature = "tracing"))]
            eprintln!("[chainql warn] SQL policy: {rule}: {sql}");
            Ok(())
        }
        DangerousDmlPolicy::Error => Err(DbError::validation(format!(
            "SQL policy violation: {rule}: {sql}"
        ))),
    }
}
