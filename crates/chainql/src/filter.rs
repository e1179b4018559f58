//! Predicate input for WHERE and HAVING.

use crate::clause::Joiner;
use crate::driver::Driver;
use crate::escape::has_comparison_operator;
use std::fmt::Display;

/// How a predicate merges with what is already in the clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub(crate) fn joiner(self) -> Joiner {
        match self {
            Conjunction::And => Joiner::And,
            Conjunction::Or => Joiner::Or,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterKind {
    /// Column to value pairs compared with the filter's operator.
    Pairs(Vec<(String, String)>),
    /// A complete predicate, appended as written.
    Raw(String),
}

/// One WHERE/HAVING call's worth of predicates.
///
/// Values are escaped and single-quoted when the filter is merged into a
/// builder; columns are identifier-quoted unless disabled. Raw predicates are
/// trusted caller SQL and pass through untouched.
///
/// ```ignore
/// qb.and_where(Filter::pairs([("age", 30)]).op(">="));
/// qb.and_where(("id", 1));
/// qb.or_where("deleted_at IS NULL");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    kind: FilterKind,
    operator: String,
    quote: Option<bool>,
}

impl Filter {
    fn with_kind(kind: FilterKind) -> Self {
        Self {
            kind,
            operator: "=".to_string(),
            quote: None,
        }
    }

    /// `column = 'value'`
    pub fn eq(column: impl Into<String>, value: impl Display) -> Self {
        Self::with_kind(FilterKind::Pairs(vec![(column.into(), value.to_string())]))
    }

    /// `column <op> 'value'`
    pub fn cmp(column: impl Into<String>, operator: impl Into<String>, value: impl Display) -> Self {
        Self::eq(column, value).op(operator)
    }

    /// Several column/value pairs, joined by the conjunction of the call they are merged with.
    pub fn pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Display,
    {
        Self::with_kind(FilterKind::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.to_string()))
                .collect(),
        ))
    }

    /// A complete predicate such as `deleted_at IS NULL`.
    ///
    /// Text starting with the clause keyword (`WHERE ...`) replaces the clause.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::with_kind(FilterKind::Raw(sql.into()))
    }

    /// Comparison operator for pairs (default `=`).
    pub fn op(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }

    /// Emit column names without identifier quotes.
    pub fn no_backtick(self) -> Self {
        self.backtick(false)
    }

    /// Turn identifier quoting on or off for this filter, overriding the builder default.
    pub fn backtick(mut self, enabled: bool) -> Self {
        self.quote = Some(enabled);
        self
    }

    pub fn is_raw(&self) -> bool {
        matches!(self.kind, FilterKind::Raw(_))
    }

    pub fn is_empty(&self) -> bool {
        match &self.kind {
            FilterKind::Pairs(pairs) => pairs.is_empty(),
            FilterKind::Raw(sql) => sql.trim().is_empty(),
        }
    }

    /// Render each predicate of this filter, escaping values through `driver`.
    pub(crate) fn render<D: Driver>(&self, driver: &D, quote_default: bool) -> Vec<String> {
        match &self.kind {
            FilterKind::Raw(sql) => vec![sql.clone()],
            FilterKind::Pairs(pairs) => {
                let quote = self.quote.unwrap_or(quote_default);
                pairs
                    .iter()
                    .map(|(key, value)| {
                        let value = format!("'{}'", driver.escape(value));
                        if has_comparison_operator(key) {
                            format!("{} {}", key.trim_end(), value)
                        } else if quote {
                            format!("{} {} {}", driver.quote_identifier(key), self.operator, value)
                        } else {
                            format!("{} {} {}", key, self.operator, value)
                        }
                    })
                    .collect()
            }
        }
    }
}

impl From<&str> for Filter {
    fn from(sql: &str) -> Self {
        Filter::raw(sql)
    }
}

impl From<String> for Filter {
    fn from(sql: String) -> Self {
        Filter::raw(sql)
    }
}

impl<K: Into<String>, V: Display> From<(K, V)> for Filter {
    fn from((column, value): (K, V)) -> Self {
        Filter::eq(column, value)
    }
}
