//! Fluent statement builder.
//!
//! A [`QueryBuilder`] accumulates clauses across chained calls and turns them
//! into one SQL string when a terminal method runs (`get`, `insert`, `update`,
//! `delete`). Terminal methods always reset the builder, so the same instance can
//! be reused for the next statement.
//!
//! # Example
//!
//! ```ignore
//! use chainql::{Filter, QueryBuilder};
//!
//! let mut qb = QueryBuilder::new(client);
//!
//! let mut cursor = qb
//!     .select("id, name")
//!     .and_where(Filter::pairs([("age", 30)]).op(">="))
//!     .order_by("name", Some("asc"))
//!     .limit_offset(10, 20)
//!     .get_from("users")
//!     .await?
//!     .into_cursor();
//!
//! qb.set("name", "Ann").set("age", 30).insert_into("users").await?;
//! ```

use crate::clause::{Clause, Clauses, Joiner, Keyword};
use crate::config::{BuilderConfig, handle_dangerous_dml};
use crate::cursor::ResultCursor;
use crate::driver::{Driver, RawResult};
use crate::error::{DbError, DbResult};
use crate::fields::Fields;
use crate::filter::{Conjunction, Filter};
use crate::hook::{HookAction, QueryContext, QueryHook, QueryResult};
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Instant;

/// Aggregate functions accepted by [`QueryBuilder::select_aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Max,
    Min,
    Avg,
    Sum,
}

impl Aggregate {
    pub fn as_str(self) -> &'static str {
        match self {
            Aggregate::Max => "MAX",
            Aggregate::Min => "MIN",
            Aggregate::Avg => "AVG",
            Aggregate::Sum => "SUM",
        }
    }
}

/// Result of a SELECT (or any statement run through [`QueryBuilder::query`]).
#[derive(Debug)]
pub enum Outcome {
    /// The statement returned at least one row.
    Rows(ResultCursor),
    /// The statement returns rows but matched none.
    Empty,
    /// The statement returns no rows; affected-row count.
    Done(u64),
}

impl Outcome {
    fn from_raw(raw: RawResult) -> Self {
        match raw {
            RawResult::Rows(rows) if rows.row_count() > 0 => Outcome::Rows(ResultCursor::new(rows)),
            RawResult::Rows(_) => Outcome::Empty,
            RawResult::Done(affected) => Outcome::Done(affected),
        }
    }

    pub fn has_rows(&self) -> bool {
        matches!(self, Outcome::Rows(_))
    }

    /// The cursor, if rows came back.
    pub fn into_cursor(self) -> Option<ResultCursor> {
        match self {
            Outcome::Rows(cursor) => Some(cursor),
            _ => None,
        }
    }

    /// Affected rows for statements that do not return rows.
    pub fn affected(&self) -> Option<u64> {
        match self {
            Outcome::Done(n) => Some(*n),
            _ => None,
        }
    }
}

/// Stateful SQL accumulator bound to a driver.
///
/// Not meant to be shared between tasks: clause state lives in the builder
/// between chained calls. Use one builder per logical statement stream.
pub struct QueryBuilder<D> {
    driver: D,
    config: BuilderConfig,
    clauses: Clauses,
    pending: Fields,
    last_statement: String,
    hooks: Vec<Arc<dyn QueryHook>>,
}

impl<D> fmt::Debug for QueryBuilder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("config", &self.config)
            .field("clauses", &self.clauses)
            .field("pending", &self.pending)
            .field("last_statement", &self.last_statement)
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

impl<D: Driver> QueryBuilder<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            config: BuilderConfig::default(),
            clauses: Clauses::default(),
            pending: Fields::new(),
            last_statement: String::new(),
            hooks: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a hook that sees every executed statement.
    pub fn with_hook(mut self, hook: impl QueryHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Register a hook shared with other builders.
    pub fn with_shared_hook(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Escape a value with the driver's rules (no quotes added).
    pub fn escape(&self, value: &str) -> String {
        self.driver.escape(value)
    }

    /// The most recently executed SQL text.
    pub fn last_statement(&self) -> &str {
        &self.last_statement
    }

    /// Accumulated SELECT clauses.
    pub fn clauses(&self) -> &Clauses {
        &self.clauses
    }

    /// Escaped values waiting for the next INSERT or UPDATE.
    pub fn pending_fields(&self) -> &Fields {
        &self.pending
    }

    /// Drop all clause state and pending fields.
    pub fn reset(&mut self) -> &mut Self {
        self.clauses.reset();
        self.pending.clear();
        self
    }

    // ==================== SELECT ====================

    /// Set the SELECT list. Text starting with `SELECT` replaces the whole clause.
    pub fn select(&mut self, expr: &str) -> &mut Self {
        let expr = if expr.trim().is_empty() { "*" } else { expr };
        self.clauses.replace(Keyword::Select, expr);
        self
    }

    /// Prefix the SELECT list with `DISTINCT`.
    pub fn distinct(&mut self) -> &mut Self {
        self.clauses.distinct();
        self
    }

    /// `SELECT FN(expr) [AS alias]`; text starting with `SELECT` replaces the clause.
    pub fn select_aggregate(
        &mut self,
        aggregate: Aggregate,
        expr: &str,
        alias: Option<&str>,
    ) -> &mut Self {
        if Keyword::Select.opens(expr) {
            self.clauses.set(Keyword::Select, Clause::Verbatim(expr.to_string()));
            return self;
        }
        let call = match alias.filter(|a| !a.trim().is_empty()) {
            Some(alias) => format!("{}({}) AS {}", aggregate.as_str(), expr, alias),
            None => format!("{}({})", aggregate.as_str(), expr),
        };
        self.clauses.set(Keyword::Select, Clause::single(call));
        self
    }

    pub fn select_max(&mut self, expr: &str, alias: Option<&str>) -> &mut Self {
        self.select_aggregate(Aggregate::Max, expr, alias)
    }

    pub fn select_min(&mut self, expr: &str, alias: Option<&str>) -> &mut Self {
        self.select_aggregate(Aggregate::Min, expr, alias)
    }

    pub fn select_avg(&mut self, expr: &str, alias: Option<&str>) -> &mut Self {
        self.select_aggregate(Aggregate::Avg, expr, alias)
    }

    pub fn select_sum(&mut self, expr: &str, alias: Option<&str>) -> &mut Self {
        self.select_aggregate(Aggregate::Sum, expr, alias)
    }

    // ==================== FROM / JOIN ====================

    /// Set the target table, replacing any previous one.
    pub fn from(&mut self, table: &str) -> &mut Self {
        self.clauses.replace(Keyword::From, table);
        self
    }

    /// `JOIN table ON on`
    pub fn join(&mut self, table: &str, on: &str) -> &mut Self {
        self.join_as("", table, Some(on))
    }

    pub fn inner_join(&mut self, table: &str, on: &str) -> &mut Self {
        self.join_as("inner", table, Some(on))
    }

    pub fn left_join(&mut self, table: &str, on: &str) -> &mut Self {
        self.join_as("left", table, Some(on))
    }

    pub fn right_join(&mut self, table: &str, on: &str) -> &mut Self {
        self.join_as("right", table, Some(on))
    }

    /// Append `[TYPE ]JOIN table[ ON on]`. The join type is uppercased; an empty
    /// type gives a plain `JOIN`. A `table` that already contains `JOIN` is
    /// appended as written.
    pub fn join_as(&mut self, join_type: &str, table: &str, on: Option<&str>) -> &mut Self {
        if table.trim().is_empty() {
            return self;
        }
        let fragment = if Keyword::Join.opens(table) {
            table.to_string()
        } else {
            let join_type = join_type.trim();
            let prefix = if join_type.is_empty() {
                "JOIN".to_string()
            } else {
                format!("{} JOIN", join_type.to_uppercase())
            };
            match on.map(str::trim).filter(|on| !on.is_empty()) {
                Some(on) => format!("{} {} ON {}", prefix, table, on),
                None => format!("{} {}", prefix, table),
            }
        };
        self.clauses.append(Keyword::Join, Joiner::Space, fragment);
        self
    }

    /// Append a caller-written join fragment as is.
    pub fn join_raw(&mut self, fragment: &str) -> &mut Self {
        self.clauses.append(Keyword::Join, Joiner::Space, fragment);
        self
    }

    // ==================== WHERE / HAVING ====================

    /// Merge predicates into WHERE with `AND`.
    pub fn and_where(&mut self, filter: impl Into<Filter>) -> &mut Self {
        self.merge_filter(Keyword::Where, Conjunction::And, filter.into())
    }

    /// Merge predicates into WHERE with `OR`.
    pub fn or_where(&mut self, filter: impl Into<Filter>) -> &mut Self {
        self.merge_filter(Keyword::Where, Conjunction::Or, filter.into())
    }

    /// Shorthand for `and_where(Filter::eq(column, value))`.
    pub fn where_eq(&mut self, column: &str, value: impl Display) -> &mut Self {
        self.and_where(Filter::eq(column, value))
    }

    /// Merge predicates into HAVING with `AND`.
    pub fn having(&mut self, filter: impl Into<Filter>) -> &mut Self {
        self.merge_filter(Keyword::Having, Conjunction::And, filter.into())
    }

    /// Merge predicates into HAVING with `OR`.
    pub fn or_having(&mut self, filter: impl Into<Filter>) -> &mut Self {
        self.merge_filter(Keyword::Having, Conjunction::Or, filter.into())
    }

    fn merge_filter(&mut self, keyword: Keyword, conjunction: Conjunction, filter: Filter) -> &mut Self {
        if filter.is_empty() {
            return self;
        }
        for predicate in filter.render(&self.driver, self.config.quote_identifiers) {
            self.clauses.append(keyword, conjunction.joiner(), predicate);
        }
        self
    }

    // ==================== GROUP BY / ORDER BY / LIMIT ====================

    /// Append one GROUP BY column.
    pub fn group_by(&mut self, column: &str) -> &mut Self {
        self.clauses.append(Keyword::GroupBy, Joiner::Comma, column);
        self
    }

    /// Replace GROUP BY with these columns.
    pub fn group_by_all<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = columns
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.clauses.replace(Keyword::GroupBy, list);
        self
    }

    /// Append `column[ DIRECTION]` to ORDER BY.
    ///
    /// A full `ORDER BY ...` clause replaces the current one and ignores `direction`.
    pub fn order_by(&mut self, column: &str, direction: Option<&str>) -> &mut Self {
        let direction = direction.map(str::trim).filter(|d| !d.is_empty());
        let entry = match direction {
            Some(direction) if !Keyword::OrderBy.opens(column) => {
                format!("{} {}", column, direction.to_uppercase())
            }
            _ => column.to_string(),
        };
        self.clauses.append(Keyword::OrderBy, Joiner::Comma, entry);
        self
    }

    /// `LIMIT count`
    pub fn limit(&mut self, count: u64) -> &mut Self {
        self.clauses.replace(Keyword::Limit, count.to_string());
        self
    }

    /// `LIMIT offset, count`
    pub fn limit_offset(&mut self, count: u64, offset: u64) -> &mut Self {
        self.clauses
            .replace(Keyword::Limit, format!("{}, {}", offset, count));
        self
    }

    /// Caller-written LIMIT body or full clause (`LIMIT 5 OFFSET 10`).
    pub fn limit_raw(&mut self, text: &str) -> &mut Self {
        self.clauses.replace(Keyword::Limit, text);
        self
    }

    /// Replace a clause with caller text, bypassing all merge rules.
    ///
    /// The keyword is prepended when `text` does not already carry it.
    pub fn raw_clause(&mut self, keyword: Keyword, text: &str) -> &mut Self {
        let text = if keyword.opens(text) {
            text.to_string()
        } else {
            format!("{} {}", keyword, text.trim_start())
        };
        self.clauses.set(keyword, Clause::Verbatim(text));
        self
    }

    // ==================== SET ====================

    /// Queue `column = 'escaped value'` for the next INSERT/UPDATE.
    pub fn set(&mut self, column: &str, value: impl Display) -> &mut Self {
        let escaped = self.driver.escape(&value.to_string());
        self.pending.insert(column, escaped);
        self
    }

    /// Queue a value without escaping it.
    pub fn set_raw(&mut self, column: &str, value: impl Display) -> &mut Self {
        self.pending.insert(column, value.to_string());
        self
    }

    /// Queue many values; each is escaped independently when `escape` is true.
    pub fn set_fields(&mut self, data: impl Into<Fields>, escape: bool) -> &mut Self {
        let data: Fields = data.into();
        for (column, value) in data.iter() {
            let value = if escape {
                self.driver.escape(value)
            } else {
                value.to_string()
            };
            self.pending.insert(column, value);
        }
        self
    }

    // ==================== Rendering ====================

    /// The SELECT statement the current state would produce.
    pub fn to_select_sql(&self) -> String {
        self.clauses.render_select()
    }

    fn require_table(&self, statement: &str) -> DbResult<String> {
        self.clauses
            .table()
            .ok_or_else(|| DbError::validation(format!("{statement} requires a table; call from() first")))
    }

    fn where_sql(&self) -> Option<String> {
        self.clauses
            .get(Keyword::Where)
            .render(Keyword::Where)
    }

    /// The INSERT statement the current state would produce.
    pub fn to_insert_sql(&self) -> DbResult<String> {
        let table = self.require_table("INSERT")?;
        if self.pending.is_empty() {
            return Err(DbError::validation("INSERT requires at least one set() field"));
        }
        let columns = self.pending.columns().collect::<Vec<_>>().join(",");
        let values = self
            .pending
            .iter()
            .map(|(_, value)| value)
            .collect::<Vec<_>>()
            .join("','");
        Ok(format!("INSERT INTO {table} ({columns}) VALUES ('{values}')"))
    }

    /// The UPDATE statement the current state would produce.
    pub fn to_update_sql(&self) -> DbResult<String> {
        let table = self.require_table("UPDATE")?;
        if self.pending.is_empty() {
            return Err(DbError::validation("UPDATE requires at least one set() field"));
        }
        let assignments = self
            .pending
            .iter()
            .map(|(column, value)| format!("{column} = '{value}'"))
            .collect::<Vec<_>>()
            .join(",");
        Ok(match self.where_sql() {
            Some(filter) => format!("UPDATE {table} SET {assignments} {filter}"),
            None => format!("UPDATE {table} SET {assignments}"),
        })
    }

    /// The DELETE statement the current state would produce.
    pub fn to_delete_sql(&self) -> DbResult<String> {
        let table = self.require_table("DELETE")?;
        Ok(delete_statement(&table, self.where_sql().as_deref()))
    }

    // ==================== Terminal operations ====================

    /// Run the accumulated SELECT and reset the builder.
    pub async fn get(&mut self) -> DbResult<Outcome> {
        let sql = self.to_select_sql();
        self.reset();
        self.run(sql).await.map(Outcome::from_raw)
    }

    /// `from(table)` then [`QueryBuilder::get`].
    pub async fn get_from(&mut self, table: &str) -> DbResult<Outcome> {
        self.from(table);
        self.get().await
    }

    /// Run caller-written SQL through the builder's driver and hooks.
    ///
    /// Builder state is left untouched.
    pub async fn query(&mut self, sql: impl Into<String>) -> DbResult<Outcome> {
        self.run(sql.into()).await.map(Outcome::from_raw)
    }

    /// INSERT the pending fields into the FROM table and reset the builder.
    pub async fn insert(&mut self) -> DbResult<u64> {
        let sql = self.to_insert_sql();
        self.reset();
        self.write(sql?).await
    }

    pub async fn insert_into(&mut self, table: &str) -> DbResult<u64> {
        self.from(table);
        self.insert().await
    }

    /// INSERT `data` (escaped) together with any pending fields.
    pub async fn insert_with(&mut self, table: &str, data: impl Into<Fields>) -> DbResult<u64> {
        self.from(table).set_fields(data, true);
        self.insert().await
    }

    /// UPDATE the FROM table with the pending fields and WHERE clause, then reset.
    pub async fn update(&mut self) -> DbResult<u64> {
        let sql = self.to_update_sql();
        let unfiltered = self.where_sql().is_none();
        self.reset();
        let sql = sql?;
        if unfiltered {
            handle_dangerous_dml(self.config.policy.update_without_where, "UPDATE without WHERE", &sql)?;
        }
        self.write(sql).await
    }

    pub async fn update_table(&mut self, table: &str) -> DbResult<u64> {
        self.from(table);
        self.update().await
    }

    /// UPDATE `table` with `data` (escaped) where `filter` matches.
    pub async fn update_with(
        &mut self,
        table: &str,
        data: impl Into<Fields>,
        filter: impl Into<Filter>,
    ) -> DbResult<u64> {
        self.from(table).set_fields(data, true).and_where(filter);
        self.update().await
    }

    /// DELETE from the FROM table with the current WHERE clause, then reset.
    pub async fn delete(&mut self) -> DbResult<u64> {
        let sql = self.to_delete_sql();
        let unfiltered = self.where_sql().is_none();
        self.reset();
        let sql = sql?;
        if unfiltered {
            handle_dangerous_dml(self.config.policy.delete_without_where, "DELETE without WHERE", &sql)?;
        }
        self.write(sql).await
    }

    pub async fn delete_from(&mut self, table: &str) -> DbResult<u64> {
        self.from(table);
        self.delete().await
    }

    /// One DELETE per table, all sharing the current WHERE clause.
    ///
    /// Statements run in order and stop at the first failure. Returns the total
    /// number of deleted rows.
    pub async fn delete_each<I, S>(&mut self, tables: I) -> DbResult<u64>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let filter = self.where_sql();
        let statements = tables
            .into_iter()
            .map(|table| delete_statement(table.as_ref(), filter.as_deref()))
            .collect::<Vec<_>>();
        self.reset();

        if statements.is_empty() {
            return Err(DbError::validation("DELETE requires at least one table"));
        }
        if filter.is_none() {
            for sql in &statements {
                handle_dangerous_dml(self.config.policy.delete_without_where, "DELETE without WHERE", sql)?;
            }
        }

        let mut deleted = 0;
        for sql in statements {
            deleted += self.write(sql).await?;
        }
        Ok(deleted)
    }

    /// [`QueryBuilder::delete_each`] after merging `filter` into WHERE.
    pub async fn delete_where<I, S>(&mut self, tables: I, filter: impl Into<Filter>) -> DbResult<u64>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.and_where(filter);
        self.delete_each(tables).await
    }

    // ==================== Execution ====================

    async fn write(&mut self, sql: String) -> DbResult<u64> {
        match self.run(sql).await? {
            RawResult::Done(affected) => Ok(affected),
            RawResult::Rows(rows) => Ok(rows.row_count() as u64),
        }
    }

    async fn run(&mut self, sql: String) -> DbResult<RawResult> {
        let sql = sql.trim().to_string();
        let mut ctx = QueryContext::new(&sql);
        if let Some(tag) = &self.config.tag {
            ctx = ctx.with_tag(tag.clone());
        }

        for hook in &self.hooks {
            if let HookAction::Abort(reason) = hook.before_query(&ctx) {
                return Err(DbError::Aborted(reason));
            }
        }

        self.last_statement = sql;
        let start = Instant::now();
        let result = self.driver.execute(&self.last_statement).await;
        let elapsed = start.elapsed();

        if !self.hooks.is_empty() {
            let summary = match &result {
                Ok(RawResult::Rows(rows)) => QueryResult::Rows(rows.row_count()),
                Ok(RawResult::Done(affected)) => QueryResult::Affected(*affected),
                Err(e) => QueryResult::error(e.to_string()),
            };
            for hook in &self.hooks {
                hook.after_query(&ctx, elapsed, &summary);
            }
        }
        result
    }
}

fn delete_statement(table: &str, filter: Option<&str>) -> String {
    match filter {
        Some(filter) => format!("DELETE FROM {table} {filter}"),
        None => format!("DELETE FROM {table}"),
    }
}
