//! Driver trait: the database collaborator the builder executes through.

use crate::error::DbResult;
use crate::escape;
use crate::row::Row;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

/// A database driver able to run fully-assembled SQL text.
///
/// The builder never talks to a connection directly; it assembles a statement,
/// escapes values through [`Driver::escape`], and hands the finished string to
/// [`Driver::execute`].
pub trait Driver: Send + Sync {
    /// Run a statement.
    ///
    /// Row-returning statements yield [`RawResult::Rows`]; everything else yields
    /// [`RawResult::Done`] with the affected-row count. Failures must carry the
    /// driver's own error text (and code, when it has one).
    fn execute(&self, sql: &str) -> impl Future<Output = DbResult<RawResult>> + Send;

    /// Make a scalar safe for interpolation between single quotes.
    fn escape(&self, value: &str) -> String;

    /// Quote a column name for this dialect.
    ///
    /// The default uses backticks.
    fn quote_identifier(&self, column: &str) -> String {
        escape::backtick(column)
    }
}

impl<D: Driver> Driver for &D {
    fn execute(&self, sql: &str) -> impl Future<Output = DbResult<RawResult>> + Send {
        (**self).execute(sql)
    }

    fn escape(&self, value: &str) -> String {
        (**self).escape(value)
    }

    fn quote_identifier(&self, column: &str) -> String {
        (**self).quote_identifier(column)
    }
}

impl<D: Driver> Driver for Arc<D> {
    fn execute(&self, sql: &str) -> impl Future<Output = DbResult<RawResult>> + Send {
        (**self).execute(sql)
    }

    fn escape(&self, value: &str) -> String {
        (**self).escape(value)
    }

    fn quote_identifier(&self, column: &str) -> String {
        (**self).quote_identifier(column)
    }
}

/// What a driver hands back after running a statement.
pub enum RawResult {
    /// A row handle to be drained by a [`ResultCursor`](crate::ResultCursor).
    Rows(Box<dyn RawRows>),
    /// Success without rows, with the number of affected rows.
    Done(u64),
}

impl RawResult {
    /// Wrap an already-buffered row list.
    pub fn rows(rows: Vec<Row>) -> Self {
        Self::Rows(Box::new(VecRows::new(rows)))
    }
}

impl std::fmt::Debug for RawResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawResult::Rows(rows) => f
                .debug_tuple("Rows")
                .field(&format_args!("<{} rows>", rows.row_count()))
                .finish(),
            RawResult::Done(n) => f.debug_tuple("Done").field(n).finish(),
        }
    }
}

/// A raw result-set handle that yields rows one at a time.
pub trait RawRows: Send {
    /// Total number of rows in the result set.
    fn row_count(&self) -> usize;

    /// Fetch the next row, or `None` at end of data.
    fn fetch_next(&mut self) -> Option<Row>;
}

/// A buffered [`RawRows`] over rows that are already in memory.
#[derive(Debug, Default)]
pub struct VecRows {
    rows: VecDeque<Row>,
    total: usize,
}

impl VecRows {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            total: rows.len(),
            rows: rows.into(),
        }
    }
}

impl RawRows for VecRows {
    fn row_count(&self) -> usize {
        self.total
    }

    fn fetch_next(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }
}
