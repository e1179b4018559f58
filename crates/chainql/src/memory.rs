//! In-process driver that records statements instead of running them.
//!
//! `MemoryDriver` escapes like MySQL, remembers every statement it is given and
//! answers with results queued ahead of time. When nothing is queued, SELECTs
//! return an empty row set and everything else reports zero affected rows.
//!
//! ```ignore
//! let driver = MemoryDriver::new();
//! driver.push_rows(vec![Row::new().with("id", "1")]);
//!
//! let mut qb = QueryBuilder::new(&driver);
//! let outcome = qb.where_eq("id", 1).get_from("users").await?;
//! assert_eq!(driver.last_executed().as_deref(), Some("SELECT * FROM users WHERE `id` = '1'"));
//! ```

use crate::driver::{Driver, RawResult};
use crate::error::{DbError, DbResult};
use crate::escape::escape_backslash;
use crate::hook::QueryType;
use crate::row::Row;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
enum Queued {
    Rows(Vec<Row>),
    Done(u64),
    Error {
        code: Option<String>,
        message: String,
    },
}

#[derive(Debug, Default)]
struct MemoryState {
    executed: Vec<String>,
    queued: VecDeque<Queued>,
}

/// A [`Driver`] that records statements and replays queued results.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    state: Mutex<MemoryState>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Answer the next statement with these rows.
    pub fn push_rows(&self, rows: Vec<Row>) -> &Self {
        self.state().queued.push_back(Queued::Rows(rows));
        self
    }

    /// Answer the next statement with an affected-row count.
    pub fn push_done(&self, affected: u64) -> &Self {
        self.state().queued.push_back(Queued::Done(affected));
        self
    }

    /// Fail the next statement with a driver error.
    pub fn push_error(&self, code: Option<&str>, message: impl Into<String>) -> &Self {
        self.state().queued.push_back(Queued::Error {
            code: code.map(str::to_string),
            message: message.into(),
        });
        self
    }

    /// Every statement executed so far, oldest first.
    pub fn executed(&self) -> Vec<String> {
        self.state().executed.clone()
    }

    pub fn last_executed(&self) -> Option<String> {
        self.state().executed.last().cloned()
    }

    /// Forget executed statements and drop queued results.
    pub fn clear(&self) {
        let mut state = self.state();
        state.executed.clear();
        state.queued.clear();
    }
}

impl Driver for MemoryDriver {
    async fn execute(&self, sql: &str) -> DbResult<RawResult> {
        let next = {
            let mut state = self.state();
            state.executed.push(sql.to_string());
            state.queued.pop_front()
        };
        match next {
            Some(Queued::Rows(rows)) => Ok(RawResult::rows(rows)),
            Some(Queued::Done(affected)) => Ok(RawResult::Done(affected)),
            Some(Queued::Error { code, message }) => Err(DbError::Driver { code, message }),
            None if QueryType::from_sql(sql) == QueryType::Select => Ok(RawResult::rows(Vec::new())),
            None => Ok(RawResult::Done(0)),
        }
    }

    fn escape(&self, value: &str) -> String {
        escape_backslash(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_queue_then_falls_back() {
        let driver = MemoryDriver::new();
        driver
            .push_rows(vec![Row::new().with("n", "1")])
            .push_done(3)
            .push_error(Some("1146"), "Table 'db.nope' doesn't exist");

        match driver.execute("SELECT n FROM t").await.unwrap() {
            RawResult::Rows(rows) => assert_eq!(rows.row_count(), 1),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            driver.execute("DELETE FROM t").await.unwrap(),
            RawResult::Done(3)
        ));
        let err = driver.execute("SELECT * FROM nope").await.unwrap_err();
        assert!(err.to_string().contains("1146"));

        assert!(matches!(
            driver.execute("SELECT 1").await.unwrap(),
            RawResult::Rows(_)
        ));
        assert!(matches!(
            driver.execute("UPDATE t SET a = '1'").await.unwrap(),
            RawResult::Done(0)
        ));
        assert_eq!(driver.executed().len(), 5);
        assert_eq!(driver.last_executed().as_deref(), Some("UPDATE t SET a = '1'"));

        driver.clear();
        assert!(driver.executed().is_empty());
    }

    #[test]
    fn escapes_mysql_style_with_backticks() {
        let driver = MemoryDriver::new();
        assert_eq!(driver.escape("it's"), r"it\'s");
        assert_eq!(driver.quote_identifier("id"), "`id`");
    }
}
