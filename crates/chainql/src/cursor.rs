//! Positionable view over the rows of one executed statement.

use crate::driver::{RawRows, VecRows};
use crate::error::{DbError, DbResult};
use crate::row::{FromRow, Row};
use std::fmt;

/// Cursor over a row-returning statement.
///
/// The raw handle is drained into an owned buffer the first time rows are
/// needed and never touched again. Navigation clamps at both ends: stepping past
/// the last row (or before the first) leaves the position where it was.
pub struct ResultCursor {
    raw: Option<Box<dyn RawRows>>,
    rows: Vec<Row>,
    position: usize,
}

impl ResultCursor {
    /// Wrap a raw row handle; nothing is fetched yet.
    pub fn new(raw: Box<dyn RawRows>) -> Self {
        Self {
            raw: Some(raw),
            rows: Vec::new(),
            position: 0,
        }
    }

    /// Cursor over rows that are already in memory.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self::new(Box::new(VecRows::new(rows)))
    }

    /// Drain the raw handle into the row buffer (once) and return the rows.
    pub fn materialize(&mut self) -> &[Row] {
        if let Some(mut raw) = self.raw.take() {
            while let Some(row) = raw.fetch_next() {
                self.rows.push(row);
            }
            self.position = 0;
        }
        &self.rows
    }

    pub fn is_materialized(&self) -> bool {
        self.raw.is_none()
    }

    /// All rows, materializing if needed.
    pub fn all_rows(&mut self) -> &[Row] {
        self.materialize()
    }

    /// All rows decoded into `T`.
    pub fn all_as<T: FromRow>(&mut self) -> DbResult<Vec<T>> {
        self.materialize().iter().map(T::from_row).collect()
    }

    /// The row at `index`, or `DbError::NotFound` when out of range.
    pub fn row_at(&mut self, index: usize) -> DbResult<&Row> {
        let rows = self.materialize();
        let len = rows.len();
        rows.get(index)
            .ok_or_else(|| DbError::not_found(format!("row {index} out of range ({len} rows)")))
    }

    /// The row at `index` decoded into `T`.
    pub fn row_at_as<T: FromRow>(&mut self, index: usize) -> DbResult<T> {
        T::from_row(self.row_at(index)?)
    }

    /// The row under the cursor.
    pub fn current(&mut self) -> Option<&Row> {
        self.materialize();
        self.rows.get(self.position)
    }

    /// Step forward if there is a next row; return the row under the cursor.
    pub fn next_row(&mut self) -> Option<&Row> {
        self.materialize();
        if self.position + 1 < self.rows.len() {
            self.position += 1;
        }
        self.rows.get(self.position)
    }

    /// Step back if there is a previous row; return the row under the cursor.
    pub fn prev_row(&mut self) -> Option<&Row> {
        self.materialize();
        self.position = self.position.saturating_sub(1);
        self.rows.get(self.position)
    }

    pub fn first_row(&mut self) -> Option<&Row> {
        self.materialize();
        self.position = 0;
        self.rows.first()
    }

    pub fn last_row(&mut self) -> Option<&Row> {
        self.materialize();
        self.position = self.rows.len().saturating_sub(1);
        self.rows.last()
    }

    /// Current index into the row buffer.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of rows, known before materialization from the raw handle.
    pub fn len(&self) -> usize {
        match &self.raw {
            Some(raw) => raw.row_count(),
            None => self.rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the cursor and take ownership of its rows.
    pub fn into_rows(mut self) -> Vec<Row> {
        self.materialize();
        self.rows
    }
}

impl fmt::Debug for ResultCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCursor")
            .field("rows", &self.len())
            .field("materialized", &self.is_materialized())
            .field("position", &self.position)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::RowExt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn rows(n: usize) -> Vec<Row> {
        (1..=n)
            .map(|i| Row::new().with("id", i.to_string()))
            .collect()
    }

    fn id(row: Option<&Row>) -> Option<String> {
        row.and_then(|r| r.get("id")).map(str::to_string)
    }

    /// Counts how often the cursor pulls from the raw handle.
    struct CountingRows {
        inner: VecRows,
        fetches: Arc<AtomicUsize>,
    }

    impl RawRows for CountingRows {
        fn row_count(&self) -> usize {
            self.inner.row_count()
        }

        fn fetch_next(&mut self) -> Option<Row> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_next()
        }
    }

    #[test]
    fn first_then_next_reaches_last() {
        let mut cursor = ResultCursor::from_rows(rows(4));
        let mut seen = vec![id(cursor.first_row())];
        for _ in 0..3 {
            seen.push(id(cursor.next_row()));
        }
        assert_eq!(seen, [Some("1"), Some("2"), Some("3"), Some("4")].map(|s| s.map(String::from)));
        let at_end = id(cursor.current());
        assert_eq!(at_end, id(cursor.last_row()));
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let mut cursor = ResultCursor::from_rows(rows(3));
        assert_eq!(id(cursor.last_row()).as_deref(), Some("3"));
        assert_eq!(id(cursor.next_row()).as_deref(), Some("3"));
        assert_eq!(cursor.position(), 2);

        assert_eq!(id(cursor.first_row()).as_deref(), Some("1"));
        assert_eq!(id(cursor.prev_row()).as_deref(), Some("1"));
        assert_eq!(cursor.position(), 0);

        assert_eq!(id(cursor.next_row()).as_deref(), Some("2"));
        assert_eq!(id(cursor.prev_row()).as_deref(), Some("1"));
    }

    #[test]
    fn empty_cursor_yields_absent_rows() {
        let mut cursor = ResultCursor::from_rows(Vec::new());
        assert!(cursor.is_empty());
        assert!(cursor.first_row().is_none());
        assert!(cursor.last_row().is_none());
        assert!(cursor.next_row().is_none());
        assert!(cursor.prev_row().is_none());
        assert!(cursor.row_at(0).unwrap_err().is_not_found());
    }

    #[test]
    fn row_at_reports_out_of_range() {
        let mut cursor = ResultCursor::from_rows(rows(2));
        assert_eq!(cursor.row_at(1).unwrap().get("id"), Some("2"));
        let err = cursor.row_at(2).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("row 2 out of range (2 rows)"));
    }

    #[test]
    fn raw_handle_is_drained_once() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut cursor = ResultCursor::new(Box::new(CountingRows {
            inner: VecRows::new(rows(3)),
            fetches: Arc::clone(&fetches),
        }));
        assert_eq!(cursor.len(), 3);
        assert!(!cursor.is_materialized());

        let first = cursor.all_rows().to_vec();
        // three rows plus the end-of-data fetch
        assert_eq!(fetches.load(Ordering::SeqCst), 4);

        let second = cursor.all_rows().to_vec();
        cursor.next_row();
        cursor.row_at(2).unwrap();
        assert_eq!(first, second);
        assert_eq!(fetches.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn decodes_into_record_types() {
        #[derive(Debug, PartialEq)]
        struct Item {
            id: u32,
        }

        impl FromRow for Item {
            fn from_row(row: &Row) -> DbResult<Self> {
                Ok(Self {
                    id: row.try_get_column("id")?,
                })
            }
        }

        let mut cursor = ResultCursor::from_rows(rows(2));
        assert_eq!(
            cursor.all_as::<Item>().unwrap(),
            [Item { id: 1 }, Item { id: 2 }]
        );
        assert_eq!(cursor.row_at_as::<Item>(1).unwrap(), Item { id: 2 });
        assert!(cursor.row_at_as::<Item>(5).is_err());
    }

    #[test]
    fn into_rows_hands_over_buffer() {
        let cursor = ResultCursor::from_rows(rows(2));
        assert_eq!(cursor.into_rows().len(), 2);
    }
}
