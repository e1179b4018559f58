//! Row mapping traits and utilities

use crate::error::{DbError, DbResult};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::str::FromStr;

/// A schema-less result row: ordered column name to text value.
///
/// Values arrive in their textual form; `None` is SQL `NULL`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, Option<String>)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, replacing the value if the column name already exists.
    pub fn push(&mut self, column: impl Into<String>, value: Option<String>) {
        let column = column.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((column, value)),
        }
    }

    /// Builder-style variant of [`Row::push`] for a non-null value.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(column, Some(value.into()));
        self
    }

    /// Builder-style variant of [`Row::push`] for a NULL value.
    pub fn with_null(mut self, column: impl Into<String>) -> Self {
        self.push(column, None);
        self
    }

    /// Get a column's text value.
    ///
    /// Returns `None` both for a missing column and for SQL `NULL`; use
    /// [`Row::contains`] to tell them apart.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Whether the row has a column with this name.
    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|(name, _)| name == column)
    }

    /// Column names in result order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate over `(column, value)` pairs in result order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Trait for converting a result row into a caller-defined record type.
///
/// # Example
///
/// ```ignore
/// use chainql::{FromRow, Row, RowExt, DbResult};
///
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> DbResult<Self> {
///         Ok(Self {
///             id: row.try_get_column("id")?,
///             name: row.try_get_column("name")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a result row into Self
    fn from_row(row: &Row) -> DbResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(row.clone())
    }
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to parse a non-null column value, returning DbError::Decode on failure
    fn try_get_column<T: FromStr>(&self, column: &str) -> DbResult<T>
    where
        T::Err: std::fmt::Display;

    /// Like [`RowExt::try_get_column`] but maps SQL `NULL` to `None`
    fn try_get_opt<T: FromStr>(&self, column: &str) -> DbResult<Option<T>>
    where
        T::Err: std::fmt::Display;
}

impl RowExt for Row {
    fn try_get_column<T: FromStr>(&self, column: &str) -> DbResult<T>
    where
        T::Err: std::fmt::Display,
    {
        self.try_get_opt(column)?
            .ok_or_else(|| DbError::decode(column, "unexpected NULL"))
    }

    fn try_get_opt<T: FromStr>(&self, column: &str) -> DbResult<Option<T>>
    where
        T::Err: std::fmt::Display,
    {
        if !self.contains(column) {
            return Err(DbError::decode(column, "no such column"));
        }
        self.get(column)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| DbError::decode(column, e.to_string()))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::{Row, RowExt};

    fn sample() -> Row {
        Row::new()
            .with("id", "7")
            .with("name", "Ann")
            .with_null("email")
    }

    #[test]
    fn get_returns_text_and_hides_null() {
        let row = sample();
        assert_eq!(row.get("name"), Some("Ann"));
        assert_eq!(row.get("email"), None);
        assert!(row.contains("email"));
        assert!(!row.contains("missing"));
        assert_eq!(row.columns().collect::<Vec<_>>(), ["id", "name", "email"]);
    }

    #[test]
    fn push_overwrites_existing_column() {
        let mut row = sample();
        row.push("name", Some("Bob".to_string()));
        assert_eq!(row.len(), 3);
        assert_eq!(row.get("name"), Some("Bob"));
    }

    #[test]
    fn typed_access_parses_or_reports_column() {
        let row = sample();
        let id: i64 = row.try_get_column("id").unwrap();
        assert_eq!(id, 7);

        let err = row.try_get_column::<i64>("name").unwrap_err();
        assert!(err.to_string().contains("'name'"));

        assert!(row.try_get_column::<String>("email").is_err());
        assert_eq!(row.try_get_opt::<String>("email").unwrap(), None);
        assert!(row.try_get_opt::<String>("missing").is_err());
    }

    #[test]
    fn serializes_as_json_object_in_column_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, r#"{"id":"7","name":"Ann","email":null}"#);
    }
}
