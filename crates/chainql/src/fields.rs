//! Ordered column/value pairs for INSERT and UPDATE.

use std::fmt::Display;

/// Column to value pairs in first-insertion order.
///
/// Setting a column that is already present overwrites its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pairs: Vec<(String, String)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Fields::insert`].
    pub fn with(mut self, column: impl Into<String>, value: impl Display) -> Self {
        self.insert(column, value.to_string());
        self
    }

    /// Add or overwrite a column.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(c, _)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.pairs.clear();
    }
}

impl<K: Into<String>, V: Display> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (column, value) in iter {
            fields.insert(column, value.to_string());
        }
        fields
    }
}

impl<K: Into<String>, V: Display, const N: usize> From<[(K, V); N]> for Fields {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Display> From<Vec<(K, V)>> for Fields {
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Fields;

    #[test]
    fn keeps_first_insertion_order_and_overwrites() {
        let fields = Fields::new()
            .with("name", "Ann")
            .with("age", 30)
            .with("name", "Bob");
        assert_eq!(fields.columns().collect::<Vec<_>>(), ["name", "age"]);
        assert_eq!(fields.get("name"), Some("Bob"));
        assert_eq!(fields.get("age"), Some("30"));
    }

    #[test]
    fn converts_from_arrays_and_vecs() {
        let a: Fields = [("a", 1), ("b", 2)].into();
        let b: Fields = vec![("a", 1), ("b", 2)].into();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }
}
