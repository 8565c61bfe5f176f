//! Row record type
//!
//! A `Record` keeps its fields in header order and serializes as a JSON object.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// One data row as an ordered column-name to cell-value mapping
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Build a record from `(column, value)` pairs in column order.
    ///
    /// A repeated column name keeps the position of its first occurrence and
    /// takes the value of its last one.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut out: Vec<(String, String)> = Vec::new();
        for (name, value) in fields {
            let (name, value) = (name.into(), value.into());
            match positions.get(&name) {
                Some(&pos) => out[pos].1 = value,
                None => {
                    positions.insert(name.clone(), out.len());
                    out.push((name, value));
                }
            }
        }
        Self { fields: out }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// De-duplicated column layout derived once from a header row.
///
/// Each entry is a column name and the index of the cell that supplies its
/// value: the last occurrence of the name, kept at the position of the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: Vec<(String, usize)>,
}

impl ColumnLayout {
    #[must_use]
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut columns: Vec<(String, usize)> = Vec::new();
        for (index, name) in headers.into_iter().enumerate() {
            match positions.get(name) {
                Some(&pos) => columns[pos].1 = index,
                None => {
                    positions.insert(name, columns.len());
                    columns.push((name.to_string(), index));
                }
            }
        }
        Self { columns }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Build a record from one row; cells missing from the row become `""`
    #[must_use]
    pub fn record<'a, F>(&self, cell: F) -> Record
    where
        F: Fn(usize) -> Option<&'a str>,
    {
        Record {
            fields: self
                .columns
                .iter()
                .map(|(name, index)| (name.clone(), cell(*index).unwrap_or("").to_string()))
                .collect(),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
