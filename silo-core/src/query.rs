use crate::{AsValue, Result, Value};
use std::sync::Arc;

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice aligned by index with its `RowNames`.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone)]
pub struct RowLabeled {
    pub labels: RowNames,
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }

    pub fn names(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|label| label == name)
            .map(|i| &self.values[i])
    }

    /// Typed read of a column; an absent column reads as null, so optional
    /// fields rehydrate to `None`.
    pub fn decode<T: AsValue>(&self, name: &str) -> Result<T> {
        T::try_from_value(self.get_column(name).cloned().unwrap_or(Value::Null))
    }
}

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy)]
pub struct RowsAffected {
    pub rows_affected: u64,
}
