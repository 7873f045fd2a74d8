//! Decoded result rows.
//!
//! Rows are decoded in full when fetched; a [`Row`] owns its values and
//! shares the result set's column metadata with its siblings.

use std::sync::Arc;

use mariadb_protocol::FieldDescriptor;
use mariadb_types::{FromSql, SqlValue, TypeError};

/// Column metadata shared by all rows of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColMetaData {
    fields: Vec<FieldDescriptor>,
}

impl ColMetaData {
    /// Wrap the column definitions of a result set.
    #[must_use]
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column definitions in order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Find a column by name (case-insensitive).
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
    }
}

/// A row from a query result.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<SqlValue>,
    metadata: Arc<ColMetaData>,
}

impl Row {
    pub(crate) fn new(values: Vec<SqlValue>, metadata: Arc<ColMetaData>) -> Self {
        Self { values, metadata }
    }

    /// Get a value by column index with type conversion.
    pub fn get<T: FromSql>(&self, index: usize) -> Result<T, TypeError> {
        self.values
            .get(index)
            .ok_or_else(|| TypeError::TypeMismatch {
                expected: "valid column index",
                actual: format!("index {index} out of bounds"),
            })
            .and_then(T::from_sql)
    }

    /// Get a value by column name with type conversion.
    pub fn get_by_name<T: FromSql>(&self, name: &str) -> Result<T, TypeError> {
        let index = self
            .metadata
            .find_by_name(name)
            .ok_or_else(|| TypeError::TypeMismatch {
                expected: "valid column name",
                actual: format!("column '{name}' not found"),
            })?;
        self.get(index)
    }

    /// Try to get a value, returning `None` if NULL, missing or not convertible.
    pub fn try_get<T: FromSql>(&self, index: usize) -> Option<T> {
        self.values
            .get(index)
            .and_then(|v| T::from_sql_nullable(v).ok().flatten())
    }

    /// The raw value of a column.
    #[must_use]
    pub fn get_raw(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// All values in column order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Consume the row, returning its values.
    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column definitions.
    #[must_use]
    pub fn columns(&self) -> &[FieldDescriptor] {
        self.metadata.fields()
    }

    /// Whether a column is NULL. Missing columns count as NULL.
    #[must_use]
    pub fn is_null(&self, index: usize) -> bool {
        self.values.get(index).is_none_or(SqlValue::is_null)
    }
}
