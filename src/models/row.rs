//! Data rows and the store of accepted rows

use crate::models::field::FieldId;
use crate::models::schema::{Schema, SchemaError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Values of one row keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataRow {
    values: HashMap<FieldId, String>,
}

impl DataRow {
    /// A row holding an empty value for every field of the schema.
    pub fn empty(schema: &Schema) -> Self {
        Self {
            values: schema
                .iter()
                .map(|field| (field.id.clone(), String::new()))
                .collect(),
        }
    }

    /// Value for a field; absent values read as the empty string.
    pub fn value(&self, id: &FieldId) -> &str {
        self.values.get(id).map(String::as_str).unwrap_or("")
    }

    /// Set a field value, rejecting ids the schema does not know.
    pub fn set(
        &mut self,
        schema: &Schema,
        id: &FieldId,
        value: impl Into<String>,
    ) -> Result<(), SchemaError> {
        if !schema.contains(id) {
            return Err(SchemaError::UnknownField(id.clone()));
        }
        self.values.insert(id.clone(), value.into());
        Ok(())
    }

    /// Builder-style variant of [`DataRow::set`].
    pub fn with(
        mut self,
        schema: &Schema,
        id: &FieldId,
        value: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        self.set(schema, id, value)?;
        Ok(self)
    }

    /// Values in schema order.
    pub fn ordered_values<'a>(&'a self, schema: &'a Schema) -> impl Iterator<Item = &'a str> + 'a {
        schema.iter().map(move |field| self.value(&field.id))
    }

    /// True when every value is blank.
    pub fn is_blank(&self) -> bool {
        self.values.values().all(|value| value.trim().is_empty())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowStoreError {
    #[error("Row {index} is out of range ({len} rows stored)")]
    OutOfRange { index: usize, len: usize },
}

/// Accepted rows in insertion order.
///
/// Rows are never modified in place: an edit replaces the whole row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowStore {
    rows: Vec<DataRow>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: DataRow) {
        self.rows.push(row);
    }

    pub fn replace(&mut self, index: usize, row: DataRow) -> Result<DataRow, RowStoreError> {
        let len = self.rows.len();
        let slot = self
            .rows
            .get_mut(index)
            .ok_or(RowStoreError::OutOfRange { index, len })?;
        Ok(std::mem::replace(slot, row))
    }

    pub fn remove(&mut self, index: usize) -> Result<DataRow, RowStoreError> {
        if index >= self.rows.len() {
            return Err(RowStoreError::OutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        Ok(self.rows.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&DataRow> {
        self.rows.get(index)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataRow> {
        self.rows.iter()
    }

    pub fn as_slice(&self) -> &[DataRow] {
        &self.rows
    }
}
