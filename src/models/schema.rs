//! Ordered set of field descriptors with id lookup

use crate::models::field::{FieldDescriptor, FieldId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Duplicate field id: {0}")]
    DuplicateFieldId(FieldId),
    #[error("Unknown field id: {0}")]
    UnknownField(FieldId),
}

/// Parsed form schema.
///
/// Field order is display and column order. Ids are unique; inserting an id
/// twice is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
    index: HashMap<FieldId, usize>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Vec<FieldDescriptor>) -> Result<Self, SchemaError> {
        let mut schema = Self::new();
        for field in fields {
            schema.insert(field)?;
        }
        Ok(schema)
    }

    pub fn insert(&mut self, field: FieldDescriptor) -> Result<(), SchemaError> {
        if self.index.contains_key(&field.id) {
            return Err(SchemaError::DuplicateFieldId(field.id));
        }
        self.index.insert(field.id.clone(), self.fields.len());
        self.fields.push(field);
        Ok(())
    }

    pub fn get(&self, id: &FieldId) -> Option<&FieldDescriptor> {
        self.index.get(id).map(|&position| &self.fields[position])
    }

    pub fn contains(&self, id: &FieldId) -> bool {
        self.index.contains_key(id)
    }

    /// Find a field by its label, ignoring ASCII case and surrounding whitespace.
    pub fn find_by_label(&self, label: &str) -> Option<&FieldDescriptor> {
        let wanted = label.trim();
        self.fields
            .iter()
            .find(|field| field.label.eq_ignore_ascii_case(wanted))
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.label.as_str())
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Vec::<FieldDescriptor>::deserialize(deserializer)?;
        Schema::from_fields(fields).map_err(serde::de::Error::custom)
    }
}
