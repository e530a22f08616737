//! Data models for form schemas and entered rows

pub mod field;
pub mod row;
pub mod schema;

pub use field::*;
pub use row::*;
pub use schema::*;
