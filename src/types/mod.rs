//! Value types for StrideDB rows

mod table;

pub use table::{
    validate_table_name, FieldDescriptor, FieldType, Schema, TableHeader, LONG_CAPACITY,
    MAX_NAME_LEN, MAX_TEXT_LEN,
};

use std::fmt;

/// Live value of one field in one row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    Text(String),
    Long(i64),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            Cell::Long(_) => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Cell::Long(v) => Some(*v),
            Cell::Text(_) => None,
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            Cell::Text(_) => FieldType::Text,
            Cell::Long(_) => FieldType::Long,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() keeps width/alignment flags working for both variants
        match self {
            Cell::Text(s) => f.pad(s),
            Cell::Long(v) => f.pad(&v.to_string()),
        }
    }
}

/// One record: a cell per schema field, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Row(Vec<Cell>);

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Row(cells)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.0.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.0.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
