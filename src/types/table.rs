/// Table metadata: field descriptors, schema and the file header
use std::fmt;

use ahash::AHashMap;

use super::{Cell, Row};
use crate::error::{TableError, TableResult};

/// Longest table or field name, in bytes.
pub const MAX_NAME_LEN: usize = 15;

/// Largest declared TEXT capacity, in bytes.
pub const MAX_TEXT_LEN: usize = 20;

/// Capacity recorded for LONG fields (byte width of the integer).
pub const LONG_CAPACITY: usize = 8;

/// Field data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Bounded byte string
    Text,
    /// Signed 64-bit integer
    Long,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => write!(f, "TEXT"),
            FieldType::Long => write!(f, "LONG"),
        }
    }
}

/// Schema entry for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    field_type: FieldType,
    capacity: usize,
}

impl FieldDescriptor {
    /// TEXT field holding up to `capacity` bytes (1..=20).
    pub fn text(name: impl Into<String>, capacity: usize) -> TableResult<Self> {
        let name = validate_field_name(name.into())?;
        if capacity == 0 || capacity > MAX_TEXT_LEN {
            return Err(TableError::FieldLength(format!(
                "TEXT({}) for field {} (allowed 1..={})",
                capacity, name, MAX_TEXT_LEN
            )));
        }
        Ok(Self {
            name,
            field_type: FieldType::Text,
            capacity,
        })
    }

    pub fn long(name: impl Into<String>) -> TableResult<Self> {
        Ok(Self {
            name: validate_field_name(name.into())?,
            field_type: FieldType::Long,
            capacity: LONG_CAPACITY,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Zero value of this field: empty TEXT or LONG 0.
    pub fn blank(&self) -> Cell {
        match self.field_type {
            FieldType::Text => Cell::Text(String::new()),
            FieldType::Long => Cell::Long(0),
        }
    }

    /// Check that `cell` may be stored in this field.
    pub fn check(&self, cell: &Cell) -> TableResult<()> {
        match (self.field_type, cell) {
            (FieldType::Text, Cell::Text(s)) => {
                if s.len() > self.capacity {
                    return Err(TableError::FieldLength(format!(
                        "'{}' is longer than {} bytes allowed in {}",
                        s, self.capacity, self.name
                    )));
                }
                if s.as_bytes().contains(&0) {
                    return Err(TableError::FieldLength(format!(
                        "NUL byte in value for {}",
                        self.name
                    )));
                }
                Ok(())
            }
            (FieldType::Long, Cell::Long(_)) => Ok(()),
            (expected, _) => Err(TableError::FieldType(format!(
                "{} expects {}",
                self.name, expected
            ))),
        }
    }
}

fn validate_field_name(name: String) -> TableResult<String> {
    if name.is_empty() || name.len() > MAX_NAME_LEN || name.as_bytes().contains(&0) {
        return Err(TableError::FieldLength(format!(
            "field name '{}' must be 1..={} bytes",
            name, MAX_NAME_LEN
        )));
    }
    Ok(name)
}

/// Check a table name: 1..=15 bytes, no path separators, no leading dot.
pub fn validate_table_name(name: &str) -> TableResult<()> {
    let bad_char = name.starts_with('.')
        || name
            .bytes()
            .any(|b| b == 0 || b == b'/' || b == b'\\');
    if name.is_empty() || name.len() > MAX_NAME_LEN || bad_char {
        return Err(TableError::TableName(name.to_string()));
    }
    Ok(())
}

/// Ordered field list. Order is fixed once the table is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
    positions: AHashMap<String, usize>,
}

impl Schema {
    pub fn new(fields: Vec<FieldDescriptor>) -> TableResult<Self> {
        let mut schema = Schema::default();
        for field in fields {
            schema.push(field)?;
        }
        Ok(schema)
    }

    /// Append a field; names must be unique.
    pub fn push(&mut self, field: FieldDescriptor) -> TableResult<()> {
        if self.positions.contains_key(field.name()) {
            return Err(TableError::FieldLength(format!(
                "duplicate field name {}",
                field.name()
            )));
        }
        self.positions.insert(field.name().to_string(), self.fields.len());
        self.fields.push(field);
        Ok(())
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position and descriptor of the field called `name`.
    pub fn field(&self, name: &str) -> TableResult<(usize, &FieldDescriptor)> {
        self.positions
            .get(name)
            .map(|&i| (i, &self.fields[i]))
            .ok_or_else(|| TableError::FieldName(name.to_string()))
    }

    /// Row with every field set to its zero value.
    pub fn blank_row(&self) -> Row {
        Row::new(self.fields.iter().map(FieldDescriptor::blank).collect())
    }

    /// Check that `row` fits this schema cell by cell.
    pub fn check_row(&self, row: &Row) -> TableResult<()> {
        if row.len() != self.fields.len() {
            return Err(TableError::FieldLength(format!(
                "row has {} values, table has {} fields",
                row.len(),
                self.fields.len()
            )));
        }
        for (field, cell) in self.fields.iter().zip(row.cells()) {
            field.check(cell)?;
        }
        Ok(())
    }
}

/// In-memory copy of the fixed-size header at the start of a table file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    pub name: String,
    pub field_count: u64,
    pub record_count: u64,
    /// Header plus template cells, in bytes; row 1 starts here.
    pub header_len: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Schema {
        Schema::new(vec![
            FieldDescriptor::text("name", 5).unwrap(),
            FieldDescriptor::long("age").unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_field_lookup() {
        let schema = people();
        let (pos, field) = schema.field("age").unwrap();
        assert_eq!(pos, 1);
        assert_eq!(field.field_type(), FieldType::Long);
        assert_eq!(field.capacity(), LONG_CAPACITY);
        assert!(matches!(schema.field("nope"), Err(TableError::FieldName(_))));
    }

    #[test]
    fn test_text_capacity_bounds() {
        assert!(FieldDescriptor::text("a", 1).is_ok());
        assert!(FieldDescriptor::text("a", 20).is_ok());
        assert!(matches!(FieldDescriptor::text("a", 0), Err(TableError::FieldLength(_))));
        assert!(matches!(FieldDescriptor::text("a", 21), Err(TableError::FieldLength(_))));
    }

    #[test]
    fn test_name_lengths() {
        assert!(FieldDescriptor::long("abcdefghijklmno").is_ok());
        assert!(matches!(
            FieldDescriptor::long("abcdefghijklmnop"),
            Err(TableError::FieldLength(_))
        ));
        assert!(validate_table_name("abcdefghijklmno").is_ok());
        assert!(matches!(
            validate_table_name("abcdefghijklmnop"),
            Err(TableError::TableName(_))
        ));
        assert!(validate_table_name(".hidden").is_err());
        assert!(validate_table_name("a/b").is_err());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = Schema::new(vec![
            FieldDescriptor::long("x").unwrap(),
            FieldDescriptor::text("x", 3).unwrap(),
        ]);
        assert!(matches!(err, Err(TableError::FieldLength(_))));
    }

    #[test]
    fn test_check_row() {
        let schema = people();
        let ok = Row::new(vec![Cell::Text("abcde".into()), Cell::Long(10)]);
        assert!(schema.check_row(&ok).is_ok());

        let long_text = Row::new(vec![Cell::Text("abcdef".into()), Cell::Long(10)]);
        assert!(matches!(schema.check_row(&long_text), Err(TableError::FieldLength(_))));

        let swapped = Row::new(vec![Cell::Long(1), Cell::Text("a".into())]);
        assert!(matches!(schema.check_row(&swapped), Err(TableError::FieldType(_))));

        assert_eq!(schema.blank_row(), Row::new(vec![Cell::Text(String::new()), Cell::Long(0)]));
    }
}
