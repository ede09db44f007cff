//! Row cursor: a staging buffer plus the index it was last matched at.
//!
//! A cursor borrows its table only for the duration of each call, so any
//! number of cursors may exist over the same [`Table`].

use std::sync::Arc;

use super::Table;
use crate::error::{TableError, TableResult};
use crate::types::{Cell, FieldType, Row, Schema};

#[derive(Debug, Clone)]
pub struct Cursor {
    schema: Arc<Schema>,
    position: Option<u64>,
    buffer: Row,
}

impl Cursor {
    /// New cursor whose buffer holds the zero value of every field.
    pub fn new(table: &Table) -> Self {
        let schema = table.shared_schema();
        let buffer = schema.blank_row();
        Self {
            schema,
            position: None,
            buffer,
        }
    }

    /// Index the buffer was last read from or matched at.
    pub fn position(&self) -> Option<u64> {
        self.position
    }

    pub fn row(&self) -> &Row {
        &self.buffer
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get(&self, field: &str) -> TableResult<&Cell> {
        let (index, _) = self.schema.field(field)?;
        Ok(&self.buffer.cells()[index])
    }

    pub fn get_long(&self, field: &str) -> TableResult<i64> {
        match self.get(field)? {
            Cell::Long(v) => Ok(*v),
            Cell::Text(_) => Err(TableError::FieldType(format!("{} is not LONG", field))),
        }
    }

    /// Stage `cell` into `field`, checking type and capacity.
    pub fn set(&mut self, field: &str, cell: Cell) -> TableResult<()> {
        let (index, _) = self.schema.field(field)?;
        self.set_at(index, cell)
    }

    pub fn set_at(&mut self, index: usize, cell: Cell) -> TableResult<()> {
        let descriptor = self
            .schema
            .fields()
            .get(index)
            .ok_or_else(|| TableError::FieldName(format!("#{}", index + 1)))?;
        descriptor.check(&cell)?;
        if let Some(slot) = self.buffer.get_mut(index) {
            *slot = cell;
        }
        Ok(())
    }

    pub fn set_text(&mut self, field: &str, value: &str) -> TableResult<()> {
        self.set(field, Cell::Text(value.to_string()))
    }

    pub fn set_long(&mut self, field: &str, value: i64) -> TableResult<()> {
        self.set(field, Cell::Long(value))
    }

    /// Replace the whole buffer.
    pub fn load(&mut self, row: Row) -> TableResult<()> {
        self.schema.check_row(&row)?;
        self.buffer = row;
        Ok(())
    }

    /// Reset the buffer to zero values and forget the position.
    pub fn clear(&mut self) {
        self.buffer = self.schema.blank_row();
        self.position = None;
    }

    pub fn field_type(&self, field: &str) -> TableResult<FieldType> {
        Ok(self.schema.field(field)?.1.field_type())
    }

    pub fn read_at(&mut self, table: &Table, index: u64) -> TableResult<()> {
        self.buffer = table.read(index)?;
        self.position = Some(index);
        Ok(())
    }

    pub fn read_first(&mut self, table: &Table) -> TableResult<()> {
        if table.record_count() == 0 {
            return Err(TableError::RowNotFound);
        }
        self.read_at(table, 1)
    }

    /// Move to the row after whichever row currently equals the buffer.
    pub fn read_next(&mut self, table: &Table) -> TableResult<()> {
        let current = self.find(table)?;
        self.read_at(table, current + 1)
    }

    /// Move to the row before whichever row currently equals the buffer.
    pub fn read_prev(&mut self, table: &Table) -> TableResult<()> {
        let current = self.find(table)?;
        self.read_at(table, current - 1)
    }

    /// Scan for the first row equal to the buffer.
    pub fn find(&mut self, table: &Table) -> TableResult<u64> {
        let index = table.find(&self.buffer)?;
        self.position = Some(index);
        Ok(index)
    }

    pub fn append(&mut self, table: &mut Table) -> TableResult<u64> {
        let index = table.append(&self.buffer)?;
        self.position = Some(index);
        Ok(index)
    }

    pub fn update(&mut self, table: &mut Table, index: u64) -> TableResult<()> {
        table.update(index, &self.buffer)?;
        self.position = Some(index);
        Ok(())
    }

    /// Delete the first row equal to the buffer; returns its former index.
    pub fn delete(&mut self, table: &mut Table) -> TableResult<u64> {
        let index = table.find(&self.buffer)?;
        table.delete_row(index)?;
        self.position = None;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use crate::types::FieldDescriptor;
    use tempfile::tempdir;

    fn seeded(dir: &std::path::Path) -> Table {
        let config = DbConfig::for_testing(dir);
        let schema = Schema::new(vec![
            FieldDescriptor::text("name", 5).unwrap(),
            FieldDescriptor::long("age").unwrap(),
        ])
        .unwrap();
        let mut table = Table::create(&config, "t", schema).unwrap();
        let mut cursor = Cursor::new(&table);
        for (name, age) in [("a", 1), ("b", 2), ("c", 3)] {
            cursor.set_text("name", name).unwrap();
            cursor.set_long("age", age).unwrap();
            cursor.append(&mut table).unwrap();
        }
        table
    }

    #[test]
    fn test_self_match() {
        let dir = tempdir().unwrap();
        let table = seeded(dir.path());
        let mut cursor = Cursor::new(&table);
        for k in 1..=3 {
            cursor.read_at(&table, k).unwrap();
            assert_eq!(cursor.find(&table).unwrap(), k);
        }
    }

    #[test]
    fn test_next_and_prev_follow_buffer_contents() {
        let dir = tempdir().unwrap();
        let table = seeded(dir.path());
        let mut cursor = Cursor::new(&table);

        cursor.read_first(&table).unwrap();
        cursor.read_next(&table).unwrap();
        assert_eq!(cursor.get("name").unwrap(), &Cell::Text("b".into()));

        // editing the buffer re-anchors next/prev on the matching row
        cursor.set_text("name", "c").unwrap();
        cursor.set_long("age", 3).unwrap();
        cursor.read_prev(&table).unwrap();
        assert_eq!(cursor.position(), Some(2));

        cursor.read_prev(&table).unwrap();
        assert!(matches!(cursor.read_prev(&table), Err(TableError::InvalidIndex(0))));

        cursor.read_at(&table, 3).unwrap();
        assert!(matches!(cursor.read_next(&table), Err(TableError::InvalidIndex(4))));
    }

    #[test]
    fn test_read_first_on_empty_table() {
        let dir = tempdir().unwrap();
        let config = DbConfig::for_testing(dir.path());
        let schema = Schema::new(vec![FieldDescriptor::long("x").unwrap()]).unwrap();
        let table = Table::create(&config, "e", schema).unwrap();
        let mut cursor = Cursor::new(&table);
        assert!(matches!(cursor.read_first(&table), Err(TableError::RowNotFound)));
    }

    #[test]
    fn test_set_checks_field() {
        let dir = tempdir().unwrap();
        let table = seeded(dir.path());
        let mut cursor = Cursor::new(&table);

        assert!(matches!(cursor.set_long("name", 1), Err(TableError::FieldType(_))));
        assert!(matches!(cursor.set_text("name", "toolong"), Err(TableError::FieldLength(_))));
        assert!(matches!(cursor.set_long("nope", 1), Err(TableError::FieldName(_))));
        assert_eq!(cursor.get_long("age").unwrap(), 0);
    }

    #[test]
    fn test_load_and_clear() {
        let dir = tempdir().unwrap();
        let mut table = seeded(dir.path());
        let mut cursor = Cursor::new(&table);

        assert_eq!(cursor.field_type("name").unwrap(), FieldType::Text);
        assert_eq!(cursor.field_type("age").unwrap(), FieldType::Long);
        assert!(matches!(cursor.field_type("nope"), Err(TableError::FieldName(_))));

        cursor
            .load(Row::new(vec![Cell::Text("d".into()), Cell::Long(4)]))
            .unwrap();
        assert_eq!(cursor.append(&mut table).unwrap(), 4);

        // a rejected row leaves the buffer alone
        assert!(cursor.load(Row::new(vec![Cell::Long(5), Cell::Long(5)])).is_err());
        assert!(cursor
            .load(Row::new(vec![Cell::Text("toolong".into()), Cell::Long(5)]))
            .is_err());
        assert_eq!(cursor.get("name").unwrap(), &Cell::Text("d".into()));

        cursor.clear();
        assert_eq!(cursor.position(), None);
        assert_eq!(cursor.get("name").unwrap(), &Cell::Text(String::new()));
        assert_eq!(cursor.get_long("age").unwrap(), 0);
    }

    #[test]
    fn test_delete_by_buffer() {
        let dir = tempdir().unwrap();
        let mut table = seeded(dir.path());
        let mut cursor = Cursor::new(&table);

        cursor.read_at(&table, 2).unwrap();
        assert_eq!(cursor.delete(&mut table).unwrap(), 2);
        assert_eq!(table.record_count(), 2);
        assert!(matches!(cursor.find(&table), Err(TableError::RowNotFound)));
    }

    #[test]
    fn test_two_cursors_are_independent() {
        let dir = tempdir().unwrap();
        let mut table = seeded(dir.path());
        let mut reader = Cursor::new(&table);
        let mut writer = Cursor::new(&table);

        reader.read_at(&table, 1).unwrap();
        writer.read_at(&table, 3).unwrap();
        writer.set_long("age", 30).unwrap();
        writer.update(&mut table, 3).unwrap();

        assert_eq!(reader.get_long("age").unwrap(), 1);
        reader.read_at(&table, 3).unwrap();
        assert_eq!(reader.get_long("age").unwrap(), 30);
    }
}
