//! Fixed-width text rendering of table contents.
//!
//! Each column is right-aligned in `max(15, capacity) + 2` characters.

use std::io::Write;

use super::Table;
use crate::error::{Result, TableResult};
use crate::types::{FieldDescriptor, Row};

const MIN_COLUMN_WIDTH: usize = 15;
const COLUMN_GAP: usize = 2;

pub fn column_width(field: &FieldDescriptor) -> usize {
    field.capacity().max(MIN_COLUMN_WIDTH) + COLUMN_GAP
}

impl Table {
    /// Positions of `names` in the schema, in the order given.
    pub fn resolve_projection(&self, names: &[String]) -> TableResult<Vec<usize>> {
        names
            .iter()
            .map(|name| self.field(name).map(|(index, _)| index))
            .collect()
    }

    pub fn render_header(&self, out: &mut dyn Write) -> Result<()> {
        let all: Vec<usize> = (0..self.schema().len()).collect();
        self.render_header_columns(&all, out)
    }

    pub fn render_row(&self, row: &Row, out: &mut dyn Write) -> Result<()> {
        let all: Vec<usize> = (0..self.schema().len()).collect();
        self.render_row_columns(&all, row, out)
    }

    /// Header line for the named fields only.
    pub fn render_projected_header(&self, names: &[String], out: &mut dyn Write) -> Result<()> {
        let columns = self.resolve_projection(names)?;
        self.render_header_columns(&columns, out)
    }

    pub fn render_projected_row(&self, names: &[String], row: &Row, out: &mut dyn Write) -> Result<()> {
        let columns = self.resolve_projection(names)?;
        self.render_row_columns(&columns, row, out)
    }

    pub fn render_header_columns(&self, columns: &[usize], out: &mut dyn Write) -> Result<()> {
        let fields = self.schema().fields();
        for &index in columns {
            let field = &fields[index];
            write!(out, "{:>width$}", field.name(), width = column_width(field))?;
        }
        writeln!(out)?;
        Ok(())
    }

    pub fn render_row_columns(&self, columns: &[usize], row: &Row, out: &mut dyn Write) -> Result<()> {
        let fields = self.schema().fields();
        for &index in columns {
            if let Some(cell) = row.get(index) {
                write!(out, "{:>width$}", cell, width = column_width(&fields[index]))?;
            }
        }
        writeln!(out)?;
        Ok(())
    }

    /// Blank line, table name, header, every row, blank line.
    pub fn render_table(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", self.name())?;
        self.render_header(out)?;
        for index in 1..=self.record_count() {
            let row = self.read(index)?;
            self.render_row(&row, out)?;
        }
        writeln!(out)?;
        Ok(())
    }
}
