/// Statement executor - runs parsed statements against table files
use std::io::Write;

use log::{debug, warn};

use super::ast::*;
use super::parser::parse_statement;
use crate::config::DbConfig;
use crate::error::{Result, SqlError, TableError};
use crate::storage::{Cursor, Table};
use crate::types::{Cell, FieldDescriptor, FieldType, Row, Schema};

/// Query result
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// SELECT result
    Select {
        columns: Vec<String>,
        /// 1-based positions of the returned rows, ascending
        indices: Vec<u64>,
        rows: Vec<Row>,
    },

    /// INSERT/UPDATE/DELETE result
    Modification { affected_rows: usize },

    /// CREATE/DROP result
    Definition { message: String },
}

impl QueryResult {
    pub fn affected_rows(&self) -> usize {
        match self {
            QueryResult::Modification { affected_rows } => *affected_rows,
            _ => 0,
        }
    }

    /// Row positions of a SELECT result.
    pub fn selected(&self) -> Option<&[u64]> {
        match self {
            QueryResult::Select { indices, .. } => Some(indices),
            _ => None,
        }
    }
}

/// Value assigned by UPDATE, resolved against the table schema.
enum Assignment {
    Literal(Cell),
    CopyText(usize),
    Expr(LongExpr),
}

impl Assignment {
    /// New value for the row currently in `cursor`.
    fn value_for(&self, cursor: &Cursor) -> Result<Cell> {
        Ok(match self {
            Assignment::Literal(cell) => cell.clone(),
            Assignment::CopyText(source) => match cursor.row().get(*source) {
                Some(cell @ Cell::Text(_)) => cell.clone(),
                _ => return Err(TableError::FieldName(format!("#{}", source + 1)).into()),
            },
            Assignment::Expr(expr) => Cell::Long(expr.evaluate(cursor)?),
        })
    }
}

/// Runs one statement at a time. Holds no table state between statements:
/// every statement re-opens its table from disk.
pub struct Interpreter {
    config: DbConfig,
}

impl Interpreter {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Parse and run `sql`, writing any rendered output to `out`.
    pub fn execute(&self, sql: &str, out: &mut dyn Write) -> Result<QueryResult> {
        let statement = parse_statement(sql)?;
        debug!("{} {}", statement.verb(), statement.table());
        self.execute_statement(statement, out)
    }

    /// `OK` or `ERROR: <message>`; the interpreter stays usable either way.
    pub fn respond(&self, sql: &str, out: &mut dyn Write) -> String {
        match self.execute(sql, out) {
            Ok(_) => "OK".to_string(),
            Err(e) => {
                warn!("statement failed ({}): {}", e.kind(), e);
                format!("ERROR: {}", e)
            }
        }
    }

    pub fn execute_statement(&self, statement: Statement, out: &mut dyn Write) -> Result<QueryResult> {
        match statement {
            Statement::CreateTable(stmt) => self.create_table(stmt, out),
            Statement::DropTable(stmt) => self.drop_table(stmt, out),
            Statement::Insert(stmt) => self.insert(stmt, out),
            Statement::Select(stmt) => self.select(stmt, out),
            Statement::Update(stmt) => self.update(stmt, out),
            Statement::Delete(stmt) => self.delete(stmt, out),
        }
    }

    fn create_table(&self, stmt: CreateTableStmt, out: &mut dyn Write) -> Result<QueryResult> {
        let mut fields = Vec::with_capacity(stmt.fields.len());
        for def in stmt.fields {
            let field = match (def.field_type, def.length) {
                (FieldType::Text, Some(length)) => FieldDescriptor::text(def.name, length)?,
                (FieldType::Long, _) => FieldDescriptor::long(def.name)?,
                (FieldType::Text, None) => {
                    return Err(SqlError::FieldDescription(format!("{} has no TEXT length", def.name)).into())
                }
            };
            fields.push(field);
        }
        let schema = Schema::new(fields)?;

        let table = Table::create(&self.config, &stmt.table, schema)?;
        self.echo(&table, out)?;
        Ok(QueryResult::Definition {
            message: format!("The table {} was created", stmt.table),
        })
    }

    fn drop_table(&self, stmt: DropTableStmt, out: &mut dyn Write) -> Result<QueryResult> {
        Table::drop(&self.config, &stmt.table)?;
        let message = format!("The table {} was deleted", stmt.table);
        writeln!(out, "{}", message)?;
        Ok(QueryResult::Definition { message })
    }

    fn insert(&self, stmt: InsertStmt, out: &mut dyn Write) -> Result<QueryResult> {
        let mut table = Table::open(&self.config, &stmt.table)?;
        if stmt.values.len() != table.schema().len() {
            return Err(SqlError::UnknownCommand(format!(
                "{} expects {} values, got {}",
                stmt.table,
                table.schema().len(),
                stmt.values.len()
            ))
            .into());
        }

        let mut cursor = Cursor::new(&table);
        let fields = table.schema().fields().to_vec();
        for (index, (field, value)) in fields.iter().zip(stmt.values).enumerate() {
            let cell = match (field.field_type(), value) {
                (FieldType::Text, InsertValue::Text(s)) => Cell::Text(s),
                (FieldType::Text, other) => {
                    return Err(SqlError::TextFormat(format!(
                        "{} needs a quoted string, got {}",
                        field.name(),
                        describe(&other)
                    ))
                    .into())
                }
                (FieldType::Long, InsertValue::Long(v)) => Cell::Long(v),
                (FieldType::Long, other) => {
                    return Err(SqlError::NumberFormat(format!(
                        "{} needs an integer, got {}",
                        field.name(),
                        describe(&other)
                    ))
                    .into())
                }
            };
            cursor.set_at(index, cell)?;
        }
        cursor.append(&mut table)?;

        self.echo(&table, out)?;
        Ok(QueryResult::Modification { affected_rows: 1 })
    }

    fn select(&self, stmt: SelectStmt, out: &mut dyn Write) -> Result<QueryResult> {
        let table = Table::open(&self.config, &stmt.table)?;
        let columns: Vec<usize> = match &stmt.projection {
            Projection::All => (0..table.schema().len()).collect(),
            Projection::Fields(names) => table.resolve_projection(names)?,
        };

        let mut cursor = Cursor::new(&table);
        let indices = self.matching_rows(&table, &mut cursor, &stmt.selection)?;

        table.render_header_columns(&columns, out)?;
        let mut rows = Vec::with_capacity(indices.len());
        for &index in &indices {
            cursor.read_at(&table, index)?;
            table.render_row_columns(&columns, cursor.row(), out)?;
            let projected = columns.iter().filter_map(|&c| cursor.row().get(c).cloned()).collect();
            rows.push(Row::new(projected));
        }

        let names = columns
            .iter()
            .map(|&c| table.schema().fields()[c].name().to_string())
            .collect();
        Ok(QueryResult::Select {
            columns: names,
            indices,
            rows,
        })
    }

    fn update(&self, stmt: UpdateStmt, out: &mut dyn Write) -> Result<QueryResult> {
        let mut table = Table::open(&self.config, &stmt.table)?;
        let (target, field) = table.field(&stmt.field)?;
        let assignment = resolve_assignment(table.schema(), field, stmt.value)?;

        let mut cursor = Cursor::new(&table);
        let indices = self.matching_rows(&table, &mut cursor, &stmt.selection)?;

        for &index in &indices {
            cursor.read_at(&table, index)?;
            let cell = assignment.value_for(&cursor)?;
            cursor.set_at(target, cell)?;
            cursor.update(&mut table, index)?;
        }

        self.echo(&table, out)?;
        Ok(QueryResult::Modification {
            affected_rows: indices.len(),
        })
    }

    fn delete(&self, stmt: DeleteStmt, out: &mut dyn Write) -> Result<QueryResult> {
        let mut table = Table::open(&self.config, &stmt.table)?;
        let mut cursor = Cursor::new(&table);
        let indices = self.matching_rows(&table, &mut cursor, &stmt.selection)?;

        // highest first, so pending indices stay valid
        for &index in indices.iter().rev() {
            table.delete_row(index)?;
        }

        self.echo(&table, out)?;
        Ok(QueryResult::Modification {
            affected_rows: indices.len(),
        })
    }

    fn matching_rows(&self, table: &Table, cursor: &mut Cursor, clause: &WhereClause) -> Result<Vec<u64>> {
        let predicate = clause.bind(table.schema())?;
        predicate.select(table, cursor)
    }

    fn echo(&self, table: &Table, out: &mut dyn Write) -> Result<()> {
        if self.config.echo_table_after_write {
            table.render_table(out)?;
        }
        Ok(())
    }
}

fn resolve_assignment(schema: &Schema, field: &FieldDescriptor, value: UpdateValue) -> Result<Assignment> {
    let assignment = match (field.field_type(), value) {
        (FieldType::Text, UpdateValue::Text(s)) => {
            let cell = Cell::Text(s);
            field.check(&cell)?;
            Assignment::Literal(cell)
        }
        (FieldType::Text, UpdateValue::Expr(expr)) => {
            let source = expr
                .as_field()
                .and_then(|name| schema.field(name).ok())
                .filter(|(_, f)| f.field_type() == FieldType::Text)
                .map(|(index, _)| index)
                .ok_or_else(|| {
                    SqlError::TextExprSyntax(format!(
                        "{} needs a quoted string or a TEXT field, got {}",
                        field.name(),
                        expr
                    ))
                })?;
            Assignment::CopyText(source)
        }
        (FieldType::Long, UpdateValue::Text(s)) => {
            return Err(SqlError::LongExprSyntax(format!(
                "{} is LONG, got '{}'",
                field.name(),
                s
            ))
            .into())
        }
        (FieldType::Long, UpdateValue::Expr(expr)) => Assignment::Expr(expr),
    };
    Ok(assignment)
}

fn describe(value: &InsertValue) -> String {
    match value {
        InsertValue::Text(s) => format!("'{}'", s),
        InsertValue::Long(v) => v.to_string(),
        InsertValue::Word(w) => w.clone(),
    }
}
