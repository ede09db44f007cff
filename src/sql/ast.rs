/// Abstract Syntax Tree for statements
use crate::types::FieldType;

pub use super::long_expr::{ArithOp, LongExpr};
pub use super::predicate::{LogicExpr, Operand, RelOp, TextOperand, WhereClause};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTableStmt),
    DropTable(DropTableStmt),
    Insert(InsertStmt),
    Select(SelectStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
}

impl Statement {
    pub fn table(&self) -> &str {
        match self {
            Statement::CreateTable(s) => &s.table,
            Statement::DropTable(s) => &s.table,
            Statement::Insert(s) => &s.table,
            Statement::Select(s) => &s.table,
            Statement::Update(s) => &s.table,
            Statement::Delete(s) => &s.table,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Statement::CreateTable(_) => "CREATE",
            Statement::DropTable(_) => "DROP",
            Statement::Insert(_) => "INSERT",
            Statement::Select(_) => "SELECT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
        }
    }
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStmt {
    pub table: String,
    pub fields: Vec<FieldDef>,
}

/// `name TEXT(len)` or `name LONG`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    /// Declared length, TEXT only
    pub length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStmt {
    pub table: String,
}

/// INSERT statement: one value per field, in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub table: String,
    pub values: Vec<InsertValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertValue {
    Text(String),
    Long(i64),
    /// Unquoted word; never valid, kept so the error matches the field type
    Word(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    All,
    Fields(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub projection: Projection,
    pub table: String,
    pub selection: WhereClause,
}

/// UPDATE statement: a single `field = value` assignment
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    pub table: String,
    pub field: String,
    pub value: UpdateValue,
    pub selection: WhereClause,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    /// Quoted literal
    Text(String),
    /// Long-expression; a bare field name may also name a TEXT field
    Expr(LongExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub table: String,
    pub selection: WhereClause,
}
