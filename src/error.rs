//! Error types for StrideDB
//!
//! Two disjoint domains: [`TableError`] for the storage engine and
//! [`SqlError`] for the statement interpreter. Both fold into [`Error`].

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type TableResult<T> = std::result::Result<T, TableError>;
pub type SqlResult<T> = std::result::Result<T, SqlError>;

/// Storage engine failures.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("can't open file {}: {1}", .0.display())]
    FileOpen(PathBuf, #[source] std::io::Error),

    #[error("can't write to file {}: {1}", .0.display())]
    FileWrite(PathBuf, #[source] std::io::Error),

    #[error("can't read from file {}: {1}", .0.display())]
    FileRead(PathBuf, String),

    #[error("can't move the pointer in file {}: {1}", .0.display())]
    FileSeek(PathBuf, #[source] std::io::Error),

    #[error("file you try to open is empty: {}", .0.display())]
    EmptyFile(PathBuf),

    #[error("can't delete file {}: {1}", .0.display())]
    FileRemove(PathBuf, #[source] std::io::Error),

    #[error("can't rename file {}: {1}", .0.display())]
    FileRename(PathBuf, #[source] std::io::Error),

    #[error("no such field name: {0}")]
    FieldName(String),

    #[error("no such record in the table")]
    RowNotFound,

    #[error("no such line number in the table: {0}")]
    InvalidIndex(u64),

    #[error("wrong field name or string length: {0}")]
    FieldLength(String),

    #[error("wrong table name length: {0}")]
    TableName(String),

    #[error("wrong value type for field: {0}")]
    FieldType(String),
}

/// Statement parsing and evaluation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlError {
    #[error("wrong command: {0}")]
    UnknownCommand(String),

    #[error("wrong field name: {0}")]
    FieldName(String),

    #[error("wrong field description: {0}")]
    FieldDescription(String),

    #[error("wrong text format: {0}")]
    TextFormat(String),

    #[error("wrong number format: {0}")]
    NumberFormat(String),

    #[error("wrong long-expression: {0}")]
    LongExprSyntax(String),

    #[error("wrong text-expression: {0}")]
    TextExprSyntax(String),

    #[error("wrong where-expression: {0}")]
    WhereSyntax(String),

    #[error("wrong logic-expression: {0}")]
    LogicExprSyntax(String),

    #[error("not ended string starting at {line}:{column}")]
    UnterminatedString { line: usize, column: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Sql(#[from] SqlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl TableError {
    pub fn kind(&self) -> &'static str {
        match self {
            TableError::FileOpen(..) => "FileOpen",
            TableError::FileWrite(..) => "FileWrite",
            TableError::FileRead(..) => "FileRead",
            TableError::FileSeek(..) => "FileSeek",
            TableError::EmptyFile(_) => "EmptyFile",
            TableError::FileRemove(..) => "FileRemove",
            TableError::FileRename(..) => "FileRename",
            TableError::FieldName(_) => "FieldName",
            TableError::RowNotFound => "RowNotFound",
            TableError::InvalidIndex(_) => "InvalidIndex",
            TableError::FieldLength(_) => "FieldLength",
            TableError::TableName(_) => "TableName",
            TableError::FieldType(_) => "FieldType",
        }
    }
}

impl SqlError {
    pub fn kind(&self) -> &'static str {
        match self {
            SqlError::UnknownCommand(_) => "UnknownCommand",
            SqlError::FieldName(_) => "FieldName",
            SqlError::FieldDescription(_) => "FieldDescription",
            SqlError::TextFormat(_) => "TextFormat",
            SqlError::NumberFormat(_) => "NumberFormat",
            SqlError::LongExprSyntax(_) => "LongExprSyntax",
            SqlError::TextExprSyntax(_) => "TextExprSyntax",
            SqlError::WhereSyntax(_) => "WhereSyntax",
            SqlError::LogicExprSyntax(_) => "LogicExprSyntax",
            SqlError::UnterminatedString { .. } => "UnterminatedString",
            SqlError::DivisionByZero => "DivisionByZero",
            SqlError::ArithmeticOverflow(_) => "ArithmeticOverflow",
        }
    }
}

impl Error {
    /// Variant name of the underlying failure, e.g. `"WhereSyntax"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Table(e) => e.kind(),
            Error::Sql(e) => e.kind(),
            Error::Io(_) => "Io",
            Error::Config(_) => "Config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_passes_through_domains() {
        let err: Error = TableError::RowNotFound.into();
        assert_eq!(err.kind(), "RowNotFound");

        let err: Error = SqlError::WhereSyntax("x".into()).into();
        assert_eq!(err.kind(), "WhereSyntax");
        assert_eq!(err.to_string(), "wrong where-expression: x");
    }

    #[test]
    fn test_path_in_message() {
        let err = TableError::EmptyFile(PathBuf::from("t.txt"));
        assert_eq!(err.to_string(), "file you try to open is empty: t.txt");
    }
}
