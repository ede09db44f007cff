//! StrideDB
//!
//! A small single-user table store driven by a SQL-like statement language.
//!
//! ## Layout
//! - Storage: one fixed-width binary file per table (header, field templates,
//!   packed records), accessed through a [`Cursor`]
//! - Statements: lexer, recursive-descent parser, WHERE binding and the
//!   [`Interpreter`]
//! - Front-ends: a line-oriented TCP server, its client and an interactive
//!   shell (see `src/bin`)

pub mod config;
pub mod logging;
pub mod server;
pub mod sql;
pub mod storage;
pub mod types;

mod error;

pub use config::{DbConfig, DurabilityLevel, ServerConfig};
pub use error::{Error, Result, SqlError, SqlResult, TableError, TableResult};

pub use sql::{execute_sql, Interpreter, QueryResult};
pub use storage::{Cursor, Table};
pub use types::{Cell, FieldDescriptor, FieldType, Row, Schema};
