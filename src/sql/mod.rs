/// StrideDB statement language
///
/// Architecture:
/// - Lexer: Tokenizes statement text
/// - Parser: Builds AST from tokens; WHERE clauses are parsed without a schema
/// - Predicate: Binds a WHERE clause to a table schema and selects rows
/// - Executor: Runs statements against table files

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod long_expr;
pub mod predicate;
pub mod executor;

pub use token::{Token, TokenType};
pub use lexer::{tokenize, Lexer};
pub use ast::{Statement, CreateTableStmt, DropTableStmt, InsertStmt, SelectStmt, UpdateStmt, DeleteStmt};
pub use parser::{parse_statement, Parser};
pub use long_expr::{ArithOp, FieldSource, LongExpr};
pub use predicate::{Predicate, WhereClause};
pub use executor::{Interpreter, QueryResult};

use std::io::Write;

use crate::config::DbConfig;
use crate::error::Result;

/// Parse and execute one statement
pub fn execute_sql(config: &DbConfig, sql: &str, out: &mut dyn Write) -> Result<QueryResult> {
    let mut lexer = Lexer::new(sql);
    let tokens = lexer.tokenize()?;
    let mut parser = Parser::new(tokens);
    let statement = parser.parse()?;
    let interpreter = Interpreter::new(config.clone());
    interpreter.execute_statement(statement, out)
}
