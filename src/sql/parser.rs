/// Statement parser - converts tokens into an AST
///
/// Recursive descent over an explicit token position. Long-expression and
/// WHERE grammars live in their own modules as further `impl Parser` blocks.
use super::ast::*;
use super::lexer::Lexer;
use super::token::{Token, TokenType};
use crate::error::{SqlError, SqlResult};
use crate::types::FieldType;

/// Deepest allowed nesting of `(` and `NOT` within one statement.
pub const MAX_NESTING: usize = 256;

/// Most arithmetic and AND/OR operators allowed in one statement.
pub const MAX_OPERATORS: usize = 1024;

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
    operators: usize,
}

/// Saved parser state for backtracking.
#[derive(Debug, Clone, Copy)]
pub(super) struct Mark {
    position: usize,
    depth: usize,
    operators: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(t) if t.token_type == TokenType::Eof) {
            let (line, column) = tokens.last().map_or((1, 1), |t| (t.line, t.column));
            tokens.push(Token::new(TokenType::Eof, line, column));
        }
        Self {
            tokens,
            position: 0,
            depth: 0,
            operators: 0,
        }
    }

    /// Parse one statement; the input must end after it.
    pub fn parse(&mut self) -> SqlResult<Statement> {
        let stmt = match &self.current().token_type {
            TokenType::Create => Statement::CreateTable(self.parse_create_table()?),
            TokenType::Drop => Statement::DropTable(self.parse_drop_table()?),
            TokenType::Insert => Statement::Insert(self.parse_insert()?),
            TokenType::Select => Statement::Select(self.parse_select()?),
            TokenType::Update => Statement::Update(self.parse_update()?),
            TokenType::Delete => Statement::Delete(self.parse_delete()?),
            _ => {
                return Err(self.error(
                    SqlError::UnknownCommand,
                    "expected CREATE, DROP, INSERT, SELECT, UPDATE or DELETE",
                ))
            }
        };
        Ok(stmt)
    }

    /// CREATE TABLE name ( field, ... )
    fn parse_create_table(&mut self) -> SqlResult<CreateTableStmt> {
        self.expect(TokenType::Create, SqlError::UnknownCommand)?;
        self.expect(TokenType::Table, SqlError::UnknownCommand)?;
        let table = self.parse_identifier(SqlError::UnknownCommand)?;

        self.expect(TokenType::LParen, SqlError::UnknownCommand)?;
        let mut fields = Vec::new();
        loop {
            fields.push(self.parse_field_def()?);
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        self.expect(TokenType::RParen, SqlError::UnknownCommand)?;
        self.expect_end(SqlError::UnknownCommand)?;

        Ok(CreateTableStmt { table, fields })
    }

    fn parse_field_def(&mut self) -> SqlResult<FieldDef> {
        let name = self.parse_identifier(SqlError::FieldName)?;
        match self.current().token_type {
            TokenType::Long => {
                self.advance();
                Ok(FieldDef {
                    name,
                    field_type: FieldType::Long,
                    length: None,
                })
            }
            TokenType::Text => {
                self.advance();
                self.expect(TokenType::LParen, SqlError::FieldDescription)?;
                let length = match &self.current().token_type {
                    TokenType::Number(digits) => digits.parse::<usize>().map_err(|_| {
                        SqlError::NumberFormat(format!("TEXT length {} is out of range", digits))
                    })?,
                    _ => return Err(self.error(SqlError::NumberFormat, "expected TEXT length")),
                };
                self.advance();
                self.expect(TokenType::RParen, SqlError::FieldDescription)?;
                Ok(FieldDef {
                    name,
                    field_type: FieldType::Text,
                    length: Some(length),
                })
            }
            _ => Err(self.error(
                SqlError::FieldDescription,
                &format!("expected TEXT(len) or LONG for field {}", name),
            )),
        }
    }

    /// DROP TABLE name
    fn parse_drop_table(&mut self) -> SqlResult<DropTableStmt> {
        self.expect(TokenType::Drop, SqlError::UnknownCommand)?;
        self.expect(TokenType::Table, SqlError::UnknownCommand)?;
        let table = self.parse_identifier(SqlError::UnknownCommand)?;
        self.expect_end(SqlError::UnknownCommand)?;
        Ok(DropTableStmt { table })
    }

    /// INSERT INTO name ( value, ... )
    fn parse_insert(&mut self) -> SqlResult<InsertStmt> {
        self.expect(TokenType::Insert, SqlError::UnknownCommand)?;
        self.expect(TokenType::Into, SqlError::UnknownCommand)?;
        let table = self.parse_identifier(SqlError::UnknownCommand)?;

        self.expect(TokenType::LParen, SqlError::UnknownCommand)?;
        let mut values = Vec::new();
        loop {
            values.push(self.parse_insert_value()?);
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        self.expect(TokenType::RParen, SqlError::UnknownCommand)?;
        self.expect_end(SqlError::UnknownCommand)?;

        Ok(InsertStmt { table, values })
    }

    fn parse_insert_value(&mut self) -> SqlResult<InsertValue> {
        let value = match self.current().token_type.clone() {
            TokenType::String(s) => InsertValue::Text(s),
            TokenType::Minus | TokenType::Number(_) => InsertValue::Long(self.parse_signed_integer()?),
            TokenType::Identifier(word) => InsertValue::Word(word),
            t if TokenType::from_keyword(&t.to_string()).is_some() => InsertValue::Word(t.to_string()),
            _ => return Err(self.error(SqlError::UnknownCommand, "expected a value")),
        };
        if !matches!(value, InsertValue::Long(_)) {
            self.advance();
        }
        Ok(value)
    }

    /// SELECT * | name, ... FROM name WHERE clause
    fn parse_select(&mut self) -> SqlResult<SelectStmt> {
        self.expect(TokenType::Select, SqlError::UnknownCommand)?;

        let projection = if self.match_token(&TokenType::Star) {
            Projection::All
        } else {
            let mut names = Vec::new();
            loop {
                names.push(self.parse_identifier(SqlError::FieldName)?);
                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
            Projection::Fields(names)
        };

        self.expect(TokenType::From, SqlError::UnknownCommand)?;
        let table = self.parse_identifier(SqlError::UnknownCommand)?;
        let selection = self.parse_where()?;

        Ok(SelectStmt {
            projection,
            table,
            selection,
        })
    }

    /// UPDATE name SET field = value WHERE clause
    fn parse_update(&mut self) -> SqlResult<UpdateStmt> {
        self.expect(TokenType::Update, SqlError::UnknownCommand)?;
        let table = self.parse_identifier(SqlError::UnknownCommand)?;
        self.expect(TokenType::Set, SqlError::UnknownCommand)?;
        let field = self.parse_identifier(SqlError::FieldName)?;
        self.expect(TokenType::Eq, SqlError::UnknownCommand)?;

        let value = match self.current().token_type.clone() {
            TokenType::String(s) => {
                self.advance();
                UpdateValue::Text(s)
            }
            _ => UpdateValue::Expr(self.parse_long_expr()?),
        };

        let selection = self.parse_where()?;
        Ok(UpdateStmt {
            table,
            field,
            value,
            selection,
        })
    }

    /// DELETE FROM name WHERE clause
    fn parse_delete(&mut self) -> SqlResult<DeleteStmt> {
        self.expect(TokenType::Delete, SqlError::UnknownCommand)?;
        self.expect(TokenType::From, SqlError::UnknownCommand)?;
        let table = self.parse_identifier(SqlError::UnknownCommand)?;
        let selection = self.parse_where()?;
        Ok(DeleteStmt { table, selection })
    }

    /// `WHERE clause` through to the end of input
    fn parse_where(&mut self) -> SqlResult<WhereClause> {
        self.expect(TokenType::Where, SqlError::UnknownCommand)?;
        let clause = self.parse_where_clause()?;
        self.expect_end(SqlError::WhereSyntax)?;
        Ok(clause)
    }

    // Helper methods

    /// Optionally signed integer literal.
    pub(super) fn parse_signed_integer(&mut self) -> SqlResult<i64> {
        let negative = self.match_token(&TokenType::Minus);
        let digits = match &self.current().token_type {
            TokenType::Number(digits) => digits.clone(),
            _ => return Err(self.error(SqlError::NumberFormat, "expected an integer")),
        };
        self.advance();
        let text = if negative { format!("-{}", digits) } else { digits };
        text.parse::<i64>()
            .map_err(|_| SqlError::NumberFormat(format!("{} does not fit a LONG", text)))
    }

    fn parse_identifier(&mut self, kind: fn(String) -> SqlError) -> SqlResult<String> {
        if let TokenType::Identifier(name) = &self.current().token_type {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error(kind, "expected a name"))
        }
    }

    /// Optional `;`, then end of input.
    fn expect_end(&mut self, kind: fn(String) -> SqlError) -> SqlResult<()> {
        self.match_token(&TokenType::Semicolon);
        if self.at_eof() {
            Ok(())
        } else {
            Err(self.error(kind, "unexpected trailing input"))
        }
    }

    pub(super) fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    /// Token `offset` places ahead of the current one (Eof past the end).
    pub(super) fn peek(&self, offset: usize) -> &TokenType {
        let index = (self.position + offset).min(self.tokens.len() - 1);
        &self.tokens[index].token_type
    }

    pub(super) fn at_eof(&self) -> bool {
        matches!(self.current().token_type, TokenType::Eof)
    }

    pub(super) fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    pub(super) fn mark(&self) -> Mark {
        Mark {
            position: self.position,
            depth: self.depth,
            operators: self.operators,
        }
    }

    pub(super) fn reset(&mut self, mark: Mark) {
        self.position = mark.position;
        self.depth = mark.depth;
        self.operators = mark.operators;
    }

    /// Step into a parenthesised group or `NOT`; pair with [`Parser::leave_nested`].
    pub(super) fn enter_nested(&mut self, kind: fn(String) -> SqlError) -> SqlResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(kind, &format!("nesting deeper than {}", MAX_NESTING)));
        }
        self.depth += 1;
        Ok(())
    }

    pub(super) fn leave_nested(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Account for one binary operator node.
    pub(super) fn count_operator(&mut self, kind: fn(String) -> SqlError) -> SqlResult<()> {
        if self.operators >= MAX_OPERATORS {
            return Err(self.error(kind, &format!("more than {} operators", MAX_OPERATORS)));
        }
        self.operators += 1;
        Ok(())
    }

    pub(super) fn match_token(&mut self, token_type: &TokenType) -> bool {
        if std::mem::discriminant(&self.current().token_type) == std::mem::discriminant(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn expect(&mut self, token_type: TokenType, kind: fn(String) -> SqlError) -> SqlResult<()> {
        if self.match_token(&token_type) {
            Ok(())
        } else {
            Err(self.error(kind, &format!("expected '{}'", token_type)))
        }
    }

    pub(super) fn error(&self, kind: fn(String) -> SqlError, msg: &str) -> SqlError {
        kind(format!("{}, found {}", msg, self.current()))
    }
}

/// Tokenize and parse one statement.
pub fn parse_statement(input: &str) -> SqlResult<Statement> {
    let tokens = Lexer::new(input).tokenize()?;
    Parser::new(tokens).parse()
}
