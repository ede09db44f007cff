//! Long-expressions: integer arithmetic over LONG fields and literals.
//!
//! ```text
//! Expr := Term (('+' | '-') Term)*
//! Term := Atom (('*' | '/' | '%') Atom)*
//! Atom := '(' Expr ')' | INTEGER | LONG_FIELD_NAME
//! ```
//!
//! An expression is parsed once and evaluated against as many rows as
//! needed. Field names are not checked while parsing; any word that is not
//! a keyword, operator or all-digit number is taken to be a LONG field and
//! resolved when the expression is evaluated.

use std::fmt;

use super::lexer::Lexer;
use super::parser::Parser;
use super::token::TokenType;
use crate::error::{Result, SqlError, SqlResult};
use crate::storage::Cursor;
use crate::types::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithOp {
    fn precedence(self) -> u8 {
        match self {
            ArithOp::Add | ArithOp::Sub => 1,
            ArithOp::Mul | ArithOp::Div | ArithOp::Mod => 2,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
        }
    }

    /// Checked i64 arithmetic; `/` and `%` truncate toward zero.
    pub fn apply(self, left: i64, right: i64) -> SqlResult<i64> {
        if right == 0 && matches!(self, ArithOp::Div | ArithOp::Mod) {
            return Err(SqlError::DivisionByZero);
        }
        let result = match self {
            ArithOp::Add => left.checked_add(right),
            ArithOp::Sub => left.checked_sub(right),
            ArithOp::Mul => left.checked_mul(right),
            ArithOp::Div => left.checked_div(right),
            ArithOp::Mod => left.checked_rem(right),
        };
        result.ok_or_else(|| {
            SqlError::ArithmeticOverflow(format!("{} {} {}", left, self.symbol(), right))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LongExpr {
    Literal(i64),
    Field(String),
    Binary {
        op: ArithOp,
        left: Box<LongExpr>,
        right: Box<LongExpr>,
    },
}

/// Where evaluation looks up LONG field values.
pub trait FieldSource {
    fn long_value(&self, field: &str) -> Result<i64>;
}

impl FieldSource for Cursor {
    fn long_value(&self, field: &str) -> Result<i64> {
        match self.get(field)? {
            Cell::Long(v) => Ok(*v),
            Cell::Text(_) => Err(SqlError::LongExprSyntax(format!(
                "{} is a TEXT field, expected LONG",
                field
            ))
            .into()),
        }
    }
}

impl LongExpr {
    /// Parse a standalone expression; the whole input must be consumed.
    pub fn parse(input: &str) -> SqlResult<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        let mut parser = Parser::new(tokens);
        let expr = parser.parse_long_expr()?;
        if !parser.at_eof() {
            return Err(parser.error(SqlError::LongExprSyntax, "unexpected token after expression"));
        }
        Ok(expr)
    }

    pub fn binary(op: ArithOp, left: LongExpr, right: LongExpr) -> Self {
        LongExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn evaluate(&self, source: &dyn FieldSource) -> Result<i64> {
        match self {
            LongExpr::Literal(v) => Ok(*v),
            LongExpr::Field(name) => source.long_value(name),
            LongExpr::Binary { op, left, right } => {
                let l = left.evaluate(source)?;
                let r = right.evaluate(source)?;
                Ok(op.apply(l, r)?)
            }
        }
    }

    /// Every field name referenced, left to right.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            LongExpr::Literal(_) => {}
            LongExpr::Field(name) => out.push(name),
            LongExpr::Binary { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
        }
    }

    /// The field name if this expression is nothing but a field.
    pub fn as_field(&self) -> Option<&str> {
        match self {
            LongExpr::Field(name) => Some(name),
            _ => None,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parent: ArithOp, right_side: bool) -> fmt::Result {
        let needs_parens = match self {
            LongExpr::Binary { op, .. } => {
                op.precedence() < parent.precedence()
                    || (right_side && op.precedence() == parent.precedence())
            }
            _ => false,
        };
        if needs_parens {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// Normalized text that parses back to the same tree.
impl fmt::Display for LongExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LongExpr::Literal(v) => write!(f, "{}", v),
            LongExpr::Field(name) => write!(f, "{}", name),
            LongExpr::Binary { op, left, right } => {
                left.fmt_operand(f, *op, false)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_operand(f, *op, true)
            }
        }
    }
}

impl Parser {
    pub(crate) fn parse_long_expr(&mut self) -> SqlResult<LongExpr> {
        let mut left = self.parse_long_term()?;
        loop {
            let op = match self.current().token_type {
                TokenType::Plus => ArithOp::Add,
                TokenType::Minus => ArithOp::Sub,
                _ => break,
            };
            self.count_operator(SqlError::LongExprSyntax)?;
            self.advance();
            let right = self.parse_long_term()?;
            left = LongExpr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_long_term(&mut self) -> SqlResult<LongExpr> {
        let mut left = self.parse_long_atom()?;
        loop {
            let op = match self.current().token_type {
                TokenType::Star => ArithOp::Mul,
                TokenType::Slash => ArithOp::Div,
                TokenType::Percent => ArithOp::Mod,
                _ => break,
            };
            self.count_operator(SqlError::LongExprSyntax)?;
            self.advance();
            let right = self.parse_long_atom()?;
            left = LongExpr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_long_atom(&mut self) -> SqlResult<LongExpr> {
        match self.current().token_type.clone() {
            TokenType::LParen => {
                self.enter_nested(SqlError::LongExprSyntax)?;
                self.advance();
                let inner = self.parse_long_expr()?;
                self.expect(TokenType::RParen, SqlError::LongExprSyntax)?;
                self.leave_nested();
                Ok(inner)
            }
            TokenType::Number(digits) => {
                self.advance();
                digits
                    .parse::<i64>()
                    .map(LongExpr::Literal)
                    .map_err(|_| SqlError::NumberFormat(format!("{} does not fit a LONG", digits)))
            }
            TokenType::Identifier(name) => {
                self.advance();
                Ok(LongExpr::Field(name))
            }
            _ => Err(self.error(SqlError::LongExprSyntax, "expected a number, field or '('")),
        }
    }
}
