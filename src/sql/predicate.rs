//! WHERE clauses
//!
//! A clause is parsed without looking at the table into one of five modes:
//!
//! ```text
//! ALL
//! TEXT_FIELD [NOT] LIKE 'regex'
//! (TEXT_FIELD | 'text') [NOT] IN ('a', 'b', ...)
//! LongExpr [NOT] IN (1, -2, ...)
//! Or  := And (OR And)*
//! And := Rel (AND Rel)*
//! Rel := '(' Or ')' | NOT Rel | Operand REL_OP Operand
//! ```
//!
//! [`WhereClause::bind`] then resolves field names against a schema and
//! type-checks, producing a [`Predicate`] that can be run over a table.

use ahash::AHashSet;
use log::debug;
use regex::Regex;

use super::long_expr::LongExpr;
use super::parser::Parser;
use super::token::TokenType;
use crate::error::{Result, SqlError, SqlResult, TableError};
use crate::storage::{Cursor, Table};
use crate::types::{Cell, FieldType, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    fn from_token(token: &TokenType) -> Option<Self> {
        Some(match token {
            TokenType::Eq => RelOp::Eq,
            TokenType::Ne => RelOp::Ne,
            TokenType::Lt => RelOp::Lt,
            TokenType::Le => RelOp::Le,
            TokenType::Gt => RelOp::Gt,
            TokenType::Ge => RelOp::Ge,
            _ => return None,
        })
    }

    pub fn apply<T: Ord + ?Sized>(self, left: &T, right: &T) -> bool {
        match self {
            RelOp::Eq => left == right,
            RelOp::Ne => left != right,
            RelOp::Lt => left < right,
            RelOp::Le => left <= right,
            RelOp::Gt => left > right,
            RelOp::Ge => left >= right,
        }
    }
}

/// Left side of IN_TEXT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOperand {
    Field(String),
    Literal(String),
}

/// One side of a comparison before binding. A bare field name parses as a
/// long-expression and turns into a text operand if the field is TEXT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Str(String),
    Expr(LongExpr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicExpr {
    Or(Box<LogicExpr>, Box<LogicExpr>),
    And(Box<LogicExpr>, Box<LogicExpr>),
    Not(Box<LogicExpr>),
    Compare {
        left: Operand,
        op: RelOp,
        right: Operand,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhereClause {
    All,
    Like {
        field: String,
        pattern: String,
        negated: bool,
    },
    InText {
        operand: TextOperand,
        values: Vec<String>,
        negated: bool,
    },
    InLong {
        expr: LongExpr,
        values: Vec<i64>,
        negated: bool,
    },
    Logic(LogicExpr),
}

enum ListItem {
    Str(String),
    Long(i64),
}

impl Parser {
    /// Parse a WHERE clause body, committing to exactly one mode.
    pub(crate) fn parse_where_clause(&mut self) -> SqlResult<WhereClause> {
        if self.match_token(&TokenType::All) {
            return Ok(WhereClause::All);
        }

        let is_like = matches!(self.peek(1), TokenType::Like)
            || (matches!(self.peek(1), TokenType::Not) && matches!(self.peek(2), TokenType::Like));
        if is_like {
            return self.parse_like();
        }

        // [NOT] IN after a string or a long-expression; otherwise LOGIC
        let mark = self.mark();
        let operand = match self.current().token_type.clone() {
            TokenType::String(s) => {
                self.advance();
                Some(Operand::Str(s))
            }
            _ => self.parse_long_expr().ok().map(Operand::Expr),
        };
        if let Some(operand) = operand {
            let is_in = matches!(self.peek(0), TokenType::In)
                || (matches!(self.peek(0), TokenType::Not) && matches!(self.peek(1), TokenType::In));
            if is_in {
                return self.parse_in(operand);
            }
        }

        self.reset(mark);
        Ok(WhereClause::Logic(self.parse_or()?))
    }

    fn parse_like(&mut self) -> SqlResult<WhereClause> {
        let field = match self.current().token_type.clone() {
            TokenType::Identifier(name) => name,
            _ => return Err(self.error(SqlError::WhereSyntax, "LIKE needs a TEXT field on the left")),
        };
        self.advance();
        let negated = self.match_token(&TokenType::Not);
        self.expect(TokenType::Like, SqlError::WhereSyntax)?;
        let pattern = match self.current().token_type.clone() {
            TokenType::String(s) => s,
            _ => return Err(self.error(SqlError::WhereSyntax, "LIKE needs a quoted pattern")),
        };
        self.advance();
        Ok(WhereClause::Like {
            field,
            pattern,
            negated,
        })
    }

    fn parse_in(&mut self, operand: Operand) -> SqlResult<WhereClause> {
        let negated = self.match_token(&TokenType::Not);
        self.expect(TokenType::In, SqlError::WhereSyntax)?;
        self.expect(TokenType::LParen, SqlError::WhereSyntax)?;

        let mut items = Vec::new();
        loop {
            let item = match self.current().token_type.clone() {
                TokenType::String(s) => {
                    self.advance();
                    ListItem::Str(s)
                }
                TokenType::Minus | TokenType::Number(_) => ListItem::Long(self.parse_signed_integer()?),
                _ => return Err(self.error(SqlError::WhereSyntax, "expected a literal in IN list")),
            };
            items.push(item);
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        self.expect(TokenType::RParen, SqlError::WhereSyntax)?;

        let all_text = items.iter().all(|i| matches!(i, ListItem::Str(_)));
        let all_long = items.iter().all(|i| matches!(i, ListItem::Long(_)));

        if all_text {
            let values = items
                .into_iter()
                .filter_map(|i| match i {
                    ListItem::Str(s) => Some(s),
                    ListItem::Long(_) => None,
                })
                .collect();
            let operand = match operand {
                Operand::Str(s) => TextOperand::Literal(s),
                Operand::Expr(LongExpr::Field(name)) => TextOperand::Field(name),
                Operand::Expr(expr) => {
                    return Err(SqlError::LogicExprSyntax(format!(
                        "{} is LONG, the IN list is TEXT",
                        expr
                    )))
                }
            };
            Ok(WhereClause::InText {
                operand,
                values,
                negated,
            })
        } else if all_long {
            let values = items
                .into_iter()
                .filter_map(|i| match i {
                    ListItem::Long(v) => Some(v),
                    ListItem::Str(_) => None,
                })
                .collect();
            let expr = match operand {
                Operand::Expr(expr) => expr,
                Operand::Str(s) => {
                    return Err(SqlError::LogicExprSyntax(format!(
                        "'{}' is TEXT, the IN list is LONG",
                        s
                    )))
                }
            };
            Ok(WhereClause::InLong {
                expr,
                values,
                negated,
            })
        } else {
            Err(SqlError::WhereSyntax("IN list mixes TEXT and LONG values".to_string()))
        }
    }

    fn parse_or(&mut self) -> SqlResult<LogicExpr> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(0), TokenType::Or) {
            self.count_operator(SqlError::LogicExprSyntax)?;
            self.advance();
            let right = self.parse_and()?;
            left = LogicExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> SqlResult<LogicExpr> {
        let mut left = self.parse_rel()?;
        while matches!(self.peek(0), TokenType::And) {
            self.count_operator(SqlError::LogicExprSyntax)?;
            self.advance();
            let right = self.parse_rel()?;
            left = LogicExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_rel(&mut self) -> SqlResult<LogicExpr> {
        if matches!(self.peek(0), TokenType::Not) {
            self.enter_nested(SqlError::LogicExprSyntax)?;
            self.advance();
            let inner = self.parse_rel()?;
            self.leave_nested();
            return Ok(LogicExpr::Not(Box::new(inner)));
        }
        if matches!(self.peek(0), TokenType::LParen) {
            // `(a + 1) > 2` or `(a > 2 AND ...)`
            let mark = self.mark();
            if let Ok(cmp) = self.parse_comparison() {
                return Ok(cmp);
            }
            self.reset(mark);
            self.enter_nested(SqlError::LogicExprSyntax)?;
            self.advance();
            let inner = self.parse_or()?;
            self.expect(TokenType::RParen, SqlError::LogicExprSyntax)?;
            self.leave_nested();
            return Ok(inner);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> SqlResult<LogicExpr> {
        let left = self.parse_operand()?;
        let op = RelOp::from_token(self.peek(0))
            .ok_or_else(|| self.error(SqlError::LogicExprSyntax, "expected a comparison operator"))?;
        self.advance();
        let right = self.parse_operand()?;
        Ok(LogicExpr::Compare { left, op, right })
    }

    fn parse_operand(&mut self) -> SqlResult<Operand> {
        match self.current().token_type.clone() {
            TokenType::String(s) => {
                self.advance();
                Ok(Operand::Str(s))
            }
            TokenType::LParen | TokenType::Number(_) | TokenType::Identifier(_) => {
                Ok(Operand::Expr(self.parse_long_expr()?))
            }
            _ => Err(self.error(SqlError::LogicExprSyntax, "expected an operand")),
        }
    }
}

/// TEXT value source after binding.
#[derive(Debug, Clone)]
pub enum TextValue {
    Field(usize),
    Literal(String),
}

#[derive(Debug, Clone)]
pub enum Condition {
    Or(Box<Condition>, Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
    Long {
        left: LongExpr,
        op: RelOp,
        right: LongExpr,
    },
    Text {
        left: TextValue,
        op: RelOp,
        right: TextValue,
    },
}

/// A WHERE clause bound to one table's schema.
#[derive(Debug, Clone)]
pub enum Predicate {
    All,
    Like {
        field: usize,
        pattern: Regex,
        negated: bool,
    },
    InText {
        operand: TextValue,
        values: AHashSet<String>,
        negated: bool,
    },
    InLong {
        expr: LongExpr,
        values: AHashSet<i64>,
        negated: bool,
    },
    Logic(Condition),
}

enum Bound {
    Text(TextValue),
    Long(LongExpr),
}

fn resolve(schema: &Schema, name: &str) -> SqlResult<(usize, FieldType)> {
    schema
        .field(name)
        .map(|(index, field)| (index, field.field_type()))
        .map_err(|_| SqlError::WhereSyntax(format!("no such field {}", name)))
}

fn check_long_expr(schema: &Schema, expr: &LongExpr) -> SqlResult<()> {
    for name in expr.fields() {
        if resolve(schema, name)?.1 != FieldType::Long {
            return Err(SqlError::LogicExprSyntax(format!(
                "{} is TEXT, expected LONG",
                name
            )));
        }
    }
    Ok(())
}

fn bind_text_operand(schema: &Schema, operand: &TextOperand) -> SqlResult<TextValue> {
    match operand {
        TextOperand::Literal(s) => Ok(TextValue::Literal(s.clone())),
        TextOperand::Field(name) => match resolve(schema, name)? {
            (index, FieldType::Text) => Ok(TextValue::Field(index)),
            (_, FieldType::Long) => Err(SqlError::LogicExprSyntax(format!(
                "{} is LONG, expected TEXT",
                name
            ))),
        },
    }
}

fn bind_operand(schema: &Schema, operand: &Operand) -> SqlResult<Bound> {
    match operand {
        Operand::Str(s) => Ok(Bound::Text(TextValue::Literal(s.clone()))),
        Operand::Expr(expr) => {
            if let Some(name) = expr.as_field() {
                if let (index, FieldType::Text) = resolve(schema, name)? {
                    return Ok(Bound::Text(TextValue::Field(index)));
                }
            }
            check_long_expr(schema, expr)?;
            Ok(Bound::Long(expr.clone()))
        }
    }
}

fn bind_logic(schema: &Schema, expr: &LogicExpr) -> SqlResult<Condition> {
    Ok(match expr {
        LogicExpr::Or(l, r) => Condition::Or(
            Box::new(bind_logic(schema, l)?),
            Box::new(bind_logic(schema, r)?),
        ),
        LogicExpr::And(l, r) => Condition::And(
            Box::new(bind_logic(schema, l)?),
            Box::new(bind_logic(schema, r)?),
        ),
        LogicExpr::Not(inner) => Condition::Not(Box::new(bind_logic(schema, inner)?)),
        LogicExpr::Compare { left, op, right } => {
            match (bind_operand(schema, left)?, bind_operand(schema, right)?) {
                (Bound::Text(left), Bound::Text(right)) => Condition::Text { left, op: *op, right },
                (Bound::Long(left), Bound::Long(right)) => Condition::Long { left, op: *op, right },
                _ => {
                    return Err(SqlError::LogicExprSyntax(
                        "cannot compare TEXT with LONG".to_string(),
                    ))
                }
            }
        }
    })
}

impl WhereClause {
    /// Parse a clause on its own (without the WHERE keyword).
    pub fn parse(input: &str) -> SqlResult<Self> {
        let tokens = super::lexer::Lexer::new(input).tokenize()?;
        let mut parser = Parser::new(tokens);
        let clause = parser.parse_where_clause()?;
        parser.match_token(&TokenType::Semicolon);
        if !parser.at_eof() {
            return Err(parser.error(SqlError::WhereSyntax, "unexpected trailing input"));
        }
        Ok(clause)
    }

    /// Resolve fields against `schema` and type-check.
    pub fn bind(&self, schema: &Schema) -> SqlResult<Predicate> {
        Ok(match self {
            WhereClause::All => Predicate::All,
            WhereClause::Like {
                field,
                pattern,
                negated,
            } => {
                let index = match resolve(schema, field)? {
                    (index, FieldType::Text) => index,
                    (_, FieldType::Long) => {
                        return Err(SqlError::LogicExprSyntax(format!(
                            "LIKE needs a TEXT field, {} is LONG",
                            field
                        )))
                    }
                };
                let anchored = Regex::new(&format!("^(?:{})$", pattern))
                    .map_err(|e| SqlError::WhereSyntax(format!("bad LIKE pattern: {}", e)))?;
                Predicate::Like {
                    field: index,
                    pattern: anchored,
                    negated: *negated,
                }
            }
            WhereClause::InText {
                operand,
                values,
                negated,
            } => Predicate::InText {
                operand: bind_text_operand(schema, operand)?,
                values: values.iter().cloned().collect(),
                negated: *negated,
            },
            WhereClause::InLong {
                expr,
                values,
                negated,
            } => {
                check_long_expr(schema, expr)?;
                Predicate::InLong {
                    expr: expr.clone(),
                    values: values.iter().copied().collect(),
                    negated: *negated,
                }
            }
            WhereClause::Logic(expr) => Predicate::Logic(bind_logic(schema, expr)?),
        })
    }
}

fn text_field(cursor: &Cursor, index: usize) -> Result<&str> {
    match cursor.row().get(index) {
        Some(Cell::Text(s)) => Ok(s),
        _ => Err(TableError::FieldName(format!("#{}", index + 1)).into()),
    }
}

fn text_of<'a>(cursor: &'a Cursor, value: &'a TextValue) -> Result<&'a str> {
    match value {
        TextValue::Literal(s) => Ok(s),
        TextValue::Field(index) => text_field(cursor, *index),
    }
}

impl Condition {
    /// Both sides of AND / OR are always evaluated, so an error on either
    /// side surfaces regardless of the other's value.
    pub fn evaluate(&self, cursor: &Cursor) -> Result<bool> {
        Ok(match self {
            Condition::Or(l, r) => {
                let left = l.evaluate(cursor)?;
                let right = r.evaluate(cursor)?;
                left || right
            }
            Condition::And(l, r) => {
                let left = l.evaluate(cursor)?;
                let right = r.evaluate(cursor)?;
                left && right
            }
            Condition::Not(inner) => !inner.evaluate(cursor)?,
            Condition::Long { left, op, right } => {
                op.apply(&left.evaluate(cursor)?, &right.evaluate(cursor)?)
            }
            Condition::Text { left, op, right } => {
                op.apply(text_of(cursor, left)?, text_of(cursor, right)?)
            }
        })
    }
}

impl Predicate {
    /// Does the row in `cursor`'s buffer satisfy the predicate?
    pub fn matches(&self, cursor: &Cursor) -> Result<bool> {
        Ok(match self {
            Predicate::All => true,
            Predicate::Like {
                field,
                pattern,
                negated,
            } => {
                pattern.is_match(text_field(cursor, *field)?) != *negated
            }
            Predicate::InText {
                operand,
                values,
                negated,
            } => values.contains(text_of(cursor, operand)?) != *negated,
            Predicate::InLong {
                expr,
                values,
                negated,
            } => values.contains(&expr.evaluate(cursor)?) != *negated,
            Predicate::Logic(condition) => condition.evaluate(cursor)?,
        })
    }

    /// True when the outcome cannot depend on the row.
    fn is_row_independent(&self) -> bool {
        matches!(
            self,
            Predicate::All
                | Predicate::InText {
                    operand: TextValue::Literal(_),
                    ..
                }
        )
    }

    /// Sorted, duplicate-free 1-based indices of matching rows.
    pub fn select(&self, table: &Table, cursor: &mut Cursor) -> Result<Vec<u64>> {
        let count = table.record_count();
        if self.is_row_independent() {
            return Ok(if self.matches(cursor)? {
                (1..=count).collect()
            } else {
                Vec::new()
            });
        }

        let mut selected = Vec::new();
        for index in 1..=count {
            cursor.read_at(table, index)?;
            if self.matches(cursor)? {
                selected.push(index);
            }
        }
        selected.sort_unstable();
        selected.dedup();

        debug!("{}: {} of {} rows match", table.name(), selected.len(), count);
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use crate::error::Error;
    use crate::types::{FieldDescriptor, Row};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use tempfile::{tempdir, TempDir};

    fn people(rows: &[(&str, i64)]) -> (TempDir, Table) {
        let dir = tempdir().unwrap();
        let config = DbConfig::for_testing(dir.path());
        let schema = Schema::new(vec![
            FieldDescriptor::text("name", 10).unwrap(),
            FieldDescriptor::long("age").unwrap(),
        ])
        .unwrap();
        let mut table = Table::create(&config, "people", schema).unwrap();
        for (name, age) in rows {
            table
                .append(&Row::new(vec![Cell::Text(name.to_string()), Cell::Long(*age)]))
                .unwrap();
        }
        (dir, table)
    }

    fn select(table: &Table, clause: &str) -> Result<Vec<u64>> {
        let predicate = WhereClause::parse(clause)?.bind(table.schema())?;
        let mut cursor = Cursor::new(table);
        predicate.select(table, &mut cursor)
    }

    fn sample() -> (TempDir, Table) {
        people(&[("ann", 5), ("bob", 6), ("cy", 5), ("dora", 1), ("ed", 3)])
    }

    #[test]
    fn test_mode_selection() {
        assert_eq!(WhereClause::parse("ALL").unwrap(), WhereClause::All);
        assert!(matches!(
            WhereClause::parse("name NOT LIKE 'a.*'").unwrap(),
            WhereClause::Like { negated: true, .. }
        ));
        assert!(matches!(
            WhereClause::parse("name IN ('a', 'b')").unwrap(),
            WhereClause::InText { operand: TextOperand::Field(_), .. }
        ));
        assert!(matches!(
            WhereClause::parse("'a' NOT IN ('a')").unwrap(),
            WhereClause::InText { operand: TextOperand::Literal(_), negated: true, .. }
        ));
        assert!(matches!(
            WhereClause::parse("(age + 1) * 2 IN (1, -2)").unwrap(),
            WhereClause::InLong { .. }
        ));
        assert!(matches!(
            WhereClause::parse("(age + 1) * 2 > 3 OR name = 'x'").unwrap(),
            WhereClause::Logic(LogicExpr::Or(..))
        ));
        assert!(matches!(
            WhereClause::parse("NOT (age = 1)").unwrap(),
            WhereClause::Logic(LogicExpr::Not(_))
        ));
    }

    #[test]
    fn test_all_selects_every_row_in_order() {
        let (_dir, table) = sample();
        assert_eq!(select(&table, "ALL").unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_equality_and_contradiction() {
        let (_dir, table) = sample();
        assert_eq!(select(&table, "age = 5").unwrap(), vec![1, 3]);
        assert!(select(&table, "age = 5 AND age = 6").unwrap().is_empty());
        assert_eq!(select(&table, "age = 5 OR age = 6").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_in_long_and_complement() {
        let (_dir, table) = sample();
        assert_eq!(select(&table, "age IN (1, 2, 3)").unwrap(), vec![4, 5]);
        assert_eq!(select(&table, "age NOT IN (1, 2, 3)").unwrap(), vec![1, 2, 3]);
        assert_eq!(select(&table, "age - 6 IN (-5, 0)").unwrap(), vec![2, 4]);
    }

    #[test]
    fn test_in_complement_randomized() {
        let mut rng = StdRng::seed_from_u64(7);
        let rows: Vec<(String, i64)> = (0..40)
            .map(|i| (format!("r{}", i), rng.gen_range(0..10)))
            .collect();
        let borrowed: Vec<(&str, i64)> = rows.iter().map(|(n, a)| (n.as_str(), *a)).collect();
        let (_dir, table) = people(&borrowed);

        let inside = select(&table, "age IN (1, 2, 3)").unwrap();
        let outside = select(&table, "age NOT IN (1, 2, 3)").unwrap();
        let mut union: Vec<u64> = inside.iter().chain(outside.iter()).copied().collect();
        union.sort_unstable();
        assert_eq!(union, (1..=40).collect::<Vec<u64>>());
        assert!(inside.iter().all(|i| !outside.contains(i)));
        for index in &inside {
            assert!((1..=3).contains(&borrowed[*index as usize - 1].1));
        }
    }

    #[test]
    fn test_like_matches_whole_value() {
        let (_dir, table) = sample();
        assert_eq!(select(&table, "name LIKE 'b.b'").unwrap(), vec![2]);
        assert!(select(&table, "name LIKE 'o'").unwrap().is_empty());
        assert_eq!(select(&table, "name LIKE '.*o.*'").unwrap(), vec![2, 4]);
        assert_eq!(select(&table, "name NOT LIKE '.*o.*'").unwrap(), vec![1, 3, 5]);
        assert_eq!(select(&table, "name LIKE 'a|cy'").unwrap(), vec![3]);
    }

    #[test]
    fn test_in_text() {
        let (_dir, table) = sample();
        assert_eq!(select(&table, "name IN ('cy', 'ed', 'zed')").unwrap(), vec![3, 5]);
        assert_eq!(select(&table, "name NOT IN ('cy')").unwrap(), vec![1, 2, 4, 5]);
        assert_eq!(select(&table, "'x' IN ('x', 'y')").unwrap(), vec![1, 2, 3, 4, 5]);
        assert!(select(&table, "'x' NOT IN ('x')").unwrap().is_empty());
    }

    #[test]
    fn test_text_comparison_is_lexicographic() {
        let (_dir, table) = sample();
        assert_eq!(select(&table, "name < 'c'").unwrap(), vec![1, 2]);
        assert_eq!(select(&table, "name >= 'cy' AND age != 1").unwrap(), vec![3, 5]);
        assert_eq!(select(&table, "'bob' = name").unwrap(), vec![2]);
    }

    #[test]
    fn test_parenthesized_logic() {
        let (_dir, table) = sample();
        assert_eq!(
            select(&table, "(age > 4 AND name != 'bob') OR (age + 1) * 2 = 4").unwrap(),
            vec![1, 3, 4]
        );
        assert_eq!(select(&table, "NOT (age = 5 OR age = 6)").unwrap(), vec![4, 5]);
        assert_eq!(select(&table, "((age)) >= 5").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_both_sides_are_evaluated() {
        let (_dir, table) = sample();
        let err = select(&table, "age = 100 AND age / 0 = 1").unwrap_err();
        assert!(matches!(err, Error::Sql(SqlError::DivisionByZero)));
        let err = select(&table, "age > 0 OR age % 0 = 1").unwrap_err();
        assert!(matches!(err, Error::Sql(SqlError::DivisionByZero)));
    }

    #[test]
    fn test_bind_errors() {
        let (_dir, table) = sample();
        let kind = |clause: &str| select(&table, clause).unwrap_err().kind();

        assert_eq!(kind("nope = 1"), "WhereSyntax");
        assert_eq!(kind("nope LIKE 'a'"), "WhereSyntax");
        assert_eq!(kind("name = 1"), "LogicExprSyntax");
        assert_eq!(kind("name + 1 > 2"), "LogicExprSyntax");
        assert_eq!(kind("age LIKE '1'"), "LogicExprSyntax");
        assert_eq!(kind("age IN ('a')"), "LogicExprSyntax");
        assert_eq!(kind("name IN (1)"), "LogicExprSyntax");
        assert_eq!(kind("name LIKE '('"), "WhereSyntax");
    }

    #[test]
    fn test_parse_errors() {
        let kind = |clause: &str| WhereClause::parse(clause).unwrap_err().kind();

        assert_eq!(kind("ALL ALL"), "WhereSyntax");
        assert_eq!(kind("age IN (1, 'a')"), "WhereSyntax");
        assert_eq!(kind("age IN ()"), "WhereSyntax");
        assert_eq!(kind("age IN 1"), "WhereSyntax");
        assert_eq!(kind("'a' LIKE 'a'"), "WhereSyntax");
        assert_eq!(kind("name LIKE other"), "WhereSyntax");
        assert_eq!(kind("(age = 1"), "LogicExprSyntax");
        assert_eq!(kind("age"), "LogicExprSyntax");
        assert_eq!(kind("age = 1 AND"), "LogicExprSyntax");
        assert_eq!(kind("age = 1)"), "WhereSyntax");
        assert_eq!(kind("'it"), "UnterminatedString");
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let (_dir, table) = sample();
        let grouped = |depth: usize| format!("{}age = 5{}", "(".repeat(depth), ")".repeat(depth));
        let wrapped = |depth: usize| format!("{}age{} = 5", "(".repeat(depth), ")".repeat(depth));

        assert_eq!(select(&table, &grouped(20)).unwrap(), vec![1, 3]);
        assert_eq!(select(&table, &wrapped(20)).unwrap(), vec![1, 3]);

        let kind = |clause: &str| WhereClause::parse(clause).unwrap_err().kind();
        assert_eq!(kind(&grouped(50_000)), "LogicExprSyntax");
        assert_eq!(kind(&wrapped(50_000)), "LogicExprSyntax");
        assert_eq!(kind(&format!("{}age = 5", "NOT ".repeat(50_000))), "LogicExprSyntax");
        assert_eq!(kind(&vec!["age = 5"; 5_000].join(" OR ")), "LogicExprSyntax");
        assert_eq!(select(&table, &vec!["age = 5"; 100].join(" OR ")).unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_select_is_repeatable() {
        let (_dir, table) = sample();
        let first = select(&table, "age > 2 OR name LIKE 'd.*'").unwrap();
        let second = select(&table, "age > 2 OR name LIKE 'd.*'").unwrap();
        assert_eq!(first, second);
    }
}
