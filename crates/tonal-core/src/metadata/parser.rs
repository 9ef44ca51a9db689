//! Recursive-descent parser for the restricted SQL dialect (spec.md §4.7).
//!
//! `AND` binds tighter than `OR`: the precedence climb is `parse_or` ->
//! `parse_and` -> `parse_atom`, the usual shape for a hand-written
//! expression parser and the one the Python reference's grammar encodes
//! via Lark's rule ordering.

use crate::error::{IndexError, Result};

use super::ast::{ColumnList, CompareOp, Condition, LogicalOp, Select, Value};
use super::lexer::{tokenize, Token};

const DEFAULT_TABLE: &str = "metadata";

pub fn parse_query(input: &str) -> Result<Select> {
    let trimmed = input.trim();
    let is_short_form = !trimmed.to_uppercase().starts_with("SELECT");

    let full = if is_short_form {
        format!("SELECT * FROM {DEFAULT_TABLE} WHERE {trimmed}")
    } else {
        trimmed.to_string()
    };

    let tokens = tokenize(&full)?;
    let mut parser = Parser { tokens, pos: 0 };
    let select = parser.parse_select()?;
    if parser.pos < parser.tokens.len() && parser.tokens[parser.pos] != Token::Semicolon {
        return Err(IndexError::invalid_query("unexpected trailing input"));
    }
    Ok(select)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expect_ident(&mut self, expected: &str) -> Result<()> {
        match self.advance() {
            Some(Token::Ident(s)) if s.eq_ignore_ascii_case(expected) => Ok(()),
            other => Err(IndexError::invalid_query(format!(
                "expected {expected:?}, found {other:?}"
            ))),
        }
    }

    fn ident(&mut self) -> Result<String> {
        match self.advance() {
            Some(Token::Ident(s)) => Ok(s),
            other => Err(IndexError::invalid_query(format!("expected identifier, found {other:?}"))),
        }
    }

    fn parse_select(&mut self) -> Result<Select> {
        self.expect_ident("SELECT")?;
        let columns = self.parse_column_list()?;
        self.expect_ident("FROM")?;
        let table = self.ident()?;

        let condition = if let Some(Token::Ident(kw)) = self.peek() {
            if kw.eq_ignore_ascii_case("WHERE") {
                self.advance();
                Some(self.parse_or()?)
            } else {
                None
            }
        } else {
            None
        };

        if self.peek() == Some(&Token::Semicolon) {
            self.advance();
        }

        Ok(Select { columns, table, condition })
    }

    fn parse_column_list(&mut self) -> Result<ColumnList> {
        if self.peek() == Some(&Token::Star) {
            self.advance();
            return Ok(ColumnList::Star);
        }

        let mut columns = vec![self.ident()?];
        while self.peek() == Some(&Token::Comma) {
            self.advance();
            columns.push(self.ident()?);
        }
        Ok(ColumnList::Named(columns))
    }

    fn parse_or(&mut self) -> Result<Condition> {
        let mut left = self.parse_and()?;
        while let Some(Token::Ident(kw)) = self.peek() {
            if kw.eq_ignore_ascii_case("OR") {
                self.advance();
                let right = self.parse_and()?;
                left = Condition::Logical { op: LogicalOp::Or, left: Box::new(left), right: Box::new(right) };
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Condition> {
        let mut left = self.parse_atom()?;
        while let Some(Token::Ident(kw)) = self.peek() {
            if kw.eq_ignore_ascii_case("AND") {
                self.advance();
                let right = self.parse_atom()?;
                left = Condition::Logical { op: LogicalOp::And, left: Box::new(left), right: Box::new(right) };
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_atom(&mut self) -> Result<Condition> {
        if self.peek() == Some(&Token::LParen) {
            self.advance();
            let inner = self.parse_or()?;
            match self.advance() {
                Some(Token::RParen) => Ok(inner),
                other => Err(IndexError::invalid_query(format!("expected ')', found {other:?}"))),
            }
        } else {
            self.parse_comparison_or_between()
        }
    }

    fn parse_comparison_or_between(&mut self) -> Result<Condition> {
        let column = self.ident()?;

        if let Some(Token::Ident(kw)) = self.peek() {
            if kw.eq_ignore_ascii_case("BETWEEN") {
                self.advance();
                let low = self.parse_value()?;
                self.expect_ident("AND")?;
                let high = self.parse_value()?;
                return Ok(Condition::Between { column, low, high });
            }
        }

        let op = match self.advance() {
            Some(Token::Op(op)) => parse_op(&op)?,
            other => Err(IndexError::invalid_query(format!("expected comparison operator, found {other:?}")))?,
        };
        let value = self.parse_value()?;
        Ok(Condition::Compare { column, op, value })
    }

    fn parse_value(&mut self) -> Result<Value> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Value::Number(n)),
            Some(Token::String(s)) => Ok(Value::Text(s)),
            other => Err(IndexError::invalid_query(format!("expected a value, found {other:?}"))),
        }
    }
}

fn parse_op(op: &str) -> Result<CompareOp> {
    match op {
        "=" => Ok(CompareOp::Eq),
        "!=" => Ok(CompareOp::Ne),
        "<" => Ok(CompareOp::Lt),
        "<=" => Ok(CompareOp::Le),
        ">" => Ok(CompareOp::Gt),
        ">=" => Ok(CompareOp::Ge),
        other => Err(IndexError::invalid_query(format!("unsupported operator {other:?}"))),
    }
}
