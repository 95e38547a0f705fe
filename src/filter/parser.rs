// src/filter/parser.rs

//! Recursive-descent parser for filter expressions.

use serde_json::Value;

use super::lexer::{Spanned, Token, tokenize};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Top-level field of the record.
    Field(String),
    /// `base.key` or `base[index]`.
    Member(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
}

const KEYWORDS: &[&str] = &[
    "and",
    "or",
    "not",
    "in",
    "contains",
    "startsWith",
    "endsWith",
    "true",
    "false",
    "nil",
    "null",
];

/// Deepest nesting of parentheses, brackets and prefix operators.
const MAX_DEPTH: usize = 64;

/// Longest accepted expression. Operator chains parse iteratively but still
/// build trees that evaluation walks recursively.
const MAX_TOKENS: usize = 512;

pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(AppError::filter(0, "empty expression"));
    }
    if let Some((_, position)) = tokens.get(MAX_TOKENS) {
        return Err(AppError::filter(*position, "expression too long"));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
        depth: 0,
    };
    let expr = parser.parse_or()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn peek_keyword(&self, offset: usize, keyword: &str) -> bool {
        matches!(
            self.tokens.get(self.pos + offset),
            Some((Token::Ident(name), _)) if name == keyword
        )
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.end, |(_, position)| *position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(0, keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(AppError::filter(self.position(), format!("expected {what}")))
        }
    }

    fn unexpected(&self) -> AppError {
        match self.peek() {
            Some(token) => AppError::filter(self.position(), format!("unexpected {token:?}")),
            None => AppError::filter(self.end, "unexpected end of expression"),
        }
    }

    fn nested(&mut self, parse: fn(&mut Self) -> Result<Expr>) -> Result<Expr> {
        if self.depth >= MAX_DEPTH {
            return Err(AppError::filter(self.position(), "expression nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) || self.eat_keyword("or") {
            let right = self.parse_and()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.eat(&Token::And) || self.eat_keyword("and") {
            let right = self.parse_not()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.eat(&Token::Bang) || self.eat_keyword("not") {
            return Ok(Expr::Not(Box::new(self.nested(Self::parse_not)?)));
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> Result<Expr> {
        let left = self.parse_unary()?;

        let op = match self.peek() {
            Some(Token::Eq) => Some(BinaryOp::Eq),
            Some(Token::Ne) => Some(BinaryOp::Ne),
            Some(Token::Lt) => Some(BinaryOp::Lt),
            Some(Token::Le) => Some(BinaryOp::Le),
            Some(Token::Gt) => Some(BinaryOp::Gt),
            Some(Token::Ge) => Some(BinaryOp::Ge),
            Some(Token::Ident(name)) => match name.as_str() {
                "in" => Some(BinaryOp::In),
                "not" if self.peek_keyword(1, "in") => Some(BinaryOp::NotIn),
                "contains" => Some(BinaryOp::Contains),
                "startsWith" => Some(BinaryOp::StartsWith),
                "endsWith" => Some(BinaryOp::EndsWith),
                _ => None,
            },
            _ => None,
        };

        let Some(op) = op else {
            return Ok(left);
        };
        self.pos += if op == BinaryOp::NotIn { 2 } else { 1 };
        let right = self.parse_unary()?;
        Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Neg(Box::new(self.nested(Self::parse_unary)?)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&Token::Dot) {
                let position = self.position();
                let Some(Token::Ident(name)) = self.advance() else {
                    return Err(AppError::filter(position, "expected a field name after '.'"));
                };
                expr = Expr::Member(Box::new(expr), Box::new(Expr::Literal(Value::String(name))));
            } else if self.eat(&Token::LBracket) {
                let index = self.nested(Self::parse_or)?;
                self.expect(&Token::RBracket, "']'")?;
                expr = Expr::Member(Box::new(expr), Box::new(index));
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let position = self.position();
        let Some(token) = self.advance() else {
            return Err(AppError::filter(self.end, "unexpected end of expression"));
        };

        match token {
            Token::Number(number) => Ok(Expr::Literal(Value::Number(number))),
            Token::Str(text) => Ok(Expr::Literal(Value::String(text))),
            Token::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "nil" | "null" => Ok(Expr::Literal(Value::Null)),
                keyword if KEYWORDS.contains(&keyword) => Err(AppError::filter(
                    position,
                    format!("unexpected keyword '{keyword}'"),
                )),
                _ => Ok(Expr::Field(name)),
            },
            Token::LParen => {
                let inner = self.nested(Self::parse_or)?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(AppError::filter(position, format!("unexpected {other:?}"))),
        }
    }
}
