// src/filter/mod.rs

//! Boolean filter expressions over repository records.
//!
//! Supported syntax, loosest binding first:
//!
//! ```text
//! a || b        a or b
//! a && b        a and b
//! !a            not a
//! ==  !=  <  <=  >  >=
//! x in y        x not in y        (object key, array element, substring)
//! s contains t  s startsWith t    s endsWith t
//! -n
//! field  field.key  field["key"]  list[0]  (expr)
//! "text"  'text'  42  2.5  true  false  nil
//! ```
//!
//! A record matches only when the expression evaluates to `true`; type
//! mismatches make it evaluate to nothing, which counts as no match.
//! Expressions nested more than 64 levels deep or longer than 512 tokens are
//! rejected by the parser.

mod eval;
mod lexer;
mod parser;

use crate::error::Result;
use crate::models::Record;

use self::parser::Expr;

/// A compiled filter expression.
#[derive(Debug, Clone)]
pub struct Predicate {
    expr: Expr,
}

impl Predicate {
    /// Compile `source`, reporting the byte offset of the first syntax error.
    pub fn parse(source: &str) -> Result<Self> {
        Ok(Self {
            expr: parser::parse(source)?,
        })
    }

    /// Whether `record` satisfies the expression.
    pub fn matches(&self, record: &Record) -> bool {
        matches!(
            eval::evaluate(&self.expr, record),
            Some(serde_json::Value::Bool(true))
        )
    }
}
