// src/filter/eval.rs

//! Evaluation of parsed filter expressions against a record.

use std::cmp::Ordering;

use serde_json::Value;

use super::parser::{BinaryOp, Expr};
use crate::models::Record;

/// Evaluate `expr` with the record's fields in scope.
///
/// `None` means the expression is ill-typed for this record.
pub fn evaluate(expr: &Expr, record: &Record) -> Option<Value> {
    match expr {
        Expr::Literal(value) => Some(value.clone()),
        Expr::Field(name) => Some(record.get(name).cloned().unwrap_or(Value::Null)),
        Expr::Member(base, key) => member(evaluate(base, record)?, evaluate(key, record)?),
        Expr::Not(inner) => Some(Value::Bool(!as_bool(&evaluate(inner, record)?)?)),
        Expr::Neg(inner) => negate(&evaluate(inner, record)?),
        Expr::Binary(BinaryOp::And, left, right) => {
            if !as_bool(&evaluate(left, record)?)? {
                return Some(Value::Bool(false));
            }
            Some(Value::Bool(as_bool(&evaluate(right, record)?)?))
        }
        Expr::Binary(BinaryOp::Or, left, right) => {
            if as_bool(&evaluate(left, record)?)? {
                return Some(Value::Bool(true));
            }
            Some(Value::Bool(as_bool(&evaluate(right, record)?)?))
        }
        Expr::Binary(op, left, right) => {
            let left = evaluate(left, record)?;
            let right = evaluate(right, record)?;
            compare(*op, &left, &right).map(Value::Bool)
        }
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Option<bool> {
    match op {
        BinaryOp::Eq => Some(equal(left, right)),
        BinaryOp::Ne => Some(!equal(left, right)),
        BinaryOp::Lt => Some(order(left, right)? == Ordering::Less),
        BinaryOp::Le => Some(order(left, right)? != Ordering::Greater),
        BinaryOp::Gt => Some(order(left, right)? == Ordering::Greater),
        BinaryOp::Ge => Some(order(left, right)? != Ordering::Less),
        BinaryOp::In => contains(right, left),
        BinaryOp::NotIn => contains(right, left).map(|found| !found),
        BinaryOp::Contains => contains(left, right),
        BinaryOp::StartsWith => Some(left.as_str()?.starts_with(right.as_str()?)),
        BinaryOp::EndsWith => Some(left.as_str()?.ends_with(right.as_str()?)),
        BinaryOp::And | BinaryOp::Or => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    value.as_bool()
}

fn member(base: Value, key: Value) -> Option<Value> {
    match (base, key) {
        (Value::Object(mut object), Value::String(key)) => {
            Some(object.remove(&key).unwrap_or(Value::Null))
        }
        (Value::Array(mut items), Value::Number(index)) => {
            let index = usize::try_from(index.as_u64()?).ok()?;
            Some(if index < items.len() {
                items.swap_remove(index)
            } else {
                Value::Null
            })
        }
        _ => None,
    }
}

fn negate(value: &Value) -> Option<Value> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(int) = number.as_i64() {
        return Some(Value::from(int.checked_neg()?));
    }
    serde_json::Number::from_f64(-number.as_f64()?).map(Value::Number)
}

/// Equality with numbers compared by value, so `1 == 1.0`.
fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Membership: key of an object, element of an array, substring of a string.
fn contains(container: &Value, item: &Value) -> Option<bool> {
    match container {
        Value::Object(object) => Some(object.contains_key(item.as_str()?)),
        Value::Array(items) => Some(items.iter().any(|element| equal(element, item))),
        Value::String(text) => Some(text.contains(item.as_str()?)),
        _ => None,
    }
}
