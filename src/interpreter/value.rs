//=====================================================
// File: interpreter/value.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: PlainTalk runtime values
// Objective: Dynamic value union plus the display, truthiness, arithmetic,
//            comparison and member-access rules the interpreter applies
//=====================================================

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::errors::RuntimeError;
use crate::ast::{BinaryOp, Literal};

/// Represents runtime values in PlainTalk
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
    #[default]
    Absent,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::List(_) => "list",
            Value::Record(_) => "record",
            Value::Absent => "null",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Absent => false,
            Value::Boolean(flag) => *flag,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(_) | Value::Record(_) => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text typed at an `ask` prompt becomes a number when it reads as one.
    pub fn from_input(text: String) -> Value {
        let trimmed = text.trim();
        match trimmed.parse::<f64>() {
            Ok(number) if !trimmed.is_empty() && number.is_finite() => Value::Number(number),
            _ => Value::String(text),
        }
    }

    /// Loose numeric reading used when ordering mixed operands.
    fn ordering_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Boolean(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Some(0.0)
                } else {
                    trimmed.parse::<f64>().ok()
                }
            }
            _ => None,
        }
    }

    fn partial_order(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => {
                let a = self.ordering_number()?;
                let b = other.ordering_number()?;
                a.partial_cmp(&b)
            }
        }
    }

    //Function: member
    //Purpose: Read `object.property` / `object[index]`
    //Inputs: &self (object), property value
    //Returns: Result<Value, RuntimeError>; missing members are Absent
    pub fn member(&self, property: &Value) -> Result<Value, RuntimeError> {
        if let Value::String(name) = property {
            if name == "length" {
                match self {
                    Value::List(items) => return Ok(Value::Number(items.len() as f64)),
                    Value::String(text) => {
                        return Ok(Value::Number(text.chars().count() as f64));
                    }
                    _ => {}
                }
            }
        }

        match (self, property) {
            (Value::Absent, _) => Err(RuntimeError::NullAccess),
            (Value::List(items), Value::Number(index)) => Ok(index_of(*index)
                .and_then(|i| items.get(i).cloned())
                .unwrap_or_default()),
            (Value::String(text), Value::Number(index)) => Ok(index_of(*index)
                .and_then(|i| text.chars().nth(i))
                .map(|c| Value::String(c.to_string()))
                .unwrap_or_default()),
            (Value::Record(fields), key) => Ok(fields.get(&key.to_string()).cloned().unwrap_or_default()),
            _ => Ok(Value::Absent),
        }
    }
}

fn index_of(index: f64) -> Option<usize> {
    if index >= 0.0 && index.fract() == 0.0 && index <= usize::MAX as f64 {
        Some(index as usize)
    } else {
        None
    }
}

fn format_number(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let label = if n > 0.0 { "Infinity" } else { "-Infinity" };
        label.to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        exponent_form(n)
    } else {
        format!("{}", n)
    }
}

/// `1e21` -> `1e+21`, `2.5e-8` -> `2.5e-8`
fn exponent_form(n: f64) -> String {
    let text = format!("{:e}", n);
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => text,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                f.write_str(&parts.join(", "))
            }
            Value::Record(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Value::Absent => f.write_str("null"),
        }
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Boolean(b) => Value::Boolean(*b),
        }
    }
}

//=============================================
//            Binary operators
//=============================================

fn numeric_operands(left: &Value, right: &Value) -> Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::TypeError(
            "Cannot perform arithmetic on non-numeric values".to_string(),
        )),
    }
}

/// Applies every non-short-circuit binary operator.
pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(format!("{}{}", left, right)))
            }
            _ => numeric_operands(left, right).map(|(a, b)| Value::Number(a + b)),
        },
        BinaryOp::Subtract => numeric_operands(left, right).map(|(a, b)| Value::Number(a - b)),
        BinaryOp::Multiply => numeric_operands(left, right).map(|(a, b)| Value::Number(a * b)),
        BinaryOp::Divide => {
            let (a, b) = numeric_operands(left, right)?;
            if b == 0.0 {
                Err(RuntimeError::DivisionByZero)
            } else {
                Ok(Value::Number(a / b))
            }
        }
        BinaryOp::Equal => Ok(Value::Boolean(left == right)),
        BinaryOp::NotEqual => Ok(Value::Boolean(left != right)),
        BinaryOp::Greater => Ok(Value::Boolean(matches!(
            left.partial_order(right),
            Some(Ordering::Greater)
        ))),
        BinaryOp::GreaterEqual => Ok(Value::Boolean(matches!(
            left.partial_order(right),
            Some(Ordering::Greater | Ordering::Equal)
        ))),
        BinaryOp::Less => Ok(Value::Boolean(matches!(
            left.partial_order(right),
            Some(Ordering::Less)
        ))),
        BinaryOp::LessEqual => Ok(Value::Boolean(matches!(
            left.partial_order(right),
            Some(Ordering::Less | Ordering::Equal)
        ))),
        // Short-circuit operators are resolved by the interpreter before operands are paired
        BinaryOp::And => Ok(if left.is_truthy() { right.clone() } else { left.clone() }),
        BinaryOp::Or => Ok(if left.is_truthy() { left.clone() } else { right.clone() }),
    }
}
