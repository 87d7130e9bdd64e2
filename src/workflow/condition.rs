// ABOUTME: Small condition language for declarative task predicates
// ABOUTME: Parses `<task>.<path> <op> <literal>` and evaluates it against a context snapshot

use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::error::{Result, WorkflowError};
use crate::engine::{ContextSnapshot, Predicate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

// Two-character operators first so `>=` is not read as `>`
const OPERATORS: [(&str, CompareOp); 6] = [
    (">=", CompareOp::Ge),
    ("<=", CompareOp::Le),
    ("==", CompareOp::Eq),
    ("!=", CompareOp::Ne),
    (">", CompareOp::Gt),
    ("<", CompareOp::Lt),
];

/// A test on one value in a completed task's outputs. Without an operator
/// the value is tested for truthiness.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub task_id: String,
    pub path: String,
    pub comparison: Option<(CompareOp, Value)>,
}

impl Condition {
    pub fn parse(expression: &str) -> Result<Self> {
        let invalid = |reason: &str| WorkflowError::InvalidCondition {
            expression: expression.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(invalid("expression is empty"));
        }

        let (lhs, comparison) = match find_operator(trimmed) {
            Some((index, symbol, op)) => {
                let rhs = trimmed[index + symbol.len()..].trim();
                if rhs.is_empty() {
                    return Err(invalid("missing value after operator"));
                }
                (trimmed[..index].trim(), Some((op, parse_literal(rhs))))
            }
            None => (trimmed, None),
        };

        let (task_id, path) = lhs
            .split_once('.')
            .ok_or_else(|| invalid("left side must look like <task>.<output>"))?;
        if task_id.is_empty() || path.is_empty() {
            return Err(invalid("left side must look like <task>.<output>"));
        }
        if lhs.contains(char::is_whitespace) {
            return Err(invalid("left side must not contain whitespace"));
        }

        Ok(Self {
            task_id: task_id.to_string(),
            path: path.to_string(),
            comparison,
        })
    }

    pub fn evaluate(&self, snapshot: &ContextSnapshot) -> bool {
        let Some(actual) = snapshot.lookup(&self.task_id, &self.path) else {
            return false;
        };

        match &self.comparison {
            None => is_truthy(actual),
            Some((op, expected)) => match op {
                CompareOp::Eq => values_equal(actual, expected),
                CompareOp::Ne => !values_equal(actual, expected),
                CompareOp::Gt => compare(actual, expected) == Some(Ordering::Greater),
                CompareOp::Ge => matches!(
                    compare(actual, expected),
                    Some(Ordering::Greater | Ordering::Equal)
                ),
                CompareOp::Lt => compare(actual, expected) == Some(Ordering::Less),
                CompareOp::Le => matches!(
                    compare(actual, expected),
                    Some(Ordering::Less | Ordering::Equal)
                ),
            },
        }
    }

    pub fn into_predicate(self) -> Predicate {
        Arc::new(move |snapshot: &ContextSnapshot| self.evaluate(snapshot))
    }
}

fn find_operator(expression: &str) -> Option<(usize, &'static str, CompareOp)> {
    for (index, _) in expression.char_indices() {
        let rest = &expression[index..];
        for (symbol, op) in OPERATORS {
            if rest.starts_with(symbol) {
                return Some((index, symbol, op));
            }
        }
    }
    None
}

/// JSON literals parse as such; anything else (optionally single-quoted) is a string
fn parse_literal(raw: &str) -> Value {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return value;
    }
    let unquoted = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(raw);
    Value::String(unquoted.to_string())
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

impl FromStr for Condition {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = OPERATORS
            .iter()
            .find(|(_, op)| op == self)
            .map(|(symbol, _)| *symbol)
            .unwrap_or("?");
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.comparison {
            Some((op, value)) => write!(f, "{}.{} {} {}", self.task_id, self.path, op, value),
            None => write!(f, "{}.{}", self.task_id, self.path),
        }
    }
}
