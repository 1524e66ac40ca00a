//! Condition expressions: `<key> <operator> <literal>`.
//!
//! ```text
//! role == 'host'
//! login_count < 5
//! tags includes "vip"
//! is_subscribed
//! ```
//!
//! The left side names a flattened-context key, the right side is a literal.
//! A lone key is a truthiness test.  Parsing and evaluation return
//! [`ConditionError`] internally; [`evaluate`] maps every error to `false`,
//! so a malformed condition hides its block instead of failing the render.

use std::fmt;

use thiserror::Error;

use super::value::{parse_number, Value};
use crate::context::FlatContext;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why a condition could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("empty condition")]
    Empty,
    #[error("no operator in condition `{0}`")]
    NoOperator(String),
    #[error("condition `{expr}` does not split into two operands around `{op}`")]
    Split { expr: String, op: Operator },
}

// ── Operators ─────────────────────────────────────────────────────────────────

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
    NotIncludes,
    Includes,
}

impl Operator {
    /// Search order.  The first operator found in the expression wins, so
    /// compound operators precede their prefixes (`>=` before `>`).
    pub const SEARCH_ORDER: [Operator; 8] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Ge,
        Operator::Le,
        Operator::Gt,
        Operator::Lt,
        Operator::NotIncludes,
        Operator::Includes,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::NotIncludes => "not includes",
            Operator::Includes => "includes",
        }
    }

    fn is_word(self) -> bool {
        matches!(self, Operator::NotIncludes | Operator::Includes)
    }

    /// Split `expr` around every occurrence of this operator.  Word operators
    /// only match when surrounded by whitespace.  `None` if absent.
    fn split(self, expr: &str) -> Option<Vec<&str>> {
        let sym = self.symbol();
        let mut parts = Vec::new();
        let mut rest = expr;
        let mut found = false;
        while let Some(at) = find_operator(rest, sym, self.is_word()) {
            found = true;
            parts.push(&rest[..at]);
            rest = &rest[at + sym.len()..];
        }
        if !found {
            return None;
        }
        parts.push(rest);
        Some(parts)
    }

    /// Apply the operator to resolved operands.
    pub fn apply(self, left: &Value, right: &Value) -> bool {
        match self {
            Operator::Eq => left.loose_eq(right),
            Operator::Ne => !left.loose_eq(right),
            Operator::Gt => left.to_number() > right.to_number(),
            Operator::Lt => left.to_number() < right.to_number(),
            Operator::Ge => left.to_number() >= right.to_number(),
            Operator::Le => left.to_number() <= right.to_number(),
            Operator::Includes => left.includes(right).unwrap_or(false),
            Operator::NotIncludes => left.includes(right).map_or(true, |hit| !hit),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

fn find_operator(haystack: &str, sym: &str, word: bool) -> Option<usize> {
    if !word {
        return haystack.find(sym);
    }
    let mut from = 0;
    while let Some(rel) = haystack[from..].find(sym) {
        let at = from + rel;
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + sym.len()..].chars().next();
        if before.is_some_and(char::is_whitespace) && after.is_some_and(char::is_whitespace) {
            return Some(at);
        }
        from = at + sym.len();
    }
    None
}

// ── Parsed condition ──────────────────────────────────────────────────────────

/// Right-hand literal.
pub fn parse_operand(raw: &str) -> Value {
    let raw = raw.trim();
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Value::Str(raw[1..raw.len() - 1].to_owned());
        }
    }
    if let Some(n) = parse_number(raw) {
        return Value::Num(n);
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::Str(raw.to_owned()),
    }
}

/// A parsed condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `key`
    Truthy(String),
    /// `key <op> literal`
    Compare { key: String, op: Operator, literal: Value },
}

impl Condition {
    pub fn parse(expr: &str) -> Result<Self, ConditionError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(ConditionError::Empty);
        }

        for op in Operator::SEARCH_ORDER {
            let Some(parts) = op.split(expr) else { continue };
            let split_err = || ConditionError::Split {
                expr: expr.to_owned(),
                op,
            };
            let [left, right] = parts.as_slice() else {
                return Err(split_err());
            };
            let (left, right) = (left.trim(), right.trim());
            if left.is_empty() || right.is_empty() {
                return Err(split_err());
            }
            return Ok(Condition::Compare {
                key: left.to_owned(),
                op,
                literal: parse_operand(right),
            });
        }

        if is_identifier(expr) {
            Ok(Condition::Truthy(expr.to_owned()))
        } else {
            Err(ConditionError::NoOperator(expr.to_owned()))
        }
    }

    /// The context key this condition reads.
    pub fn key(&self) -> &str {
        match self {
            Condition::Truthy(key) | Condition::Compare { key, .. } => key,
        }
    }

    pub fn eval(&self, ctx: &FlatContext) -> bool {
        match self {
            Condition::Truthy(key) => ctx.lookup(key).truthy(),
            Condition::Compare { key, op, literal } => op.apply(&ctx.lookup(key), literal),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

// ── Evaluation ────────────────────────────────────────────────────────────────

/// Parse and evaluate `expr`, reporting malformed input as an error.
pub fn try_evaluate(expr: &str, ctx: &FlatContext) -> Result<bool, ConditionError> {
    Condition::parse(expr).map(|cond| cond.eval(ctx))
}

/// Parse and evaluate `expr`.  Malformed conditions evaluate to `false`.
pub fn evaluate(expr: &str, ctx: &FlatContext) -> bool {
    match try_evaluate(expr, ctx) {
        Ok(hit) => hit,
        Err(e) => {
            tracing::debug!(error = %e, "condition failed closed");
            false
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
