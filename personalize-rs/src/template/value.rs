//! Runtime value type for condition evaluation and substitution.
//!
//! Recipient data is loosely typed: a login count may arrive as a number or
//! as a numeric string, a flag may be compared against `'true'` or `1`.  Every
//! coercion lives here, as a method on [`Value`], so each operator in
//! [`condition`](super::condition) dispatches to exactly one rule.

use std::fmt;

/// A flattened-context value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The key is not present in the context.
    #[default]
    Absent,
    Bool(bool),
    Num(f64),
    Str(String),
    /// Ordered string sequence (recipient tags).
    List(Vec<String>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(x) => write!(f, "{}", format_number(*x)),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

impl Value {
    /// Returns `true` for [`Value::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
        }
    }

    /// Coerce to boolean: absent, `false`, `0`, NaN, `""` and `[]` are falsy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Absent => false,
            Value::Bool(b) => *b,
            Value::Num(x) => *x != 0.0 && !x.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }

    /// Coerce to `f64`.  NaN is the failure value; every ordering comparison
    /// against it is false.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Absent => f64::NAN,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Num(x) => *x,
            Value::Str(s) => str_to_number(s),
            Value::List(items) => match items.as_slice() {
                [] => 0.0,
                [only] => str_to_number(only),
                _ => f64::NAN,
            },
        }
    }

    /// Loose equality.
    ///
    /// Absent equals only absent.  Booleans compare as `1`/`0`, a number
    /// against a string compares numerically, and a list compares as its
    /// comma-joined string.  Two lists are never equal.
    pub fn loose_eq(&self, rhs: &Value) -> bool {
        match (self, rhs) {
            (Value::Absent, Value::Absent) => true,
            (Value::Absent, _) | (_, Value::Absent) => false,

            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(_), Value::List(_)) => false,

            (Value::Bool(_), other) => Value::Num(self.to_number()).loose_eq(other),
            (other, Value::Bool(_)) => other.loose_eq(&Value::Num(rhs.to_number())),

            (Value::Num(n), Value::Str(s)) | (Value::Str(s), Value::Num(n)) => {
                *n == str_to_number(s)
            }

            (Value::List(items), other) => Value::Str(items.join(",")).loose_eq(other),
            (other, Value::List(items)) => other.loose_eq(&Value::Str(items.join(","))),
        }
    }

    /// Membership / substring test behind `includes`.
    ///
    /// Returns `None` when `self` is neither a list nor a string.  List
    /// membership is exact and only a string needle can match; string
    /// containment uses the needle's display form.
    pub fn includes(&self, needle: &Value) -> Option<bool> {
        match self {
            Value::List(items) => Some(match needle {
                Value::Str(s) => items.iter().any(|item| item == s),
                _ => false,
            }),
            Value::Str(s) => Some(s.contains(needle.to_string().as_str())),
            _ => None,
        }
    }
}

/// Recognise a numeric literal.
///
/// Accepts decimal and exponent forms (`42`, `-3.5`, `.5`, `1e3`), `0x` hex
/// and `Infinity`.  Rejects the words Rust's own float parser tolerates
/// (`inf`, `nan`) as well as the empty string.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let (sign, body) = match s.as_bytes()[0] {
        b'-' => (-1.0, &s[1..]),
        b'+' => (1.0, &s[1..]),
        _ => (1.0, s),
    };
    if body == "Infinity" {
        return Some(sign * f64::INFINITY);
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        // Signed hex is not a number literal.
        return u64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    let numeric = body
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !numeric || !body.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn str_to_number(s: &str) -> f64 {
    if s.trim().is_empty() {
        return 0.0;
    }
    parse_number(s).unwrap_or(f64::NAN)
}

fn format_number(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_owned()
    } else if x.is_infinite() {
        if x > 0.0 { "Infinity" } else { "-Infinity" }.to_owned()
    } else if x.fract() == 0.0 && x.abs() < 1e21 {
        format!("{}", x as i128)
    } else {
        format!("{x}")
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Num(n as f64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Num(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
