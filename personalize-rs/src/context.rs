//! Recipient data and the flattened context built from it.
//!
//! A [`Recipient`] is the structured record a delivery pipeline hands to the
//! engine.  [`flatten`] turns it into a [`FlatContext`]: a single-level map
//! from token name to [`Value`] shared by condition evaluation and variable
//! substitution.
//!
//! ## Key precedence
//!
//! Entries are inserted in three layers, later layers overwriting earlier
//! ones on collision:
//!
//! 1. reserved recipient fields under their own names (`role`, `tags`, …)
//! 2. derived `user_*` tokens (`user_first_name`, `user_full_name`, …)
//! 3. every key of `custom_properties`
//!
//! Custom properties therefore override the built-in values.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::template::value::Value;

/// Prefix accepted by [`FlatContext::lookup`] to address the custom bag
/// explicitly.
pub const CUSTOM_PREFIX: &str = "custom_properties.";

// ── Recipient ─────────────────────────────────────────────────────────────────

/// Error returned when a recipient record cannot be loaded.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid recipient JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// An operator-defined custom property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomValue {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<serde_json::Value>),
    /// Nested objects are accepted on input but never flattened.
    Object(serde_json::Map<String, serde_json::Value>),
}

impl CustomValue {
    /// Convert to a context value.  `None` for null and objects.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            CustomValue::Null | CustomValue::Object(_) => None,
            CustomValue::Bool(b) => Some(Value::Bool(*b)),
            CustomValue::Num(x) => Some(Value::Num(*x)),
            CustomValue::Str(s) => Some(Value::Str(s.clone())),
            CustomValue::List(items) => Some(Value::List(
                items
                    .iter()
                    .filter_map(|item| match item {
                        serde_json::Value::Null => None,
                        serde_json::Value::String(s) => Some(s.clone()),
                        other => Some(other.to_string()),
                    })
                    .collect(),
            )),
        }
    }
}

impl From<&str> for CustomValue {
    fn from(s: &str) -> Self {
        CustomValue::Str(s.to_owned())
    }
}

impl From<String> for CustomValue {
    fn from(s: String) -> Self {
        CustomValue::Str(s)
    }
}

impl From<bool> for CustomValue {
    fn from(b: bool) -> Self {
        CustomValue::Bool(b)
    }
}

impl From<f64> for CustomValue {
    fn from(x: f64) -> Self {
        CustomValue::Num(x)
    }
}

impl From<i64> for CustomValue {
    fn from(n: i64) -> Self {
        CustomValue::Num(n as f64)
    }
}

/// Per-recipient data supplied by the caller.
///
/// `id` and `email` are required when deserializing; everything else may be
/// omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub signup_source: Option<String>,
    pub segment: Option<String>,
    pub tags: Option<Vec<String>>,
    pub login_count: Option<i64>,
    /// Last login, as the timestamp string the account store provides.
    pub last_login_at: Option<String>,
    pub account_status: Option<String>,
    pub is_subscribed: Option<bool>,
    #[serde(default)]
    pub custom_properties: BTreeMap<String, CustomValue>,
}

impl Recipient {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            first_name: None,
            last_name: None,
            company_name: None,
            location: None,
            role: None,
            phone: None,
            signup_source: None,
            segment: None,
            tags: None,
            login_count: None,
            last_login_at: None,
            account_status: None,
            is_subscribed: None,
            custom_properties: BTreeMap::new(),
        }
    }

    pub fn with_first_name(mut self, v: impl Into<String>) -> Self {
        self.first_name = Some(v.into());
        self
    }

    pub fn with_last_name(mut self, v: impl Into<String>) -> Self {
        self.last_name = Some(v.into());
        self
    }

    pub fn with_company_name(mut self, v: impl Into<String>) -> Self {
        self.company_name = Some(v.into());
        self
    }

    pub fn with_location(mut self, v: impl Into<String>) -> Self {
        self.location = Some(v.into());
        self
    }

    pub fn with_role(mut self, v: impl Into<String>) -> Self {
        self.role = Some(v.into());
        self
    }

    pub fn with_phone(mut self, v: impl Into<String>) -> Self {
        self.phone = Some(v.into());
        self
    }

    pub fn with_signup_source(mut self, v: impl Into<String>) -> Self {
        self.signup_source = Some(v.into());
        self
    }

    pub fn with_segment(mut self, v: impl Into<String>) -> Self {
        self.segment = Some(v.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_login_count(mut self, n: i64) -> Self {
        self.login_count = Some(n);
        self
    }

    pub fn with_last_login_at(mut self, v: impl Into<String>) -> Self {
        self.last_login_at = Some(v.into());
        self
    }

    pub fn with_account_status(mut self, v: impl Into<String>) -> Self {
        self.account_status = Some(v.into());
        self
    }

    pub fn with_subscribed(mut self, b: bool) -> Self {
        self.is_subscribed = Some(b);
        self
    }

    /// Add (or replace) one custom property.
    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<CustomValue>) -> Self {
        self.custom_properties.insert(key.into(), value.into());
        self
    }

    /// Parse a recipient from a JSON object.
    pub fn from_json_str(s: &str) -> Result<Self, ContextError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read and parse a recipient JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ContextError> {
        let text = std::fs::read_to_string(path).map_err(|source| ContextError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

// ── FlatContext ───────────────────────────────────────────────────────────────

/// Single-level token map built by [`flatten`].
///
/// Never mutated after construction.  A key that is missing is distinct from
/// a key present with an empty value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatContext {
    entries: BTreeMap<String, Value>,
    custom: BTreeMap<String, Value>,
}

impl FlatContext {
    /// Value stored under exactly `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Resolve a condition operand.
    ///
    /// Tries the flat map first, then `custom_properties.<key>` against the
    /// custom bag.  Returns [`Value::Absent`] when neither matches.
    pub fn lookup(&self, key: &str) -> Value {
        if let Some(v) = self.entries.get(key) {
            return v.clone();
        }
        key.strip_prefix(CUSTOM_PREFIX)
            .and_then(|k| self.custom.get(k))
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: &str, value: Option<Value>) {
        if let Some(v) = value {
            self.entries.insert(key.to_owned(), v);
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for FlatContext {
    /// Build a context directly; entries whose value is [`Value::Absent`] are
    /// skipped.
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .filter(|(_, v)| !v.is_absent())
            .collect();
        FlatContext {
            entries,
            custom: BTreeMap::new(),
        }
    }
}

/// Build the flat token map for `recipient`.
pub fn flatten(recipient: &Recipient) -> FlatContext {
    let mut ctx = FlatContext::default();
    let text = |v: &Option<String>| v.clone().map(Value::Str);

    // Reserved fields, addressable by their own names in conditions.
    ctx.insert("id", Some(Value::Str(recipient.id.clone())));
    ctx.insert("email", Some(Value::Str(recipient.email.clone())));
    ctx.insert("first_name", text(&recipient.first_name));
    ctx.insert("last_name", text(&recipient.last_name));
    ctx.insert("company_name", text(&recipient.company_name));
    ctx.insert("location", text(&recipient.location));
    ctx.insert("role", text(&recipient.role));
    ctx.insert("phone", text(&recipient.phone));
    ctx.insert("signup_source", text(&recipient.signup_source));
    ctx.insert("segment", text(&recipient.segment));
    ctx.insert("tags", recipient.tags.clone().map(Value::List));
    ctx.insert("login_count", recipient.login_count.map(Value::from));
    ctx.insert("last_login_at", text(&recipient.last_login_at));
    ctx.insert("account_status", text(&recipient.account_status));
    ctx.insert("is_subscribed", recipient.is_subscribed.map(Value::Bool));

    // Derived tokens.
    ctx.insert("user_id", Some(Value::Str(recipient.id.clone())));
    ctx.insert("user_email", Some(Value::Str(recipient.email.clone())));
    ctx.insert("user_first_name", text(&recipient.first_name));
    ctx.insert("user_last_name", text(&recipient.last_name));
    ctx.insert("user_full_name", full_name(recipient).map(Value::Str));
    ctx.insert("user_phone", text(&recipient.phone));
    ctx.insert("user_location", text(&recipient.location));
    ctx.insert("user_role", text(&recipient.role));
    ctx.insert("user_company", text(&recipient.company_name));

    for (key, raw) in &recipient.custom_properties {
        let Some(value) = raw.to_value() else {
            tracing::debug!(key = %key, "dropping null or object custom property");
            continue;
        };
        if let Some(previous) = ctx.entries.get(key) {
            tracing::trace!(key = %key, previous = %previous, "custom property overrides built-in token");
        }
        ctx.entries.insert(key.clone(), value.clone());
        ctx.custom.insert(key.clone(), value);
    }

    ctx
}

fn full_name(recipient: &Recipient) -> Option<String> {
    let first = recipient.first_name.as_deref().unwrap_or("");
    let last = recipient.last_name.as_deref().unwrap_or("");
    let joined = format!("{first} {last}");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> Recipient {
        Recipient::new("u-1", "ana@example.com")
            .with_first_name("Ana")
            .with_last_name("Silva")
            .with_role("host")
            .with_tags(["vip", "early"])
            .with_login_count(3)
            .with_subscribed(false)
    }

    #[test]
    fn reserved_fields_under_own_names() {
        let ctx = flatten(&ana());
        assert_eq!(ctx.get("role"), Some(&Value::Str("host".into())));
        assert_eq!(ctx.get("login_count"), Some(&Value::Num(3.0)));
        assert_eq!(ctx.get("is_subscribed"), Some(&Value::Bool(false)));
        assert_eq!(
            ctx.get("tags"),
            Some(&Value::List(vec!["vip".into(), "early".into()]))
        );
    }

    #[test]
    fn derived_tokens() {
        let ctx = flatten(&ana());
        assert_eq!(ctx.get("user_first_name"), Some(&Value::Str("Ana".into())));
        assert_eq!(ctx.get("user_full_name"), Some(&Value::Str("Ana Silva".into())));
        assert_eq!(ctx.get("user_email"), Some(&Value::Str("ana@example.com".into())));
        assert_eq!(ctx.get("tags").map(ToString::to_string).as_deref(), Some("vip, early"));
    }

    #[test]
    fn full_name_trims_missing_half() {
        let ctx = flatten(&Recipient::new("u", "e").with_last_name("Silva"));
        assert_eq!(ctx.get("user_full_name"), Some(&Value::Str("Silva".into())));
        let ctx = flatten(&Recipient::new("u", "e"));
        assert!(ctx.get("user_full_name").is_none());
    }

    #[test]
    fn absent_fields_are_absent_not_empty() {
        let ctx = flatten(&Recipient::new("u", "e"));
        assert!(!ctx.contains_key("role"));
        assert!(!ctx.contains_key("tags"));
        assert_eq!(ctx.lookup("role"), Value::Absent);

        let ctx = flatten(&Recipient::new("u", "e").with_role(""));
        assert_eq!(ctx.get("role"), Some(&Value::Str(String::new())));
    }

    #[test]
    fn custom_properties_override_builtins() {
        let r = ana().with_custom("role", "guest").with_custom("plan", "pro");
        let ctx = flatten(&r);
        assert_eq!(ctx.get("role"), Some(&Value::Str("guest".into())));
        assert_eq!(ctx.get("plan"), Some(&Value::Str("pro".into())));
        assert_eq!(ctx.lookup("custom_properties.plan"), Value::Str("pro".into()));
    }

    #[test]
    fn null_and_object_customs_dropped() {
        let r = Recipient::from_json_str(
            r#"{"id":"u","email":"e","custom_properties":{"a":null,"b":{"x":1},"c":[1,"two",null]}}"#,
        )
        .unwrap();
        let ctx = flatten(&r);
        assert!(!ctx.contains_key("a"));
        assert!(!ctx.contains_key("b"));
        assert_eq!(ctx.get("c"), Some(&Value::List(vec!["1".into(), "two".into()])));
    }

    #[test]
    fn json_round_trip_of_fields() {
        let r = Recipient::from_json_str(
            r#"{"id":"u-9","email":"bo@example.com","first_name":"Bo","tags":["a"],
                "login_count":12,"is_subscribed":true,"custom_properties":{"score":9.5}}"#,
        )
        .unwrap();
        assert_eq!(r.first_name.as_deref(), Some("Bo"));
        assert_eq!(r.login_count, Some(12));
        assert_eq!(r.custom_properties.get("score"), Some(&CustomValue::Num(9.5)));
    }

    #[test]
    fn invalid_json_is_error() {
        assert!(matches!(
            Recipient::from_json_str("{not json"),
            Err(ContextError::Json(_))
        ));
    }

    #[test]
    fn id_and_email_required() {
        assert!(matches!(
            Recipient::from_json_str("{}"),
            Err(ContextError::Json(_))
        ));
        assert!(matches!(
            Recipient::from_json_str(r#"{"id": "u-1"}"#),
            Err(ContextError::Json(_))
        ));
        let r = Recipient::from_json_str(r#"{"id": "u-1", "email": "a@example.com"}"#).unwrap();
        assert_eq!(r, Recipient::new("u-1", "a@example.com"));
    }

    #[test]
    fn from_iter_skips_absent() {
        let ctx: FlatContext = [("a", Value::from(1i64)), ("b", Value::Absent)]
            .into_iter()
            .collect();
        assert_eq!(ctx.len(), 1);
        assert!(ctx.contains_key("a"));
    }
}
