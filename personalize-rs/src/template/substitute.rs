//! Variable substitution: `{{ key }}` → context value.
//!
//! Runs after block processing, in a single left-to-right pass.  Unknown keys
//! keep their marker verbatim so missing data stays visible in the output.
//! Replacement text is never rescanned: a recipient value that itself looks
//! like `{{other}}` is emitted as-is.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::context::FlatContext;

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("token regex is valid"))
}

/// Replace every known `{{ key }}` marker in `text`.
pub fn substitute(text: &str, ctx: &FlatContext) -> String {
    token_re()
        .replace_all(text, |caps: &Captures<'_>| match ctx.get(&caps[1]) {
            Some(value) if !value.is_absent() => value.to_string(),
            _ => caps[0].to_owned(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::value::Value;

    fn ctx() -> FlatContext {
        [
            ("user_first_name", Value::from("Ana")),
            ("login_count", Value::from(3i64)),
            ("is_subscribed", Value::from(true)),
            ("tags", Value::from(vec!["vip".to_owned(), "early".to_owned()])),
            ("empty", Value::from("")),
            ("first name", Value::from("spaced")),
            ("sneaky", Value::from("{{user_first_name}}")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn replaces_known_keys() {
        assert_eq!(substitute("Hi {{user_first_name}}!", &ctx()), "Hi Ana!");
        assert_eq!(substitute("Hi {{  user_first_name  }}!", &ctx()), "Hi Ana!");
        assert_eq!(substitute("{{login_count}} logins", &ctx()), "3 logins");
        assert_eq!(substitute("{{is_subscribed}}", &ctx()), "true");
        assert_eq!(substitute("{{tags}}", &ctx()), "vip, early");
        assert_eq!(substitute("{{ first name }}", &ctx()), "spaced");
    }

    #[test]
    fn every_occurrence_replaced() {
        assert_eq!(
            substitute("{{user_first_name}}/{{ user_first_name }}", &ctx()),
            "Ana/Ana"
        );
    }

    #[test]
    fn present_empty_value_replaced() {
        assert_eq!(substitute("[{{empty}}]", &ctx()), "[]");
    }

    #[test]
    fn unknown_keys_left_verbatim() {
        assert_eq!(substitute("Hi {{unknown_key}}", &ctx()), "Hi {{unknown_key}}");
        assert_eq!(substitute("{{ }}", &ctx()), "{{ }}");
        assert_eq!(substitute("{{#if x}}", &ctx()), "{{#if x}}");
    }

    #[test]
    fn values_not_rescanned() {
        assert_eq!(substitute("{{sneaky}}", &ctx()), "{{user_first_name}}");
    }
}
