//! Token catalog for authoring tools.
//!
//! Descriptive metadata only: the renderer never consults it.  The tests at
//! the bottom keep it in step with [`flatten`](crate::context::flatten).

use serde::Serialize;

/// A substitution token an author can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub example: &'static str,
}

/// A ready-made condition snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConditionExample {
    pub snippet: &'static str,
    pub description: &'static str,
}

/// Everything the catalog exports, for JSON output.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Catalog {
    pub tokens: &'static [TokenInfo],
    pub conditions: &'static [ConditionExample],
}

pub const CATALOG: Catalog = Catalog {
    tokens: TOKENS,
    conditions: CONDITION_EXAMPLES,
};

macro_rules! token {
    ($name:literal, $desc:literal, $example:literal) => {
        TokenInfo {
            name: $name,
            description: $desc,
            example: $example,
        }
    };
}

pub const TOKENS: &[TokenInfo] = &[
    token!("user_id", "Recipient id", "u-1042"),
    token!("user_email", "Recipient email address", "ana@example.com"),
    token!("user_first_name", "First name", "Ana"),
    token!("user_last_name", "Last name", "Silva"),
    token!("user_full_name", "First and last name", "Ana Silva"),
    token!("user_phone", "Phone number", "+351 912 345 678"),
    token!("user_location", "City or region", "Lisbon"),
    token!("user_role", "Account role", "host"),
    token!("user_company", "Company name", "Acme Rentals"),
    token!("id", "Recipient id", "u-1042"),
    token!("email", "Recipient email address", "ana@example.com"),
    token!("first_name", "First name", "Ana"),
    token!("last_name", "Last name", "Silva"),
    token!("company_name", "Company name", "Acme Rentals"),
    token!("location", "City or region", "Lisbon"),
    token!("role", "Account role (host, guest, admin)", "host"),
    token!("phone", "Phone number", "+351 912 345 678"),
    token!("signup_source", "Where the account signed up", "referral"),
    token!("segment", "Marketing segment", "power-hosts"),
    token!("tags", "Tags, comma separated", "vip, early"),
    token!("login_count", "Number of logins", "12"),
    token!("last_login_at", "Last login timestamp", "2026-10-01T09:30:00Z"),
    token!("account_status", "Account status", "active"),
    token!("is_subscribed", "Paid subscription flag", "true"),
];

pub const CONDITION_EXAMPLES: &[ConditionExample] = &[
    ConditionExample {
        snippet: "{{#if role == 'host'}}…{{/if}}",
        description: "Only for hosts",
    },
    ConditionExample {
        snippet: "{{#if role != 'guest'}}…{{/if}}",
        description: "Everyone except guests",
    },
    ConditionExample {
        snippet: "{{#if login_count < 5}}…{{/if}}",
        description: "New users (fewer than 5 logins)",
    },
    ConditionExample {
        snippet: "{{#if login_count >= 50}}…{{/if}}",
        description: "Power users",
    },
    ConditionExample {
        snippet: "{{#if tags includes 'vip'}}…{{/if}}",
        description: "Recipients tagged vip",
    },
    ConditionExample {
        snippet: "{{#if tags not includes 'beta'}}…{{/if}}",
        description: "Recipients not in the beta",
    },
    ConditionExample {
        snippet: "{{#if email includes '@acme.com'}}…{{/if}}",
        description: "Recipients on a given email domain",
    },
    ConditionExample {
        snippet: "{{#unless is_subscribed}}…{{/unless}}",
        description: "Recipients without a subscription",
    },
];

/// Look up a token by name.
pub fn token(name: &str) -> Option<&'static TokenInfo> {
    TOKENS.iter().find(|t| t.name == name)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
