//! Personalization template engine.
//!
//! A template is plain text with two kinds of markers:
//!
//! - `{{ key }}` is replaced by the recipient's value for `key`
//! - `{{#if <condition>}} … {{/if}}` and `{{#unless <condition>}} … {{/unless}}`
//!   keep or drop their content depending on a condition
//!
//! Rendering never fails.  Malformed conditions hide their block, unknown
//! keys stay in the output as written.
//!
//! # Quick start
//!
//! ```rust
//! use personalize::{render, Recipient};
//!
//! let ana = Recipient::new("u-1", "ana@example.com")
//!     .with_first_name("Ana")
//!     .with_role("host");
//! let out = render("{{#if role == 'host'}}Welcome host {{user_first_name}}!{{/if}}", &ana);
//! assert_eq!(out, "Welcome host Ana!");
//! ```

pub mod blocks;
pub mod condition;
pub mod parse;
pub mod render;
pub mod substitute;
pub mod value;

// Re-exports for convenience.
pub use blocks::{process_blocks, BlockMode};
pub use condition::{evaluate, try_evaluate, Condition, ConditionError, Operator};
pub use parse::{BlockKind, Node, Template};
pub use render::{compile, render, Renderer};
pub use substitute::substitute;
pub use value::Value;
