//! Authoring checks run ahead of send.
//!
//! Rendering silently hides blocks with malformed conditions and leaves
//! unknown tokens in place.  [`lint`] surfaces both so an author can fix them
//! before a template reaches recipients.

use std::fmt;

use crate::catalog;
use crate::context::FlatContext;
use crate::template::condition::{Condition, ConditionError};
use crate::template::parse::Template;

/// One problem found in a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    /// The condition always evaluates false.
    BadCondition {
        condition: String,
        error: ConditionError,
    },
    /// Neither the catalog nor the recipient knows this token.
    UnknownToken(String),
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::BadCondition { condition, error } => {
                write!(f, "condition `{condition}` is malformed ({error}) and always evaluates false")
            }
            Finding::UnknownToken(key) => {
                write!(f, "token `{{{{{key}}}}}` is unknown and will be left as written")
            }
        }
    }
}

/// Check `template` against the catalog and a sample context.
pub fn lint(template: &Template, ctx: &FlatContext) -> Vec<Finding> {
    let mut findings: Vec<Finding> = template
        .conditions()
        .into_iter()
        .filter_map(|cond| {
            Condition::parse(cond).err().map(|error| Finding::BadCondition {
                condition: cond.to_owned(),
                error,
            })
        })
        .collect();

    findings.extend(
        template
            .variables()
            .into_iter()
            .filter(|key| catalog::token(key).is_none() && !ctx.contains_key(key))
            .map(|key| Finding::UnknownToken(key.to_owned())),
    );
    findings
}
