//! Conditional block processing.
//!
//! Two strategies share one contract: given the raw template and the flat
//! context, keep or drop every `#if` / `#unless` block and return the
//! remaining text with variable markers untouched.
//!
//! - [`BlockMode::Nested`] walks the [`Template`] tree, so blocks nest.
//! - [`BlockMode::Legacy`] reproduces the older regex scan: one pass for
//!   `#if`, then one for `#unless`, each pairing an open marker with the
//!   first following close marker of the same kind.  Nested blocks of the
//!   same kind are mis-paired, exactly as in templates authored against it.
//!   The condition must fit on one line; the body may span lines.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::condition::evaluate;
use super::parse::{BlockKind, Node, Template};
use crate::context::FlatContext;

/// Block matching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockMode {
    #[default]
    Nested,
    Legacy,
}

impl fmt::Display for BlockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlockMode::Nested => "nested",
            BlockMode::Legacy => "legacy",
        })
    }
}

impl FromStr for BlockMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nested" => Ok(BlockMode::Nested),
            "legacy" => Ok(BlockMode::Legacy),
            other => Err(format!("unknown block mode `{other}` (expected nested or legacy)")),
        }
    }
}

/// Keep or drop every conditional block in `template`.
pub fn process_blocks(template: &str, ctx: &FlatContext, mode: BlockMode) -> String {
    match mode {
        BlockMode::Nested => {
            let parsed = Template::parse(template);
            let mut out = String::with_capacity(template.len());
            render_nodes(parsed.nodes(), ctx, &mut out);
            out
        }
        BlockMode::Legacy => legacy_scan(template, ctx),
    }
}

/// Append the surviving text of `nodes` to `out`.  Variables are written as
/// their raw markers for the substitution pass.
pub fn render_nodes(nodes: &[Node], ctx: &FlatContext, out: &mut String) {
    let mut stack = vec![nodes.iter()];
    while let Some(level) = stack.last_mut() {
        let Some(node) = level.next() else {
            stack.pop();
            continue;
        };
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Variable { raw, .. } => out.push_str(raw),
            Node::Block {
                kind,
                condition,
                children,
            } => {
                if keeps(*kind, condition, ctx) {
                    stack.push(children.iter());
                }
            }
        }
    }
}

fn keeps(kind: BlockKind, condition: &str, ctx: &FlatContext) -> bool {
    let hit = evaluate(condition, ctx);
    match kind {
        BlockKind::If => hit,
        BlockKind::Unless => !hit,
    }
}

// ── Legacy scan ───────────────────────────────────────────────────────────────

fn if_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{#if\s+(.+?)\}\}((?s:.*?))\{\{/if\}\}").expect("if-block regex is valid")
    })
}

fn unless_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{#unless\s+(.+?)\}\}((?s:.*?))\{\{/unless\}\}")
            .expect("unless-block regex is valid")
    })
}

fn legacy_pass(re: &Regex, kind: BlockKind, src: &str, ctx: &FlatContext) -> String {
    re.replace_all(src, |caps: &Captures<'_>| {
        if keeps(kind, &caps[1], ctx) {
            caps[2].to_owned()
        } else {
            String::new()
        }
    })
    .into_owned()
}

fn legacy_scan(template: &str, ctx: &FlatContext) -> String {
    let after_if = legacy_pass(if_block_re(), BlockKind::If, template, ctx);
    legacy_pass(unless_block_re(), BlockKind::Unless, &after_if, ctx)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
