//! Render entry points.
//!
//! Every render flattens the recipient fresh, processes conditional blocks
//! against the raw values, then substitutes variables.  Blocks always run
//! first, so conditions never see substituted text.

use super::blocks::{process_blocks, render_nodes, BlockMode};
use super::parse::Template;
use super::substitute::substitute;
use crate::config::EngineConfig;
use crate::context::{flatten, FlatContext, Recipient};

/// Stateless renderer.  Cheap to copy and safe to share across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Renderer {
    mode: BlockMode,
}

impl Renderer {
    pub fn new(mode: BlockMode) -> Self {
        Renderer { mode }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Renderer::new(config.block_mode)
    }

    pub fn mode(&self) -> BlockMode {
        self.mode
    }

    /// Render `template` for `recipient`.
    pub fn render(&self, template: &str, recipient: &Recipient) -> String {
        self.render_flat(template, &flatten(recipient))
    }

    /// Render against an already-flattened context.
    pub fn render_flat(&self, template: &str, ctx: &FlatContext) -> String {
        let _span = tracing::debug_span!("render", len = template.len(), mode = %self.mode).entered();
        let kept = process_blocks(template, ctx, self.mode);
        let out = substitute(&kept, ctx);
        tracing::debug!(out_len = out.len(), "rendered");
        out
    }
}

/// Render `template` for `recipient` with nested block matching.
pub fn render(template: &str, recipient: &Recipient) -> String {
    Renderer::default().render(template, recipient)
}

/// Parse once, render many times.  Always uses nested block matching.
pub fn compile(template: &str) -> Template {
    Template::parse(template)
}

impl Template {
    /// Render a parsed template against `ctx`.
    pub fn render(&self, ctx: &FlatContext) -> String {
        let mut kept = String::new();
        render_nodes(self.nodes(), ctx, &mut kept);
        substitute(&kept, ctx)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> Recipient {
        Recipient::new("u-1", "ana@example.com")
            .with_first_name("Ana")
            .with_role("host")
    }

    #[test]
    fn pipeline() {
        let out = render(
            "{{#if role == 'host'}}Welcome host {{user_first_name}}!{{/if}}",
            &host(),
        );
        assert_eq!(out, "Welcome host Ana!");
    }

    #[test]
    fn conditions_see_raw_values() {
        // A custom value that looks like a marker must not change the
        // condition outcome or be expanded.
        let r = host().with_custom("nickname", "{{role}}");
        let out = render("{{nickname}}{{#if nickname includes 'role'}} raw{{/if}}", &r);
        assert_eq!(out, "{{role}} raw");
        let out = render("{{role}}: {{#if role == 'host'}}yes{{/if}}", &host());
        assert_eq!(out, "host: yes");
    }

    #[test]
    fn compiled_template_matches_render() {
        let src = "{{#unless is_subscribed}}Hi {{ user_full_name }}, upgrade!{{/unless}}";
        let r = host().with_last_name("Silva");
        let compiled = compile(src);
        assert_eq!(compiled.render(&flatten(&r)), render(src, &r));
        assert_eq!(compiled.render(&flatten(&r)), "Hi Ana Silva, upgrade!");
    }

    #[test]
    fn renderer_modes() {
        let src = "{{#if role}}A{{#if role}}B{{/if}}C{{/if}}";
        assert_eq!(Renderer::new(BlockMode::Nested).render(src, &host()), "ABC");
        assert_eq!(
            Renderer::new(BlockMode::Legacy).render(src, &host()),
            "A{{#if role}}BC{{/if}}"
        );
    }

    #[test]
    fn renderer_from_config() {
        let config = EngineConfig {
            block_mode: BlockMode::Legacy,
            ..EngineConfig::default()
        };
        assert_eq!(Renderer::from_config(&config).mode(), BlockMode::Legacy);
    }
}
