//! Template tokenizer and block parser.
//!
//! The token vocabulary is fixed by templates already in circulation:
//!
//! | Marker | Token |
//! |--------|-------|
//! | `{{#if <condition>}}` | open `if` block |
//! | `{{#unless <condition>}}` | open `unless` block |
//! | `{{/if}}`, `{{/unless}}` | close block |
//! | `{{ key }}` | variable |
//!
//! Everything else is literal text.  Blocks nest to any depth, including
//! `#if` inside `#unless` and vice versa.  A close marker that matches no open
//! block is kept as text, and an open block that is never closed is emitted
//! as its literal marker followed by its content.

/// Kind of conditional block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Keep the content when the condition holds.
    If,
    /// Keep the content when the condition does not hold.
    Unless,
}

impl BlockKind {
    fn open_prefix(self) -> &'static str {
        match self {
            BlockKind::If => "{{#if",
            BlockKind::Unless => "{{#unless",
        }
    }

    fn close_marker(self) -> &'static str {
        match self {
            BlockKind::If => "{{/if}}",
            BlockKind::Unless => "{{/unless}}",
        }
    }
}

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    Text(&'a str),
    Open {
        kind: BlockKind,
        raw: &'a str,
        condition: &'a str,
    },
    Close {
        kind: BlockKind,
        raw: &'a str,
    },
    Variable {
        raw: &'a str,
        key: &'a str,
    },
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn take(&mut self, len: usize) -> &'a str {
        let s = &self.src[self.pos..self.pos + len];
        self.pos += len;
        s
    }

    /// `{{#if` / `{{#unless`, at least one whitespace character, then the
    /// condition up to the first `}}`.
    fn read_open(&mut self, kind: BlockKind) -> Option<Token<'a>> {
        let rest = self.rest();
        let after = rest.strip_prefix(kind.open_prefix())?;
        if !after.starts_with(char::is_whitespace) {
            return None;
        }
        let end = after.find("}}")?;
        let condition = after[..end].trim();
        let len = kind.open_prefix().len() + end + 2;
        let raw = self.take(len);
        Some(Token::Open {
            kind,
            raw,
            condition,
        })
    }

    fn read_close(&mut self, kind: BlockKind) -> Option<Token<'a>> {
        let marker = kind.close_marker();
        if !self.rest().starts_with(marker) {
            return None;
        }
        let raw = self.take(marker.len());
        Some(Token::Close { kind, raw })
    }

    fn read_variable(&mut self) -> Option<Token<'a>> {
        let inner_and_rest = &self.rest()[2..];
        let end = inner_and_rest.find("}}")?;
        let inner = &inner_and_rest[..end];
        let key = inner.trim();
        if key.is_empty() || inner.contains(['{', '}']) {
            return None;
        }
        let raw = self.take(end + 4);
        Some(Token::Variable { raw, key })
    }

    fn next_token(&mut self) -> Option<Token<'a>> {
        let rest = self.rest();
        if rest.is_empty() {
            return None;
        }
        match rest.find("{{") {
            None => return Some(Token::Text(self.take(rest.len()))),
            Some(0) => {}
            Some(at) => return Some(Token::Text(self.take(at))),
        }

        self.read_close(BlockKind::If)
            .or_else(|| self.read_close(BlockKind::Unless))
            .or_else(|| self.read_open(BlockKind::If))
            .or_else(|| self.read_open(BlockKind::Unless))
            .or_else(|| self.read_variable())
            .or_else(|| Some(Token::Text(self.take(2))))
    }

}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        self.next_token()
    }
}

/// Split `src` into tokens.  Concatenating every token's source text gives
/// back `src`.
pub fn tokenize(src: &str) -> Vec<Token<'_>> {
    Lexer::new(src).collect()
}

// ── Tree ──────────────────────────────────────────────────────────────────────

/// A template node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    /// `{{ key }}`; `raw` is the marker exactly as written.
    Variable { raw: String, key: String },
    Block {
        kind: BlockKind,
        condition: String,
        children: Vec<Node>,
    },
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if let Some(Node::Text(last)) = nodes.last_mut() {
        last.push_str(text);
    } else {
        nodes.push(Node::Text(text.to_owned()));
    }
}

fn extend_nodes(nodes: &mut Vec<Node>, more: Vec<Node>) {
    for node in more {
        match node {
            Node::Text(t) => push_text(nodes, &t),
            other => nodes.push(other),
        }
    }
}

/// A block whose close marker has not been seen yet.
struct Frame<'a> {
    kind: BlockKind,
    raw: &'a str,
    condition: &'a str,
    nodes: Vec<Node>,
}

struct Parser<'a> {
    root: Vec<Node>,
    /// Currently open blocks, innermost last.
    open: Vec<Frame<'a>>,
    /// Open `#if` and `#unless` blocks, so a stray close needs no scan.
    open_if: usize,
    open_unless: usize,
}

impl<'a> Parser<'a> {
    fn new() -> Self {
        Parser {
            root: Vec::new(),
            open: Vec::new(),
            open_if: 0,
            open_unless: 0,
        }
    }

    fn count(&mut self, kind: BlockKind) -> &mut usize {
        match kind {
            BlockKind::If => &mut self.open_if,
            BlockKind::Unless => &mut self.open_unless,
        }
    }

    fn push_frame(&mut self, frame: Frame<'a>) {
        *self.count(frame.kind) += 1;
        self.open.push(frame);
    }

    fn pop_frame(&mut self) -> Option<Frame<'a>> {
        let frame = self.open.pop()?;
        *self.count(frame.kind) -= 1;
        Some(frame)
    }

    /// Node list of the innermost open block, or the top level.
    fn current(&mut self) -> &mut Vec<Node> {
        match self.open.last_mut() {
            Some(frame) => &mut frame.nodes,
            None => &mut self.root,
        }
    }

    /// Emit every block opened at `depth` or deeper as literal text.
    fn unwind(&mut self, depth: usize) {
        let frames: Vec<Frame<'a>> = self.open.drain(depth..).collect();
        for frame in &frames {
            *self.count(frame.kind) -= 1;
        }
        let target = self.current();
        for frame in frames {
            push_text(target, frame.raw);
            extend_nodes(target, frame.nodes);
        }
    }

    fn feed(&mut self, tok: Token<'a>) {
        match tok {
            Token::Text(t) => push_text(self.current(), t),
            Token::Variable { raw, key } => self.current().push(Node::Variable {
                raw: raw.to_owned(),
                key: key.to_owned(),
            }),
            Token::Open {
                kind,
                raw,
                condition,
            } => self.push_frame(Frame {
                kind,
                raw,
                condition,
                nodes: Vec::new(),
            }),
            Token::Close { kind, raw } => {
                if *self.count(kind) == 0 {
                    push_text(self.current(), raw);
                    return;
                }
                let depth = self
                    .open
                    .iter()
                    .rposition(|f| f.kind == kind)
                    .unwrap_or_default();
                // Blocks opened inside the one being closed were never closed.
                self.unwind(depth + 1);
                if let Some(frame) = self.pop_frame() {
                    self.current().push(Node::Block {
                        kind: frame.kind,
                        condition: frame.condition.to_owned(),
                        children: frame.nodes,
                    });
                }
            }
        }
    }

    fn finish(mut self) -> Vec<Node> {
        self.unwind(0);
        self.root
    }
}

/// A parsed template.  Parsing never fails.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(src: &str) -> Self {
        let mut parser = Parser::new();
        for tok in Lexer::new(src) {
            parser.feed(tok);
        }
        Template {
            nodes: parser.finish(),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Variable keys referenced anywhere in the template, in order of first
    /// appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        walk(&self.nodes, &mut |node| {
            if let Node::Variable { key, .. } = node {
                if !out.contains(&key.as_str()) {
                    out.push(key.as_str());
                }
            }
        });
        out
    }

    /// Every block condition, in document order.
    pub fn conditions(&self) -> Vec<&str> {
        let mut out = Vec::new();
        walk(&self.nodes, &mut |node| {
            if let Node::Block { condition, .. } = node {
                out.push(condition.as_str());
            }
        });
        out
    }
}

/// Pre-order traversal with an explicit stack; nesting depth is bounded only
/// by the input length.
fn walk<'t>(nodes: &'t [Node], f: &mut dyn FnMut(&'t Node)) {
    let mut stack = vec![nodes.iter()];
    while let Some(level) = stack.last_mut() {
        let Some(node) = level.next() else {
            stack.pop();
            continue;
        };
        f(node);
        if let Node::Block { children, .. } = node {
            stack.push(children.iter());
        }
    }
}

impl Drop for Template {
    // The derived drop glue recurses once per nesting level.
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.nodes);
        while let Some(mut node) = stack.pop() {
            if let Node::Block { children, .. } = &mut node {
                stack.append(children);
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
