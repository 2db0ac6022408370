//! Markup tree traversal producing Markdown.
//!
//! The document is walked depth-first with an explicit work stack instead of
//! recursion, so deeply nested markup cannot exhaust the call stack. List
//! nesting is tracked in [`RenderState`], which lives for exactly one call to
//! [`render_html`].

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tracing::trace;

use crate::error::Result;

/// Opening and closing line of a fenced code block.
const FENCE: &str = "```";

/// Renders an HTML document or fragment as Markdown.
///
/// Parsing is lenient: unclosed and misnested tags, stray text and missing
/// `<html>`/`<body>` wrappers are all accepted.
///
/// # Errors
///
/// Returns [`Error::Render`](crate::Error::Render) if the tokenizer cannot
/// read the input stream at all.
pub fn render_html(html: &str) -> Result<String> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())?;

    let mut renderer = Renderer::default();
    renderer.run(&dom.document);
    Ok(renderer.finish())
}

/// Kind of an open list element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// `<ul>`, items prefixed with `- `.
    Unordered,
    /// `<ol>`, items prefixed with `N. `.
    Ordered,
}

/// List nesting threaded through a single render.
///
/// `counters` holds one entry per open ordered list, innermost last, so an
/// item only ever advances the numbering of its own list.
#[derive(Debug, Default)]
pub struct RenderState {
    lists: Vec<ListKind>,
    counters: Vec<usize>,
}

impl RenderState {
    /// Opens a list. Ordered lists start counting at 1.
    pub fn enter_list(&mut self, kind: ListKind) {
        self.lists.push(kind);
        if kind == ListKind::Ordered {
            self.counters.push(1);
        }
    }

    /// Closes the innermost list.
    pub fn leave_list(&mut self) {
        if self.lists.pop() == Some(ListKind::Ordered) {
            self.counters.pop();
        }
    }

    /// Number of currently open lists.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.lists.len()
    }

    /// Returns the indented marker for the next list item and advances the
    /// innermost ordered counter when that list is ordered.
    pub fn next_item_prefix(&mut self) -> String {
        let indent = "  ".repeat(self.depth().saturating_sub(1));
        match (self.lists.last(), self.counters.last_mut()) {
            (Some(ListKind::Ordered), Some(counter)) => {
                let prefix = format!("{indent}{counter}. ");
                *counter += 1;
                prefix
            }
            _ => format!("{indent}- "),
        }
    }
}

/// Pending unit of work on the traversal stack.
#[derive(Clone)]
enum Step {
    /// Render a node (and schedule its children).
    Visit(Handle),
    /// Append literal text.
    Emit(&'static str),
    /// Make sure the output ends with a blank line.
    BlankLine,
    /// Close the innermost list, then end it with a blank line.
    LeaveList,
}

#[derive(Default)]
struct Renderer {
    out: String,
    state: RenderState,
}

impl Renderer {
    fn run(&mut self, root: &Handle) {
        let mut stack = vec![Step::Visit(root.clone())];

        while let Some(step) = stack.pop() {
            match step {
                Step::Visit(node) => self.visit(&node, &mut stack),
                Step::Emit(text) => self.out.push_str(text),
                Step::BlankLine => self.ensure_blank_line(),
                Step::LeaveList => {
                    self.state.leave_list();
                    self.ensure_blank_line();
                }
            }
        }
    }

    fn visit(&mut self, node: &Handle, stack: &mut Vec<Step>) {
        match &node.data {
            NodeData::Text { contents } => {
                self.push_collapsed(&contents.borrow());
            }
            NodeData::Element { name, .. } => {
                self.visit_element(node, &name.local, stack);
            }
            _ => schedule(stack, node, &[]),
        }
    }

    fn visit_element(&mut self, node: &Handle, tag: &str, stack: &mut Vec<Step>) {
        trace!(tag, depth = self.state.depth(), "render element");
        match tag {
            "br" => self.out.push('\n'),
            "p" | "div" => {
                self.ensure_blank_line();
                schedule(stack, node, &[Step::BlankLine]);
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse::<usize>().unwrap_or(1);
                self.ensure_blank_line();
                self.out.push_str(&"#".repeat(level));
                self.out.push(' ');
                schedule(stack, node, &[Step::BlankLine]);
            }
            "strong" | "b" => {
                self.out.push_str(" **");
                schedule(stack, node, &[Step::Emit("**")]);
            }
            "em" | "i" => {
                self.out.push_str(" *");
                schedule(stack, node, &[Step::Emit("*")]);
            }
            "a" => self.push_link(node),
            "ul" => {
                self.state.enter_list(ListKind::Unordered);
                schedule(stack, node, &[Step::LeaveList]);
            }
            "ol" => {
                self.state.enter_list(ListKind::Ordered);
                schedule(stack, node, &[Step::LeaveList]);
            }
            "li" => {
                let prefix = self.state.next_item_prefix();
                self.out.push_str(&prefix);
                schedule(stack, node, &[Step::Emit("\n")]);
            }
            // The subtree is copied verbatim and never visited.
            "pre" => self.push_fenced(node),
            "code" => {
                self.out.push_str(" `");
                schedule(stack, node, &[Step::Emit("`")]);
            }
            "img" => self.push_image(node),
            _ => schedule(stack, node, &[]),
        }
    }

    /// Appends text with every whitespace run collapsed to one space. A run
    /// only produces a space when more visible text follows it.
    fn push_collapsed(&mut self, text: &str) {
        let mut pending_space = false;
        for ch in text.chars() {
            if matches!(ch, ' ' | '\n' | '\t' | '\r') {
                pending_space = true;
            } else {
                if pending_space {
                    self.out.push(' ');
                    pending_space = false;
                }
                self.out.push(ch);
            }
        }
    }

    fn push_link(&mut self, node: &Handle) {
        let text = descendant_text(node);
        let text = text.trim();
        let href = attribute(node, "href")
            .map(|href| href.trim().to_string())
            .unwrap_or_default();

        self.out.push(' ');
        self.out.push_str(text);
        if !href.is_empty() && href != text {
            self.out.push_str(" (");
            self.out.push_str(&href);
            self.out.push(')');
        }
    }

    fn push_fenced(&mut self, node: &Handle) {
        self.ensure_blank_line();
        self.out.push_str(FENCE);
        self.out.push('\n');

        let raw = descendant_text(node);
        self.out.push_str(&raw);
        if !raw.ends_with('\n') {
            self.out.push('\n');
        }

        self.out.push_str(FENCE);
        self.out.push('\n');
        self.ensure_blank_line();
    }

    fn push_image(&mut self, node: &Handle) {
        let Some(alt) = attribute(node, "alt").filter(|alt| !alt.is_empty()) else {
            return;
        };
        let src = attribute(node, "src").unwrap_or_default();
        self.out.push_str(&format!(" ![{alt}]({src})"));
    }

    fn ensure_blank_line(&mut self) {
        if self.out.ends_with("\n\n") {
            return;
        }
        if self.out.ends_with('\n') {
            self.out.push('\n');
        } else {
            self.out.push_str("\n\n");
        }
    }

    fn finish(self) -> String {
        collapse_blank_lines(self.out.trim())
    }
}

/// Pushes `after` and then the children of `node` so that the children are
/// rendered first, in document order, followed by `after` in order.
fn schedule(stack: &mut Vec<Step>, node: &Handle, after: &[Step]) {
    stack.extend(after.iter().rev().cloned());
    for child in node.children.borrow().iter().rev() {
        stack.push(Step::Visit(child.clone()));
    }
}

/// Concatenated text of every descendant text node, untouched.
fn descendant_text(node: &Handle) -> String {
    let mut text = String::new();
    let mut pending = vec![node.clone()];
    while let Some(current) = pending.pop() {
        if let NodeData::Text { contents } = &current.data {
            text.push_str(&contents.borrow());
            continue;
        }
        pending.extend(current.children.borrow().iter().rev().cloned());
    }
    text
}

/// First attribute named `name` (case-insensitive).
fn attribute(node: &Handle, name: &str) -> Option<String> {
    let NodeData::Element { attrs, .. } = &node.data else {
        return None;
    };
    attrs
        .borrow()
        .iter()
        .find(|attr| (*attr.name.local).eq_ignore_ascii_case(name))
        .map(|attr| attr.value.to_string())
}

/// Caps every newline run at two characters (one blank line).
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = 0;
    for ch in text.chars() {
        if ch == '\n' {
            run += 1;
            if run > 2 {
                continue;
            }
        } else {
            run = 0;
        }
        out.push(ch);
    }
    out
}
