//! Generic node tree produced by the parser and consumed by the inflater.

use std::fs::File;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use super::escape::escape;
use super::text_parser::{ReadStream, TextParser, TextParserStream, TextParserTarget};
use crate::value::Value;

/// A named node with an optional value and ordered children.
///
/// Properties are simply children addressed by name: `text "Ok"` under a
/// `Button` node is a child named `text` with a string value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    name: String,
    value: Value,
    children: Vec<Node>,
}

/// A structural problem reported while reading a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub line: usize,
    pub message: String,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), value: Value::Null, children: Vec::new() }
    }

    /// Set the node's value (builder).
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Append a leaf child carrying `value` (builder).
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.children.push(Node::new(name).with_value(value));
        self
    }

    /// Append a child node (builder).
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// First direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Look up a descendant by a `>`-separated path of names, e.g. `"lp>width"`.
    pub fn get_node(&self, path: &str) -> Option<&Node> {
        path.split('>').try_fold(self, |node, name| node.child(name))
    }

    pub fn get_node_mut(&mut self, path: &str) -> Option<&mut Node> {
        let mut node = self;
        for name in path.split('>') {
            node = node.children.iter_mut().find(|c| c.name == name)?;
        }
        Some(node)
    }

    /// Integer value at `path`, or `default` if there is no such node.
    pub fn value_int(&self, path: &str, default: i32) -> i32 {
        self.get_node(path).map_or(default, |n| n.value.as_int())
    }

    /// Float value at `path`, or `default` if there is no such node.
    pub fn value_float(&self, path: &str, default: f64) -> f64 {
        self.get_node(path).map_or(default, |n| n.value.as_float())
    }

    /// String value at `path`, or `default` if there is no such node.
    pub fn value_string(&self, path: &str, default: &str) -> String {
        self.get_node(path).map_or_else(|| default.to_owned(), |n| n.value.as_string())
    }

    /// Parse a document. The returned node is an unnamed container for the
    /// top-level nodes. Structural errors are logged and otherwise ignored.
    pub fn parse(text: &str) -> Node {
        Node::parse_with_diagnostics(text).0
    }

    /// Parse a document, also returning the structural errors met on the way.
    pub fn parse_with_diagnostics(text: &str) -> (Node, Vec<ParseDiagnostic>) {
        let mut builder = NodeBuilder::new();
        TextParser::new().read_str(text, &mut builder);
        builder.finish()
    }

    /// Parse a document from any stream.
    pub fn read(stream: &mut dyn TextParserStream) -> io::Result<(Node, Vec<ParseDiagnostic>)> {
        let mut builder = NodeBuilder::new();
        TextParser::new().read(stream, &mut builder)?;
        Ok(builder.finish())
    }

    /// Parse a document from a file.
    pub fn read_file(path: impl AsRef<Path>) -> io::Result<(Node, Vec<ParseDiagnostic>)> {
        let file = File::open(path)?;
        Node::read(&mut ReadStream(io::BufReader::new(file)))
    }

    /// Serialize the children of this node back into the declarative format.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write(&mut out, 0);
        }
        out
    }

    fn write(&self, out: &mut String, depth: usize) {
        out.extend(std::iter::repeat('\t').take(depth));
        out.push_str(&self.name);
        if let Some(value) = format_value(&self.value) {
            out.push(' ');
            out.push_str(&value);
        }
        out.push('\n');
        for child in &self.children {
            child.write(out, depth + 1);
        }
    }
}

fn format_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::String(s) => Some(format!("\"{}\"", escape(s))),
        Value::Int(v) => Some(v.to_string()),
        Value::Float(v) => Some(format!("{v:?}")),
        Value::Array(items) => {
            let items: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::Float(v) => format!("{v:?}"),
                    other => other.as_string(),
                })
                .collect();
            Some(format!("[{}]", items.join(", ")))
        }
    }
}

// ---------------------------------------------------------------------------
// NodeBuilder
// ---------------------------------------------------------------------------

/// A [`TextParserTarget`] that assembles a [`Node`] tree.
///
/// `@include path` copies the children of an already-read node (looked up
/// from the document root) into the current node.
#[derive(Debug, Default)]
pub struct NodeBuilder {
    root: Node,
    /// Child index entered at each level; `None` for a scope with no owner.
    scopes: Vec<Option<usize>>,
    diagnostics: Vec<ParseDiagnostic>,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished tree and any diagnostics collected while reading.
    pub fn finish(self) -> (Node, Vec<ParseDiagnostic>) {
        (self.root, self.diagnostics)
    }

    fn current_mut(&mut self) -> &mut Node {
        let mut node = &mut self.root;
        for &index in self.scopes.iter().flatten() {
            node = &mut node.children[index];
        }
        node
    }

    fn include(&mut self, line_nr: usize, path: &str) {
        let Some(source) = self.root.get_node(path) else {
            debug!(line = line_nr, path, "unresolved @include");
            self.diagnostics.push(ParseDiagnostic {
                line: line_nr,
                message: format!("include target not found: {path}"),
            });
            return;
        };
        let copies = source.children.clone();
        self.current_mut().children.extend(copies);
    }
}

impl TextParserTarget for NodeBuilder {
    fn enter(&mut self) {
        let last = self.current_mut().children.len().checked_sub(1);
        self.scopes.push(last);
    }

    fn leave(&mut self) {
        self.scopes.pop();
    }

    fn on_token(&mut self, line_nr: usize, token: &str, value: Value) {
        if token == "@include" {
            self.include(line_nr, &value.as_string());
            return;
        }
        self.current_mut().children.push(Node::new(token).with_value(value));
    }

    fn on_error(&mut self, line_nr: usize, message: &str) {
        warn!(line = line_nr, message, "parse error");
        self.diagnostics.push(ParseDiagnostic { line: line_nr, message: message.to_owned() });
    }
}
