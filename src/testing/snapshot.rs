//! Plain-text views of a tree for snapshot assertions.

use std::fmt::Write;

use crate::element::{ElementId, ElementTree, PaintProps, Painter, Visibility};

// ---------------------------------------------------------------------------
// Tree dump
// ---------------------------------------------------------------------------

/// Render the subtree at `id` as an indented outline, two spaces per level.
///
/// Each line is the type name, followed by the text in quotes when there is
/// one and the visibility when it is not `Visible`. There is no trailing
/// newline.
///
/// ```
/// use elemental::element::ElementTree;
/// use elemental::testing::dump_tree;
///
/// let tree = ElementTree::new();
/// assert_eq!(dump_tree(&tree, tree.root()), "Element");
/// ```
pub fn dump_tree(tree: &ElementTree, id: ElementId) -> String {
    let mut lines = Vec::new();
    dump_into(tree, id, 0, &mut lines);
    lines.join("\n")
}

fn dump_into(tree: &ElementTree, id: ElementId, depth: usize, lines: &mut Vec<String>) {
    let mut line = format!("{:indent$}{}", "", tree.type_name(id), indent = depth * 2);
    let text = tree.text(id);
    if !text.is_empty() {
        let _ = write!(line, " {text:?}");
    }
    match tree.visibility(id) {
        Visibility::Visible => {}
        other => {
            let _ = write!(line, " [{other:?}]");
        }
    }
    lines.push(line);
    for &child in tree.children(id) {
        dump_into(tree, child, depth + 1, lines);
    }
}

// ---------------------------------------------------------------------------
// PaintLog
// ---------------------------------------------------------------------------

/// One element painted.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintCall {
    pub element: ElementId,
    pub name: String,
    pub props: PaintProps,
}

/// A [`Painter`] that records every call in paint order.
#[derive(Debug, Default)]
pub struct PaintLog {
    pub calls: Vec<PaintCall>,
}

impl PaintLog {
    /// Names of the painted elements, in order.
    pub fn names(&self) -> Vec<&str> {
        self.calls.iter().map(|c| c.name.as_str()).collect()
    }
}

impl Painter for PaintLog {
    fn paint(&mut self, element: ElementId, type_name: &str, props: &PaintProps) {
        self.calls.push(PaintCall { element, name: type_name.to_owned(), props: *props });
    }
}
