//! Building elements from a node tree.

use std::path::Path;

use tracing::{debug, trace, warn};

use super::{InflateError, InflateInfo, InflaterRegistry};
use crate::element::{
    Axis, ElementFlags, ElementId, ElementTree, FocusReason, Gravity, InvokeInfo, LayoutParams, State, Visibility,
};
use crate::geometry::Rect;
use crate::parser::lexer::{leading_literal, Literal};
use crate::parser::{Node, ParseDiagnostic};
use crate::value::{Value, ValueType};

impl ElementTree {
    /// Parse `text` and inflate its elements into `target`.
    ///
    /// Lines the parser had to skip are returned; the rest of the document
    /// is still inflated.
    pub fn load_data(
        &mut self,
        registry: &InflaterRegistry,
        target: ElementId,
        text: &str,
    ) -> Result<Vec<ParseDiagnostic>, InflateError> {
        let (node, diagnostics) = Node::parse_with_diagnostics(text);
        self.load_node_tree(registry, target, &node)?;
        Ok(diagnostics)
    }

    /// Read a document from `path` and inflate its elements into `target`.
    pub fn load_file(
        &mut self,
        registry: &InflaterRegistry,
        target: ElementId,
        path: impl AsRef<Path>,
    ) -> Result<Vec<ParseDiagnostic>, InflateError> {
        let path = path.as_ref();
        let (node, diagnostics) = Node::read_file(path)?;
        if !diagnostics.is_empty() {
            warn!(path = %path.display(), count = diagnostics.len(), "document read with errors");
        }
        self.load_node_tree(registry, target, &node)?;
        Ok(diagnostics)
    }

    /// Inflate every child of `node` into `target`.
    pub fn load_node_tree(&mut self, registry: &InflaterRegistry, target: ElementId, node: &Node) -> Result<(), InflateError> {
        if !self.contains(target) {
            return Err(InflateError::InvalidTarget);
        }
        for child in node.children() {
            self.inflate_node(registry, target, child);
        }
        Ok(())
    }

    fn inflate_node(&mut self, registry: &InflaterRegistry, parent: ElementId, node: &Node) {
        let Some((behavior, sync_type)) = registry.create(node.name()) else {
            debug!(name = node.name(), "skipping property node");
            return;
        };
        let id = self.create_boxed(behavior);
        trace!(element = ?id, name = node.name(), "inflating");
        let info = InflateInfo { node, sync_type, target: parent };

        self.read_common_properties(id, &info);
        self.with_behavior(id, |b, tree| b.on_inflate(tree, id, &info));
        if let Some(value) = node.child("value") {
            match sync_type {
                ValueType::Int => self.set_value(id, value.value().as_int()),
                ValueType::Float => self.set_double_value(id, value.value().as_float()),
                ValueType::String => self.set_text(id, &value.value().as_string()),
                _ => {}
            }
        }

        let content_root = self.behavior_ref(parent).content_root(self, parent);
        let z = self.behavior_ref(id).z_inflate();
        self.add_child(content_root, id, z, InvokeInfo::Normal);

        for child in node.children() {
            self.inflate_node(registry, id, child);
        }

        if node.value_int("autofocus", 0) != 0 {
            self.set_focus(id, FocusReason::Unknown);
        }
    }

    fn read_common_properties(&mut self, id: ElementId, info: &InflateInfo<'_>) {
        let node = info.node;
        for property in node.children() {
            let value = property.value();
            match property.name() {
                "id" => self.set_id(id, value.as_string().as_str()),
                "group-id" => self.set_group_id(id, value.as_string().as_str()),
                "data" => self.set_data(id, value.clone()),
                "is-group-root" => self.set_flag(id, ElementFlags::GROUP_ROOT, value.as_int() != 0),
                "is-focusable" => self.set_flag(id, ElementFlags::FOCUSABLE, value.as_int() != 0),
                "want-long-click" => self.set_flag(id, ElementFlags::WANT_LONG_CLICK, value.as_int() != 0),
                "ignore-input" => self.set_flag(id, ElementFlags::IGNORE_INPUT, value.as_int() != 0),
                "opacity" => self.set_opacity(id, value.as_float() as f32),
                "text" => self.set_text(id, &value.as_string()),
                "connection" => {
                    let name = value.as_string();
                    self.create_shared_value(name.as_str(), info.sync_type);
                    self.connect_value(id, name.as_str());
                }
                "axis" => self.set_axis(id, Axis::parse(&value.as_string())),
                "gravity" => self.set_gravity(id, Gravity::parse(&value.as_string())),
                "visibility" => {
                    if let Some(visibility) = Visibility::parse(&value.as_string()) {
                        self.set_visibility(id, visibility);
                    }
                }
                "state" => self.set_state(id, parse_state(value), true),
                "tooltip" => self.set_tooltip(id, value.as_string()),
                "lp" => self.set_layout_params(id, read_layout_params(property)),
                "rect" => {
                    if let [x, y, w, h] = value.as_array() {
                        self.set_rect(id, Rect::new(x.as_int(), y.as_int(), w.as_int(), h.as_int()));
                    }
                }
                _ => {}
            }
        }
    }
}

/// `state` as a bit value or as keywords like `"disabled selected"`.
fn parse_state(value: &Value) -> State {
    if let Value::Int(bits) = value {
        return match u8::try_from(*bits) {
            Ok(bits) => State::from_bits_truncate(bits),
            Err(_) => {
                debug!(bits, "state bits out of range");
                State::empty()
            }
        };
    }
    let text = value.as_string();
    let mut state = State::empty();
    for word in text.split([' ', ',']) {
        match word {
            "disabled" => state |= State::DISABLED,
            "selected" => state |= State::SELECTED,
            "pressed" => state |= State::PRESSED,
            "focused" => state |= State::FOCUSED,
            "hovered" => state |= State::HOVERED,
            _ => {}
        }
    }
    state
}

fn read_layout_params(node: &Node) -> LayoutParams {
    let mut lp = LayoutParams::default();
    for child in node.children() {
        let Some(px) = pixels(child.value()) else {
            continue;
        };
        match child.name() {
            "width" => lp.set_width(px),
            "height" => lp.set_height(px),
            "min-width" => lp.min_w = Some(px),
            "max-width" => lp.max_w = Some(px),
            "pref-width" => lp.pref_w = Some(px),
            "min-height" => lp.min_h = Some(px),
            "max-height" => lp.max_h = Some(px),
            "pref-height" => lp.pref_h = Some(px),
            other => debug!(name = other, "unknown layout param"),
        }
    }
    lp
}

/// A length with any unit suffix dropped: `40`, `40px` and `40dp` are all 40.
fn pixels(value: &Value) -> Option<i32> {
    match value {
        Value::Int(v) => Some(*v),
        Value::Float(v) => Some(*v as i32),
        Value::String(s) => match leading_literal(s)? {
            (Literal::Integer | Literal::Float, len) => Some(Value::parse_auto(&s[..len]).as_int()),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementZ;
    use crate::testing::{dump_tree, Probe};
    use pretty_assertions::assert_eq;

    fn registry() -> InflaterRegistry {
        let mut registry = InflaterRegistry::new();
        registry.register("Label", ValueType::String, || Probe::new("Label"));
        registry.register("Slider", ValueType::Float, || Probe::new("Slider"));
        registry.register("Button", ValueType::Null, || Probe::new("Button"));
        registry
    }

    // ── Structure ───────────────────────────────────────────────────

    #[test]
    fn test_inflates_nested_elements_in_order() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        tree.load_data(
            &registry(),
            root,
            "Element\n\tid box\n\tLabel\n\t\ttext Hello\n\tButton\n\t\tid ok\n",
        )
        .unwrap();
        insta::assert_snapshot!(dump_tree(&tree, root), @r#"
        Element
          Element
            Label "Hello"
            Button
        "#);
    }

    #[test]
    fn test_unknown_names_are_properties() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        tree.load_data(&registry(), root, "Widget\n\tButton\n").unwrap();
        assert!(tree.children(root).is_empty());
    }

    #[test]
    fn test_skipped_lines_are_reported() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let diagnostics = tree
            .load_data(&registry(), root, "Button\n\t\t\tid lost\nButton\n\tid kept\n")
            .unwrap();
        assert_eq!(
            diagnostics,
            vec![ParseDiagnostic { line: 2, message: "Indentation error. (Line skipped)".into() }]
        );
        assert_eq!(tree.children(root).len(), 2);
        assert!(tree.get_element_by_id(root, "kept").is_some());
        assert!(tree.get_element_by_id(root, "lost").is_none());
    }

    #[test]
    fn test_invalid_target() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let e = tree.create(Probe::new("e"));
        tree.add_child(root, e, ElementZ::Top, InvokeInfo::Normal);
        tree.delete(e);
        let err = tree.load_data(&registry(), e, "Button\n").unwrap_err();
        assert!(matches!(err, InflateError::InvalidTarget));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let err = tree.load_file(&registry(), root, "/nonexistent/layout.txt").unwrap_err();
        assert!(matches!(err, InflateError::Io(_)));
    }

    // ── Common properties ───────────────────────────────────────────

    #[test]
    fn test_common_properties() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        tree.load_data(
            &registry(),
            root,
            "Button\n\
             \tid ok\n\
             \tgroup-id g\n\
             \tis-focusable 1\n\
             \twant-long-click 1\n\
             \topacity 0.5\n\
             \taxis y\n\
             \tgravity all\n\
             \tvisibility invisible\n\
             \tstate disabled\n\
             \ttooltip \"Press me\"\n\
             \trect 1 2 30 40\n\
             \tdata 7\n",
        )
        .unwrap();
        let ok = tree.get_element_by_id(root, "ok").unwrap();
        assert_eq!(tree.group_id(ok), "g".into());
        assert!(tree.flags(ok).contains(ElementFlags::FOCUSABLE | ElementFlags::WANT_LONG_CLICK));
        assert_eq!(tree.opacity(ok), 0.5);
        assert_eq!(tree.axis(ok), Axis::Y);
        assert_eq!(tree.gravity(ok), Gravity::ALL);
        assert_eq!(tree.visibility(ok), Visibility::Invisible);
        assert!(tree.state(ok).contains(State::DISABLED));
        assert_eq!(tree.tooltip(ok), "Press me");
        assert_eq!(tree.rect(ok), Rect::new(1, 2, 30, 40));
        assert_eq!(tree.data(ok).as_int(), 7);
    }

    #[test]
    fn test_state_bits() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        tree.load_data(&registry(), root, "Button\n\tid a\n\tstate 9\nButton\n\tid b\n\tstate 257\n").unwrap();
        let a = tree.get_element_by_id(root, "a").unwrap();
        let b = tree.get_element_by_id(root, "b").unwrap();
        assert_eq!(tree.state(a), State::DISABLED | State::SELECTED);
        assert_eq!(tree.state(b), State::empty());
    }

    #[test]
    fn test_layout_params_ignore_units() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        tree.load_data(&registry(), root, "Button\n\tid b\n\tlp: width: 40dp, max-height: 20\n").unwrap();
        let b = tree.get_element_by_id(root, "b").unwrap();
        let lp = tree.layout_params(b).unwrap();
        assert_eq!(lp.pref_w, Some(40));
        assert_eq!(lp.min_w, Some(40));
        assert_eq!(lp.max_h, Some(20));
        assert_eq!(lp.pref_h, None);
    }

    #[test]
    fn test_value_follows_sync_type() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        tree.load_data(&registry(), root, "Slider\n\tid s\n\tvalue 0.25\nLabel\n\tid l\n\tvalue Hi\n").unwrap();
        assert_eq!(tree.double_value(tree.get_element_by_id(root, "s").unwrap()), 0.25);
        assert_eq!(tree.text(tree.get_element_by_id(root, "l").unwrap()), "Hi");
    }

    #[test]
    fn test_connection_creates_and_shares_value() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        tree.load_data(
            &registry(),
            root,
            "Slider\n\tid a\n\tconnection volume\nSlider\n\tid b\n\tconnection volume\n",
        )
        .unwrap();
        let a = tree.get_element_by_id(root, "a").unwrap();
        let b = tree.get_element_by_id(root, "b").unwrap();
        assert_eq!(tree.connection(a), Some("volume".into()));
        tree.set_shared_double("volume", 0.75);
        assert_eq!(tree.double_value(a), 0.75);
        assert_eq!(tree.double_value(b), 0.75);
    }

    #[test]
    fn test_autofocus() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        tree.load_data(&registry(), root, "Button\n\tis-focusable 1\nButton\n\tid second\n\tis-focusable 1\n\tautofocus 1\n")
            .unwrap();
        assert_eq!(tree.focused(), tree.get_element_by_id(root, "second"));
    }

    #[test]
    fn test_pixels() {
        assert_eq!(pixels(&Value::Int(3)), Some(3));
        assert_eq!(pixels(&Value::String("12px".into())), Some(12));
        assert_eq!(pixels(&Value::String("1.5em".into())), Some(1));
        assert_eq!(pixels(&Value::String("auto".into())), None);
    }
}
