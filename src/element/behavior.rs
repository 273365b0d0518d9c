//! Per-element behavior: the hooks a widget implements.
//!
//! The tree owns all structural and interaction state. A behavior supplies
//! the parts that differ between widgets: how it measures, paints, reacts to
//! events and stores its value. Every hook has a default, so a behavior only
//! overrides what it needs.
//!
//! While a hook runs, the behavior is taken out of its element and the hook
//! gets full `&mut ElementTree` access. Calls that reach the same element
//! again during that time see [`DefaultBehavior`].

use std::any::Any;

use super::tree::ElementTree;
use super::types::{ElementId, ElementZ, HitStatus, InvalidationMode, PreferredSize, SizeConstraints, State};
use crate::event::Event;
use crate::geometry::{Point, Rect};
use crate::inflate::InflateInfo;

/// What an element looks like for one paint pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintProps {
    /// The element's rect in root coordinates.
    pub rect: Rect,
    /// Accumulated opacity, including ancestors.
    pub opacity: f32,
    /// Stored plus automatic states.
    pub state: State,
}

/// Receiver of paint output. The renderer and skins live behind this.
pub trait Painter {
    fn paint(&mut self, element: ElementId, type_name: &str, props: &PaintProps);
}

/// Hooks implemented by widgets.
pub trait ElementBehavior {
    /// Name used in logs and tree dumps.
    fn type_name(&self) -> &str {
        "Element"
    }

    // ── Inflation ───────────────────────────────────────────────────

    /// Read widget-specific properties. Common properties are already applied.
    fn on_inflate(&mut self, tree: &mut ElementTree, id: ElementId, info: &InflateInfo<'_>) {
        let _ = (tree, id, info);
    }

    /// Where inflated children go: `id` itself, or an inner element.
    fn content_root(&self, tree: &ElementTree, id: ElementId) -> ElementId {
        let _ = tree;
        id
    }

    /// Sibling position used when this element is inflated into a parent.
    fn z_inflate(&self) -> ElementZ {
        ElementZ::Top
    }

    // ── Events ──────────────────────────────────────────────────────

    /// Handle an event. Return true to stop bubbling.
    fn on_event(&mut self, tree: &mut ElementTree, id: ElementId, event: &Event) -> bool {
        let _ = (tree, id, event);
        false
    }

    /// Where an unhandled event goes next. Defaults to the parent.
    fn event_destination(&self, tree: &ElementTree, id: ElementId) -> Option<ElementId> {
        tree.parent(id)
    }

    // ── Structure ───────────────────────────────────────────────────

    /// `id` was added to a parent.
    fn on_added(&mut self, tree: &mut ElementTree, id: ElementId) {
        let _ = (tree, id);
    }

    /// `id` is about to be removed from its parent.
    fn on_remove(&mut self, tree: &mut ElementTree, id: ElementId) {
        let _ = (tree, id);
    }

    fn on_child_added(&mut self, tree: &mut ElementTree, id: ElementId, child: ElementId) {
        let _ = (tree, id, child);
    }

    fn on_child_remove(&mut self, tree: &mut ElementTree, id: ElementId, child: ElementId) {
        let _ = (tree, id, child);
    }

    /// Called once, when dying starts.
    fn on_die(&mut self, tree: &mut ElementTree, id: ElementId) {
        let _ = (tree, id);
    }

    // ── Interaction state ───────────────────────────────────────────

    fn on_focus_changed(&mut self, tree: &mut ElementTree, id: ElementId, focused: bool) {
        let _ = (tree, id, focused);
    }

    fn on_capture_changed(&mut self, tree: &mut ElementTree, id: ElementId, captured: bool) {
        let _ = (tree, id, captured);
    }

    fn on_visibility_changed(&mut self, tree: &mut ElementTree, id: ElementId) {
        let _ = (tree, id);
    }

    /// Test a point in local coordinates. Only called for elements that can
    /// take input.
    fn hit_status(&self, tree: &ElementTree, id: ElementId, x: i32, y: i32) -> HitStatus {
        let rect = tree.rect(id);
        if x >= 0 && y >= 0 && x < rect.w && y < rect.h {
            HitStatus::Hit
        } else {
            HitStatus::NoHit
        }
    }

    /// Offset applied to children, e.g. by a scrolled container.
    fn child_translation(&self, tree: &ElementTree, id: ElementId) -> Point {
        let _ = (tree, id);
        Point::default()
    }

    // ── Per-frame processing ────────────────────────────────────────

    fn on_process_states(&mut self, tree: &mut ElementTree, id: ElementId) {
        let _ = (tree, id);
    }

    fn on_process(&mut self, tree: &mut ElementTree, id: ElementId) {
        let _ = (tree, id);
    }

    fn on_process_after_children(&mut self, tree: &mut ElementTree, id: ElementId) {
        let _ = (tree, id);
    }

    /// Paint this element. Children are painted afterwards by the tree.
    fn on_paint(&mut self, tree: &ElementTree, id: ElementId, props: &PaintProps, painter: &mut dyn Painter) {
        let _ = tree;
        painter.paint(id, self.type_name(), props);
    }

    // ── Layout ──────────────────────────────────────────────────────

    /// The element changed size. Return true if the children were laid out
    /// here; otherwise they are moved and resized by their gravity.
    fn on_resized(&mut self, tree: &mut ElementTree, id: ElementId, old_w: i32, old_h: i32) -> bool {
        let _ = (tree, id, old_w, old_h);
        false
    }

    /// Whether a recursive layout invalidation continues past this element.
    fn on_invalidate_layout(&mut self, tree: &mut ElementTree, id: ElementId, mode: InvalidationMode) -> bool {
        let _ = (tree, id, mode);
        true
    }

    /// Size of the content, padding excluded. Defaults to the largest child.
    fn calculate_preferred_content_size(
        &mut self,
        tree: &mut ElementTree,
        id: ElementId,
        constraints: SizeConstraints,
    ) -> PreferredSize {
        tree.largest_child_preferred_size(id, constraints)
    }

    /// Full preferred size. Defaults to the content size plus padding.
    fn calculate_preferred_size(
        &mut self,
        tree: &mut ElementTree,
        id: ElementId,
        constraints: SizeConstraints,
    ) -> PreferredSize {
        let padding = tree.padding(id);
        let inner = constraints.shrink_by(padding.horizontal(), padding.vertical());
        let mut ps = self.calculate_preferred_content_size(tree, id, inner);
        ps.min_w += padding.horizontal();
        ps.pref_w += padding.horizontal();
        ps.max_w = ps.max_w.saturating_add(padding.horizontal());
        ps.min_h += padding.vertical();
        ps.pref_h += padding.vertical();
        ps.max_h = ps.max_h.saturating_add(padding.vertical());
        ps
    }

    // ── Values ──────────────────────────────────────────────────────

    fn value(&self) -> i32 {
        0
    }

    fn set_value(&mut self, tree: &mut ElementTree, id: ElementId, value: i32) {
        let _ = (tree, id, value);
    }

    fn double_value(&self) -> f64 {
        f64::from(self.value())
    }

    fn set_double_value(&mut self, tree: &mut ElementTree, id: ElementId, value: f64) {
        self.set_value(tree, id, value as i32);
    }

    fn text(&self) -> String {
        String::new()
    }

    fn set_text(&mut self, tree: &mut ElementTree, id: ElementId, text: &str) {
        let _ = (tree, id, text);
    }

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Behavior with every default: a plain container.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBehavior;

impl ElementBehavior for DefaultBehavior {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
