//! Per-frame pumping: state refresh, processing, time and paint.
//!
//! A host frame is `invoke_process_states`, `invoke_process`,
//! `advance_time` (long clicks and animations) and `invoke_paint`;
//! [`ElementTree::frame`] runs all four.

use super::behavior::{PaintProps, Painter};
use super::tree::ElementTree;
use super::types::{ElementId, State, Visibility};
use crate::animation::AnimationHost;
use crate::geometry::{Point, Rect};

impl ElementTree {
    /// Let every element refresh state-dependent data, if a refresh was
    /// requested since the last call (or `force` is set).
    pub fn invoke_process_states(&mut self, force: bool) {
        if !self.update_states && !force {
            return;
        }
        self.update_states = false;
        for element in self.descendants(self.root()) {
            if self.contains(element) {
                self.with_behavior(element, |b, tree| b.on_process_states(tree, element));
            }
        }
    }

    /// Run `on_process` on every element, parents before children, with
    /// `on_process_after_children` once the subtree is done.
    pub fn invoke_process(&mut self) {
        self.process_element(self.root());
    }

    fn process_element(&mut self, id: ElementId) {
        self.with_behavior(id, |b, tree| b.on_process(tree, id));
        for child in self.children(id).to_vec() {
            if self.parent(child) == Some(id) {
                self.process_element(child);
            }
        }
        self.with_behavior(id, |b, tree| b.on_process_after_children(tree, id));
    }

    /// Current time of the tree's clock in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Move the clock forward, fire a due long click and step animations.
    pub fn advance_time(&mut self, delta_ms: u64) {
        self.now_ms += delta_ms;
        self.check_long_click();
        self.update_animations();
    }

    /// Paint the visible tree, parents below children.
    ///
    /// Elements that are transparent, empty or not visible are skipped with
    /// their subtree. Opacity multiplies down the tree; disabled elements are
    /// dimmed further.
    pub fn invoke_paint(&mut self, painter: &mut dyn Painter) {
        let root = self.root();
        let rect = self.rect(root);
        self.take_paint_request();
        self.paint_element(root, Point::new(-rect.x, -rect.y), 1.0, painter);
    }

    fn paint_element(&mut self, id: ElementId, parent_origin: Point, parent_opacity: f32, painter: &mut dyn Painter) {
        let rect = self.rect(id);
        let own_opacity = self.opacity(id);
        if own_opacity == 0.0 || rect.is_empty() || self.visibility(id) != Visibility::Visible {
            return;
        }
        let state = self.computed_state(id);
        let mut opacity = parent_opacity * own_opacity;
        if state.contains(State::DISABLED) {
            opacity *= self.config().disabled_opacity;
        }
        let origin = parent_origin + Point::new(rect.x, rect.y);
        let props = PaintProps { rect: Rect::new(origin.x, origin.y, rect.w, rect.h), opacity, state };
        self.with_behavior(id, |b, tree| b.on_paint(tree, id, &props, &mut *painter));

        let child_origin = origin + self.behavior_ref(id).child_translation(self, id);
        for child in self.children(id).to_vec() {
            if self.parent(child) == Some(id) {
                self.paint_element(child, child_origin, opacity, painter);
            }
        }
    }

    /// One host frame: states, processing, time and paint.
    pub fn frame(&mut self, delta_ms: u64, painter: &mut dyn Painter) {
        self.invoke_process_states(false);
        self.invoke_process();
        self.advance_time(delta_ms);
        self.invoke_paint(painter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementZ, InvokeInfo};
    use crate::testing::{HookLog, PaintLog, Probe};
    use pretty_assertions::assert_eq;

    fn add(tree: &mut ElementTree, parent: ElementId, probe: Probe, rect: Rect) -> ElementId {
        let e = tree.create(probe);
        tree.add_child(parent, e, ElementZ::Top, InvokeInfo::Normal);
        tree.set_rect(e, rect);
        e
    }

    #[test]
    fn test_process_order() {
        let log = HookLog::default();
        let mut tree = ElementTree::new();
        let root = tree.root();
        let parent = add(&mut tree, root, Probe::new("parent").with_log(&log), Rect::EMPTY);
        add(&mut tree, parent, Probe::new("child").with_log(&log), Rect::EMPTY);
        log.clear();

        tree.invoke_process();
        assert_eq!(
            log.take(),
            vec!["parent:process", "child:process", "child:process_after", "parent:process_after"]
        );
    }

    #[test]
    fn test_process_states_only_when_requested() {
        let log = HookLog::default();
        let mut tree = ElementTree::new();
        let root = tree.root();
        add(&mut tree, root, Probe::new("e").with_log(&log), Rect::EMPTY);
        log.clear();

        tree.invoke_process_states(false);
        assert_eq!(log.take(), vec!["e:process_states"]);
        tree.invoke_process_states(false);
        assert!(log.take().is_empty());
        tree.invoke_process_states(true);
        assert_eq!(log.take(), vec!["e:process_states"]);
        tree.invalidate_states();
        tree.invoke_process_states(false);
        assert_eq!(log.take(), vec!["e:process_states"]);
    }

    #[test]
    fn test_paint_in_root_coordinates() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        tree.set_rect(root, Rect::new(0, 0, 100, 100));
        let panel = add(&mut tree, root, Probe::new("panel"), Rect::new(10, 10, 50, 50));
        add(&mut tree, panel, Probe::new("label"), Rect::new(5, 5, 10, 10));

        let mut paint = PaintLog::default();
        tree.invoke_paint(&mut paint);
        let rects: Vec<(String, Rect)> = paint.calls.iter().map(|c| (c.name.clone(), c.props.rect)).collect();
        assert_eq!(
            rects,
            vec![
                ("Element".to_string(), Rect::new(0, 0, 100, 100)),
                ("panel".to_string(), Rect::new(10, 10, 50, 50)),
                ("label".to_string(), Rect::new(15, 15, 10, 10)),
            ]
        );
    }

    #[test]
    fn test_paint_skips_hidden_and_multiplies_opacity() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        tree.set_rect(root, Rect::new(0, 0, 100, 100));
        let faded = add(&mut tree, root, Probe::new("faded"), Rect::new(0, 0, 50, 50));
        tree.set_opacity(faded, 0.5);
        let disabled = add(&mut tree, faded, Probe::new("disabled"), Rect::new(0, 0, 10, 10));
        tree.set_state(disabled, State::DISABLED, true);
        let hidden = add(&mut tree, root, Probe::new("hidden"), Rect::new(0, 0, 50, 50));
        tree.set_visibility(hidden, Visibility::Invisible);
        add(&mut tree, hidden, Probe::new("under_hidden"), Rect::new(0, 0, 10, 10));
        add(&mut tree, root, Probe::new("empty"), Rect::EMPTY);

        let mut paint = PaintLog::default();
        tree.invoke_paint(&mut paint);
        let seen: Vec<(&str, f32)> = paint.calls.iter().map(|c| (c.name.as_str(), c.props.opacity)).collect();
        assert_eq!(seen, vec![("Element", 1.0), ("faded", 0.5), ("disabled", 0.5 * 0.3)]);
        assert!(paint.calls[2].props.state.contains(State::DISABLED));
    }

    #[test]
    fn test_paint_clears_request() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        tree.set_rect(root, Rect::new(0, 0, 10, 10));
        assert!(tree.take_paint_request());
        tree.invalidate(root);
        tree.invoke_paint(&mut PaintLog::default());
        assert!(!tree.take_paint_request());
    }
}
