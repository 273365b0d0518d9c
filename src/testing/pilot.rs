//! Pilot: scripted interaction with an element tree.
//!
//! The `Pilot` owns an [`ElementTree`] sized like a screen and turns
//! high-level gestures (clicks, key presses, elapsed time) into the
//! tree's low-level input calls.

use crate::config::UiConfig;
use crate::element::{ElementId, ElementTree};
use crate::event::{Modifiers, SpecialKey};
use crate::geometry::Rect;
use crate::inflate::{InflateError, InflaterRegistry};
use crate::parser::ParseDiagnostic;

use super::snapshot::{dump_tree, PaintLog};

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless driver for tests.
///
/// # Examples
///
/// ```
/// use elemental::inflate::InflaterRegistry;
/// use elemental::testing::Pilot;
///
/// let mut pilot = Pilot::new(200, 100);
/// pilot.load(&InflaterRegistry::new(), "Element\n\trect 0 0 50 50\n").unwrap();
/// pilot.click(10, 10);
/// assert_eq!(pilot.tree().len(), 2);
/// ```
pub struct Pilot {
    tree: ElementTree,
}

impl Pilot {
    /// A tree whose root covers `width` x `height`.
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_config(UiConfig::default(), width, height)
    }

    pub fn with_config(config: UiConfig, width: i32, height: i32) -> Self {
        let mut tree = ElementTree::with_config(config);
        let root = tree.root();
        tree.set_rect(root, Rect::new(0, 0, width, height));
        Self { tree }
    }

    /// Inflate `text` into the root, returning any lines the parser skipped.
    pub fn load(&mut self, registry: &InflaterRegistry, text: &str) -> Result<Vec<ParseDiagnostic>, InflateError> {
        let root = self.tree.root();
        self.tree.load_data(registry, root, text)
    }

    // ── Pointer ──────────────────────────────────────────────────────

    /// Press and release at (x, y).
    pub fn click(&mut self, x: i32, y: i32) {
        self.tree.invoke_pointer_down(x, y, 1, Modifiers::empty(), false);
        self.tree.invoke_pointer_up(x, y, Modifiers::empty(), false);
    }

    /// Press at (x, y), hold past the long-click delay, then release.
    pub fn long_press(&mut self, x: i32, y: i32) {
        self.tree.invoke_pointer_down(x, y, 1, Modifiers::empty(), false);
        let delay = self.tree.config().long_click_delay_ms;
        self.tree.advance_time(delay);
        self.tree.invoke_pointer_up(x, y, Modifiers::empty(), false);
    }

    /// Press at `from`, move to `to`, release there.
    pub fn drag(&mut self, from: (i32, i32), to: (i32, i32)) {
        self.tree.invoke_pointer_down(from.0, from.1, 1, Modifiers::empty(), false);
        self.tree.invoke_pointer_move(to.0, to.1, Modifiers::empty(), false);
        self.tree.invoke_pointer_up(to.0, to.1, Modifiers::empty(), false);
    }

    pub fn hover(&mut self, x: i32, y: i32) {
        self.tree.invoke_pointer_move(x, y, Modifiers::empty(), false);
    }

    // ── Keyboard ─────────────────────────────────────────────────────

    /// Key down and up for a character. Returns whether the down was handled.
    pub fn press_key(&mut self, key: char) -> bool {
        self.press(Some(key), SpecialKey::Undefined, Modifiers::empty())
    }

    pub fn press_special(&mut self, key: SpecialKey) -> bool {
        self.press(None, key, Modifiers::empty())
    }

    pub fn press(&mut self, key: Option<char>, special: SpecialKey, modifiers: Modifiers) -> bool {
        let handled = self.tree.invoke_key(key, special, modifiers, true);
        self.tree.invoke_key(key, special, modifiers, false);
        handled
    }

    pub fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.press_key(ch);
        }
    }

    /// Move focus forward.
    pub fn tab(&mut self) {
        self.press_special(SpecialKey::Tab);
    }

    /// Move focus backward.
    pub fn shift_tab(&mut self) {
        self.press(None, SpecialKey::Tab, Modifiers::SHIFT);
    }

    // ── Time ─────────────────────────────────────────────────────────

    pub fn advance(&mut self, ms: u64) {
        self.tree.advance_time(ms);
    }

    /// Run one host frame and return what was painted.
    pub fn frame(&mut self, delta_ms: u64) -> PaintLog {
        let mut paint = PaintLog::default();
        self.tree.frame(delta_ms, &mut paint);
        paint
    }

    // ── Query ────────────────────────────────────────────────────────

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ElementTree {
        &mut self.tree
    }

    pub fn root(&self) -> ElementId {
        self.tree.root()
    }

    /// Find an element below the root by its authored id.
    pub fn find(&self, id: &str) -> Option<ElementId> {
        self.tree.get_element_by_id(self.tree.root(), id)
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.tree.focused()
    }

    /// Outline of the whole tree; see [`dump_tree`].
    pub fn dump(&self) -> String {
        dump_tree(&self.tree, self.tree.root())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementFlags;
    use crate::event::EventType;
    use crate::testing::{HookLog, Probe};
    use crate::value::ValueType;
    use pretty_assertions::assert_eq;

    fn buttons(log: &HookLog) -> InflaterRegistry {
        let mut registry = InflaterRegistry::new();
        let log = log.clone();
        registry.register("Button", ValueType::Null, move || {
            Probe::new("Button").with_log(&log).handling(EventType::Click)
        });
        registry
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn new_sizes_the_root() {
        let pilot = Pilot::new(120, 40);
        assert_eq!(pilot.tree().rect(pilot.root()), Rect::new(0, 0, 120, 40));
    }

    #[test]
    fn with_config_is_used_by_long_press() {
        let log = HookLog::default();
        let mut pilot = Pilot::with_config(UiConfig::default().with_long_click_delay_ms(50), 100, 100);
        pilot.load(&buttons(&log), "Button\n\trect 0 0 20 20\n\twant-long-click 1\n").unwrap();
        log.clear();
        pilot.long_press(5, 5);
        assert_eq!(pilot.tree().now_ms(), 50);
        assert!(log.take().contains(&"Button:event(LongClick@5,5)".to_string()));
    }

    // ── Pointer ──────────────────────────────────────────────────────

    #[test]
    fn click_reaches_element_under_pointer() {
        let log = HookLog::default();
        let mut pilot = Pilot::new(100, 100);
        pilot.load(&buttons(&log), "Button\n\trect 10 10 20 20\n").unwrap();
        log.clear();
        pilot.click(15, 15);
        let clicks: Vec<String> = log.take().into_iter().filter(|l| l.contains("Click")).collect();
        assert_eq!(clicks, vec!["Button:event(Click@5,5)"]);
    }

    #[test]
    fn drag_off_the_element_does_not_click() {
        let log = HookLog::default();
        let mut pilot = Pilot::new(100, 100);
        pilot.load(&buttons(&log), "Button\n\trect 10 10 20 20\n").unwrap();
        log.clear();
        pilot.drag((15, 15), (90, 90));
        assert!(!log.take().iter().any(|l| l.contains("(Click")));
    }

    // ── Keyboard ─────────────────────────────────────────────────────

    #[test]
    fn tab_cycles_focus() {
        let mut pilot = Pilot::new(100, 100);
        pilot
            .load(&InflaterRegistry::new(), "Element\n\tid a\n\tis-focusable 1\nElement\n\tid b\n\tis-focusable 1\n")
            .unwrap();
        let (a, b) = (pilot.find("a"), pilot.find("b"));
        pilot.tab();
        assert_eq!(pilot.focused(), a);
        pilot.tab();
        assert_eq!(pilot.focused(), b);
        pilot.shift_tab();
        assert_eq!(pilot.focused(), a);
        assert!(pilot.tree().show_focus_state());
    }

    #[test]
    fn enter_clicks_focused_element() {
        let log = HookLog::default();
        let mut pilot = Pilot::new(100, 100);
        pilot.load(&buttons(&log), "Button\n\tid ok\n\tis-focusable 1\n\tautofocus 1\n").unwrap();
        let ok = pilot.find("ok").unwrap();
        pilot.tree_mut().set_flag(ok, ElementFlags::CLICK_BY_KEY, true);
        log.clear();
        pilot.press_special(SpecialKey::Enter);
        assert!(log.take().iter().any(|l| l.starts_with("Button:event(Click")));
    }

    // ── Frames ───────────────────────────────────────────────────────

    #[test]
    fn frame_paints_visible_elements() {
        let mut pilot = Pilot::new(100, 100);
        pilot
            .load(&InflaterRegistry::new(), "Element\n\trect 0 0 10 10\nElement\n\tvisibility invisible\n\trect 0 0 10 10\n")
            .unwrap();
        let paint = pilot.frame(16);
        assert_eq!(paint.names(), vec!["Element", "Element"]);
        assert_eq!(pilot.tree().now_ms(), 16);
    }
}
