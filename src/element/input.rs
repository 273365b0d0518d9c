//! Event dispatch and input routing.
//!
//! Hosts feed raw input through the `invoke_*` methods with coordinates in
//! root space. The tree hit-tests, tracks the hovered and captured element,
//! converts coordinates to the receiving element's space and dispatches
//! [`Event`]s, which bubble from the target through `event_destination`
//! until something handles them.

use tracing::{debug, trace};

use super::tree::{ElementTree, LongClickTimer};
use super::types::{ElementFlags, ElementId, FocusReason, HitStatus, Lifecycle, State, Visibility};
use crate::event::{Event, EventType, Modifiers, SpecialKey};
use crate::geometry::Point;

impl ElementTree {
    // ── Dispatch ────────────────────────────────────────────────────

    /// Dispatch `event` to `id`.
    ///
    /// Listeners (local, then global) see it first and can swallow it. Then
    /// `on_event` runs on the target and on each `event_destination` in turn
    /// until one returns true.
    pub fn invoke_event(&mut self, id: ElementId, mut event: Event) -> bool {
        if !self.contains(id) {
            return false;
        }
        event.target = Some(id);
        trace!(element = ?id, kind = ?event.kind, "invoke event");

        if self.notify_listeners(id, |l, tree| l.on_element_invoke_event(tree, id, &event)) {
            return true;
        }
        if !self.contains(id) {
            return true;
        }
        if event.kind == EventType::Changed {
            self.invalidate_states();
            match self.elements.get_mut(id) {
                // The behavior is inside a hook; its value is read once it returns.
                Some(data) if data.behavior.is_none() => data.pending_value_sync = true,
                _ => self.sync_value_from_element(id),
            }
            if !self.contains(id) {
                return true;
            }
        }
        if event.kind.invalidates_states() {
            self.invalidate_states();
        }

        let mut current = Some(id);
        let mut remaining = self.len();
        while let Some(element) = current {
            if self.with_behavior(element, |b, tree| b.on_event(tree, element, &event)) == Some(true) {
                return true;
            }
            if remaining == 0 || !self.contains(element) {
                break;
            }
            remaining -= 1;
            current = self.behavior_ref(element).event_destination(self, element);
        }
        false
    }

    // ── Hit testing ─────────────────────────────────────────────────

    /// Hit-test a point in `id`'s local coordinates.
    ///
    /// Transparent, input-ignoring, disabled, dying or hidden elements never hit.
    pub fn hit_status(&self, id: ElementId, x: i32, y: i32) -> HitStatus {
        let Some(data) = self.elements.get(id) else {
            return HitStatus::NoHit;
        };
        if data.opacity == 0.0
            || data.flags.contains(ElementFlags::IGNORE_INPUT)
            || data.state.contains(State::DISABLED)
            || matches!(data.lifecycle, Lifecycle::Dying { .. })
            || data.visibility != Visibility::Visible
        {
            return HitStatus::NoHit;
        }
        self.behavior_ref(id).hit_status(self, id, x, y)
    }

    /// The top-most element under a point in `id`'s coordinates, searching
    /// its descendants. Later siblings are on top.
    pub fn element_at(&self, id: ElementId, x: i32, y: i32) -> Option<ElementId> {
        let translation = self.behavior_ref(id).child_translation(self, id);
        let (x, y) = (x - translation.x, y - translation.y);
        let mut last_match = None;
        for &child in self.children(id) {
            let rect = self.rect(child);
            let (cx, cy) = (x - rect.x, y - rect.y);
            match self.hit_status(child, cx, cy) {
                HitStatus::NoHit => {}
                HitStatus::HitNoChildren => last_match = Some(child),
                HitStatus::Hit => last_match = Some(self.element_at(child, cx, cy).unwrap_or(child)),
            }
        }
        last_match
    }

    // ── Hover and capture ───────────────────────────────────────────

    pub fn hovered(&self) -> Option<ElementId> {
        self.hovered
    }

    pub fn captured(&self) -> Option<ElementId> {
        self.captured
    }

    fn set_hovered(&mut self, element: Option<ElementId>) {
        if self.hovered == element {
            return;
        }
        if element.is_some_and(|e| self.state(e).contains(State::DISABLED)) {
            return;
        }
        if let Some(old) = self.hovered {
            self.invalidate(old);
        }
        self.hovered = element;
        self.invalidate_states();
    }

    /// Change the captured element. Notifies both sides and cancels any
    /// pending long click.
    pub(crate) fn set_captured(&mut self, element: Option<ElementId>) {
        if self.captured == element {
            return;
        }
        if element.is_some_and(|e| self.state(e).contains(State::DISABLED)) {
            return;
        }
        self.pointer.long_click = None;
        self.pointer.cancel_click = false;
        let old = std::mem::replace(&mut self.captured, element);
        self.invalidate_states();
        if let Some(old) = old {
            self.with_behavior(old, |b, tree| b.on_capture_changed(tree, old, false));
        }
        if let Some(new) = self.captured {
            self.with_behavior(new, |b, tree| b.on_capture_changed(tree, new, true));
        }
    }

    /// Release the capture if `id` holds it.
    pub fn release_capture(&mut self, id: ElementId) {
        if self.captured == Some(id) {
            self.set_captured(None);
        }
    }

    /// Suppress the click that would follow the current press.
    pub fn cancel_click(&mut self) {
        self.pointer.cancel_click = true;
        self.invalidate_states();
    }

    // ── Pointer ─────────────────────────────────────────────────────

    /// Pointer pressed at root coordinates (`x`, `y`).
    ///
    /// Captures the element under the pointer, activates its form, focuses it
    /// (or its nearest focusable ancestor) and sends it `PointerDown`.
    /// Returns whether anything was captured.
    pub fn invoke_pointer_down(&mut self, x: i32, y: i32, count: u32, modifiers: Modifiers, touch: bool) -> bool {
        if self.captured.is_none() {
            let under = self.element_at(self.root(), x, y);
            self.set_captured(under);
            self.set_hovered(under);
            self.pointer.down = Point::new(x, y);
            self.pointer.last = Point::new(x, y);
        }
        let Some(captured) = self.captured else {
            return false;
        };
        debug!(element = ?captured, x, y, "pointer down");

        if let Some(form) = self.parent_form(captured) {
            self.activate_form(form);
        }
        let mut focus_target = Some(captured);
        while let Some(target) = focus_target {
            if self.set_focus(target, FocusReason::Pointer) {
                break;
            }
            focus_target = self.parent(target);
        }

        // Focus callbacks may have released or deleted it.
        let Some(captured) = self.captured else {
            return true;
        };
        let local = self.convert_from_root(captured, Point::new(x, y));
        let mut event = Event::new(EventType::PointerDown).at(local.x, local.y).with_modifiers(modifiers).with_touch(touch);
        event.count = count;
        if self.flags(captured).contains(ElementFlags::WANT_LONG_CLICK) {
            self.pointer.long_click = Some(LongClickTimer {
                element: captured,
                deadline_ms: self.now_ms + self.config().long_click_delay_ms,
                touch,
            });
        }
        self.invoke_event(captured, event);
        true
    }

    /// Pointer released at root coordinates. Sends `PointerUp`, then `Click`
    /// if the press wasn't cancelled and the pointer is still over the
    /// captured element, then releases the capture.
    pub fn invoke_pointer_up(&mut self, x: i32, y: i32, modifiers: Modifiers, touch: bool) {
        let Some(captured) = self.captured else {
            return;
        };
        let local = self.convert_from_root(captured, Point::new(x, y));
        let up = Event::new(EventType::PointerUp).at(local.x, local.y).with_modifiers(modifiers).with_touch(touch);
        self.invoke_event(captured, up);

        if !self.pointer.cancel_click
            && self.captured == Some(captured)
            && self.hit_status(captured, local.x, local.y) != HitStatus::NoHit
        {
            let click = Event::new(EventType::Click).at(local.x, local.y).with_modifiers(modifiers).with_touch(touch);
            self.invoke_event(captured, click);
        }
        if let Some(captured) = self.captured {
            self.release_capture(captured);
        }
    }

    /// Pointer moved to root coordinates. Updates hover and sends
    /// `PointerMove` to the captured element, or the hovered one.
    pub fn invoke_pointer_move(&mut self, x: i32, y: i32, modifiers: Modifiers, touch: bool) {
        let under = self.element_at(self.root(), x, y);
        self.set_hovered(under);
        self.pointer.last = Point::new(x, y);

        if self.pointer.long_click.is_some() {
            let moved = Point::new(x, y) - self.pointer.down;
            let threshold = self.config().pan_threshold;
            if moved.x.abs() > threshold || moved.y.abs() > threshold {
                trace!("pointer moved past threshold; long click cancelled");
                self.pointer.long_click = None;
            }
        }

        let Some(target) = self.captured.or(self.hovered) else {
            return;
        };
        let local = self.convert_from_root(target, Point::new(x, y));
        let event = Event::new(EventType::PointerMove).at(local.x, local.y).with_modifiers(modifiers).with_touch(touch);
        self.invoke_event(target, event);
    }

    /// Wheel scrolled at root coordinates.
    pub fn invoke_wheel(&mut self, x: i32, y: i32, delta_x: i32, delta_y: i32, modifiers: Modifiers) -> bool {
        let under = self.element_at(self.root(), x, y);
        self.set_hovered(under);
        self.pointer.last = Point::new(x, y);
        let Some(target) = self.captured.or(self.hovered) else {
            return false;
        };
        let local = self.convert_from_root(target, Point::new(x, y));
        let mut event = Event::new(EventType::Wheel).at(local.x, local.y).with_modifiers(modifiers);
        event.delta_x = delta_x;
        event.delta_y = delta_y;
        self.invoke_event(target, event)
    }

    /// Fire the long click if its deadline has passed.
    pub(crate) fn check_long_click(&mut self) {
        let Some(timer) = self.pointer.long_click else {
            return;
        };
        if self.now_ms < timer.deadline_ms {
            return;
        }
        self.pointer.long_click = None;
        if self.captured != Some(timer.element) || self.pointer.cancel_click {
            return;
        }
        let local = self.convert_from_root(timer.element, self.pointer.last);
        if self.hit_status(timer.element, local.x, local.y) == HitStatus::NoHit {
            return;
        }
        debug!(element = ?timer.element, "long click");
        let long_click = Event::new(EventType::LongClick).at(local.x, local.y).with_touch(timer.touch);
        let mut handled = self.invoke_event(timer.element, long_click);
        if !handled && self.contains(timer.element) {
            let menu = Event::new(EventType::ContextMenu).at(local.x, local.y).with_touch(timer.touch);
            handled = self.invoke_event(timer.element, menu);
        }
        if handled {
            self.pointer.cancel_click = true;
        }
    }

    // ── Keys ────────────────────────────────────────────────────────

    /// A key went down or up.
    ///
    /// With Ctrl or Super held a `Shortcut` event goes out first. Enter or
    /// space on a focused element that clicks by key produces a click on
    /// release. Everything else goes to the focused element; an unhandled
    /// Tab moves focus.
    pub fn invoke_key(&mut self, key: Option<char>, special_key: SpecialKey, modifiers: Modifiers, down: bool) -> bool {
        let key_event = |kind: EventType| {
            let mut event = Event::new(kind).with_modifiers(modifiers);
            event.key = key;
            event.special_key = special_key;
            event
        };

        if down && modifiers.intersects(Modifiers::CTRL | Modifiers::SUPER) {
            let target = self.focused.unwrap_or(self.root());
            if self.invoke_event(target, key_event(EventType::Shortcut)) {
                return true;
            }
        }

        let mut handled = false;
        if let Some(focused) = self.focused {
            let clicks_by_key = modifiers.is_empty()
                && self.flags(focused).contains(ElementFlags::CLICK_BY_KEY)
                && !self.state(focused).contains(State::DISABLED)
                && !self.is_dying(focused)
                && (special_key == SpecialKey::Enter || key == Some(' '));
            if clicks_by_key {
                self.emulate_key_click(focused, down);
                handled = true;
            } else {
                let kind = if down { EventType::KeyDown } else { EventType::KeyUp };
                handled = self.invoke_event(focused, key_event(kind));
            }
        }

        if down && !handled && special_key == SpecialKey::Tab {
            handled = self.move_focus(!modifiers.contains(Modifiers::SHIFT));
            if handled {
                self.set_show_focus_state(true);
            }
        }
        handled
    }

    fn emulate_key_click(&mut self, focused: ElementId, down: bool) {
        if down && self.key_click.check_pressed_state {
            self.key_click.had_pressed_state = self.state(focused).contains(State::PRESSED);
            self.key_click.check_pressed_state = false;
        }
        if !down {
            self.key_click.check_pressed_state = true;
        }
        if !self.key_click.had_pressed_state {
            self.set_state(focused, State::PRESSED, down);
            if let Some(data) = self.elements.get_mut(focused) {
                data.key_pressed_state = down;
            }
        }
        if !down {
            let rect = self.rect(focused);
            let click = Event::new(EventType::Click).at(rect.w / 2, rect.h / 2).with_touch(true);
            self.invoke_event(focused, click);
        }
    }
}
