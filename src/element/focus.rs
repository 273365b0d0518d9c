//! Keyboard focus and form activation.
//!
//! One element in the tree has focus at a time. Forms scope focus: setting
//! focus inside an inactive form only remembers it, and it is restored when
//! the form is activated.

use tracing::debug;

use super::tree::ElementTree;
use super::types::{ElementFlags, ElementId, ElementZ, FocusReason, State};

impl ElementTree {
    /// The focused element, if any.
    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    pub fn is_focused(&self, id: ElementId) -> bool {
        self.focused == Some(id)
    }

    /// Whether focus is on `id` or inside it.
    pub(crate) fn focus_is_within(&self, id: ElementId) -> bool {
        self.focused.is_some_and(|f| self.is_ancestor_of(id, f))
    }

    /// Whether the focused state is shown (set by keyboard navigation).
    pub fn show_focus_state(&self) -> bool {
        self.show_focus_state
    }

    pub fn set_show_focus_state(&mut self, show: bool) {
        if self.show_focus_state != show {
            self.show_focus_state = show;
            if let Some(focused) = self.focused {
                self.invalidate(focused);
            }
            self.invalidate_states();
        }
    }

    /// Give `id` focus.
    ///
    /// Fails for disabled, unfocusable, invisible or dying elements. Inside an
    /// inactive form the element only becomes the form's remembered focus and
    /// true is returned.
    pub fn set_focus(&mut self, id: ElementId, reason: FocusReason) -> bool {
        if self.focused == Some(id) {
            return true;
        }
        if !self.is_enabled(id)
            || !self.flags(id).contains(ElementFlags::FOCUSABLE)
            || !self.computed_visibility(id)
            || self.is_dying(id)
        {
            return false;
        }

        if let Some(form) = self.parent_form(id) {
            if let Some(state) = self.elements.get_mut(form).and_then(|d| d.form.as_mut()) {
                state.last_focus = Some(id);
                if !state.active && state.can_activate {
                    debug!(element = ?id, ?form, "focus remembered for inactive form");
                    return true;
                }
            }
        }

        let old = self.focused.replace(id);
        debug!(element = ?id, ?reason, "focus set");
        if let Some(old) = old {
            self.drop_key_pressed_state(old);
            self.invalidate(old);
        }
        self.invalidate(id);
        self.invalidate_states();

        if let Some(old) = old {
            self.invoke_focus_changed(old, false);
        }
        if self.focused == Some(id) {
            self.invoke_focus_changed(id, true);
        }
        true
    }

    /// Remove focus from whatever has it.
    pub fn clear_focus(&mut self) {
        if let Some(old) = self.focused.take() {
            self.drop_key_pressed_state(old);
            self.invalidate(old);
            self.invalidate_states();
            self.invoke_focus_changed(old, false);
        }
    }

    fn drop_key_pressed_state(&mut self, id: ElementId) {
        let had = self
            .elements
            .get_mut(id)
            .is_some_and(|d| std::mem::take(&mut d.key_pressed_state));
        if had {
            self.set_state(id, State::PRESSED, false);
        }
    }

    fn invoke_focus_changed(&mut self, id: ElementId, focused: bool) {
        self.with_behavior(id, |b, tree| b.on_focus_changed(tree, id, focused));
        self.notify_listeners(id, |l, tree| {
            l.on_element_focus_changed(tree, id, focused);
            false
        });
    }

    /// Focus the first descendant of `id`, in depth-first order, that accepts it.
    pub fn set_focus_recursive(&mut self, id: ElementId, reason: FocusReason) -> bool {
        let mut current = self.next_deep(id, Some(id));
        while let Some(element) = current {
            if self.set_focus(element, reason) {
                return true;
            }
            current = self.next_deep(element, Some(id));
        }
        false
    }

    /// Move focus to the next (or previous) focusable element in the focused
    /// element's form, wrapping around at the ends.
    pub fn move_focus(&mut self, forward: bool) -> bool {
        let origin = self.focused.unwrap_or(self.root());
        let scope = self
            .parent_form(origin)
            .unwrap_or_else(|| self.parent_root(origin));
        let limit = self.descendants(scope).len();

        let mut current = Some(origin);
        for _ in 0..=limit {
            let Some(element) = current else {
                break;
            };
            let mut next = if forward { self.next_deep(element, None) } else { self.prev_deep(element) };
            if next.map_or(true, |n| !self.is_ancestor_of(scope, n)) {
                next = if forward { self.first_child(scope) } else { self.last_leaf(scope) };
            }
            if next == Some(origin) {
                break;
            }
            if let Some(candidate) = next {
                if self.set_focus(candidate, FocusReason::Navigation) {
                    return true;
                }
            }
            current = next;
        }
        false
    }

    /// Make `form` the active form: deactivate the others, raise it, and
    /// restore its remembered focus (or the first focusable descendant).
    pub fn activate_form(&mut self, form: ElementId) {
        let Some(state) = self.form_state(form) else {
            return;
        };
        if !state.can_activate || self.parent(form).is_none() {
            return;
        }
        if !state.active {
            let others: Vec<ElementId> = self
                .descendants(self.root())
                .into_iter()
                .filter(|&e| e != form && self.form_state(e).is_some_and(|f| f.active))
                .collect();
            for other in others {
                self.set_form_active(other, false);
            }
            self.set_z(form, ElementZ::Top);
            self.set_form_active(form, true);
            debug!(?form, "form activated");
        }
        self.ensure_form_focus(form);
    }

    fn set_form_active(&mut self, form: ElementId, active: bool) {
        if let Some(state) = self.elements.get_mut(form).and_then(|d| d.form.as_mut()) {
            state.active = active;
        }
        self.set_state(form, State::SELECTED, active);
    }

    fn ensure_form_focus(&mut self, form: ElementId) -> bool {
        if self.focus_is_within(form) {
            return true;
        }
        let last = self.form_state(form).and_then(|f| f.last_focus);
        let restored = last.is_some_and(|e| self.contains(e) && self.set_focus(e, FocusReason::Unknown));
        restored || self.set_focus_recursive(form, FocusReason::Unknown)
    }

    /// The active form, if any.
    pub fn active_form(&self) -> Option<ElementId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&e| self.form_state(e).is_some_and(|f| f.active))
    }
}
