//! Event types delivered to elements.
//!
//! Defines [`Event`], [`EventType`], [`SpecialKey`] and [`Modifiers`]. Hosts
//! translate their platform input into the `ElementTree::invoke_*` calls,
//! which build these events and route them through the tree.

use bitflags::bitflags;

use crate::element::ElementId;
use crate::id::HashId;

// ---------------------------------------------------------------------------
// SpecialKey
// ---------------------------------------------------------------------------

/// Non-character keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpecialKey {
    #[default]
    Undefined,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Tab,
    Backspace,
    Insert,
    Delete,
    Enter,
    Esc,
    F(u8),
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

bitflags! {
    /// Modifier key bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const CTRL  = 1 << 0;
        const SHIFT = 1 << 1;
        const ALT   = 1 << 2;
        const SUPER = 1 << 3;
    }
}

// ---------------------------------------------------------------------------
// EventType
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Pointer pressed and released on the same element, or Enter/space on a
    /// focused element that clicks by key.
    Click,
    /// Pointer held down past the long-click delay.
    LongClick,
    PointerDown,
    PointerUp,
    PointerMove,
    Wheel,
    /// The element's value changed.
    Changed,
    KeyDown,
    KeyUp,
    /// A key combination with Ctrl or Super held.
    Shortcut,
    /// Request for a context menu (an unhandled long click).
    ContextMenu,
    /// Application-defined; see [`Event::ref_id`].
    Custom,
}

impl EventType {
    /// Whether the event should trigger a state refresh after dispatch.
    pub fn invalidates_states(self) -> bool {
        matches!(
            self,
            EventType::Click
                | EventType::LongClick
                | EventType::Changed
                | EventType::KeyDown
                | EventType::KeyUp
        )
    }

    pub fn is_pointer_event(self) -> bool {
        matches!(
            self,
            EventType::PointerDown | EventType::PointerUp | EventType::PointerMove
        )
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// An event routed through the element tree.
///
/// Pointer coordinates are relative to the element the event was invoked on.
/// `target` is filled in by `ElementTree::invoke_event` and stays the same
/// while the event bubbles.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventType,
    pub target: Option<ElementId>,
    pub x: i32,
    pub y: i32,
    pub delta_x: i32,
    pub delta_y: i32,
    /// Click count for pointer-down (2 for a double click).
    pub count: u32,
    pub key: Option<char>,
    pub special_key: SpecialKey,
    pub modifiers: Modifiers,
    pub touch: bool,
    /// Extra identifier, e.g. the id of a clicked menu item.
    pub ref_id: HashId,
}

impl Event {
    pub fn new(kind: EventType) -> Self {
        Self {
            kind,
            target: None,
            x: 0,
            y: 0,
            delta_x: 0,
            delta_y: 0,
            count: 1,
            key: None,
            special_key: SpecialKey::Undefined,
            modifiers: Modifiers::empty(),
            touch: false,
            ref_id: HashId::NONE,
        }
    }

    /// A pointer event at (`x`, `y`) (builder).
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_touch(mut self, touch: bool) -> Self {
        self.touch = touch;
        self
    }

    pub fn with_ref_id(mut self, ref_id: HashId) -> Self {
        self.ref_id = ref_id;
        self
    }

    /// Whether this is a pointer event (down, up or move).
    pub fn is_pointer_event(&self) -> bool {
        self.kind.is_pointer_event()
    }

    /// Whether this is a key event (down or up).
    pub fn is_key_event(&self) -> bool {
        matches!(self.kind, EventType::KeyDown | EventType::KeyUp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_defaults() {
        let ev = Event::new(EventType::Click);
        assert_eq!(ev.count, 1);
        assert_eq!(ev.target, None);
        assert!(ev.modifiers.is_empty());
        assert!(!ev.is_pointer_event());
    }

    #[test]
    fn test_event_builders() {
        let ev = Event::new(EventType::PointerDown)
            .at(3, 4)
            .with_modifiers(Modifiers::SHIFT | Modifiers::CTRL)
            .with_touch(true);
        assert_eq!((ev.x, ev.y), (3, 4));
        assert!(ev.modifiers.contains(Modifiers::SHIFT));
        assert!(ev.touch);
        assert!(ev.is_pointer_event());
    }

    #[test]
    fn test_state_invalidating_kinds() {
        assert!(EventType::Click.invalidates_states());
        assert!(EventType::KeyUp.invalidates_states());
        assert!(!EventType::PointerMove.invalidates_states());
        assert!(!EventType::Custom.invalidates_states());
    }
}
