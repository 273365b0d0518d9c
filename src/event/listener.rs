//! Element listeners and weak element pointers.
//!
//! Listeners observe element lifecycle and events without owning anything.
//! They are registered either globally on the tree or locally on one element
//! and are always notified local first, then global. Every listener runs;
//! boolean answers are OR-ed together.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::input::Event;
use crate::element::{ElementId, ElementTree};

/// Observer of element lifecycle and events. All methods default to no-ops.
///
/// Local listeners on an element hear about that element; for added/removed
/// they are the listeners of the parent.
pub trait ElementListener {
    /// `element` is about to be destroyed. It is still in the tree's arena.
    fn on_element_delete(&mut self, tree: &mut ElementTree, element: ElementId) {
        let _ = (tree, element);
    }

    /// `element` started dying. Return true to keep it alive; the listener
    /// must then call [`ElementTree::release_keep_alive`] once it is done.
    fn on_element_dying(&mut self, tree: &mut ElementTree, element: ElementId) -> bool {
        let _ = (tree, element);
        false
    }

    /// `child` was added to `parent`.
    fn on_element_added(&mut self, tree: &mut ElementTree, parent: ElementId, child: ElementId) {
        let _ = (tree, parent, child);
    }

    /// `child` is about to be removed from `parent`.
    fn on_element_remove(&mut self, tree: &mut ElementTree, parent: ElementId, child: ElementId) {
        let _ = (tree, parent, child);
    }

    fn on_element_focus_changed(&mut self, tree: &mut ElementTree, element: ElementId, focused: bool) {
        let _ = (tree, element, focused);
    }

    /// An event is being invoked on `element`. Return true to swallow it.
    fn on_element_invoke_event(&mut self, tree: &mut ElementTree, element: ElementId, event: &Event) -> bool {
        let _ = (tree, element, event);
        false
    }
}

/// Shared handle to a registered listener.
pub type ListenerRef = Rc<RefCell<dyn ElementListener>>;

/// Wrap a listener for registration.
pub fn listener<L: ElementListener + 'static>(listener: L) -> Rc<RefCell<L>> {
    Rc::new(RefCell::new(listener))
}

// ---------------------------------------------------------------------------
// WeakElementPointer
// ---------------------------------------------------------------------------

/// Registrations whose owners went away, waiting for the tree to remove them.
pub(crate) type ReleasedListeners = RefCell<Vec<(ElementId, ListenerRef)>>;

#[derive(Default)]
struct WeakSlot {
    element: Option<ElementId>,
    released: Weak<ReleasedListeners>,
}

impl fmt::Debug for WeakSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSlot").field("element", &self.element).finish_non_exhaustive()
    }
}

impl ElementListener for WeakSlot {
    fn on_element_delete(&mut self, _tree: &mut ElementTree, element: ElementId) {
        if self.element == Some(element) {
            self.element = None;
        }
    }
}

/// A reference to an element that clears itself when the element is deleted.
///
/// It registers a local listener on the element it points to and never keeps
/// the element alive. Dropping the last clone unregisters the listener.
#[derive(Debug, Clone, Default)]
pub struct WeakElementPointer {
    slot: Rc<RefCell<WeakSlot>>,
}

impl WeakElementPointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point at `element` (or nothing), moving the listener registration.
    pub fn reset(&self, tree: &mut ElementTree, element: Option<ElementId>) {
        let old = self.get();
        if old == element {
            return;
        }
        let as_listener: ListenerRef = self.slot.clone();
        if let Some(old) = old {
            tree.remove_listener(old, &as_listener);
        }
        let element = element.filter(|&e| tree.contains(e));
        {
            let mut slot = self.slot.borrow_mut();
            slot.element = element;
            slot.released = tree.released_listeners();
        }
        if let Some(element) = element {
            tree.add_listener(element, as_listener);
        }
    }

    /// The element, or `None` once it has been deleted.
    pub fn get(&self) -> Option<ElementId> {
        self.slot.borrow().element
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }
}

impl Drop for WeakElementPointer {
    fn drop(&mut self) {
        // One count is ours, one is the element's registration.
        if Rc::strong_count(&self.slot) != 2 {
            return;
        }
        let Ok(slot) = self.slot.try_borrow() else {
            return;
        };
        let (Some(element), Some(released)) = (slot.element, slot.released.upgrade()) else {
            return;
        };
        drop(slot);
        if let Ok(mut queue) = released.try_borrow_mut() {
            let as_listener: ListenerRef = self.slot.clone();
            queue.push((element, as_listener));
        };
    }
}
