//! The element tree: arena, structure, lifecycle and listener fan-out.
//!
//! All elements live in one `SlotMap`. Parent/child links are kept in
//! secondary maps, as is everything the tree tracks across elements: the
//! focused, hovered and captured element, the global listeners, the shared
//! value group and the animation manager. A tree is one UI session; nothing
//! is process-global.

use std::rc::Rc;

use slotmap::{SecondaryMap, SlotMap};
use tracing::{trace, warn};

use super::behavior::{DefaultBehavior, ElementBehavior};
use super::connection::ElementValueGroup;
use super::types::{
    Axis, ElementFlags, ElementId, ElementZ, ElementZRel, FormState, Gravity, InvalidationMode,
    InvokeInfo, LayoutParams, Lifecycle, PreferredSize, SizeConstraints, State, Visibility,
};
use crate::animation::AnimationManager;
use crate::config::UiConfig;
use crate::event::listener::ReleasedListeners;
use crate::event::{ElementListener, ListenerRef};
use crate::geometry::{Point, Rect, Spacing};
use crate::id::HashId;
use crate::value::Value;

/// Empty slice constant for returning when an element has no children.
const EMPTY_CHILDREN: &[ElementId] = &[];

/// Everything the tree stores for one element.
pub(crate) struct ElementData {
    pub(crate) id: HashId,
    pub(crate) group_id: HashId,
    pub(crate) rect: Rect,
    pub(crate) padding: Spacing,
    pub(crate) state: State,
    pub(crate) flags: ElementFlags,
    pub(crate) visibility: Visibility,
    pub(crate) opacity: f32,
    pub(crate) gravity: Gravity,
    pub(crate) axis: Axis,
    pub(crate) layout_params: Option<LayoutParams>,
    /// Last measurement and the constraints it was made with.
    pub(crate) cached_size: Option<(SizeConstraints, PreferredSize)>,
    pub(crate) data: Value,
    pub(crate) tooltip: String,
    pub(crate) lifecycle: Lifecycle,
    /// Set while dying listeners are being asked; releases are counted instead.
    claiming: bool,
    early_releases: u32,
    pub(crate) form: Option<FormState>,
    /// Name of the shared value this element is connected to.
    pub(crate) connection: Option<HashId>,
    /// Pressed state set by a key click, to be cleared on focus loss.
    pub(crate) key_pressed_state: bool,
    /// A change arrived while the behavior was out; read the value back on return.
    pub(crate) pending_value_sync: bool,
    pub(crate) listeners: Vec<ListenerRef>,
    pub(crate) behavior: Option<Box<dyn ElementBehavior>>,
}

impl ElementData {
    fn new(behavior: Box<dyn ElementBehavior>) -> Self {
        Self {
            id: HashId::NONE,
            group_id: HashId::NONE,
            rect: Rect::EMPTY,
            padding: Spacing::default(),
            state: State::empty(),
            flags: ElementFlags::empty(),
            visibility: Visibility::Visible,
            opacity: 1.0,
            gravity: Gravity::default(),
            axis: Axis::X,
            layout_params: None,
            cached_size: None,
            data: Value::Null,
            tooltip: String::new(),
            lifecycle: Lifecycle::Live,
            claiming: false,
            early_releases: 0,
            form: None,
            connection: None,
            key_pressed_state: false,
            pending_value_sync: false,
            listeners: Vec::new(),
            behavior: Some(behavior),
        }
    }
}

/// Deadline for a pending long click.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LongClickTimer {
    pub(crate) element: ElementId,
    pub(crate) deadline_ms: u64,
    pub(crate) touch: bool,
}

/// Pointer bookkeeping between input calls. Points are in root coordinates.
#[derive(Debug, Default)]
pub(crate) struct PointerState {
    pub(crate) down: Point,
    pub(crate) last: Point,
    pub(crate) cancel_click: bool,
    pub(crate) long_click: Option<LongClickTimer>,
}

/// Pressed-state emulation for clicks by key.
#[derive(Debug)]
pub(crate) struct KeyClickState {
    pub(crate) check_pressed_state: bool,
    pub(crate) had_pressed_state: bool,
}

/// A retained tree of elements and the interaction state that spans it.
pub struct ElementTree {
    pub(crate) elements: SlotMap<ElementId, ElementData>,
    children: SecondaryMap<ElementId, Vec<ElementId>>,
    parent: SecondaryMap<ElementId, ElementId>,
    root: ElementId,
    pub(crate) focused: Option<ElementId>,
    pub(crate) hovered: Option<ElementId>,
    pub(crate) captured: Option<ElementId>,
    pub(crate) pointer: PointerState,
    pub(crate) key_click: KeyClickState,
    pub(crate) update_states: bool,
    pub(crate) show_focus_state: bool,
    paint_pending: bool,
    global_listeners: Vec<ListenerRef>,
    released_listeners: Rc<ReleasedListeners>,
    pub(crate) values: ElementValueGroup,
    pub(crate) animations: AnimationManager<ElementTree>,
    config: UiConfig,
    pub(crate) now_ms: u64,
}

impl ElementTree {
    /// Create a tree with a root element and the default configuration.
    pub fn new() -> Self {
        Self::with_config(UiConfig::default())
    }

    /// Create a tree with a root element and the given configuration.
    pub fn with_config(config: UiConfig) -> Self {
        let mut elements = SlotMap::with_key();
        let root = elements.insert(ElementData::new(Box::new(DefaultBehavior)));
        let mut children = SecondaryMap::new();
        children.insert(root, Vec::new());
        Self {
            elements,
            children,
            parent: SecondaryMap::new(),
            root,
            focused: None,
            hovered: None,
            captured: None,
            pointer: PointerState::default(),
            key_click: KeyClickState { check_pressed_state: true, had_pressed_state: false },
            update_states: true,
            show_focus_state: config.show_focus_state,
            paint_pending: true,
            global_listeners: Vec::new(),
            released_listeners: Rc::default(),
            values: ElementValueGroup::default(),
            animations: AnimationManager::new(config.animation_duration_ms, config.animation_curve),
            config,
            now_ms: 0,
        }
    }

    pub fn config(&self) -> &UiConfig {
        &self.config
    }

    /// The root element. It always exists and cannot be deleted.
    pub fn root(&self) -> ElementId {
        self.root
    }

    // ── Creation ────────────────────────────────────────────────────

    /// Create a detached element with the given behavior.
    pub fn create(&mut self, behavior: impl ElementBehavior + 'static) -> ElementId {
        self.create_boxed(Box::new(behavior))
    }

    pub fn create_boxed(&mut self, behavior: Box<dyn ElementBehavior>) -> ElementId {
        let id = self.elements.insert(ElementData::new(behavior));
        self.children.insert(id, Vec::new());
        trace!(element = ?id, "created element");
        id
    }

    /// Number of elements alive in the arena, detached ones included.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always false: the root exists for the tree's whole life.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    // ── Behavior access ─────────────────────────────────────────────

    /// Borrow the behavior as a concrete type.
    pub fn behavior<T: 'static>(&self, id: ElementId) -> Option<&T> {
        self.elements.get(id)?.behavior.as_deref()?.as_any().downcast_ref()
    }

    pub fn behavior_mut<T: 'static>(&mut self, id: ElementId) -> Option<&mut T> {
        self.elements.get_mut(id)?.behavior.as_deref_mut()?.as_any_mut().downcast_mut()
    }

    /// The behavior, or the default one while it is taken out for a hook.
    pub(crate) fn behavior_ref(&self, id: ElementId) -> &dyn ElementBehavior {
        match self.elements.get(id).and_then(|d| d.behavior.as_deref()) {
            Some(behavior) => behavior,
            None => &DefaultBehavior,
        }
    }

    pub fn type_name(&self, id: ElementId) -> &str {
        self.behavior_ref(id).type_name()
    }

    /// Run `f` with the behavior taken out of its element, so it can use the
    /// whole tree. Returns `None` if the element doesn't exist.
    pub(crate) fn with_behavior<R>(
        &mut self,
        id: ElementId,
        f: impl FnOnce(&mut dyn ElementBehavior, &mut ElementTree) -> R,
    ) -> Option<R> {
        let taken = self.elements.get_mut(id)?.behavior.take();
        let result = match taken {
            Some(mut behavior) => {
                let result = f(behavior.as_mut(), self);
                let mut sync = false;
                if let Some(data) = self.elements.get_mut(id) {
                    if data.behavior.is_none() {
                        data.behavior = Some(behavior);
                        sync = std::mem::take(&mut data.pending_value_sync);
                    }
                }
                if sync {
                    self.sync_value_from_element(id);
                }
                result
            }
            None => f(&mut DefaultBehavior, self),
        };
        Some(result)
    }

    // ── Structure queries ───────────────────────────────────────────

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.parent.get(id).copied()
    }

    /// Children in paint order (first is at the bottom).
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(EMPTY_CHILDREN)
    }

    pub fn first_child(&self, id: ElementId) -> Option<ElementId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: ElementId) -> Option<ElementId> {
        self.children(id).last().copied()
    }

    pub fn child_at_index(&self, id: ElementId, index: usize) -> Option<ElementId> {
        self.children(id).get(index).copied()
    }

    pub fn index_of_child(&self, id: ElementId, child: ElementId) -> Option<usize> {
        self.children(id).iter().position(|&c| c == child)
    }

    pub fn next_sibling(&self, id: ElementId) -> Option<ElementId> {
        let siblings = self.children(self.parent(id)?);
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.get(index + 1).copied()
    }

    pub fn prev_sibling(&self, id: ElementId) -> Option<ElementId> {
        let siblings = self.children(self.parent(id)?);
        let index = siblings.iter().position(|&c| c == id)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    /// Ancestors of `id`, nearest first. `id` itself is not included.
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Whether `ancestor` is `other` or one of its ancestors.
    pub fn is_ancestor_of(&self, ancestor: ElementId, other: ElementId) -> bool {
        ancestor == other || self.ancestors(other).any(|a| a == ancestor)
    }

    /// The top-most ancestor (the tree root for attached elements).
    pub fn parent_root(&self, id: ElementId) -> ElementId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Next element in depth-first pre-order, staying inside `bounding`.
    pub fn next_deep(&self, id: ElementId, bounding: Option<ElementId>) -> Option<ElementId> {
        if let Some(first) = self.first_child(id) {
            return Some(first);
        }
        let mut current = Some(id);
        while let Some(element) = current {
            if Some(element) == bounding {
                return None;
            }
            if let Some(next) = self.next_sibling(element) {
                return Some(next);
            }
            current = self.parent(element);
        }
        None
    }

    /// Previous element in depth-first pre-order.
    pub fn prev_deep(&self, id: ElementId) -> Option<ElementId> {
        match self.prev_sibling(id) {
            Some(prev) => Some(self.last_leaf(prev).unwrap_or(prev)),
            None => self.parent(id),
        }
    }

    /// The deepest last descendant, or `None` without children.
    pub fn last_leaf(&self, id: ElementId) -> Option<ElementId> {
        let mut leaf = self.last_child(id)?;
        while let Some(last) = self.last_child(leaf) {
            leaf = last;
        }
        Some(leaf)
    }

    /// `start` and its descendants in depth-first pre-order.
    pub fn descendants(&self, start: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            result.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        result
    }

    // ── Lookup ──────────────────────────────────────────────────────

    /// Find `id` in `start` or its descendants, depth first.
    pub fn get_element_by_id(&self, start: ElementId, id: impl Into<HashId>) -> Option<ElementId> {
        let id = id.into();
        if id.is_none() {
            return None;
        }
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if self.elements.get(current).is_some_and(|d| d.id == id) {
                return Some(current);
            }
            stack.extend(self.children(current).iter().rev());
        }
        None
    }

    /// Like [`get_element_by_id`](Self::get_element_by_id), but only if the
    /// element's behavior is a `T`.
    pub fn get_element_by_id_typed<T: 'static>(
        &self,
        start: ElementId,
        id: impl Into<HashId>,
    ) -> Option<ElementId> {
        self.get_element_by_id(start, id)
            .filter(|&found| self.behavior::<T>(found).is_some())
    }

    /// Text of the element with `id` under `start`, or empty.
    pub fn text_by_id(&self, start: ElementId, id: impl Into<HashId>) -> String {
        self.get_element_by_id(start, id).map(|e| self.text(e)).unwrap_or_default()
    }

    /// Value of the element with `id` under `start`, or 0.
    pub fn value_by_id(&self, start: ElementId, id: impl Into<HashId>) -> i32 {
        self.get_element_by_id(start, id).map_or(0, |e| self.value(e))
    }

    // ── Adding and removing ─────────────────────────────────────────

    /// Add a detached `child` to `parent`, on top or at the bottom.
    ///
    /// Calls `on_child_added` on the parent, then `on_added` on the child,
    /// then notifies listeners, unless `info` suppresses callbacks.
    pub fn add_child(&mut self, parent: ElementId, child: ElementId, z: ElementZ, info: InvokeInfo) -> bool {
        let index = match z {
            ElementZ::Top => self.children(parent).len(),
            ElementZ::Bottom => 0,
        };
        self.insert_child(parent, child, index, info)
    }

    /// Add `child` right before or after `reference`, which must be a child of `parent`.
    pub fn add_child_relative(
        &mut self,
        parent: ElementId,
        child: ElementId,
        rel: ElementZRel,
        reference: ElementId,
    ) -> bool {
        let Some(index) = self.index_of_child(parent, reference) else {
            warn!(?parent, ?reference, "reference is not a child of parent");
            return false;
        };
        let index = match rel {
            ElementZRel::Before => index,
            ElementZRel::After => index + 1,
        };
        self.insert_child(parent, child, index, InvokeInfo::Normal)
    }

    fn insert_child(&mut self, parent: ElementId, child: ElementId, index: usize, info: InvokeInfo) -> bool {
        if !self.contains(parent) || !self.contains(child) {
            warn!(?parent, ?child, "add_child on a stale element");
            return false;
        }
        if self.parent(child).is_some() || self.is_ancestor_of(child, parent) {
            warn!(?parent, ?child, "child is already attached or would become its own ancestor");
            return false;
        }
        self.parent.insert(child, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.insert(index.min(siblings.len()), child);
        }
        trace!(?parent, ?child, "added child");

        if info == InvokeInfo::Normal {
            self.with_behavior(parent, |b, tree| b.on_child_added(tree, parent, child));
            self.with_behavior(child, |b, tree| b.on_added(tree, child));
            self.notify_listeners(parent, |l, tree| {
                l.on_element_added(tree, parent, child);
                false
            });
        }
        self.invalidate_layout(parent, InvalidationMode::Recursive);
        self.invalidate(parent);
        self.invalidate_states();
        true
    }

    /// Detach `child` from `parent`. The child stays alive and can be added again.
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId, info: InvokeInfo) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        if info == InvokeInfo::Normal {
            if !self.is_dying(parent) && self.focus_is_within(child) {
                self.move_focus(true);
                if self.focus_is_within(child) {
                    self.clear_focus();
                }
            }
            self.with_behavior(parent, |b, tree| b.on_child_remove(tree, parent, child));
            self.with_behavior(child, |b, tree| b.on_remove(tree, child));
            self.notify_listeners(parent, |l, tree| {
                l.on_element_remove(tree, parent, child);
                false
            });
            if self.parent(child) != Some(parent) {
                return true;
            }
        }
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.retain(|&c| c != child);
        }
        self.parent.remove(child);
        trace!(?parent, ?child, "removed child");

        if self.captured.is_some_and(|c| self.is_ancestor_of(child, c)) {
            self.set_captured(None);
        }
        if self.hovered.is_some_and(|h| self.is_ancestor_of(child, h)) {
            self.hovered = None;
        }
        self.invalidate_layout(parent, InvalidationMode::Recursive);
        self.invalidate(parent);
        self.invalidate_states();
        true
    }

    /// Detach `id` from whatever parent it has.
    pub fn remove_from_parent(&mut self, id: ElementId) -> bool {
        match self.parent(id) {
            Some(parent) => self.remove_child(parent, id, InvokeInfo::Normal),
            None => false,
        }
    }

    /// Put `new` where `old` is and detach `old`. `old` is not deleted.
    pub fn replace_child(&mut self, parent: ElementId, old: ElementId, new: ElementId) -> bool {
        if self.parent(old) != Some(parent) {
            return false;
        }
        self.add_child_relative(parent, new, ElementZRel::Before, old)
            && self.remove_child(parent, old, InvokeInfo::Normal)
    }

    /// Move `id` to the top or bottom of its siblings, without callbacks.
    pub fn set_z(&mut self, id: ElementId, z: ElementZ) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let Some(siblings) = self.children.get_mut(parent) else {
            return;
        };
        let at_place = match z {
            ElementZ::Top => siblings.last() == Some(&id),
            ElementZ::Bottom => siblings.first() == Some(&id),
        };
        if at_place {
            return;
        }
        siblings.retain(|&c| c != id);
        match z {
            ElementZ::Top => siblings.push(id),
            ElementZ::Bottom => siblings.insert(0, id),
        }
        self.invalidate(parent);
    }

    /// Remove `child` from `parent` and destroy it with its subtree.
    pub fn delete_child(&mut self, parent: ElementId, child: ElementId) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        self.delete(child);
        true
    }

    /// Destroy every child of `id`.
    pub fn delete_all_children(&mut self, id: ElementId) {
        while let Some(child) = self.first_child(id) {
            self.remove_child(id, child, InvokeInfo::Normal);
            if self.parent(child) == Some(id) {
                // A callback put it back; detach without callbacks.
                self.remove_child(id, child, InvokeInfo::NoCallbacks);
            }
            if self.parent(child).is_none() {
                self.destroy(child);
            }
        }
    }

    /// Remove `id` from its parent and destroy it with its subtree.
    pub fn delete(&mut self, id: ElementId) {
        if id == self.root {
            warn!("the root element cannot be deleted");
            return;
        }
        if !self.contains(id) {
            return;
        }
        self.remove_from_parent(id);
        self.destroy(id);
    }

    /// Free a detached element. Weak observers are notified before the slot goes.
    fn destroy(&mut self, id: ElementId) {
        let Some(data) = self.elements.get_mut(id) else {
            return;
        };
        // No holds: a release from a delete listener must not delete again.
        data.lifecycle = Lifecycle::Dying { holds: 0 };
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        if self.captured == Some(id) {
            self.captured = None;
            self.pointer.long_click = None;
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
        self.notify_listeners(id, |l, tree| {
            l.on_element_delete(tree, id);
            false
        });
        self.delete_all_children(id);
        self.disconnect_value(id);
        if let Some(data) = self.elements.get_mut(id) {
            data.listeners.clear();
        }
        self.elements.remove(id);
        self.children.remove(id);
        self.parent.remove(id);
        trace!(element = ?id, "deleted element");
    }

    // ── Dying ───────────────────────────────────────────────────────

    /// Start a two-phase delete.
    ///
    /// Calls `on_die` once, then asks listeners whether to keep the element
    /// alive. With no takers it is deleted at once. Otherwise it stays in the
    /// tree, visible but excluded from input and focus, until every listener
    /// that kept it has called [`release_keep_alive`](Self::release_keep_alive).
    pub fn die(&mut self, id: ElementId) {
        if id == self.root {
            warn!("the root element cannot die");
            return;
        }
        let Some(data) = self.elements.get_mut(id) else {
            return;
        };
        if matches!(data.lifecycle, Lifecycle::Dying { .. }) {
            return;
        }
        data.lifecycle = Lifecycle::Dying { holds: 0 };
        data.claiming = true;
        data.early_releases = 0;
        trace!(element = ?id, "element dying");

        self.with_behavior(id, |b, tree| b.on_die(tree, id));

        let mut claims = 0u32;
        self.notify_listeners(id, |l, tree| {
            if l.on_element_dying(tree, id) {
                claims += 1;
            }
            false
        });

        let Some(data) = self.elements.get_mut(id) else {
            return;
        };
        data.claiming = false;
        let holds = claims.saturating_sub(data.early_releases);
        data.lifecycle = Lifecycle::Dying { holds };
        if holds == 0 {
            self.delete(id);
            return;
        }
        if self.focus_is_within(id) {
            self.move_focus(true);
            if self.focus_is_within(id) {
                self.clear_focus();
            }
        }
        if self.captured.is_some_and(|c| self.is_ancestor_of(id, c)) {
            self.set_captured(None);
        }
        if self.hovered.is_some_and(|h| self.is_ancestor_of(id, h)) {
            self.hovered = None;
        }
    }

    /// Drop one keep-alive hold on a dying element; the last one deletes it.
    pub fn release_keep_alive(&mut self, id: ElementId) {
        let Some(data) = self.elements.get_mut(id) else {
            return;
        };
        if data.claiming {
            data.early_releases += 1;
            return;
        }
        if let Lifecycle::Dying { holds } = &mut data.lifecycle {
            if *holds == 0 {
                return;
            }
            *holds -= 1;
            if *holds == 0 {
                self.delete(id);
            }
        }
    }

    /// Whether `id` or any ancestor is dying.
    pub fn is_dying(&self, id: ElementId) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .any(|e| self.lifecycle(e).is_some_and(|l| matches!(l, Lifecycle::Dying { .. })))
    }

    /// The element's own lifecycle state.
    pub fn lifecycle(&self, id: ElementId) -> Option<Lifecycle> {
        self.elements.get(id).map(|d| d.lifecycle)
    }

    // ── Listeners ───────────────────────────────────────────────────

    /// Register a listener on one element.
    pub fn add_listener(&mut self, id: ElementId, listener: ListenerRef) {
        self.purge_released_listeners();
        if let Some(data) = self.elements.get_mut(id) {
            data.listeners.push(listener);
        }
    }

    pub fn remove_listener(&mut self, id: ElementId, listener: &ListenerRef) {
        if let Some(data) = self.elements.get_mut(id) {
            data.listeners.retain(|l| !Rc::ptr_eq(l, listener));
        }
    }

    pub fn has_listener(&self, id: ElementId, listener: &ListenerRef) -> bool {
        self.elements
            .get(id)
            .is_some_and(|d| d.listeners.iter().any(|l| Rc::ptr_eq(l, listener)))
    }

    /// Register a listener that hears about every element.
    pub fn add_global_listener(&mut self, listener: ListenerRef) {
        self.global_listeners.push(listener);
    }

    pub fn remove_global_listener(&mut self, listener: &ListenerRef) {
        self.global_listeners.retain(|l| !Rc::ptr_eq(l, listener));
    }

    pub(crate) fn released_listeners(&self) -> std::rc::Weak<ReleasedListeners> {
        Rc::downgrade(&self.released_listeners)
    }

    /// Drop registrations whose owners have gone away.
    fn purge_released_listeners(&mut self) {
        let released = std::mem::take(&mut *self.released_listeners.borrow_mut());
        for (id, listener) in released {
            self.remove_listener(id, &listener);
        }
    }

    /// Call `f` on the local listeners of `local_of`, then on the global ones.
    ///
    /// Runs over a snapshot, skipping listeners removed meanwhile. Returns the
    /// OR of all answers.
    pub(crate) fn notify_listeners(
        &mut self,
        local_of: ElementId,
        mut f: impl FnMut(&mut dyn ElementListener, &mut ElementTree) -> bool,
    ) -> bool {
        self.purge_released_listeners();
        let local = self.elements.get(local_of).map(|d| d.listeners.clone()).unwrap_or_default();
        let global = self.global_listeners.clone();
        let mut handled = false;
        for listener in &local {
            if self.has_listener(local_of, listener) {
                handled |= self.call_listener(listener, &mut f);
            }
        }
        for listener in &global {
            if self.global_listeners.iter().any(|l| Rc::ptr_eq(l, listener)) {
                handled |= self.call_listener(listener, &mut f);
            }
        }
        handled
    }

    fn call_listener(
        &mut self,
        listener: &ListenerRef,
        f: &mut impl FnMut(&mut dyn ElementListener, &mut ElementTree) -> bool,
    ) -> bool {
        match listener.try_borrow_mut() {
            Ok(mut guard) => f(&mut *guard, self),
            Err(_) => {
                warn!("listener re-entered while already running; call skipped");
                false
            }
        }
    }

    // ── Properties ──────────────────────────────────────────────────

    pub fn id(&self, id: ElementId) -> HashId {
        self.elements.get(id).map_or(HashId::NONE, |d| d.id)
    }

    pub fn set_id(&mut self, id: ElementId, hash: impl Into<HashId>) {
        if let Some(data) = self.elements.get_mut(id) {
            data.id = hash.into();
        }
    }

    pub fn group_id(&self, id: ElementId) -> HashId {
        self.elements.get(id).map_or(HashId::NONE, |d| d.group_id)
    }

    pub fn set_group_id(&mut self, id: ElementId, hash: impl Into<HashId>) {
        if let Some(data) = self.elements.get_mut(id) {
            data.group_id = hash.into();
        }
    }

    pub fn flags(&self, id: ElementId) -> ElementFlags {
        self.elements.get(id).map_or(ElementFlags::empty(), |d| d.flags)
    }

    pub fn set_flag(&mut self, id: ElementId, flag: ElementFlags, on: bool) {
        if let Some(data) = self.elements.get_mut(id) {
            data.flags.set(flag, on);
        }
    }

    /// Stored states only.
    pub fn state(&self, id: ElementId) -> State {
        self.elements.get(id).map_or(State::empty(), |d| d.state)
    }

    pub fn set_state(&mut self, id: ElementId, state: State, on: bool) {
        let Some(data) = self.elements.get_mut(id) else {
            return;
        };
        let new_state = if on { data.state | state } else { data.state - state };
        if new_state == data.state {
            return;
        }
        data.state = new_state;
        self.invalidate(id);
        self.invalidate_states();
    }

    /// Stored states plus the automatic pressed, hovered and focused states.
    pub fn computed_state(&self, id: ElementId) -> State {
        let mut state = self.state(id);
        let pressed = !self.pointer.cancel_click
            && self.captured == Some(id)
            && self.hovered == Some(id);
        if pressed {
            state |= State::PRESSED;
        }
        if self.hovered == Some(id) {
            state |= State::HOVERED;
        }
        if self.focused == Some(id) && self.show_focus_state {
            state |= State::FOCUSED;
        }
        state
    }

    pub fn opacity(&self, id: ElementId) -> f32 {
        self.elements.get(id).map_or(0.0, |d| d.opacity)
    }

    /// Set opacity, clamped to `0.0..=1.0`.
    pub fn set_opacity(&mut self, id: ElementId, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if let Some(data) = self.elements.get_mut(id) {
            if data.opacity != opacity {
                data.opacity = opacity;
                self.invalidate(id);
            }
        }
    }

    pub fn visibility(&self, id: ElementId) -> Visibility {
        self.elements.get(id).map_or(Visibility::Gone, |d| d.visibility)
    }

    pub fn set_visibility(&mut self, id: ElementId, visibility: Visibility) {
        let Some(data) = self.elements.get_mut(id) else {
            return;
        };
        let old = data.visibility;
        if old == visibility {
            return;
        }
        if visibility == Visibility::Gone {
            self.invalidate_layout(id, InvalidationMode::Recursive);
        }
        if let Some(data) = self.elements.get_mut(id) {
            data.visibility = visibility;
        }
        self.invalidate(id);
        if old == Visibility::Gone {
            self.invalidate_layout(id, InvalidationMode::Recursive);
        }
        self.with_behavior(id, |b, tree| b.on_visibility_changed(tree, id));
    }

    /// Whether `id` and all its ancestors are visible with nonzero opacity.
    pub fn computed_visibility(&self, id: ElementId) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .all(|e| self.opacity(e) > 0.0 && self.visibility(e) == Visibility::Visible)
    }

    /// Whether neither `id` nor any ancestor is disabled.
    pub fn is_enabled(&self, id: ElementId) -> bool {
        self.contains(id)
            && std::iter::once(id)
                .chain(self.ancestors(id))
                .all(|e| !self.state(e).contains(State::DISABLED))
    }

    /// Whether `id` can take input or focus: visible up the chain, not
    /// ignoring input, enabled and not dying.
    pub fn is_interactable(&self, id: ElementId) -> bool {
        self.computed_visibility(id)
            && !self.flags(id).contains(ElementFlags::IGNORE_INPUT)
            && self.is_enabled(id)
            && !self.is_dying(id)
    }

    pub fn axis(&self, id: ElementId) -> Axis {
        self.elements.get(id).map_or(Axis::X, |d| d.axis)
    }

    pub fn set_axis(&mut self, id: ElementId, axis: Axis) {
        if let Some(data) = self.elements.get_mut(id) {
            if data.axis != axis {
                data.axis = axis;
                self.invalidate_layout(id, InvalidationMode::Recursive);
            }
        }
    }

    pub fn gravity(&self, id: ElementId) -> Gravity {
        self.elements.get(id).map_or(Gravity::default(), |d| d.gravity)
    }

    pub fn set_gravity(&mut self, id: ElementId, gravity: Gravity) {
        if let Some(data) = self.elements.get_mut(id) {
            data.gravity = gravity;
        }
    }

    /// Host data attached to the element.
    pub fn data(&self, id: ElementId) -> Value {
        self.elements.get(id).map(|d| d.data.clone()).unwrap_or_default()
    }

    pub fn set_data(&mut self, id: ElementId, data: impl Into<Value>) {
        if let Some(element) = self.elements.get_mut(id) {
            element.data = data.into();
        }
    }

    pub fn tooltip(&self, id: ElementId) -> &str {
        self.elements.get(id).map_or("", |d| d.tooltip.as_str())
    }

    pub fn set_tooltip(&mut self, id: ElementId, tooltip: impl Into<String>) {
        if let Some(data) = self.elements.get_mut(id) {
            data.tooltip = tooltip.into();
        }
    }

    // ── Forms ───────────────────────────────────────────────────────

    /// Make `id` a form: a focus scope that can be active or inactive.
    pub fn set_form(&mut self, id: ElementId, form: FormState) {
        if let Some(data) = self.elements.get_mut(id) {
            data.form = Some(form);
        }
    }

    pub fn form_state(&self, id: ElementId) -> Option<FormState> {
        self.elements.get(id).and_then(|d| d.form)
    }

    pub fn is_form(&self, id: ElementId) -> bool {
        self.form_state(id).is_some()
    }

    /// The nearest form containing `id`, `id` included.
    pub fn parent_form(&self, id: ElementId) -> Option<ElementId> {
        std::iter::once(id).chain(self.ancestors(id)).find(|&e| self.is_form(e))
    }

    // ── Value and text ──────────────────────────────────────────────

    pub fn value(&self, id: ElementId) -> i32 {
        self.behavior_ref(id).value()
    }

    pub fn set_value(&mut self, id: ElementId, value: i32) {
        self.with_behavior(id, |b, tree| b.set_value(tree, id, value));
    }

    pub fn double_value(&self, id: ElementId) -> f64 {
        self.behavior_ref(id).double_value()
    }

    pub fn set_double_value(&mut self, id: ElementId, value: f64) {
        self.with_behavior(id, |b, tree| b.set_double_value(tree, id, value));
    }

    pub fn text(&self, id: ElementId) -> String {
        self.behavior_ref(id).text()
    }

    pub fn set_text(&mut self, id: ElementId, text: &str) {
        self.with_behavior(id, |b, tree| b.set_text(tree, id, text));
    }

    // ── Invalidation ────────────────────────────────────────────────

    /// Request a repaint.
    pub fn invalidate(&mut self, id: ElementId) {
        if self.contains(id) {
            self.paint_pending = true;
        }
    }

    /// Request a state refresh on the next [`invoke_process_states`](Self::invoke_process_states).
    pub fn invalidate_states(&mut self) {
        self.update_states = true;
        self.paint_pending = true;
    }

    /// Whether a repaint was requested since the last call. Clears the request.
    pub fn take_paint_request(&mut self) -> bool {
        std::mem::take(&mut self.paint_pending)
    }
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::event::{listener, WeakElementPointer};
    use crate::testing::{HookLog, Probe};
    use pretty_assertions::assert_eq;

    /// Counts deletes and optionally keeps dying elements alive.
    #[derive(Default)]
    struct Lifeline {
        deleted: Vec<ElementId>,
        dying: Vec<ElementId>,
        keep_alive: bool,
        added: Vec<(ElementId, ElementId)>,
        removed: Vec<(ElementId, ElementId)>,
    }

    impl ElementListener for Lifeline {
        fn on_element_delete(&mut self, _tree: &mut ElementTree, element: ElementId) {
            self.deleted.push(element);
        }
        fn on_element_dying(&mut self, _tree: &mut ElementTree, element: ElementId) -> bool {
            self.dying.push(element);
            self.keep_alive
        }
        fn on_element_added(&mut self, _tree: &mut ElementTree, parent: ElementId, child: ElementId) {
            self.added.push((parent, child));
        }
        fn on_element_remove(&mut self, _tree: &mut ElementTree, parent: ElementId, child: ElementId) {
            self.removed.push((parent, child));
        }
    }

    fn add(tree: &mut ElementTree, parent: ElementId) -> ElementId {
        let child = tree.create(DefaultBehavior);
        assert!(tree.add_child(parent, child, ElementZ::Top, InvokeInfo::Normal));
        child
    }

    /// ```text
    ///        root
    ///       /    \
    ///      a      b
    ///     / \
    ///    a1  a2
    /// ```
    fn sample() -> (ElementTree, [ElementId; 4]) {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let a = add(&mut tree, root);
        let b = add(&mut tree, root);
        let a1 = add(&mut tree, a);
        let a2 = add(&mut tree, a);
        (tree, [a, b, a1, a2])
    }

    // ── Structure ───────────────────────────────────────────────────

    #[test]
    fn test_add_child_z_order() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let top = add(&mut tree, root);
        let bottom = tree.create(DefaultBehavior);
        tree.add_child(root, bottom, ElementZ::Bottom, InvokeInfo::Normal);
        let middle = tree.create(DefaultBehavior);
        tree.add_child_relative(root, middle, ElementZRel::After, bottom);
        assert_eq!(tree.children(root), &[bottom, middle, top]);
        assert_eq!(tree.next_sibling(bottom), Some(middle));
        assert_eq!(tree.prev_sibling(bottom), None);
    }

    #[test]
    fn test_add_child_rejects_attached_and_cycles() {
        let (mut tree, [a, b, a1, _]) = sample();
        assert!(!tree.add_child(b, a1, ElementZ::Top, InvokeInfo::Normal));
        tree.remove_from_parent(a);
        assert!(!tree.add_child(a1, a, ElementZ::Top, InvokeInfo::Normal));
        assert!(!tree.add_child(a, a, ElementZ::Top, InvokeInfo::Normal));
    }

    #[test]
    fn test_callbacks_parent_then_child_then_listeners() {
        let log = HookLog::default();
        let mut tree = ElementTree::new();
        let root = tree.root();
        let parent = tree.create(Probe::new("parent").with_log(&log));
        tree.add_child(root, parent, ElementZ::Top, InvokeInfo::Normal);
        let child = tree.create(Probe::new("child").with_log(&log));
        let lifeline = listener(Lifeline::default());
        tree.add_global_listener(lifeline.clone());
        log.clear();

        tree.add_child(parent, child, ElementZ::Top, InvokeInfo::Normal);
        assert_eq!(log.take(), vec!["parent:child_added", "child:added"]);
        assert_eq!(lifeline.borrow().added, vec![(parent, child)]);

        tree.remove_child(parent, child, InvokeInfo::Normal);
        assert_eq!(log.take(), vec!["parent:child_remove", "child:remove"]);
        assert_eq!(lifeline.borrow().removed, vec![(parent, child)]);

        tree.add_child(parent, child, ElementZ::Top, InvokeInfo::NoCallbacks);
        assert!(log.take().is_empty());
        assert_eq!(lifeline.borrow().added.len(), 1);
    }

    #[test]
    fn test_replace_child_keeps_position() {
        let (mut tree, [a, b, _, _]) = sample();
        let root = tree.root();
        let c = tree.create(DefaultBehavior);
        assert!(tree.replace_child(root, a, c));
        assert_eq!(tree.children(root), &[c, b]);
        assert!(tree.contains(a));
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn test_traversal() {
        let (tree, [a, b, a1, a2]) = sample();
        let root = tree.root();
        assert_eq!(tree.next_deep(root, None), Some(a));
        assert_eq!(tree.next_deep(a, None), Some(a1));
        assert_eq!(tree.next_deep(a1, None), Some(a2));
        assert_eq!(tree.next_deep(a2, None), Some(b));
        assert_eq!(tree.next_deep(b, None), None);
        assert_eq!(tree.next_deep(a2, Some(a)), None);

        assert_eq!(tree.prev_deep(b), Some(a2));
        assert_eq!(tree.prev_deep(a1), Some(a));
        assert_eq!(tree.last_leaf(root), Some(b));
        assert_eq!(tree.last_leaf(a), Some(a2));
        assert_eq!(tree.descendants(root), vec![root, a, a1, a2, b]);

        assert!(tree.is_ancestor_of(root, a2));
        assert!(tree.is_ancestor_of(a, a));
        assert!(!tree.is_ancestor_of(b, a2));
        assert_eq!(tree.parent_root(a2), root);
    }

    #[test]
    fn test_get_element_by_id() {
        let (mut tree, [a, b, _, a2]) = sample();
        let root = tree.root();
        tree.set_id(a2, "target");
        tree.set_id(b, "target");
        assert_eq!(tree.get_element_by_id(root, "target"), Some(a2));
        assert_eq!(tree.get_element_by_id(a, "target"), Some(a2));
        assert_eq!(tree.get_element_by_id(root, "missing"), None);
        assert_eq!(tree.get_element_by_id(root, ""), None);
        assert_eq!(tree.get_element_by_id_typed::<DefaultBehavior>(root, "target"), Some(a2));
        assert_eq!(tree.get_element_by_id_typed::<Probe>(root, "target"), None);
    }

    // ── Delete ──────────────────────────────────────────────────────

    #[test]
    fn test_delete_destroys_subtree_exactly_once() {
        let (mut tree, [a, b, a1, a2]) = sample();
        let root = tree.root();
        let lifeline = listener(Lifeline::default());
        tree.add_global_listener(lifeline.clone());

        tree.remove_child(a, a1, InvokeInfo::Normal);
        tree.delete(a);

        let mut deleted = lifeline.borrow().deleted.clone();
        deleted.sort();
        let mut expected = vec![a, a2];
        expected.sort();
        assert_eq!(deleted, expected);
        assert!(!tree.contains(a));
        assert!(!tree.contains(a2));
        assert!(tree.contains(a1));
        assert_eq!(tree.children(root), &[b]);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_delete_clears_global_pointers() {
        let (mut tree, [a, _, a1, _]) = sample();
        tree.hovered = Some(a1);
        tree.captured = Some(a1);
        tree.focused = Some(a1);
        tree.delete(a);
        assert_eq!((tree.hovered, tree.captured, tree.focused), (None, None, None));
    }

    #[test]
    fn test_root_cannot_be_deleted() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        tree.delete(root);
        tree.die(root);
        assert!(tree.contains(root));
    }

    #[test]
    fn test_delete_all_children() {
        let (mut tree, [a, b, _, _]) = sample();
        tree.delete_all_children(a);
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.len(), 3);
        assert!(tree.contains(b));
    }

    // ── Die ─────────────────────────────────────────────────────────

    #[test]
    fn test_die_without_listener_deletes_immediately() {
        let log = HookLog::default();
        let mut tree = ElementTree::new();
        let root = tree.root();
        let e = tree.create(Probe::new("e").with_log(&log));
        tree.add_child(root, e, ElementZ::Top, InvokeInfo::Normal);
        log.clear();

        tree.die(e);
        assert!(!tree.contains(e));
        assert_eq!(log.take(), vec!["e:die", "e:remove"]);
    }

    #[test]
    fn test_die_with_keep_alive_listener() {
        let log = HookLog::default();
        let (mut tree, [a, _, a1, _]) = sample();
        let e = tree.create(Probe::new("e").with_log(&log));
        tree.add_child(a, e, ElementZ::Top, InvokeInfo::Normal);
        tree.set_flag(e, ElementFlags::FOCUSABLE, true);
        let lifeline = listener(Lifeline { keep_alive: true, ..Default::default() });
        tree.add_listener(e, lifeline.clone());
        log.clear();

        tree.die(e);
        assert!(tree.contains(e));
        assert_eq!(tree.parent(e), Some(a));
        assert!(tree.is_dying(e));
        assert!(!tree.is_dying(a1));
        assert!(!tree.is_interactable(e));
        assert!(!tree.set_focus(e, crate::element::FocusReason::Unknown));
        assert_eq!(tree.lifecycle(e), Some(Lifecycle::Dying { holds: 1 }));

        // A second die is ignored; on_die ran once.
        tree.die(e);
        assert_eq!(log.take(), vec!["e:die"]);
        assert_eq!(lifeline.borrow().dying, vec![e]);

        tree.release_keep_alive(e);
        assert!(!tree.contains(e));
    }

    #[test]
    fn test_children_inherit_dying_without_on_die() {
        let log = HookLog::default();
        let mut tree = ElementTree::new();
        let root = tree.root();
        let parent = tree.create(Probe::new("parent").with_log(&log));
        tree.add_child(root, parent, ElementZ::Top, InvokeInfo::Normal);
        let child = tree.create(Probe::new("child").with_log(&log));
        tree.add_child(parent, child, ElementZ::Top, InvokeInfo::Normal);
        tree.add_global_listener(listener(Lifeline { keep_alive: true, ..Default::default() }));
        log.clear();

        tree.die(parent);
        assert!(tree.is_dying(child));
        assert_eq!(tree.lifecycle(child), Some(Lifecycle::Live));
        assert_eq!(log.take(), vec!["parent:die"]);
    }

    // ── Listeners ───────────────────────────────────────────────────

    #[test]
    fn test_local_listeners_run_before_global() {
        #[derive(Clone)]
        struct Named(&'static str, Rc<RefCell<Vec<&'static str>>>);
        impl ElementListener for Named {
            fn on_element_dying(&mut self, _tree: &mut ElementTree, _element: ElementId) -> bool {
                self.1.borrow_mut().push(self.0);
                false
            }
        }

        let order = Rc::new(RefCell::new(Vec::new()));
        let (mut tree, [a, _, _, _]) = sample();
        tree.add_global_listener(listener(Named("global", order.clone())));
        tree.add_listener(a, listener(Named("local", order.clone())));
        tree.die(a);
        assert_eq!(*order.borrow(), vec!["local", "global"]);
    }

    #[test]
    fn test_weak_pointer_clears_on_delete() {
        let (mut tree, [a, b, a1, _]) = sample();
        let weak = WeakElementPointer::new();
        weak.reset(&mut tree, Some(a1));
        assert_eq!(weak.get(), Some(a1));

        weak.reset(&mut tree, Some(b));
        assert_eq!(tree.elements[a1].listeners.len(), 0);
        assert_eq!(tree.elements[b].listeners.len(), 1);

        tree.delete(a);
        assert_eq!(weak.get(), Some(b));
        tree.delete(b);
        assert_eq!(weak.get(), None);
        assert!(!weak.is_set());
    }

    #[test]
    fn test_dropped_weak_pointer_unregisters() {
        let (mut tree, [a, b, _, _]) = sample();
        let weak = WeakElementPointer::new();
        weak.reset(&mut tree, Some(b));
        let copy = weak.clone();
        drop(weak);
        assert_eq!(tree.elements[b].listeners.len(), 1);

        drop(copy);
        let other = WeakElementPointer::new();
        other.reset(&mut tree, Some(a));
        assert_eq!(tree.elements[b].listeners.len(), 0);
        assert_eq!(tree.elements[a].listeners.len(), 1);
    }

    // ── Properties ──────────────────────────────────────────────────

    #[test]
    fn test_effective_interactability() {
        let (mut tree, [a, _, a1, _]) = sample();
        assert!(tree.is_interactable(a1));

        tree.set_visibility(a, Visibility::Invisible);
        assert!(!tree.computed_visibility(a1));
        assert!(!tree.is_interactable(a1));
        tree.set_visibility(a, Visibility::Visible);

        tree.set_state(a, State::DISABLED, true);
        assert!(!tree.is_enabled(a1));
        assert!(!tree.is_interactable(a1));
        tree.set_state(a, State::DISABLED, false);

        tree.set_opacity(a1, 0.0);
        assert!(!tree.is_interactable(a1));
        tree.set_opacity(a1, 1.0);

        tree.set_opacity(a, 0.0);
        assert!(!tree.computed_visibility(a1));
        assert!(!tree.is_interactable(a1));
        tree.set_opacity(a, 1.0);

        tree.set_opacity(a1, 2.0);
        assert_eq!(tree.opacity(a1), 1.0);

        tree.set_flag(a1, ElementFlags::IGNORE_INPUT, true);
        assert!(!tree.is_interactable(a1));
    }

    #[test]
    fn test_behavior_downcast_and_values() {
        let mut tree = ElementTree::new();
        let e = tree.create(Probe::new("e"));
        tree.set_text(e, "hello");
        tree.set_value(e, 7);
        assert_eq!(tree.text(e), "hello");
        assert_eq!(tree.value(e), 7);
        assert_eq!(tree.behavior::<Probe>(e).map(|p| p.text()), Some("hello".to_string()));
        assert!(tree.behavior::<DefaultBehavior>(e).is_none());
        assert_eq!(tree.type_name(e), "e");
    }
}
