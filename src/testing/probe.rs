//! A configurable behavior that records the hooks it receives.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::element::{ElementBehavior, ElementId, ElementTree, HitStatus, PreferredSize, SizeConstraints};
use crate::event::{Event, EventType};

// ---------------------------------------------------------------------------
// HookLog
// ---------------------------------------------------------------------------

/// Shared, ordered record of hook calls. Clones append to the same list.
#[derive(Debug, Clone, Default)]
pub struct HookLog(Rc<RefCell<Vec<String>>>);

impl HookLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Return the entries so far and start over.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

// ---------------------------------------------------------------------------
// Probe
// ---------------------------------------------------------------------------

/// A stand-in widget for tests.
///
/// Its type name is the name it was created with. It stores a text and a
/// number, so it can act as a label, a check box or a slider. Structure,
/// focus, event and processing hooks are written to a [`HookLog`] as
/// `"name:hook"` entries.
#[derive(Debug)]
pub struct Probe {
    name: String,
    log: Option<HookLog>,
    text: String,
    number: f64,
    handled: Vec<EventType>,
    destination: Option<ElementId>,
    hit_no_children: bool,
    content_size: Option<PreferredSize>,
    measures: Rc<Cell<u32>>,
    emits_changed: bool,
}

impl Probe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            log: None,
            text: String::new(),
            number: 0.0,
            handled: Vec::new(),
            destination: None,
            hit_no_children: false,
            content_size: None,
            measures: Rc::new(Cell::new(0)),
            emits_changed: false,
        }
    }

    pub fn with_log(mut self, log: &HookLog) -> Self {
        self.log = Some(log.clone());
        self
    }

    /// Report events of `kind` as handled, which stops bubbling.
    pub fn handling(mut self, kind: EventType) -> Self {
        self.handled.push(kind);
        self
    }

    /// Send unhandled events to `destination` instead of the parent.
    pub fn with_destination(mut self, destination: ElementId) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Hide children from hit-testing.
    pub fn hit_no_children(mut self) -> Self {
        self.hit_no_children = true;
        self
    }

    /// Measure as `size` instead of the largest child.
    pub fn with_content_size(mut self, size: PreferredSize) -> Self {
        self.content_size = Some(size);
        self
    }

    /// Invoke a `Changed` event when the value or text changes.
    pub fn emits_changed(mut self) -> Self {
        self.emits_changed = true;
        self
    }

    /// Counter of content measurements, readable after the probe is moved
    /// into a tree.
    pub fn measure_count(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.measures)
    }

    fn record(&self, hook: std::fmt::Arguments<'_>) {
        if let Some(log) = &self.log {
            log.push(format!("{}:{}", self.name, hook));
        }
    }

    fn changed(&self, tree: &mut ElementTree, id: ElementId) {
        if self.emits_changed {
            tree.invoke_event(id, Event::new(EventType::Changed));
        }
    }
}

impl ElementBehavior for Probe {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn on_event(&mut self, _tree: &mut ElementTree, _id: ElementId, event: &Event) -> bool {
        let positioned = matches!(
            event.kind,
            EventType::Click
                | EventType::LongClick
                | EventType::ContextMenu
                | EventType::PointerDown
                | EventType::PointerUp
                | EventType::PointerMove
                | EventType::Wheel
        );
        if positioned {
            self.record(format_args!("event({:?}@{},{})", event.kind, event.x, event.y));
        } else {
            self.record(format_args!("event({:?})", event.kind));
        }
        self.handled.contains(&event.kind)
    }

    fn event_destination(&self, tree: &ElementTree, id: ElementId) -> Option<ElementId> {
        self.destination.or_else(|| tree.parent(id))
    }

    fn on_added(&mut self, _tree: &mut ElementTree, _id: ElementId) {
        self.record(format_args!("added"));
    }

    fn on_remove(&mut self, _tree: &mut ElementTree, _id: ElementId) {
        self.record(format_args!("remove"));
    }

    fn on_child_added(&mut self, _tree: &mut ElementTree, _id: ElementId, _child: ElementId) {
        self.record(format_args!("child_added"));
    }

    fn on_child_remove(&mut self, _tree: &mut ElementTree, _id: ElementId, _child: ElementId) {
        self.record(format_args!("child_remove"));
    }

    fn on_die(&mut self, _tree: &mut ElementTree, _id: ElementId) {
        self.record(format_args!("die"));
    }

    fn on_focus_changed(&mut self, _tree: &mut ElementTree, _id: ElementId, focused: bool) {
        self.record(format_args!("focus({focused})"));
    }

    fn hit_status(&self, tree: &ElementTree, id: ElementId, x: i32, y: i32) -> HitStatus {
        let rect = tree.rect(id);
        let inside = x >= 0 && y >= 0 && x < rect.w && y < rect.h;
        match (inside, self.hit_no_children) {
            (false, _) => HitStatus::NoHit,
            (true, false) => HitStatus::Hit,
            (true, true) => HitStatus::HitNoChildren,
        }
    }

    fn on_process_states(&mut self, _tree: &mut ElementTree, _id: ElementId) {
        self.record(format_args!("process_states"));
    }

    fn on_process(&mut self, _tree: &mut ElementTree, _id: ElementId) {
        self.record(format_args!("process"));
    }

    fn on_process_after_children(&mut self, _tree: &mut ElementTree, _id: ElementId) {
        self.record(format_args!("process_after"));
    }

    fn calculate_preferred_content_size(
        &mut self,
        tree: &mut ElementTree,
        id: ElementId,
        constraints: SizeConstraints,
    ) -> PreferredSize {
        self.measures.set(self.measures.get() + 1);
        match self.content_size {
            Some(size) => size,
            None => tree.largest_child_preferred_size(id, constraints),
        }
    }

    fn value(&self) -> i32 {
        self.number as i32
    }

    fn set_value(&mut self, tree: &mut ElementTree, id: ElementId, value: i32) {
        self.set_double_value(tree, id, f64::from(value));
    }

    fn double_value(&self) -> f64 {
        self.number
    }

    fn set_double_value(&mut self, tree: &mut ElementTree, id: ElementId, value: f64) {
        if self.number != value {
            self.number = value;
            self.changed(tree, id);
        }
    }

    fn text(&self) -> String {
        self.text.clone()
    }

    fn set_text(&mut self, tree: &mut ElementTree, id: ElementId, text: &str) {
        if self.text != text {
            self.text = text.to_owned();
            self.changed(tree, id);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
