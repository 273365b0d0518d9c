//! Shared named values that keep connected elements in sync.
//!
//! An element connected to a value shows that value. When the element
//! changes (it invokes a `Changed` event), the value is read back from it and
//! pushed to every other connected element. Values are typed: string values
//! sync through text, int and null values through `value`, float values
//! through `double_value`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{trace, warn};

use super::tree::ElementTree;
use super::types::ElementId;
use crate::id::HashId;
use crate::value::{Value, ValueType};

/// Observer of shared value changes.
pub trait ValueGroupListener {
    fn on_value_changed(&mut self, name: HashId, value: &Value);
}

pub type ValueListenerRef = Rc<RefCell<dyn ValueGroupListener>>;

/// One named value and the elements showing it.
#[derive(Debug)]
pub struct ElementValue {
    name: HashId,
    value: Value,
    connections: Vec<ElementId>,
    /// Set while pushing to elements, so their change events don't loop back.
    syncing: bool,
}

impl ElementValue {
    fn new(name: HashId, value_type: ValueType) -> Self {
        let value = match value_type {
            ValueType::String => Value::String(String::new()),
            ValueType::Int => Value::Int(0),
            ValueType::Float => Value::Float(0.0),
            _ => Value::Null,
        };
        Self { name, value, connections: Vec::new(), syncing: false }
    }

    pub fn name(&self) -> HashId {
        self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn connections(&self) -> &[ElementId] {
        &self.connections
    }
}

/// All shared values of a tree.
#[derive(Default)]
pub struct ElementValueGroup {
    values: HashMap<HashId, ElementValue>,
    listeners: Vec<ValueListenerRef>,
}

impl ElementValueGroup {
    pub fn get(&self, name: HashId) -> Option<&ElementValue> {
        self.values.get(&name)
    }
}

impl ElementTree {
    /// Create the shared value `name` unless it exists. Returns its current value.
    pub fn create_shared_value(&mut self, name: impl Into<HashId>, value_type: ValueType) -> &Value {
        let name = name.into();
        &self
            .values
            .values
            .entry(name)
            .or_insert_with(|| ElementValue::new(name, value_type))
            .value
    }

    pub fn shared_value(&self, name: impl Into<HashId>) -> Option<&ElementValue> {
        self.values.get(name.into())
    }

    pub fn add_value_listener(&mut self, listener: ValueListenerRef) {
        self.values.listeners.push(listener);
    }

    pub fn remove_value_listener(&mut self, listener: &ValueListenerRef) {
        self.values.listeners.retain(|l| !Rc::ptr_eq(l, listener));
    }

    /// Connect `id` to the shared value `name` and show the value on it.
    /// An existing connection is dropped first. The value must exist.
    pub fn connect_value(&mut self, id: ElementId, name: impl Into<HashId>) -> bool {
        let name = name.into();
        if !self.contains(id) || !self.values.values.contains_key(&name) {
            warn!(element = ?id, ?name, "connect to a missing element or value");
            return false;
        }
        self.disconnect_value(id);
        if let Some(shared) = self.values.values.get_mut(&name) {
            shared.connections.push(id);
        }
        if let Some(data) = self.elements.get_mut(id) {
            data.connection = Some(name);
        }
        self.sync_value_to_element(name, id);
        true
    }

    /// Drop the element's value connection, if any.
    pub fn disconnect_value(&mut self, id: ElementId) {
        let Some(name) = self.elements.get_mut(id).and_then(|d| d.connection.take()) else {
            return;
        };
        if let Some(shared) = self.values.values.get_mut(&name) {
            shared.connections.retain(|&c| c != id);
        }
    }

    /// The shared value the element is connected to.
    pub fn connection(&self, id: ElementId) -> Option<HashId> {
        self.elements.get(id).and_then(|d| d.connection)
    }

    pub fn set_shared_integer(&mut self, name: impl Into<HashId>, value: i32) {
        self.set_shared(name.into(), Value::Int(value));
    }

    pub fn set_shared_double(&mut self, name: impl Into<HashId>, value: f64) {
        self.set_shared(name.into(), Value::Float(value));
    }

    pub fn set_shared_text(&mut self, name: impl Into<HashId>, text: &str) {
        self.set_shared(name.into(), Value::String(text.to_string()));
    }

    fn set_shared(&mut self, name: HashId, value: Value) {
        let Some(shared) = self.values.values.get_mut(&name) else {
            warn!(?name, "set on a missing shared value");
            return;
        };
        shared.value = value;
        self.sync_value_to_elements(name, None);
    }

    /// Read the value back from a connected element after it changed.
    pub(crate) fn sync_value_from_element(&mut self, id: ElementId) {
        let Some(name) = self.connection(id) else {
            return;
        };
        let Some(shared) = self.values.values.get(&name) else {
            return;
        };
        if shared.syncing {
            return;
        }
        let value = match shared.value.value_type() {
            ValueType::String => Value::String(self.text(id)),
            ValueType::Null | ValueType::Int => Value::Int(self.value(id)),
            ValueType::Float => Value::Float(self.double_value(id)),
            other => {
                warn!(?name, ?other, "shared value type can't sync from elements");
                return;
            }
        };
        trace!(?name, ?value, "shared value read from element");
        if let Some(shared) = self.values.values.get_mut(&name) {
            shared.value = value;
        }
        self.sync_value_to_elements(name, Some(id));
    }

    fn sync_value_to_elements(&mut self, name: HashId, exclude: Option<ElementId>) {
        let Some(shared) = self.values.values.get(&name) else {
            return;
        };
        let value = shared.value.clone();
        let connections = shared.connections.clone();
        for listener in self.values.listeners.clone() {
            match listener.try_borrow_mut() {
                Ok(mut listener) => listener.on_value_changed(name, &value),
                Err(_) => warn!(?name, "value listener re-entered; call skipped"),
            }
        }
        for element in connections {
            if Some(element) != exclude && self.connection(element) == Some(name) {
                self.sync_value_to_element(name, element);
            }
        }
    }

    fn sync_value_to_element(&mut self, name: HashId, id: ElementId) {
        let Some(shared) = self.values.values.get_mut(&name) else {
            return;
        };
        if shared.syncing {
            return;
        }
        shared.syncing = true;
        let value = shared.value.clone();
        match value.value_type() {
            ValueType::String => self.set_text(id, &value.as_string()),
            ValueType::Null | ValueType::Int => self.set_value(id, value.as_int()),
            ValueType::Float => self.set_double_value(id, value.as_float()),
            _ => {}
        }
        if let Some(shared) = self.values.values.get_mut(&name) {
            shared.syncing = false;
        }
    }
}
