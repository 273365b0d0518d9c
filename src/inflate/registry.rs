//! Name to behavior factory mapping used while inflating.

use std::collections::HashMap;
use std::fmt;

use crate::element::{DefaultBehavior, ElementBehavior};
use crate::value::ValueType;

type Factory = Box<dyn Fn() -> Box<dyn ElementBehavior>>;

struct Inflater {
    factory: Factory,
    sync_type: ValueType,
}

/// The element types that can be created from a document.
///
/// Node names without an entry are treated as properties of their parent.
/// A new registry knows `Element`, a plain container.
pub struct InflaterRegistry {
    inflaters: HashMap<String, Inflater>,
}

impl InflaterRegistry {
    pub fn new() -> Self {
        let mut registry = Self { inflaters: HashMap::new() };
        registry.register("Element", ValueType::Null, || DefaultBehavior);
        registry
    }

    /// Register `name`. `sync_type` decides how a `value` property is applied
    /// and what type a `connection` creates. A later registration of the same
    /// name replaces the earlier one.
    pub fn register<B, F>(&mut self, name: impl Into<String>, sync_type: ValueType, factory: F)
    where
        B: ElementBehavior + 'static,
        F: Fn() -> B + 'static,
    {
        let factory: Factory = Box::new(move || Box::new(factory()));
        self.inflaters.insert(name.into(), Inflater { factory, sync_type });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inflaters.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inflaters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inflaters.is_empty()
    }

    /// A fresh behavior for `name` with its sync type.
    pub fn create(&self, name: &str) -> Option<(Box<dyn ElementBehavior>, ValueType)> {
        self.inflaters.get(name).map(|i| ((i.factory)(), i.sync_type))
    }
}

impl Default for InflaterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InflaterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.inflaters.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("InflaterRegistry").field("names", &names).finish()
    }
}
