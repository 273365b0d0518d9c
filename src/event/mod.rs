//! Events and listeners: event types, element listeners, weak element pointers.

pub mod input;
pub mod listener;

pub use input::{Event, EventType, Modifiers, SpecialKey};
pub use listener::{listener, ElementListener, ListenerRef, WeakElementPointer};
