//! Headless testing helpers: Pilot, Probe, snapshot helpers.
//!
//! Use the [`Pilot`] to drive an [`ElementTree`](crate::element::ElementTree)
//! with clicks, keys and elapsed time. [`Probe`] is a stand-in widget that
//! logs its hooks to a [`HookLog`]. [`dump_tree`] and [`PaintLog`] turn a tree
//! into plain data for assertions.

pub mod pilot;
pub mod probe;
pub mod snapshot;

pub use pilot::Pilot;
pub use probe::{HookLog, Probe};
pub use snapshot::{dump_tree, PaintCall, PaintLog};
