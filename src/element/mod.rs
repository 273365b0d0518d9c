//! The retained element tree.
//!
//! [`ElementTree`] owns every element in an arena and carries the state that
//! spans elements: focus, hover, capture, listeners, shared values and
//! animations. Widgets plug in through [`ElementBehavior`].

mod behavior;
mod connection;
mod focus;
mod input;
mod layout;
mod process;
mod tree;
mod types;

pub use behavior::{DefaultBehavior, ElementBehavior, PaintProps, Painter};
pub use connection::{ElementValue, ElementValueGroup, ValueGroupListener, ValueListenerRef};
pub use tree::ElementTree;
pub use types::{
    Axis, ElementFlags, ElementId, ElementZ, ElementZRel, FocusReason, FormState, Gravity, HitStatus,
    InvalidationMode, InvokeInfo, LayoutParams, Lifecycle, PreferredSize, SizeConstraints, State,
    Visibility, MAX_LAYOUT_SIZE,
};
