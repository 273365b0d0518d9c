//! Time-based animations driven by the element tree's clock.
//!
//! [`AnimationManager`] is generic over its [`AnimationHost`] so animations can
//! mutate whatever owns the manager. [`ElementTree`](crate::element::ElementTree)
//! is the host in practice; see [`element`] for the stock element animations.

pub mod curve;
pub mod element;
pub mod manager;

pub use curve::AnimationCurve;
pub use element::{ElementAnimationListener, OpacityAnimation, RectAnimation, RectMode, ALMOST_ZERO_OPACITY};
pub use manager::{
    Animation, AnimationBlocker, AnimationHost, AnimationId, AnimationManager, AnimationTime,
};
