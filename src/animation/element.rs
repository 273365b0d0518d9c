//! Animations of element properties, and the listener that fades forms in and out.

use tracing::debug;

use super::curve::AnimationCurve;
use super::manager::{Animation, AnimationHost, AnimationManager, AnimationTime};
use crate::element::{ElementId, ElementTree};
use crate::event::{listener, ElementListener, ListenerRef};
use crate::geometry::Rect;

/// Lowest opacity used for fades. Zero would make the element unfocusable
/// while it fades in.
pub const ALMOST_ZERO_OPACITY: f32 = 0.001;

impl AnimationHost for ElementTree {
    type Owner = ElementId;

    fn animation_manager(&self) -> &AnimationManager<Self> {
        &self.animations
    }

    fn animation_manager_mut(&mut self) -> &mut AnimationManager<Self> {
        &mut self.animations
    }

    fn clock_ms(&self) -> u64 {
        self.now_ms
    }
}

/// Fades an element between two opacities.
///
/// With `die` set the animation holds a keep-alive on a dying element and
/// releases it when it stops, which lets the element finish dying.
#[derive(Debug, Clone, Copy)]
pub struct OpacityAnimation {
    element: ElementId,
    src: f32,
    dst: f32,
    die: bool,
}

impl OpacityAnimation {
    pub fn new(element: ElementId, src: f32, dst: f32, die: bool) -> Self {
        Self { element, src, dst, die }
    }
}

impl Animation<ElementTree> for OpacityAnimation {
    fn on_start(&mut self, tree: &mut ElementTree) {
        tree.set_opacity(self.element, self.src);
    }

    fn on_update(&mut self, tree: &mut ElementTree, progress: f32) {
        tree.set_opacity(self.element, self.src + (self.dst - self.src) * progress);
    }

    fn on_stop(&mut self, tree: &mut ElementTree, _aborted: bool) {
        if self.die {
            tree.release_keep_alive(self.element);
        } else {
            tree.set_opacity(self.element, self.dst);
        }
    }

    fn owner(&self) -> Option<ElementId> {
        Some(self.element)
    }
}

/// How a [`RectAnimation`] picks its end points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RectMode {
    SrcToDest,
    /// From the current rect to the current rect offset by the delta.
    DeltaIn,
    /// From the current rect offset by the delta back to the current rect.
    DeltaOut,
}

/// Moves and resizes an element.
///
/// The delta modes read the element's rect at the first update. If it has
/// not been laid out yet (empty rect) the animation aborts itself.
#[derive(Debug, Clone, Copy)]
pub struct RectAnimation {
    element: ElementId,
    src: Rect,
    dst: Rect,
    delta: Rect,
    mode: RectMode,
}

impl RectAnimation {
    pub fn new(element: ElementId, src: Rect, dst: Rect) -> Self {
        Self { element, src, dst, delta: Rect::EMPTY, mode: RectMode::SrcToDest }
    }

    pub fn with_delta(element: ElementId, delta: Rect, mode: RectMode) -> Self {
        Self { element, src: Rect::EMPTY, dst: Rect::EMPTY, delta, mode }
    }

    fn resolve(&mut self, current: Rect) {
        let moved = Rect::new(
            current.x + self.delta.x,
            current.y + self.delta.y,
            current.w + self.delta.w,
            current.h + self.delta.h,
        );
        match self.mode {
            RectMode::DeltaIn => {
                self.src = current;
                self.dst = moved;
            }
            RectMode::DeltaOut => {
                self.src = moved;
                self.dst = current;
            }
            RectMode::SrcToDest => return,
        }
        self.mode = RectMode::SrcToDest;
    }
}

impl Animation<ElementTree> for RectAnimation {
    fn on_update(&mut self, tree: &mut ElementTree, progress: f32) {
        if self.mode != RectMode::SrcToDest {
            let current = tree.rect(self.element);
            if current == Rect::EMPTY {
                debug!(element = ?self.element, "rect animation started before layout; aborted");
                self.src = current;
                self.dst = current;
                self.mode = RectMode::SrcToDest;
                tree.abort_animations_of(self.element);
                return;
            }
            self.resolve(current);
        }
        tree.set_rect(self.element, self.src.lerp(self.dst, progress));
    }

    fn on_stop(&mut self, tree: &mut ElementTree, aborted: bool) {
        if !aborted && self.mode == RectMode::SrcToDest && self.dst != Rect::EMPTY {
            tree.set_rect(self.element, self.dst);
        }
    }

    fn owner(&self) -> Option<ElementId> {
        Some(self.element)
    }
}

/// Fades forms in when they are added and out when they die, and aborts
/// the animations of deleted elements.
#[derive(Debug, Default)]
pub struct ElementAnimationListener;

impl ElementListener for ElementAnimationListener {
    fn on_element_delete(&mut self, tree: &mut ElementTree, element: ElementId) {
        tree.abort_animations_of(element);
    }

    fn on_element_dying(&mut self, tree: &mut ElementTree, element: ElementId) -> bool {
        if !tree.is_form(element) {
            return false;
        }
        let from = tree.opacity(element);
        let duration = tree.animation_manager().default_duration_ms();
        tree.start_animation_with(
            Box::new(OpacityAnimation::new(element, from, ALMOST_ZERO_OPACITY, true)),
            AnimationCurve::Bezier,
            duration,
            AnimationTime::FirstUpdate,
        );
        true
    }

    fn on_element_added(&mut self, tree: &mut ElementTree, _parent: ElementId, child: ElementId) {
        if !tree.is_form(child) {
            return;
        }
        let duration = tree.animation_manager().default_duration_ms();
        tree.start_animation_with(
            Box::new(OpacityAnimation::new(child, ALMOST_ZERO_OPACITY, 1.0, false)),
            AnimationCurve::Bezier,
            duration,
            AnimationTime::FirstUpdate,
        );
    }
}

impl ElementTree {
    /// Register the [`ElementAnimationListener`] and return its handle.
    pub fn install_element_animations(&mut self) -> ListenerRef {
        let handle: ListenerRef = listener(ElementAnimationListener);
        self.add_global_listener(handle.clone());
        handle
    }
}
