//! Element handle, state flags and the small value types used by the tree.

use bitflags::bitflags;
use slotmap::new_key_type;

new_key_type! {
    /// Handle to an element in an [`ElementTree`](super::ElementTree).
    ///
    /// Generational: a handle to a deleted element never aliases a new one.
    pub struct ElementId;
}

bitflags! {
    /// Interaction states. Some are stored, some are added automatically by
    /// [`ElementTree::computed_state`](super::ElementTree::computed_state).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct State: u8 {
        const DISABLED = 1 << 0;
        const FOCUSED  = 1 << 1;
        const PRESSED  = 1 << 2;
        const SELECTED = 1 << 3;
        const HOVERED  = 1 << 4;
    }
}

bitflags! {
    /// Which parent edges a child sticks to when the parent is resized.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Gravity: u8 {
        const LEFT   = 1 << 0;
        const RIGHT  = 1 << 1;
        const TOP    = 1 << 2;
        const BOTTOM = 1 << 3;
        const LEFT_RIGHT = Self::LEFT.bits() | Self::RIGHT.bits();
        const TOP_BOTTOM = Self::TOP.bits() | Self::BOTTOM.bits();
        const ALL = Self::LEFT_RIGHT.bits() | Self::TOP_BOTTOM.bits();
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Gravity::LEFT | Gravity::TOP
    }
}

impl Gravity {
    /// Parse keywords such as `"left right"` or `"all"`.
    ///
    /// An axis with no keyword defaults to left/top.
    pub fn parse(s: &str) -> Gravity {
        let mut gravity = Gravity::empty();
        for (word, flag) in [
            ("left", Gravity::LEFT),
            ("right", Gravity::RIGHT),
            ("top", Gravity::TOP),
            ("bottom", Gravity::BOTTOM),
            ("all", Gravity::ALL),
        ] {
            if s.contains(word) {
                gravity |= flag;
            }
        }
        if !gravity.intersects(Gravity::LEFT_RIGHT) {
            gravity |= Gravity::LEFT;
        }
        if !gravity.intersects(Gravity::TOP_BOTTOM) {
            gravity |= Gravity::TOP;
        }
        gravity
    }
}

bitflags! {
    /// Per-element behavior switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElementFlags: u8 {
        /// Can receive keyboard focus.
        const FOCUSABLE       = 1 << 0;
        /// Enter or space on the focused element produces a click.
        const CLICK_BY_KEY    = 1 << 1;
        /// A held press produces a long-click event.
        const WANT_LONG_CLICK = 1 << 2;
        /// Invisible to hit-testing; pointer events go to what is behind.
        const IGNORE_INPUT    = 1 << 3;
        /// Scope for group ids (e.g. radio buttons).
        const GROUP_ROOT      = 1 << 4;
    }
}

/// Visibility of an element. `Gone` also takes no space in layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Invisible,
    Gone,
}

impl Visibility {
    pub fn parse(s: &str) -> Option<Visibility> {
        match s {
            "visible" => Some(Visibility::Visible),
            "invisible" => Some(Visibility::Invisible),
            "gone" => Some(Visibility::Gone),
            _ => None,
        }
    }
}

/// Layout direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    #[default]
    X,
    Y,
}

impl Axis {
    pub fn parse(s: &str) -> Axis {
        if s == "y" {
            Axis::Y
        } else {
            Axis::X
        }
    }
}

/// Where a new child goes among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementZ {
    /// Last child, painted on top.
    #[default]
    Top,
    /// First child, painted below the others.
    Bottom,
}

/// Placement relative to a reference sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementZRel {
    Before,
    After,
}

/// Whether structural changes notify hooks and listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InvokeInfo {
    #[default]
    Normal,
    NoCallbacks,
}

/// Why focus is being set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FocusReason {
    /// Keyboard navigation (tab).
    Navigation,
    /// Pointer press.
    Pointer,
    #[default]
    Unknown,
}

/// Result of hit-testing a point against an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitStatus {
    NoHit,
    Hit,
    /// Hit, but children must not be tested.
    HitNoChildren,
}

/// How far a layout invalidation travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidationMode {
    TargetOnly,
    Recursive,
}

/// Upper bound for any layout size.
pub const MAX_LAYOUT_SIZE: i32 = 10_000;

/// Space offered to an element when measuring it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeConstraints {
    pub available_w: i32,
    pub available_h: i32,
}

impl SizeConstraints {
    /// No restriction on either axis.
    pub const NONE: SizeConstraints = SizeConstraints {
        available_w: MAX_LAYOUT_SIZE,
        available_h: MAX_LAYOUT_SIZE,
    };

    pub const fn new(available_w: i32, available_h: i32) -> Self {
        Self { available_w, available_h }
    }

    /// Remove padding from the available space. Unrestricted axes stay unrestricted.
    pub fn shrink_by(self, horizontal: i32, vertical: i32) -> SizeConstraints {
        let shrink = |available: i32, by: i32| {
            if available == MAX_LAYOUT_SIZE {
                available
            } else {
                (available - by).max(0)
            }
        };
        SizeConstraints {
            available_w: shrink(self.available_w, horizontal),
            available_h: shrink(self.available_h, vertical),
        }
    }

    /// Cap the available space by the explicit maximums in `lp`.
    pub fn constrain_by(self, lp: &LayoutParams) -> SizeConstraints {
        SizeConstraints {
            available_w: lp.max_w.map_or(self.available_w, |m| self.available_w.min(m)),
            available_h: lp.max_h.map_or(self.available_h, |m| self.available_h.min(m)),
        }
    }
}

impl Default for SizeConstraints {
    fn default() -> Self {
        SizeConstraints::NONE
    }
}

/// Measured size range of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreferredSize {
    pub min_w: i32,
    pub min_h: i32,
    pub max_w: i32,
    pub max_h: i32,
    pub pref_w: i32,
    pub pref_h: i32,
}

impl PreferredSize {
    /// A fixed size: min, max and preferred all equal.
    pub const fn fixed(w: i32, h: i32) -> Self {
        Self { min_w: w, min_h: h, max_w: w, max_h: h, pref_w: w, pref_h: h }
    }

    /// Apply explicit overrides, then restore `min <= pref <= max`.
    pub fn apply(mut self, lp: &LayoutParams) -> PreferredSize {
        let overrides = [
            (lp.min_w, &mut self.min_w),
            (lp.min_h, &mut self.min_h),
            (lp.max_w, &mut self.max_w),
            (lp.max_h, &mut self.max_h),
            (lp.pref_w, &mut self.pref_w),
            (lp.pref_h, &mut self.pref_h),
        ];
        for (param, field) in overrides {
            if let Some(v) = param {
                *field = v;
            }
        }
        self.max_w = self.max_w.max(self.min_w);
        self.max_h = self.max_h.max(self.min_h);
        self.pref_w = self.pref_w.clamp(self.min_w, self.max_w);
        self.pref_h = self.pref_h.clamp(self.min_h, self.max_h);
        self
    }
}

impl Default for PreferredSize {
    fn default() -> Self {
        Self { min_w: 0, min_h: 0, max_w: MAX_LAYOUT_SIZE, max_h: MAX_LAYOUT_SIZE, pref_w: 0, pref_h: 0 }
    }
}

/// Explicit size overrides. Unset fields leave the measured value alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LayoutParams {
    pub min_w: Option<i32>,
    pub min_h: Option<i32>,
    pub max_w: Option<i32>,
    pub max_h: Option<i32>,
    pub pref_w: Option<i32>,
    pub pref_h: Option<i32>,
}

impl LayoutParams {
    /// Fix the size on both axes.
    pub fn fixed(w: i32, h: i32) -> Self {
        let mut lp = Self::default();
        lp.set_width(w);
        lp.set_height(h);
        lp
    }

    /// Fix the width: min, max and preferred.
    pub fn set_width(&mut self, w: i32) {
        self.min_w = Some(w);
        self.max_w = Some(w);
        self.pref_w = Some(w);
    }

    /// Fix the height: min, max and preferred.
    pub fn set_height(&mut self, h: i32) {
        self.min_h = Some(h);
        self.max_h = Some(h);
        self.pref_h = Some(h);
    }
}

/// Two-phase delete state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifecycle {
    #[default]
    Live,
    /// Kept alive by `holds` listeners; deleted when the last one releases.
    Dying { holds: u32 },
}

/// Top-level focus scope bookkeeping for elements acting as forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormState {
    pub active: bool,
    /// Forms that can't activate never hold back focus.
    pub can_activate: bool,
    /// Focus to restore when the form becomes active.
    pub last_focus: Option<ElementId>,
}

impl Default for FormState {
    fn default() -> Self {
        Self { active: false, can_activate: true, last_focus: None }
    }
}
