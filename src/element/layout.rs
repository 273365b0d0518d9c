//! Geometry, measurement and layout invalidation.

use super::tree::ElementTree;
use super::types::{
    ElementId, Gravity, InvalidationMode, LayoutParams, PreferredSize, SizeConstraints, Visibility,
};
use crate::geometry::{Point, Rect, Spacing};

impl ElementTree {
    /// The element's rect, relative to its parent.
    pub fn rect(&self, id: ElementId) -> Rect {
        self.elements.get(id).map_or(Rect::EMPTY, |d| d.rect)
    }

    /// Move and resize. A size change calls `on_resized`; unless the behavior
    /// lays out its children itself, they follow their gravity.
    pub fn set_rect(&mut self, id: ElementId, rect: Rect) {
        let Some(data) = self.elements.get_mut(id) else {
            return;
        };
        let old = data.rect;
        if old == rect {
            return;
        }
        data.rect = rect;
        if old.w != rect.w || old.h != rect.h {
            let handled = self
                .with_behavior(id, |b, tree| b.on_resized(tree, id, old.w, old.h))
                .unwrap_or(true);
            if !handled {
                self.apply_gravity(id, rect.w - old.w, rect.h - old.h);
            }
        }
        self.invalidate(id);
    }

    pub fn set_size(&mut self, id: ElementId, w: i32, h: i32) {
        let rect = self.rect(id);
        self.set_rect(id, Rect::new(rect.x, rect.y, w, h));
    }

    pub fn set_position(&mut self, id: ElementId, x: i32, y: i32) {
        let rect = self.rect(id);
        self.set_rect(id, Rect::new(x, y, rect.w, rect.h));
    }

    fn apply_gravity(&mut self, id: ElementId, dw: i32, dh: i32) {
        let children = self.children(id).to_vec();
        for child in children {
            if self.visibility(child) == Visibility::Gone {
                continue;
            }
            let gravity = self.gravity(child);
            let mut rect = self.rect(child);
            if gravity.contains(Gravity::LEFT_RIGHT) {
                rect.w += dw;
            } else if gravity.contains(Gravity::RIGHT) {
                rect.x += dw;
            }
            if gravity.contains(Gravity::TOP_BOTTOM) {
                rect.h += dh;
            } else if gravity.contains(Gravity::BOTTOM) {
                rect.y += dh;
            }
            self.set_rect(child, rect);
        }
    }

    pub fn padding(&self, id: ElementId) -> Spacing {
        self.elements.get(id).map_or_else(Spacing::default, |d| d.padding)
    }

    pub fn set_padding(&mut self, id: ElementId, padding: Spacing) {
        if let Some(data) = self.elements.get_mut(id) {
            if data.padding != padding {
                data.padding = padding;
                self.invalidate_layout(id, InvalidationMode::Recursive);
            }
        }
    }

    /// The element's local bounds minus padding.
    pub fn padding_rect(&self, id: ElementId) -> Rect {
        let rect = self.rect(id);
        Rect::new(0, 0, rect.w, rect.h).shrink(self.padding(id))
    }

    pub fn layout_params(&self, id: ElementId) -> Option<LayoutParams> {
        self.elements.get(id).and_then(|d| d.layout_params)
    }

    pub fn set_layout_params(&mut self, id: ElementId, lp: LayoutParams) {
        if let Some(data) = self.elements.get_mut(id) {
            data.layout_params = Some(lp);
            self.invalidate_layout(id, InvalidationMode::Recursive);
        }
    }

    /// Measure the element, using the cached result when the constraints match.
    ///
    /// Layout params cap the constraints before measuring and override the
    /// result afterwards.
    pub fn get_preferred_size(&mut self, id: ElementId, constraints: SizeConstraints) -> PreferredSize {
        let Some(data) = self.elements.get(id) else {
            return PreferredSize::default();
        };
        let lp = data.layout_params;
        let constraints = match &lp {
            Some(lp) => constraints.constrain_by(lp),
            None => constraints,
        };
        if let Some((cached_constraints, cached)) = data.cached_size {
            if cached_constraints == constraints {
                return cached;
            }
        }

        let measured = self
            .with_behavior(id, |b, tree| b.calculate_preferred_size(tree, id, constraints))
            .unwrap_or_default();
        let measured = match &lp {
            Some(lp) => measured.apply(lp),
            None => measured,
        };
        if let Some(data) = self.elements.get_mut(id) {
            data.cached_size = Some((constraints, measured));
        }
        measured
    }

    /// The union of the children's size ranges, gone children excluded.
    pub fn largest_child_preferred_size(&mut self, id: ElementId, constraints: SizeConstraints) -> PreferredSize {
        let mut ps = PreferredSize::default();
        for child in self.children(id).to_vec() {
            if self.visibility(child) == Visibility::Gone {
                continue;
            }
            let child_ps = self.get_preferred_size(child, constraints);
            ps.min_w = ps.min_w.max(child_ps.min_w);
            ps.min_h = ps.min_h.max(child_ps.min_h);
            ps.pref_w = ps.pref_w.max(child_ps.pref_w);
            ps.pref_h = ps.pref_h.max(child_ps.pref_h);
            ps.max_w = ps.max_w.max(child_ps.max_w);
            ps.max_h = ps.max_h.max(child_ps.max_h);
        }
        ps
    }

    /// Drop the cached measurement.
    ///
    /// With [`InvalidationMode::Recursive`] the ancestors are invalidated too,
    /// until one's `on_invalidate_layout` stops it. Gone elements stop the walk.
    pub fn invalidate_layout(&mut self, id: ElementId, mode: InvalidationMode) {
        let mut current = Some(id);
        while let Some(element) = current {
            let Some(data) = self.elements.get_mut(element) else {
                return;
            };
            data.cached_size = None;
            if data.visibility == Visibility::Gone {
                return;
            }
            self.invalidate(element);
            if mode != InvalidationMode::Recursive {
                return;
            }
            let proceed = self
                .with_behavior(element, |b, tree| b.on_invalidate_layout(tree, element, mode))
                .unwrap_or(false);
            current = if proceed { self.parent(element) } else { None };
        }
    }

    /// Whether the element has an up-to-date measurement.
    pub fn has_cached_size(&self, id: ElementId) -> bool {
        self.elements.get(id).is_some_and(|d| d.cached_size.is_some())
    }

    /// Resize to the preferred size, keeping the position.
    pub fn resize_to_fit_content(&mut self, id: ElementId) {
        let ps = self.get_preferred_size(id, SizeConstraints::NONE);
        self.set_size(id, ps.pref_w, ps.pref_h);
    }

    /// Convert a point in `id`'s coordinates to root coordinates.
    pub fn convert_to_root(&self, id: ElementId, point: Point) -> Point {
        let mut point = point;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            let rect = self.rect(current);
            point = point + Point::new(rect.x, rect.y);
            point = point + self.behavior_ref(parent).child_translation(self, parent);
            current = parent;
        }
        point
    }

    /// Convert a point in root coordinates to `id`'s coordinates.
    pub fn convert_from_root(&self, id: ElementId, point: Point) -> Point {
        point - self.convert_to_root(id, Point::default())
    }

    /// The element's rect in root coordinates.
    pub fn root_rect(&self, id: ElementId) -> Rect {
        let rect = self.rect(id);
        let origin = self.convert_to_root(id, Point::default());
        Rect::new(origin.x, origin.y, rect.w, rect.h)
    }
}
