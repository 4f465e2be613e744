/// Viewport nodes: a logical coordinate space fitted into the parent viewport.
///
/// A viewport asks for a logical size. Depending on its scale mode it is
/// scaled uniformly so that the requested width and/or height fits the parent,
/// then optionally extended along an axis so it covers the parent completely.
/// What remains of the parent is distributed according to the alignment
/// (0 = left/top, 0.5 = centered, 1 = right/bottom).

use bitflags::bitflags;
use glam::{Mat4, Vec2, Vec3};

use crate::math::Rect;
use crate::scene::node_2d::Node2D;

bitflags! {
    /// How a viewport fits its requested size into the parent viewport
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ScaleMode: u32 {
        /// Scale so the requested width matches the parent width
        const SCALE_BY_WIDTH = 1 << 0;
        /// Scale so the requested height matches the parent height
        const SCALE_BY_HEIGHT = 1 << 1;
        /// Grow the logical width to cover the parent after scaling
        const EXTEND_WIDTH = 1 << 2;
        /// Grow the logical height to cover the parent after scaling
        const EXTEND_HEIGHT = 1 << 3;
        /// Largest scale at which the whole requested area fits
        const SCALE_BY_WIDTH_OR_HEIGHT = Self::SCALE_BY_WIDTH.bits() | Self::SCALE_BY_HEIGHT.bits();
    }
}

impl ScaleMode {
    /// Take the size of the parent viewport as is
    pub const INHERIT: Self = Self::empty();
}

/// Result of fitting a requested size into a parent size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportFit {
    /// Logical size seen by the children
    pub size: Vec2,
    /// Uniform scale from logical units to parent units
    pub scale: f32,
    /// Position of the logical origin in the parent
    pub offset: Vec2,
}

/// Fit `requested` into `parent` according to `mode` and `alignment`
pub fn fit_viewport(requested: Vec2, mode: ScaleMode, alignment: Vec2, parent: Vec2) -> ViewportFit {
    if mode == ScaleMode::INHERIT || requested.x <= 0.0 || requested.y <= 0.0 {
        return ViewportFit { size: parent, scale: 1.0, offset: Vec2::ZERO };
    }

    let scale_w = parent.x / requested.x;
    let scale_h = parent.y / requested.y;
    let scale = match (mode.contains(ScaleMode::SCALE_BY_WIDTH), mode.contains(ScaleMode::SCALE_BY_HEIGHT)) {
        (true, true) => scale_w.min(scale_h),
        (true, false) => scale_w,
        (false, true) => scale_h,
        (false, false) => 1.0,
    };

    let mut size = requested;
    if scale > 0.0 {
        if mode.contains(ScaleMode::EXTEND_WIDTH) {
            size.x = size.x.max(parent.x / scale);
        }
        if mode.contains(ScaleMode::EXTEND_HEIGHT) {
            size.y = size.y.max(parent.y / scale);
        }
    }

    let offset = (parent - size * scale) * alignment;
    ViewportFit { size, scale, offset }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Placement of the viewport inside its parent
    pub transform: Node2D,
    requested: Vec2,
    scale_mode: ScaleMode,
    alignment: Vec2,
    rect: Rect,
    fit: ViewportFit,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Vec2::ZERO, ScaleMode::INHERIT)
    }
}

impl Viewport {
    pub fn new(requested: Vec2, scale_mode: ScaleMode) -> Self {
        Self {
            transform: Node2D::default(),
            requested,
            scale_mode,
            alignment: Vec2::splat(0.5),
            rect: Rect::default(),
            fit: ViewportFit { size: Vec2::ZERO, scale: 1.0, offset: Vec2::ZERO },
        }
    }

    pub fn requested_size(&self) -> Vec2 {
        self.requested
    }

    pub fn set_requested_size(&mut self, size: Vec2) {
        self.requested = size;
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    pub fn set_scale_mode(&mut self, mode: ScaleMode) {
        self.scale_mode = mode;
    }

    pub fn alignment(&self) -> Vec2 {
        self.alignment
    }

    pub fn set_alignment(&mut self, alignment: Vec2) {
        self.alignment = alignment;
    }

    /// Logical rectangle as of the last transform update
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Scale to the parent as of the last transform update
    pub fn scale(&self) -> f32 {
        self.fit.scale
    }

    /// Refit into `parent` and return the local transform
    ///
    /// The previous rectangle is returned alongside when it changed.
    pub(crate) fn compute_local_transform(&mut self, parent: Vec2) -> (Mat4, Option<Rect>) {
        self.fit = fit_viewport(self.requested, self.scale_mode, self.alignment, parent);
        let rect = Rect::from_size(self.fit.size.x, self.fit.size.y);
        let previous = (rect != self.rect).then_some(self.rect);
        self.rect = rect;

        let local = self.transform.local_transform()
            * Mat4::from_translation(self.fit.offset.extend(0.0))
            * Mat4::from_scale(Vec3::new(self.fit.scale, self.fit.scale, 1.0));
        (local, previous)
    }
}

#[cfg(test)]
#[path = "viewport_tests.rs"]
mod tests;
