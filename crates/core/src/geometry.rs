//! Screen/document coordinate transforms and field geometry.
//!
//! All persisted geometry lives in document-point space (PDF points,
//! origin top-left). Screen pixels are always derived by multiplying with
//! the current [`Scale`]; nothing scale-dependent is ever stored. These
//! are the only functions in the crate where the two spaces meet.

use pdf_engine::PageSize;
use serde::{Deserialize, Serialize};

/// Smallest accepted pixels-per-point ratio. A viewport reporting a zero
/// or negative scale is a configuration error; we clamp instead of
/// propagating infinities through every geometry computation.
pub const MIN_SCALE: f32 = 1e-4;

/// Display pixels per document point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale(f32);

impl Scale {
    pub fn new(pixels_per_point: f32) -> Self {
        if pixels_per_point < MIN_SCALE {
            log::warn!(
                "scale factor {} out of range, clamping to {}",
                pixels_per_point,
                MIN_SCALE
            );
            return Self(MIN_SCALE);
        }
        Self(pixels_per_point)
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self(1.0)
    }
}

/// A point in screen-pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_page(self, scale: Scale) -> PagePoint {
        PagePoint::new(self.x / scale.get(), self.y / scale.get())
    }
}

/// A pixel-space delta between two pointer positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVec {
    pub dx: f32,
    pub dy: f32,
}

impl ScreenVec {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    pub fn between(from: ScreenPoint, to: ScreenPoint) -> Self {
        Self::new(to.x - from.x, to.y - from.y)
    }

    pub fn to_page(self, scale: Scale) -> PageVec {
        PageVec::new(self.dx / scale.get(), self.dy / scale.get())
    }
}

/// A point in document-point space, origin at the top-left of the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagePoint {
    pub x: f32,
    pub y: f32,
}

impl PagePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_screen(self, scale: Scale) -> ScreenPoint {
        ScreenPoint::new(self.x * scale.get(), self.y * scale.get())
    }

    pub fn within(self, bounds: PageSize) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.x <= bounds.width_pt && self.y <= bounds.height_pt
    }
}

/// A document-space delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageVec {
    pub dx: f32,
    pub dy: f32,
}

impl PageVec {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

/// Field geometry in document points, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl FieldRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn top_left(&self) -> PagePoint {
        PagePoint::new(self.left, self.top)
    }

    /// Screen-space rect at the given scale: `(left, top, width, height)`
    /// in pixels. Presentation only; never stored.
    pub fn to_screen(&self, scale: Scale) -> (f32, f32, f32, f32) {
        let s = scale.get();
        (self.left * s, self.top * s, self.width * s, self.height * s)
    }

    /// Move the rect so its full extent stays inside the page.
    pub fn positioned_within(&self, top_left: PagePoint, bounds: PageSize) -> Self {
        let left = top_left
            .x
            .min(bounds.width_pt - self.width)
            .max(0.0);
        let top = top_left
            .y
            .min(bounds.height_pt - self.height)
            .max(0.0);
        Self { left, top, ..*self }
    }

    /// Resize, clamping each dimension to `[min, page_extent - origin]`.
    pub fn sized_within(
        &self,
        width: f32,
        height: f32,
        min_width: f32,
        min_height: f32,
        bounds: PageSize,
    ) -> Self {
        let width = width.max(min_width).min(bounds.width_pt - self.left);
        let height = height.max(min_height).min(bounds.height_pt - self.top);
        Self { width, height, ..*self }
    }

    /// True when the bounds invariant holds for this rect on a page.
    pub fn fits_within(&self, bounds: PageSize) -> bool {
        self.left >= 0.0
            && self.top >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.right() <= bounds.width_pt
            && self.bottom() <= bounds.height_pt
    }
}
