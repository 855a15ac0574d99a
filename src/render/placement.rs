use crate::foundation::core::{Affine, Point, Rect, Size, Vec2};

/// Uniform scale plus centering offset that fits content into a viewport.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Placement {
    /// Uniform scale applied to the native size.
    pub scale: f64,
    /// Top-left corner of the displayed content in viewport coordinates.
    pub offset: Vec2,
    /// Displayed size (`native * scale`).
    pub size: Size,
}

impl Placement {
    /// Transform mapping native content coordinates to viewport coordinates.
    pub fn to_affine(self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Rectangle the content occupies on screen.
    pub fn content_rect(self) -> Rect {
        Rect::from_origin_size(self.offset.to_point(), self.size)
    }

    /// Map fractional content coordinates (`0..=1` on each axis) to viewport coordinates.
    pub fn scaled_point(self, sx: f64, sy: f64) -> Point {
        let rect = self.content_rect();
        Point::new(rect.x0 + sx * rect.width(), rect.y0 + sy * rect.height())
    }
}

/// Aspect-preserving fit: `scale = min(vw / w, vh / h)`, centered on both axes.
///
/// Returns `None` when either size is degenerate (zero, negative or not finite).
pub fn fit_to_viewport(native: Size, viewport: Size) -> Option<Placement> {
    let valid = |s: Size| s.width.is_finite() && s.height.is_finite() && s.width > 0.0 && s.height > 0.0;
    if !valid(native) || !valid(viewport) {
        return None;
    }

    let scale = (viewport.width / native.width).min(viewport.height / native.height);
    let size = Size::new(native.width * scale, native.height * scale);
    let offset = Vec2::new(
        (viewport.width - size.width) / 2.0,
        (viewport.height - size.height) / 2.0,
    );
    Some(Placement {
        scale,
        offset,
        size,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/placement.rs"]
mod tests;
