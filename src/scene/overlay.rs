use crate::foundation::core::{Point, Vec2};
use crate::scene::model::{OverlayKind, OverlaySpec};

/// Z-order overlays are drawn at; above every video layer and background.
pub const OVERLAY_Z: i32 = 100;

/// A positionable, show/hide graphic.
///
/// Overlays start hidden. The arrow flavour is moved by the scene's menu and scaled with the
/// displayed content; plain images stay where the document put them.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Overlay {
    kind: OverlayKind,
    file: String,
    position: Point,
    scale_factor: f64,
    scale: f64,
    active_on_end: bool,
    visible: bool,
}

impl Overlay {
    pub fn new(spec: &OverlaySpec) -> Self {
        Self {
            kind: spec.kind,
            file: spec.file.clone(),
            position: Point::new(spec.position[0], spec.position[1]),
            scale_factor: if spec.scale > 0.0 { spec.scale } else { 1.0 },
            scale: 1.0,
            active_on_end: spec.active_on_end,
            visible: false,
        }
    }

    pub fn kind(&self) -> OverlayKind {
        self.kind
    }

    pub fn is_arrow(&self) -> bool {
        self.kind == OverlayKind::Arrow
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Base scale from the document.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Scale currently applied when drawing.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn z(&self) -> i32 {
        OVERLAY_Z
    }

    pub fn active_on_end(&self) -> bool {
        self.active_on_end
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn activate(&mut self) {
        self.visible = true;
    }

    pub fn deactivate(&mut self) {
        self.visible = false;
    }

    pub fn move_to(&mut self, position: Point) {
        self.position = position;
    }

    pub fn move_by(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Scale by `content_scale` on top of the document's base scale.
    pub fn set_content_scale(&mut self, content_scale: f64) {
        self.scale = content_scale * self.scale_factor;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/overlay.rs"]
mod tests;
