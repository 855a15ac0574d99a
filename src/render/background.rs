use crate::foundation::core::{Point, Size, Vec2};
use crate::media::layer::LayerProps;
use crate::render::placement::{Placement, fit_to_viewport};

/// Frozen frame shown in place of video for a scene that defines none.
///
/// Drawn behind every overlay at [`InheritedBackground::Z`] and laid out with the same fit rule as
/// live video, using the captured image dimensions as the native size.
#[derive(Clone)]
pub struct InheritedBackground {
    image: image::RgbaImage,
    source: String,
    placement: Option<Placement>,
}

impl std::fmt::Debug for InheritedBackground {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InheritedBackground")
            .field("source", &self.source)
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("placement", &self.placement)
            .finish()
    }
}

impl InheritedBackground {
    pub const Z: i32 = -1;

    /// Wrap a captured frame; `None` for an empty image.
    pub fn new(image: image::RgbaImage, source: impl Into<String>) -> Option<Self> {
        if image.width() == 0 || image.height() == 0 {
            return None;
        }
        Some(Self {
            image,
            source: source.into(),
            placement: None,
        })
    }

    pub fn image(&self) -> &image::RgbaImage {
        &self.image
    }

    /// Scene the frame was captured from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn native_size(&self) -> Size {
        Size::new(f64::from(self.image.width()), f64::from(self.image.height()))
    }

    /// Opaque and untranslated, below every video layer and overlay.
    pub fn props(&self) -> LayerProps {
        LayerProps {
            position: Point::ZERO,
            z: Self::Z,
            opacity: 1.0,
        }
    }

    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    /// Recompute the fit for `viewport`; the unscaled placement is kept until a valid one exists.
    pub fn fit(&mut self, viewport: Size) -> Placement {
        let placement = fit_to_viewport(self.native_size(), viewport)
            .or(self.placement)
            .unwrap_or(Placement {
                scale: 1.0,
                offset: Vec2::ZERO,
                size: self.native_size(),
            });
        self.placement = Some(placement);
        placement
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/background.rs"]
mod tests;
