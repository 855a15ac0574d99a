use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::foundation::core::Size;
use crate::media::backend::PlayerId;
use crate::media::layer::LayerProps;
use crate::render::placement::Placement;

/// Item the surface positions on screen.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub enum LayoutTarget {
    /// The graphics item of a video handle.
    Video(PlayerId),
    /// The inherited background installed on the named scene.
    Background(String),
}

/// Windowing/graphics surface that draws layers.
///
/// The crate computes geometry with [`crate::fit_to_viewport`]; the surface only applies it.
pub trait Surface {
    /// Current drawable size.
    fn viewport(&self) -> Size;
    /// Position and scale `target`.
    fn apply_layout(&mut self, target: LayoutTarget, placement: Placement);
    /// Stacking order, opacity and document offset of `target`.
    ///
    /// `props.position` is relative to the fitted content origin.
    fn apply_props(&mut self, _target: LayoutTarget, _props: LayerProps) {}
    /// Drop `target` from the surface (used for backgrounds a scene no longer shows).
    fn remove(&mut self, _target: &LayoutTarget) {}
}

/// Surface with a fixed viewport that ignores layout calls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NullSurface {
    viewport: Size,
}

impl NullSurface {
    pub fn new(viewport: Size) -> Self {
        Self { viewport }
    }
}

impl Surface for NullSurface {
    fn viewport(&self) -> Size {
        self.viewport
    }

    fn apply_layout(&mut self, _target: LayoutTarget, _placement: Placement) {}
}

#[derive(Debug, Default)]
struct Recorded {
    viewport: Size,
    calls: Vec<(LayoutTarget, Placement)>,
    current: BTreeMap<LayoutTarget, Placement>,
    props: BTreeMap<LayoutTarget, LayerProps>,
}

/// In-memory surface for tests and headless runs.
///
/// Clones share state, so a test can keep a handle while the coordinator owns another.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    inner: Rc<RefCell<Recorded>>,
}

impl RecordingSurface {
    pub fn new(viewport: Size) -> Self {
        let surface = Self::default();
        surface.set_viewport(viewport);
        surface
    }

    /// Simulate a window resize; the host must then call `TransitionCoordinator::resize`.
    pub fn set_viewport(&self, viewport: Size) {
        self.inner.borrow_mut().viewport = viewport;
    }

    /// Every layout call in order.
    pub fn calls(&self) -> Vec<(LayoutTarget, Placement)> {
        self.inner.borrow().calls.clone()
    }

    /// Latest placement of `target`, if it is still on the surface.
    pub fn placement(&self, target: &LayoutTarget) -> Option<Placement> {
        self.inner.borrow().current.get(target).copied()
    }

    /// Latest attributes of `target`, if it is still on the surface.
    pub fn props(&self, target: &LayoutTarget) -> Option<LayerProps> {
        self.inner.borrow().props.get(target).copied()
    }

    /// Targets currently on the surface.
    pub fn targets(&self) -> Vec<LayoutTarget> {
        self.inner.borrow().current.keys().cloned().collect()
    }
}

impl Surface for RecordingSurface {
    fn viewport(&self) -> Size {
        self.inner.borrow().viewport
    }

    fn apply_layout(&mut self, target: LayoutTarget, placement: Placement) {
        let mut rec = self.inner.borrow_mut();
        rec.calls.push((target.clone(), placement));
        rec.current.insert(target, placement);
    }

    fn apply_props(&mut self, target: LayoutTarget, props: LayerProps) {
        self.inner.borrow_mut().props.insert(target, props);
    }

    fn remove(&mut self, target: &LayoutTarget) {
        let mut rec = self.inner.borrow_mut();
        rec.current.remove(target);
        rec.props.remove(target);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
