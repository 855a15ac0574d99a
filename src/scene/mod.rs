pub(crate) mod menu;
pub(crate) mod model;
pub(crate) mod overlay;
#[allow(clippy::module_inception)]
pub(crate) mod scene;
pub(crate) mod store;
