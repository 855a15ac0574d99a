pub(crate) mod background;
pub(crate) mod placement;
pub(crate) mod surface;
