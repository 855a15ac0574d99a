pub(crate) mod audio;
pub(crate) mod backend;
pub(crate) mod layer;
pub(crate) mod probe;
pub(crate) mod registry;
pub(crate) mod sim;
pub(crate) mod sounds;
