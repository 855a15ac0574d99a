pub(crate) mod coordinator;
pub(crate) mod input;
pub(crate) mod opts;
pub(crate) mod requests;
