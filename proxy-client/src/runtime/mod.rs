//! Runtime ownership: the process-wide library and the handle registry behind it.

pub(crate) mod library;
pub(crate) mod registry;
