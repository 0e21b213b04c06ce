//! Connection lifecycle for a client's proxies: the connection set and the manager
//! that dials and tears it down.

pub(crate) mod connection_manager;
pub mod connection_set;
