//! Publish path: message construction, signing and fan-out to connected proxies.

pub(crate) mod fan_out;
pub mod stream_message;
