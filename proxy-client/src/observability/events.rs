//! Canonical structured event names used across `proxy-client`.

// Library and client lifecycle events.
pub const LIBRARY_INIT: &str = "library_init";
pub const LIBRARY_CLEANUP_START: &str = "library_cleanup_start";
pub const LIBRARY_CLEANUP_OK: &str = "library_cleanup_ok";
pub const LIBRARY_NOT_INITIALIZED: &str = "library_not_initialized";
pub const CLIENT_CREATE_OK: &str = "client_create_ok";
pub const CLIENT_CREATE_FAILED: &str = "client_create_failed";
pub const CLIENT_NOT_FOUND: &str = "client_not_found";
pub const CLIENT_CLOSE_START: &str = "client_close_start";
pub const CLIENT_CLOSE_OK: &str = "client_close_ok";

// Control-plane connection events.
pub const CONNECT_START: &str = "connect_start";
pub const CONNECT_NO_PROXIES: &str = "connect_no_proxies";
pub const CONNECT_INVALID_PROXY: &str = "connect_invalid_proxy";
pub const CONNECT_REUSE: &str = "connect_reuse";
pub const CONNECT_DIAL_ATTEMPT: &str = "connect_dial_attempt";
pub const CONNECT_DIAL_OK: &str = "connect_dial_ok";
pub const CONNECT_DIAL_FAILED: &str = "connect_dial_failed";
pub const CONNECT_SUMMARY: &str = "connect_summary";
pub const TEARDOWN_CLOSE_OK: &str = "teardown_close_ok";
pub const TEARDOWN_CLOSE_FAILED: &str = "teardown_close_failed";

// Data-plane publish events.
pub const PUBLISH_START: &str = "publish_start";
pub const PUBLISH_NO_PROXIES: &str = "publish_no_proxies";
pub const PUBLISH_BUILD_FAILED: &str = "publish_build_failed";
pub const PUBLISH_SEND_OK: &str = "publish_send_ok";
pub const PUBLISH_SEND_FAILED: &str = "publish_send_failed";
pub const PUBLISH_CONNECTION_LOST: &str = "publish_connection_lost";
pub const PUBLISH_SEND_TASK_FAILED: &str = "publish_send_task_failed";
pub const PUBLISH_SUMMARY: &str = "publish_summary";
