/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod test_fixtures;
pub use test_fixtures::{
    proxy, unreachable_proxies, INVALID_ETHEREUM_ADDRESS, INVALID_PROXY_URL,
    INVALID_STREAM_PART_ID, OWN_ETHEREUM_ADDRESS, PROXY_ETHEREUM_ADDRESS, SIGNER_ETHEREUM_ADDRESS,
    SIGNING_KEY, STREAM_PART_ID, STREAM_PART_ID_WITH_PATH, VALID_PROXY_URL,
};

mod test_transports;
pub use test_transports::{CountingTransport, HangingTransport, UnreachableTransport};

/// Installs a test-writer `tracing` subscriber once per test binary.
///
/// Honors `RUST_LOG`; later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
