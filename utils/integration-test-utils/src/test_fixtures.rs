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

use proxy_client::Proxy;

pub const OWN_ETHEREUM_ADDRESS: &str = "0x1234567890123456789012345678901234567890";
pub const PROXY_ETHEREUM_ADDRESS: &str = "0xd2078dc2d780029473a39ce873fc182587be69db";
pub const INVALID_ETHEREUM_ADDRESS: &str = "INVALID_ETHEREUM_ADDRESS";

pub const STREAM_PART_ID: &str = "0xa000000000000000000000000000000000000000#01";
pub const STREAM_PART_ID_WITH_PATH: &str =
    "0xd2078dc2d780029473a39ce873fc182587be69db/low-level-client#0";
pub const INVALID_STREAM_PART_ID: &str = "INVALID_STREAM_PART_ID";

pub const VALID_PROXY_URL: &str = "ws://valid.com";
pub const INVALID_PROXY_URL: &str = "poiejrg039utg240";

/// Private key used wherever a signed publish is needed.
pub const SIGNING_KEY: &str =
    "0x23bead9b499af21c4c16e4511b3b6b08c3e22e76e0591f5ab5ba8d4c3a5b1820";
/// Address of `SIGNING_KEY` under the secp256k1 signer.
pub const SIGNER_ETHEREUM_ADDRESS: &str = "0xa5374e3c19f15e1847881979dd0c6c9ffe846bd5";

pub fn proxy(websocket_url: &str) -> Proxy {
    Proxy::new(websocket_url, PROXY_ETHEREUM_ADDRESS)
}

/// `count` proxies on distinct local ports that nothing listens on.
pub fn unreachable_proxies(count: u16) -> Vec<Proxy> {
    (0..count)
        .map(|port| proxy(&format!("ws://localhost:{port}")))
        .collect()
}
