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

use crate::error::ClientError;
use crate::validation::{validate_endpoint_address, validate_identity};
use crate::validation::{EndpointAddress, EthereumAddress};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A proxy node the client publishes through.
///
/// Holds the strings exactly as the caller supplied them so that results and errors
/// echo back the same values. Two proxies are equal iff both fields match.
///
/// # Examples
///
/// ```
/// use proxy_client::Proxy;
///
/// let proxy = Proxy::new(
///     "wss://proxy.example.com",
///     "0x1234567890123456789012345678901234567890",
/// );
/// let validated = proxy.validate().unwrap();
///
/// assert_eq!(validated.endpoint().port(), 443);
/// assert!(validated.endpoint().is_tls());
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Proxy {
    websocket_url: String,
    ethereum_address: String,
}

impl Proxy {
    pub fn new(websocket_url: impl Into<String>, ethereum_address: impl Into<String>) -> Self {
        Self {
            websocket_url: websocket_url.into(),
            ethereum_address: ethereum_address.into(),
        }
    }

    pub fn websocket_url(&self) -> &str {
        &self.websocket_url
    }

    pub fn ethereum_address(&self) -> &str {
        &self.ethereum_address
    }

    /// Checks the identity first and then the URL, reporting the first failure
    /// attributed to this proxy.
    pub fn validate(&self) -> Result<ValidatedProxy, ClientError> {
        let identity = validate_identity(&self.ethereum_address)
            .map_err(|err| err.with_proxy(self.clone()))?;
        let endpoint = validate_endpoint_address(&self.websocket_url)
            .map_err(|err| err.with_proxy(self.clone()))?;

        Ok(ValidatedProxy {
            proxy: self.clone(),
            endpoint,
            identity,
        })
    }
}

impl Display for Proxy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.websocket_url, self.ethereum_address)
    }
}

/// A [`Proxy`] whose URL and identity passed validation.
#[derive(Clone, Debug)]
pub struct ValidatedProxy {
    proxy: Proxy,
    endpoint: EndpointAddress,
    identity: EthereumAddress,
}

impl ValidatedProxy {
    pub fn proxy(&self) -> &Proxy {
        &self.proxy
    }

    pub fn endpoint(&self) -> &EndpointAddress {
        &self.endpoint
    }

    pub fn identity(&self) -> &EthereumAddress {
        &self.identity
    }
}
