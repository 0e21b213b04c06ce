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

//! Transport seam between the client and the proxies it publishes through.
//!
//! The client never touches sockets itself. A [`ProxyTransport`] dials a proxy and
//! hands back a [`ProxyConnection`] that carries encoded messages.

pub mod memory;

use crate::validation::{EndpointAddress, EthereumAddress, StreamPartId};
use async_trait::async_trait;
use bytes::Bytes;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Role requested from the proxy during the connection handshake.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ProxyDirection {
    Publish,
}

/// Everything a transport needs to open and authorize one proxy connection.
#[derive(Clone, Debug)]
pub struct ConnectRequest {
    pub endpoint: EndpointAddress,
    pub proxy_identity: EthereumAddress,
    pub local_identity: EthereumAddress,
    pub stream_part_id: StreamPartId,
    pub direction: ProxyDirection,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransportError {
    /// Nothing answered at the endpoint.
    Unreachable(String),
    /// The proxy answered but refused the handshake.
    Refused(String),
    /// The connection is gone.
    Closed,
    Io(String),
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Unreachable(reason) => write!(f, "proxy unreachable: {reason}"),
            TransportError::Refused(reason) => write!(f, "proxy refused connection: {reason}"),
            TransportError::Closed => write!(f, "connection closed"),
            TransportError::Io(reason) => write!(f, "transport i/o error: {reason}"),
        }
    }
}

impl Error for TransportError {}

/// Dials proxies.
///
/// Implementations must be cheap to share; the client keeps one
/// `Arc<dyn ProxyTransport>` for its whole lifetime and calls `open` concurrently.
#[async_trait]
pub trait ProxyTransport: Send + Sync {
    async fn open(&self, request: &ConnectRequest)
        -> Result<Arc<dyn ProxyConnection>, TransportError>;
}

/// One open connection to a proxy.
#[async_trait]
pub trait ProxyConnection: Send + Sync {
    async fn send(&self, payload: Bytes) -> Result<(), TransportError>;

    /// Tells the proxy this client is leaving and releases the connection.
    async fn close(&self) -> Result<(), TransportError>;
}
