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

use async_trait::async_trait;
use proxy_client::transport::{ConnectRequest, ProxyConnection, ProxyTransport, TransportError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Refuses every dial as unreachable.
pub struct UnreachableTransport;

#[async_trait]
impl ProxyTransport for UnreachableTransport {
    async fn open(
        &self,
        request: &ConnectRequest,
    ) -> Result<Arc<dyn ProxyConnection>, TransportError> {
        let websocket_url = request.endpoint.websocket_url();
        debug!("UnreachableTransport: refusing dial to {websocket_url}");
        Err(TransportError::Unreachable(websocket_url))
    }
}

/// Records every dial and forwards it to an inner transport.
pub struct CountingTransport {
    inner: Arc<dyn ProxyTransport>,
    dialed: Mutex<Vec<String>>,
}

impl CountingTransport {
    pub fn new(inner: Arc<dyn ProxyTransport>) -> Self {
        Self {
            inner,
            dialed: Mutex::new(Vec::new()),
        }
    }

    /// Canonical websocket URLs dialed so far, in call order.
    pub async fn dialed(&self) -> Vec<String> {
        self.dialed.lock().await.clone()
    }

    pub async fn dial_count(&self) -> usize {
        self.dialed.lock().await.len()
    }
}

#[async_trait]
impl ProxyTransport for CountingTransport {
    async fn open(
        &self,
        request: &ConnectRequest,
    ) -> Result<Arc<dyn ProxyConnection>, TransportError> {
        self.dialed
            .lock()
            .await
            .push(request.endpoint.websocket_url());
        self.inner.open(request).await
    }
}

/// Dials that never complete, for exercising connect timeouts.
pub struct HangingTransport;

#[async_trait]
impl ProxyTransport for HangingTransport {
    async fn open(
        &self,
        request: &ConnectRequest,
    ) -> Result<Arc<dyn ProxyConnection>, TransportError> {
        debug!(
            "HangingTransport: holding dial to {}",
            request.endpoint.websocket_url()
        );
        futures::future::pending::<()>().await;
        Err(TransportError::Closed)
    }
}
