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

//! In-process proxy network.
//!
//! Proxies are registered on a [`MemoryNetwork`] under their canonical websocket URL
//! and reached through a [`MemoryTransport`]. Each [`MemoryProxy`] keeps every payload
//! it received, which makes it the usual stand-in for real proxies in tests.

use super::{ConnectRequest, ProxyConnection, ProxyTransport, TransportError};
use crate::error::ClientError;
use crate::validation::{validate_endpoint_address, validate_identity, EthereumAddress};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
pub struct MemoryNetwork {
    proxies: Arc<Mutex<HashMap<String, MemoryProxy>>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a proxy reachable at `websocket_url` that answers as `identity`.
    ///
    /// Registering a second proxy at the same canonical URL replaces the first.
    pub async fn add_proxy(
        &self,
        websocket_url: &str,
        identity: &str,
    ) -> Result<MemoryProxy, ClientError> {
        let endpoint = validate_endpoint_address(websocket_url)?;
        let identity = validate_identity(identity)?;
        let proxy = MemoryProxy::new(identity);

        self.proxies
            .lock()
            .await
            .insert(endpoint.websocket_url(), proxy.clone());

        Ok(proxy)
    }

    pub async fn remove_proxy(&self, websocket_url: &str) -> Option<MemoryProxy> {
        let endpoint = validate_endpoint_address(websocket_url).ok()?;
        self.proxies.lock().await.remove(&endpoint.websocket_url())
    }

    pub fn transport(&self) -> MemoryTransport {
        MemoryTransport {
            network: self.clone(),
        }
    }

    async fn lookup(&self, websocket_url: &str) -> Option<MemoryProxy> {
        self.proxies.lock().await.get(websocket_url).cloned()
    }
}

/// Handle to one registered in-memory proxy.
#[derive(Clone)]
pub struct MemoryProxy {
    state: Arc<MemoryProxyState>,
}

struct MemoryProxyState {
    identity: EthereumAddress,
    online: AtomicBool,
    fail_sends: AtomicBool,
    send_delay: Mutex<Option<Duration>>,
    received: Mutex<Vec<Bytes>>,
    connections_opened: AtomicUsize,
    leave_notices: AtomicUsize,
}

impl MemoryProxy {
    fn new(identity: EthereumAddress) -> Self {
        Self {
            state: Arc::new(MemoryProxyState {
                identity,
                online: AtomicBool::new(true),
                fail_sends: AtomicBool::new(false),
                send_delay: Mutex::new(None),
                received: Mutex::new(Vec::new()),
                connections_opened: AtomicUsize::new(0),
                leave_notices: AtomicUsize::new(0),
            }),
        }
    }

    pub fn identity(&self) -> &EthereumAddress {
        &self.state.identity
    }

    /// An offline proxy refuses new dials and drops existing connections.
    pub fn set_online(&self, online: bool) {
        self.state.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.state.online.load(Ordering::SeqCst)
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.state.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Delays every delivery by `delay`, for exercising send timeouts.
    pub async fn set_send_delay(&self, delay: Option<Duration>) {
        *self.state.send_delay.lock().await = delay;
    }

    pub async fn received(&self) -> Vec<Bytes> {
        self.state.received.lock().await.clone()
    }

    pub async fn received_count(&self) -> usize {
        self.state.received.lock().await.len()
    }

    pub fn connections_opened(&self) -> usize {
        self.state.connections_opened.load(Ordering::SeqCst)
    }

    pub fn leave_notices(&self) -> usize {
        self.state.leave_notices.load(Ordering::SeqCst)
    }
}

/// [`ProxyTransport`] that dials proxies registered on a [`MemoryNetwork`].
#[derive(Clone)]
pub struct MemoryTransport {
    network: MemoryNetwork,
}

#[async_trait]
impl ProxyTransport for MemoryTransport {
    async fn open(
        &self,
        request: &ConnectRequest,
    ) -> Result<Arc<dyn ProxyConnection>, TransportError> {
        let websocket_url = request.endpoint.websocket_url();
        let proxy = self
            .network
            .lookup(&websocket_url)
            .await
            .filter(MemoryProxy::is_online)
            .ok_or_else(|| TransportError::Unreachable(websocket_url.clone()))?;

        if proxy.identity().to_bytes() != request.proxy_identity.to_bytes() {
            return Err(TransportError::Refused(format!(
                "{websocket_url} answers as {}",
                proxy.identity()
            )));
        }

        proxy
            .state
            .connections_opened
            .fetch_add(1, Ordering::SeqCst);

        Ok(Arc::new(MemoryConnection {
            proxy,
            closed: AtomicBool::new(false),
        }))
    }
}

struct MemoryConnection {
    proxy: MemoryProxy,
    closed: AtomicBool,
}

#[async_trait]
impl ProxyConnection for MemoryConnection {
    async fn send(&self, payload: Bytes) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) || !self.proxy.is_online() {
            return Err(TransportError::Closed);
        }

        let delay = *self.proxy.state.send_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
            if !self.proxy.is_online() {
                return Err(TransportError::Closed);
            }
        }

        if self.proxy.state.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Io("proxy rejected message".to_string()));
        }

        self.proxy.state.received.lock().await.push(payload);
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if !self.proxy.is_online() {
            return Err(TransportError::Closed);
        }

        self.proxy
            .state
            .leave_notices
            .fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
