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

//! Process-wide client library: the handle registry and the collaborators every
//! client shares.

use super::registry::{ClientHandle, HandleRegistry};
use crate::config::{ClientConfig, ConfigError};
use crate::control_plane::connection_set::ConnectionState;
use crate::error::{ClientError, ErrorKind};
use crate::observability::{events, fields};
use crate::proxy::Proxy;
use crate::proxy_client::ProxyClient;
use crate::result::OperationResult;
use crate::signing::{Credential, Secp256k1Signer, Signer};
use crate::transport::ProxyTransport;
use crate::validation::{validate_identity, validate_stream_part_id};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const COMPONENT: &str = "library";

/// Builds a [`ProxyClientLibrary`] around a transport.
pub struct LibraryBuilder {
    transport: Arc<dyn ProxyTransport>,
    signer: Arc<dyn Signer>,
    config: ClientConfig,
}

impl LibraryBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = signer;
        self
    }

    pub fn init(self) -> Result<ProxyClientLibrary, ConfigError> {
        self.config.validate()?;

        info!(
            event = events::LIBRARY_INIT,
            component = COMPONENT,
            connect_timeout_ms = self.config.connect_timeout_ms,
            publish_timeout_ms = self.config.publish_timeout_ms,
            "proxy client library initialized"
        );

        Ok(ProxyClientLibrary {
            inner: Arc::new(LibraryInner {
                transport: self.transport,
                signer: self.signer,
                config: self.config,
                initialized: AtomicBool::new(true),
                clients: Mutex::new(HandleRegistry::new()),
            }),
        })
    }
}

struct LibraryInner {
    transport: Arc<dyn ProxyTransport>,
    signer: Arc<dyn Signer>,
    config: ClientConfig,
    initialized: AtomicBool,
    clients: Mutex<HandleRegistry<Arc<ProxyClient>>>,
}

/// Entry point for creating and driving proxy clients.
///
/// Cloning is cheap and every clone shares the same registry. Clients are addressed
/// only through their [`ClientHandle`]; operations on one handle never touch another
/// client's connections.
///
/// ```
/// use proxy_client::transport::memory::MemoryNetwork;
/// use proxy_client::{ErrorKind, Proxy, ProxyClientLibrary};
/// use std::sync::Arc;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let network = MemoryNetwork::new();
/// let proxy_node = network
///     .add_proxy("ws://proxy.example.com", "0xd2078dc2d780029473a39ce873fc182587be69db")
///     .await
///     .unwrap();
///
/// let library = ProxyClientLibrary::builder(Arc::new(network.transport()))
///     .init()
///     .unwrap();
/// let handle = library
///     .new_client(
///         "0x1234567890123456789012345678901234567890",
///         "0xd2078dc2d780029473a39ce873fc182587be69db/low-level-client#0",
///     )
///     .await
///     .unwrap();
///
/// let proxies = [Proxy::new(
///     "ws://proxy.example.com",
///     "0xd2078dc2d780029473a39ce873fc182587be69db",
/// )];
/// let connected = library.connect(handle, &proxies).await.unwrap();
/// assert_eq!(connected.succeeded().len(), 1);
///
/// let published = library.publish(handle, b"hello", None).await.unwrap();
/// assert_eq!(published.succeeded().len(), 1);
/// assert_eq!(proxy_node.received_count().await, 1);
///
/// assert!(library.close(handle).await.is_complete_success());
/// let err = library.publish(handle, b"again", None).await.unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::ProxyClientNotFound);
/// # });
/// ```
#[derive(Clone)]
pub struct ProxyClientLibrary {
    inner: Arc<LibraryInner>,
}

impl ProxyClientLibrary {
    /// Starts a builder using the secp256k1 signer and default [`ClientConfig`].
    pub fn builder(transport: Arc<dyn ProxyTransport>) -> LibraryBuilder {
        LibraryBuilder {
            transport,
            signer: Arc::new(Secp256k1Signer::new()),
            config: ClientConfig::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::SeqCst)
    }

    fn ensure_initialized(&self) -> Result<(), ClientError> {
        if self.is_initialized() {
            return Ok(());
        }

        warn!(
            event = events::LIBRARY_NOT_INITIALIZED,
            component = COMPONENT,
            "proxy client library used outside its init/cleanup window"
        );
        Err(ClientError::library_not_initialized())
    }

    /// Validates `own_ethereum_address` and `stream_part_id` and registers a new client.
    ///
    /// Nothing is allocated when validation fails.
    pub async fn new_client(
        &self,
        own_ethereum_address: &str,
        stream_part_id: &str,
    ) -> Result<ClientHandle, ClientError> {
        self.ensure_initialized()?;

        let validated = validate_identity(own_ethereum_address).and_then(|identity| {
            validate_stream_part_id(stream_part_id).map(|stream_part_id| (identity, stream_part_id))
        });
        let (identity, stream_part_id) = match validated {
            Ok(validated) => validated,
            Err(err) => {
                warn!(
                    event = events::CLIENT_CREATE_FAILED,
                    component = COMPONENT,
                    code = err.code(),
                    err = %err,
                    "rejected new proxy client"
                );
                return Err(err);
            }
        };

        let client = Arc::new(ProxyClient::new(
            identity,
            stream_part_id,
            self.inner.transport.clone(),
            self.inner.signer.clone(),
            &self.inner.config,
        ));

        let mut clients = self.inner.clients.lock().await;
        // `cleanup` may have run while this call waited on the registry.
        self.ensure_initialized()?;
        let handle = clients.insert(client.clone());
        drop(clients);

        info!(
            event = events::CLIENT_CREATE_OK,
            component = COMPONENT,
            client_handle = %handle,
            stream_part = client.stream_part_id().as_str(),
            publisher = client.identity().as_str(),
            "created proxy client"
        );
        Ok(handle)
    }

    async fn lookup(&self, handle: ClientHandle) -> Result<Arc<ProxyClient>, ClientError> {
        self.ensure_initialized()?;

        let client = self.inner.clients.lock().await.get(handle).cloned();
        client.ok_or_else(|| {
            debug!(
                event = events::CLIENT_NOT_FOUND,
                component = COMPONENT,
                client_handle = %handle,
                "unknown proxy client handle"
            );
            ClientError::client_not_found()
        })
    }

    /// Connects the client to `proxies`, reporting one outcome per proxy in input
    /// order.
    ///
    /// An empty `proxies` yields a single `NO_PROXIES_DEFINED` failure, even for a
    /// stale handle.
    pub async fn connect(
        &self,
        handle: ClientHandle,
        proxies: &[Proxy],
    ) -> Result<OperationResult, ClientError> {
        self.ensure_initialized()?;

        if proxies.is_empty() {
            warn!(
                event = events::CONNECT_NO_PROXIES,
                component = COMPONENT,
                client_handle = %handle,
                "connect called without proxies"
            );
            return Ok(OperationResult::client_failure(ClientError::new(
                ErrorKind::NoProxiesDefined,
                "no proxies defined",
            )));
        }

        self.lookup(handle).await?.connect(proxies).await
    }

    /// Publishes `content` to every connected proxy of the client, signed with
    /// `credential` when one is given.
    pub async fn publish(
        &self,
        handle: ClientHandle,
        content: &[u8],
        credential: Option<&Credential>,
    ) -> Result<OperationResult, ClientError> {
        self.lookup(handle).await?.publish(content, credential).await
    }

    /// Closes the client and frees its handle.
    ///
    /// Closing an unknown or already closed handle returns an empty result.
    pub async fn close(&self, handle: ClientHandle) -> OperationResult {
        let client = self.inner.clients.lock().await.remove(handle);
        let Some(client) = client else {
            debug!(
                event = events::CLIENT_NOT_FOUND,
                component = COMPONENT,
                client_handle = %handle,
                "close of unknown proxy client handle"
            );
            return OperationResult::default();
        };

        close_client(handle, &client).await
    }

    pub async fn connection_states(
        &self,
        handle: ClientHandle,
    ) -> Result<Vec<(Proxy, ConnectionState)>, ClientError> {
        self.lookup(handle).await?.connection_states().await
    }

    pub async fn client_count(&self) -> usize {
        self.inner.clients.lock().await.len()
    }

    /// Closes every remaining client and shuts the library down.
    ///
    /// Afterwards `new_client`, `connect` and `publish` fail with
    /// `LIBRARY_NOT_INITIALIZED`. A second cleanup returns an empty result.
    pub async fn cleanup(&self) -> OperationResult {
        let mut clients = self.inner.clients.lock().await;
        if !self.inner.initialized.swap(false, Ordering::SeqCst) {
            return OperationResult::default();
        }
        let remaining = clients.drain();
        drop(clients);

        info!(
            event = events::LIBRARY_CLEANUP_START,
            component = COMPONENT,
            clients = remaining.len(),
            "cleaning up proxy client library"
        );

        let mut result = OperationResult::default();
        for (handle, client) in remaining {
            result.merge(close_client(handle, &client).await);
        }

        info!(
            event = events::LIBRARY_CLEANUP_OK,
            component = COMPONENT,
            succeeded = result.succeeded().len(),
            failed = result.failed().len(),
            "proxy client library cleaned up"
        );
        result
    }
}

async fn close_client(handle: ClientHandle, client: &ProxyClient) -> OperationResult {
    info!(
        event = events::CLIENT_CLOSE_START,
        component = COMPONENT,
        client_handle = %handle,
        stream_part = client.stream_part_id().as_str(),
        "closing proxy client"
    );

    let result = client.close().await;

    info!(
        event = events::CLIENT_CLOSE_OK,
        component = COMPONENT,
        client_handle = %handle,
        succeeded = result.succeeded().len(),
        failed = result.failed().len(),
        code = fields::format_failure_codes(&result).as_str(),
        "closed proxy client"
    );
    result
}
