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

//! # proxy-client
//!
//! `proxy-client` publishes one logical stream through a set of redundant proxy
//! nodes. Every operation reports a per-proxy partition of what succeeded and what
//! failed instead of a single aggregate outcome.
//!
//! Typical usage goes through [`ProxyClientLibrary`]: create a client for a stream
//! part, connect it to proxies, publish, close. Signed publishes use the client's
//! own private key, so the client identity is the address of that key.
//!
//! ```
//! use proxy_client::transport::memory::MemoryNetwork;
//! use proxy_client::{Credential, ErrorKind, Proxy, ProxyClientLibrary};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let network = MemoryNetwork::new();
//! network
//!     .add_proxy("ws://proxy-a.example.com", "0xd2078dc2d780029473a39ce873fc182587be69db")
//!     .await
//!     .unwrap();
//!
//! let library = ProxyClientLibrary::builder(Arc::new(network.transport()))
//!     .init()
//!     .unwrap();
//! let handle = library
//!     .new_client(
//!         "0xa5374e3c19f15e1847881979dd0c6c9ffe846bd5",
//!         "0xa000000000000000000000000000000000000000#01",
//!     )
//!     .await
//!     .unwrap();
//!
//! let proxies = vec![
//!     Proxy::new(
//!         "ws://proxy-a.example.com",
//!         "0xd2078dc2d780029473a39ce873fc182587be69db",
//!     ),
//!     Proxy::new("ws://localhost:1", "0xd2078dc2d780029473a39ce873fc182587be69db"),
//!     Proxy::new("poiejrg039utg240", "0xd2078dc2d780029473a39ce873fc182587be69db"),
//! ];
//! let connected = library.connect(handle, &proxies).await.unwrap();
//!
//! assert_eq!(connected.succeeded(), &proxies[..1]);
//! assert_eq!(connected.failed()[0].kind(), ErrorKind::ProxyConnectionFailed);
//! assert_eq!(connected.failed()[1].kind(), ErrorKind::InvalidProxyUrl);
//!
//! let credential =
//!     Credential::new("0x23bead9b499af21c4c16e4511b3b6b08c3e22e76e0591f5ab5ba8d4c3a5b1820");
//! let published = library
//!     .publish(handle, b"hello", Some(&credential))
//!     .await
//!     .unwrap();
//! assert_eq!(published.succeeded().len(), 1);
//!
//! library.close(handle).await;
//! library.cleanup().await;
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - API facade: [`ProxyClientLibrary`] keyed by [`ClientHandle`]
//! - Validation: identities, stream part ids and proxy URLs, checked before any I/O
//! - Control plane: per-client connection set and the manager that dials and closes it
//! - Data plane: message construction, signing and fan-out to connected proxies
//! - Runtime: generation-checked handle registry and library lifecycle
//! - Transport: the [`transport::ProxyTransport`] seam plus an in-memory network
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

mod config;
pub use config::{ClientConfig, ConfigError};

mod control_plane;
pub use control_plane::connection_set::ConnectionState;

mod data_plane;
pub use data_plane::stream_message::{ContentType, MessageId, StreamMessage};

mod error;
pub use error::{ClientError, ErrorKind, UnknownErrorCode};

#[doc(hidden)]
pub mod observability;

mod proxy;
pub use proxy::{Proxy, ValidatedProxy};

mod proxy_client;

mod result;
pub use result::OperationResult;

mod runtime;
pub use runtime::library::{LibraryBuilder, ProxyClientLibrary};
pub use runtime::registry::ClientHandle;

mod signing;
pub use signing::{
    Credential, Ed25519Signer, Secp256k1Signer, Signature, SignatureType, Signer, SigningError,
};

pub mod transport;

pub mod validation;
