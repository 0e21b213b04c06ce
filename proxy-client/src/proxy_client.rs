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

//! State owned by one client: its identity, stream part, connections and message chain.

use crate::config::ClientConfig;
use crate::control_plane::connection_manager::{ConnectionManager, LocalPeer};
use crate::control_plane::connection_set::{ConnectionSet, ConnectionState, SharedConnectionSet};
use crate::data_plane::fan_out::FanOutEngine;
use crate::data_plane::stream_message::{MessageId, StreamMessage};
use crate::error::{ClientError, ErrorKind};
use crate::observability::{events, fields};
use crate::proxy::Proxy;
use crate::result::OperationResult;
use crate::signing::{Credential, Signer, SigningError};
use crate::transport::ProxyTransport;
use crate::validation::{EthereumAddress, StreamPartId};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const COMPONENT: &str = "proxy_client";
const FIRST_SEQUENCE_NUMBER: u64 = 1;

pub(crate) struct ProxyClient {
    local: LocalPeer,
    stream_part: Arc<str>,
    message_chain_id: String,
    next_sequence_number: AtomicU64,
    closed: AtomicBool,
    connections: SharedConnectionSet,
    connection_manager: ConnectionManager,
    fan_out: FanOutEngine,
    signer: Arc<dyn Signer>,
}

impl ProxyClient {
    pub(crate) fn new(
        identity: EthereumAddress,
        stream_part_id: StreamPartId,
        transport: Arc<dyn ProxyTransport>,
        signer: Arc<dyn Signer>,
        config: &ClientConfig,
    ) -> Self {
        let message_chain_id = config
            .message_chain_id()
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Self {
            stream_part: Arc::from(stream_part_id.as_str()),
            local: LocalPeer {
                identity,
                stream_part_id,
            },
            message_chain_id,
            next_sequence_number: AtomicU64::new(FIRST_SEQUENCE_NUMBER),
            closed: AtomicBool::new(false),
            connections: Arc::new(Mutex::new(ConnectionSet::new())),
            connection_manager: ConnectionManager::new(
                transport,
                config.connect_timeout(),
                config.close_timeout(),
            ),
            fan_out: FanOutEngine::new(config.publish_timeout()),
            signer,
        }
    }

    pub(crate) fn identity(&self) -> &EthereumAddress {
        &self.local.identity
    }

    pub(crate) fn stream_part_id(&self) -> &StreamPartId {
        &self.local.stream_part_id
    }

    /// Fails once `close` has started; checked before and after taking the
    /// connection lock so a call queued behind `close` never runs on a torn-down set.
    fn ensure_open(&self) -> Result<(), ClientError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(ClientError::client_not_found())
        } else {
            Ok(())
        }
    }

    pub(crate) async fn connect(&self, proxies: &[Proxy]) -> Result<OperationResult, ClientError> {
        self.ensure_open()?;
        let mut connections = self.connections.lock().await;
        self.ensure_open()?;

        Ok(self
            .connection_manager
            .connect(&mut connections, &self.local, proxies)
            .await)
    }

    pub(crate) async fn publish(
        &self,
        content: &[u8],
        credential: Option<&Credential>,
    ) -> Result<OperationResult, ClientError> {
        self.ensure_open()?;
        let connections = self.connections.lock().await;
        self.ensure_open()?;

        if connections.is_empty() {
            warn!(
                event = events::PUBLISH_NO_PROXIES,
                component = COMPONENT,
                stream_part = &*self.stream_part,
                "publish with no proxies connected"
            );
            return Ok(OperationResult::client_failure(ClientError::new(
                ErrorKind::ProxyBroadcastFailed,
                "no proxies connected",
            )));
        }

        let message = match self.build_message(content, credential) {
            Ok(message) => message,
            Err(err) => {
                warn!(
                    event = events::PUBLISH_BUILD_FAILED,
                    component = COMPONENT,
                    stream_part = &*self.stream_part,
                    err = %err,
                    "failed to build message"
                );
                return Ok(OperationResult::client_failure(err));
            }
        };

        let payload = match message.encode() {
            Ok(payload) => payload,
            Err(err) => {
                return Ok(OperationResult::client_failure(ClientError::new(
                    ErrorKind::ProxyBroadcastFailed,
                    format!("failed to encode message: {err}"),
                )))
            }
        };

        let sequence_number = message.message_id.sequence_number;
        // Consumed only by a message that goes out.
        self.next_sequence_number
            .store(sequence_number + 1, Ordering::SeqCst);
        debug!(
            event = events::PUBLISH_START,
            component = COMPONENT,
            stream_part = &*self.stream_part,
            sequence_number,
            signed = message.is_signed(),
            connected = connections.connected_count(),
            "publishing message"
        );

        let targets = connections.publish_targets();
        // Not held across sends.
        drop(connections);

        let result = self
            .fan_out
            .broadcast(
                targets,
                payload,
                self.connections.clone(),
                self.stream_part.clone(),
                sequence_number,
            )
            .await;

        debug!(
            event = events::PUBLISH_SUMMARY,
            component = COMPONENT,
            stream_part = &*self.stream_part,
            sequence_number,
            succeeded = result.succeeded().len(),
            failed = result.failed().len(),
            code = fields::format_failure_codes(&result).as_str(),
            "publish finished"
        );

        Ok(result)
    }

    /// Builds the next message of the chain without consuming its sequence number.
    ///
    /// Callers hold the connection lock, which serializes message construction.
    fn build_message(
        &self,
        content: &[u8],
        credential: Option<&Credential>,
    ) -> Result<StreamMessage, ClientError> {
        let sequence_number = self.next_sequence_number.load(Ordering::SeqCst);
        let message_id = MessageId::new(
            &self.local.stream_part_id,
            &self.local.identity,
            &self.message_chain_id,
            now_millis(),
            sequence_number,
        );
        let mut message = StreamMessage::unsigned(message_id, content.to_vec());

        if let Some(credential) = credential.filter(|credential| !credential.is_empty()) {
            let signing_failed =
                |err: SigningError| ClientError::new(ErrorKind::ProxyBroadcastFailed, err.to_string());

            if let Some(address) = self.signer.signer_address(credential).map_err(signing_failed)? {
                if address.to_bytes() != self.local.identity.to_bytes() {
                    return Err(ClientError::new(
                        ErrorKind::ProxyBroadcastFailed,
                        format!(
                            "credential signs as {address}, not as publisher {}",
                            self.local.identity
                        ),
                    ));
                }
            }

            message
                .sign(self.signer.as_ref(), credential)
                .map_err(signing_failed)?;
        }

        Ok(message)
    }

    /// Marks the client closed and releases every connection.
    ///
    /// Waits for an in-progress connect to finish; later calls see the client as gone.
    pub(crate) async fn close(&self) -> OperationResult {
        self.closed.store(true, Ordering::SeqCst);
        let mut connections = self.connections.lock().await;
        self.connection_manager.close_all(&mut connections).await
    }

    pub(crate) async fn connection_states(&self) -> Result<Vec<(Proxy, ConnectionState)>, ClientError> {
        self.ensure_open()?;
        Ok(self.connections.lock().await.snapshot())
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
