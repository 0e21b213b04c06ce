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

//! Dialing and teardown of proxy connections for one client.

use super::connection_set::ConnectionSet;
use crate::error::{ClientError, ErrorKind};
use crate::observability::{events, fields};
use crate::proxy::{Proxy, ValidatedProxy};
use crate::result::{OperationResult, ResultAggregator};
use crate::transport::{ConnectRequest, ProxyConnection, ProxyDirection, ProxyTransport};
use crate::validation::{EthereumAddress, StreamPartId};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const COMPONENT: &str = "connection_manager";

/// The client's own side of every connection handshake.
#[derive(Clone, Debug)]
pub(crate) struct LocalPeer {
    pub(crate) identity: EthereumAddress,
    pub(crate) stream_part_id: StreamPartId,
}

pub(crate) struct ConnectionManager {
    transport: Arc<dyn ProxyTransport>,
    connect_timeout: Duration,
    close_timeout: Duration,
}

impl ConnectionManager {
    pub(crate) fn new(
        transport: Arc<dyn ProxyTransport>,
        connect_timeout: Duration,
        close_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            connect_timeout,
            close_timeout,
        }
    }

    /// Validates and dials every proxy in `proxies`, reporting one outcome per input
    /// position.
    ///
    /// Invalid proxies are never dialed. Proxies already connected are reused. The
    /// remaining ones are dialed concurrently, each at most once per call.
    pub(crate) async fn connect(
        &self,
        connections: &mut ConnectionSet,
        local: &LocalPeer,
        proxies: &[Proxy],
    ) -> OperationResult {
        debug!(
            event = events::CONNECT_START,
            component = COMPONENT,
            stream_part = local.stream_part_id.as_str(),
            requested = proxies.len(),
            known = connections.len(),
            "connecting to proxies"
        );

        let mut aggregator =
            ResultAggregator::new(proxies.iter().cloned(), ErrorKind::ProxyConnectionFailed);
        let mut pending: Vec<(ValidatedProxy, Vec<usize>)> = Vec::new();

        for (index, proxy) in proxies.iter().enumerate() {
            let validated = match proxy.validate() {
                Ok(validated) => validated,
                Err(err) => {
                    warn!(
                        event = events::CONNECT_INVALID_PROXY,
                        component = COMPONENT,
                        proxy_url = proxy.websocket_url(),
                        proxy_id = proxy.ethereum_address(),
                        code = err.code(),
                        err = %err,
                        "skipping invalid proxy"
                    );
                    aggregator.record_failure(index, err);
                    continue;
                }
            };

            if connections.is_connected(proxy) {
                debug!(
                    event = events::CONNECT_REUSE,
                    component = COMPONENT,
                    proxy_url = proxy.websocket_url(),
                    proxy_id = proxy.ethereum_address(),
                    "reusing open proxy connection"
                );
                aggregator.record_success(index);
                continue;
            }

            match pending
                .iter_mut()
                .find(|(queued, _)| queued.proxy() == proxy)
            {
                Some((_, positions)) => positions.push(index),
                None => pending.push((validated, vec![index])),
            }
        }

        let outcomes = join_all(
            pending
                .iter()
                .map(|(validated, _)| self.dial(validated, local)),
        )
        .await;

        for ((validated, positions), outcome) in pending.iter().zip(outcomes) {
            match outcome {
                Ok(connection) => {
                    connections.mark_connected(validated.proxy(), connection);
                    for &index in positions {
                        aggregator.record_success(index);
                    }
                }
                Err(err) => {
                    connections.mark_failed(validated.proxy(), err.message());
                    for &index in positions {
                        aggregator.record_failure(index, err.clone());
                    }
                }
            }
        }

        let result = aggregator.finish();
        debug!(
            event = events::CONNECT_SUMMARY,
            component = COMPONENT,
            stream_part = local.stream_part_id.as_str(),
            succeeded = result.succeeded().len(),
            failed = result.failed().len(),
            code = fields::format_failure_codes(&result).as_str(),
            "connect finished"
        );
        result
    }

    async fn dial(
        &self,
        validated: &ValidatedProxy,
        local: &LocalPeer,
    ) -> Result<Arc<dyn ProxyConnection>, ClientError> {
        let proxy = validated.proxy();
        let request = ConnectRequest {
            endpoint: validated.endpoint().clone(),
            proxy_identity: validated.identity().clone(),
            local_identity: local.identity.clone(),
            stream_part_id: local.stream_part_id.clone(),
            direction: ProxyDirection::Publish,
        };

        debug!(
            event = events::CONNECT_DIAL_ATTEMPT,
            component = COMPONENT,
            proxy_url = proxy.websocket_url(),
            proxy_id = proxy.ethereum_address(),
            "dialing proxy"
        );

        let message = match tokio::time::timeout(self.connect_timeout, self.transport.open(&request))
            .await
        {
            Ok(Ok(connection)) => {
                debug!(
                    event = events::CONNECT_DIAL_OK,
                    component = COMPONENT,
                    proxy_url = proxy.websocket_url(),
                    proxy_id = proxy.ethereum_address(),
                    "proxy connected"
                );
                return Ok(connection);
            }
            Ok(Err(err)) => format!("failed to connect to proxy: {err}"),
            Err(_) => format!(
                "connection attempt timed out after {} ms",
                self.connect_timeout.as_millis()
            ),
        };

        warn!(
            event = events::CONNECT_DIAL_FAILED,
            component = COMPONENT,
            proxy_url = proxy.websocket_url(),
            proxy_id = proxy.ethereum_address(),
            err = message.as_str(),
            "proxy connection failed"
        );
        Err(ClientError::new(ErrorKind::ProxyConnectionFailed, message).with_proxy(proxy.clone()))
    }

    /// Closes every connected proxy and empties the set.
    ///
    /// Closing is best effort: a proxy that fails to close is reported and released
    /// like the others.
    pub(crate) async fn close_all(&self, connections: &mut ConnectionSet) -> OperationResult {
        let connected = connections.drain_connected();
        let mut aggregator = ResultAggregator::new(
            connected.iter().map(|(proxy, _)| proxy.clone()),
            ErrorKind::ProxyBroadcastFailed,
        );

        let outcomes = join_all(connected.iter().map(|(_, connection)| {
            tokio::time::timeout(self.close_timeout, connection.close())
        }))
        .await;

        for (index, ((proxy, _), outcome)) in connected.iter().zip(outcomes).enumerate() {
            let failure = match outcome {
                Ok(Ok(())) => {
                    debug!(
                        event = events::TEARDOWN_CLOSE_OK,
                        component = COMPONENT,
                        proxy_url = proxy.websocket_url(),
                        "proxy connection closed"
                    );
                    aggregator.record_success(index);
                    continue;
                }
                Ok(Err(err)) => format!("failed to close proxy connection: {err}"),
                Err(_) => format!(
                    "closing proxy connection timed out after {} ms",
                    self.close_timeout.as_millis()
                ),
            };

            warn!(
                event = events::TEARDOWN_CLOSE_FAILED,
                component = COMPONENT,
                proxy_url = proxy.websocket_url(),
                err = failure.as_str(),
                "proxy connection did not close cleanly"
            );
            aggregator.record_failure(
                index,
                ClientError::new(ErrorKind::ProxyBroadcastFailed, failure),
            );
        }

        aggregator.finish()
    }
}
