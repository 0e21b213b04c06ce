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

//! Independent delivery of one encoded message to every publish target.

use crate::control_plane::connection_set::SharedConnectionSet;
use crate::error::{ClientError, ErrorKind};
use crate::observability::events;
use crate::proxy::Proxy;
use crate::result::{OperationResult, ResultAggregator};
use crate::transport::{ProxyConnection, TransportError};
use bytes::Bytes;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const COMPONENT: &str = "fan_out";

/// One entry of the connection set as seen by a publish.
pub(crate) struct PublishTarget {
    pub(crate) proxy: Proxy,
    /// `None` when the proxy is known but not currently connected.
    pub(crate) connection: Option<Arc<dyn ProxyConnection>>,
}

#[derive(Debug)]
enum SendFailure {
    Transport(TransportError),
    TimedOut(Duration),
}

impl SendFailure {
    fn into_client_error(self) -> ClientError {
        let message = match self {
            SendFailure::Transport(err) => format!("publish failed: {err}"),
            SendFailure::TimedOut(timeout) => {
                format!("publish timed out after {} ms", timeout.as_millis())
            }
        };
        ClientError::new(ErrorKind::ProxyBroadcastFailed, message)
    }
}

/// Everything a send task needs besides its connection.
struct SendContext {
    payload: Bytes,
    send_timeout: Duration,
    connections: SharedConnectionSet,
    stream_part: Arc<str>,
    sequence_number: u64,
}

pub(crate) struct FanOutEngine {
    send_timeout: Duration,
}

impl FanOutEngine {
    pub(crate) fn new(send_timeout: Duration) -> Self {
        Self { send_timeout }
    }

    /// Sends `payload` to every connected target.
    ///
    /// Each send runs on its own task and records a lost connection in `connections`
    /// itself, so dropping the returned future neither cancels dispatched sends nor
    /// loses their effect on connection state.
    pub(crate) async fn broadcast(
        &self,
        targets: Vec<PublishTarget>,
        payload: Bytes,
        connections: SharedConnectionSet,
        stream_part: Arc<str>,
        sequence_number: u64,
    ) -> OperationResult {
        let mut aggregator = ResultAggregator::new(
            targets.iter().map(|target| target.proxy.clone()),
            ErrorKind::ProxyBroadcastFailed,
        );
        let context = Arc::new(SendContext {
            payload,
            send_timeout: self.send_timeout,
            connections,
            stream_part,
            sequence_number,
        });
        let mut in_flight: Vec<(usize, JoinHandle<Result<(), SendFailure>>)> = Vec::new();

        for (index, target) in targets.iter().enumerate() {
            let Some(connection) = target.connection.clone() else {
                aggregator.record_failure(
                    index,
                    ClientError::new(ErrorKind::ProxyBroadcastFailed, "proxy not connected"),
                );
                continue;
            };

            let handle = tokio::spawn(send_one(
                connection,
                target.proxy.clone(),
                context.clone(),
            ));
            in_flight.push((index, handle));
        }

        let (indices, handles): (Vec<_>, Vec<_>) = in_flight.into_iter().unzip();

        for (index, joined) in indices.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(Ok(())) => aggregator.record_success(index),
                Ok(Err(failure)) => aggregator.record_failure(index, failure.into_client_error()),
                Err(join_err) => {
                    warn!(
                        event = events::PUBLISH_SEND_TASK_FAILED,
                        component = COMPONENT,
                        proxy_url = targets[index].proxy.websocket_url(),
                        err = %join_err,
                        "publish send task did not complete"
                    );
                    aggregator.record_failure(
                        index,
                        ClientError::new(
                            ErrorKind::ProxyBroadcastFailed,
                            format!("publish task failed: {join_err}"),
                        ),
                    );
                }
            }
        }

        aggregator.finish()
    }
}

async fn send_one(
    connection: Arc<dyn ProxyConnection>,
    proxy: Proxy,
    context: Arc<SendContext>,
) -> Result<(), SendFailure> {
    let outcome = match tokio::time::timeout(
        context.send_timeout,
        connection.send(context.payload.clone()),
    )
    .await
    {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(SendFailure::Transport(err)),
        Err(_) => Err(SendFailure::TimedOut(context.send_timeout)),
    };

    match &outcome {
        Ok(()) => debug!(
            event = events::PUBLISH_SEND_OK,
            component = COMPONENT,
            stream_part = &*context.stream_part,
            sequence_number = context.sequence_number,
            proxy_url = proxy.websocket_url(),
            proxy_id = proxy.ethereum_address(),
            "published to proxy"
        ),
        Err(failure) => warn!(
            event = events::PUBLISH_SEND_FAILED,
            component = COMPONENT,
            stream_part = &*context.stream_part,
            sequence_number = context.sequence_number,
            proxy_url = proxy.websocket_url(),
            proxy_id = proxy.ethereum_address(),
            err = ?failure,
            "publish to proxy failed"
        ),
    }

    if matches!(outcome, Err(SendFailure::Transport(TransportError::Closed))) {
        context
            .connections
            .lock()
            .await
            .mark_disconnected(&proxy, &connection);
        debug!(
            event = events::PUBLISH_CONNECTION_LOST,
            component = COMPONENT,
            proxy_url = proxy.websocket_url(),
            proxy_id = proxy.ethereum_address(),
            "marked proxy disconnected"
        );
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::FanOutEngine;
    use crate::control_plane::connection_set::{ConnectionSet, ConnectionState, SharedConnectionSet};
    use crate::error::ErrorKind;
    use crate::proxy::Proxy;
    use crate::transport::{ProxyConnection, TransportError};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    struct CountingConnection {
        sends: AtomicUsize,
    }

    #[async_trait]
    impl ProxyConnection for CountingConnection {
        async fn send(&self, _payload: Bytes) -> Result<(), TransportError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn close(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    /// Reports the connection gone after `delay`.
    struct ClosedConnection {
        delay: Duration,
    }

    #[async_trait]
    impl ProxyConnection for ClosedConnection {
        async fn send(&self, _payload: Bytes) -> Result<(), TransportError> {
            tokio::time::sleep(self.delay).await;
            Err(TransportError::Closed)
        }

        async fn close(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    struct StalledConnection;

    #[async_trait]
    impl ProxyConnection for StalledConnection {
        async fn send(&self, _payload: Bytes) -> Result<(), TransportError> {
            futures::future::pending::<()>().await;
            Ok(())
        }

        async fn close(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn proxy(n: u8) -> Proxy {
        Proxy::new(
            format!("ws://proxy-{n}"),
            format!("0x{}", format!("{n:02x}").repeat(20)),
        )
    }

    fn shared(set: ConnectionSet) -> SharedConnectionSet {
        Arc::new(Mutex::new(set))
    }

    async fn state_of(connections: &SharedConnectionSet, proxy: &Proxy) -> Option<ConnectionState> {
        connections.lock().await.state(proxy).cloned()
    }

    #[tokio::test]
    async fn one_failing_target_does_not_block_the_others() {
        let healthy = Arc::new(CountingConnection {
            sends: AtomicUsize::new(0),
        });
        let mut set = ConnectionSet::new();
        set.mark_connected(&proxy(1), healthy.clone());
        set.mark_connected(
            &proxy(2),
            Arc::new(ClosedConnection {
                delay: Duration::ZERO,
            }),
        );
        set.mark_failed(&proxy(3), "refused");
        set.mark_connected(&proxy(4), healthy.clone());
        let targets = set.publish_targets();
        let connections = shared(set);

        let result = FanOutEngine::new(Duration::from_secs(1))
            .broadcast(
                targets,
                Bytes::from_static(b"msg"),
                connections.clone(),
                Arc::from("s#0"),
                1,
            )
            .await;

        assert_eq!(result.succeeded(), &[proxy(1), proxy(4)]);
        assert_eq!(result.failed().len(), 2);
        assert_eq!(result.failed()[0].proxy(), Some(&proxy(2)));
        assert_eq!(result.failed()[1].proxy(), Some(&proxy(3)));
        assert!(result
            .failed()
            .iter()
            .all(|err| err.kind() == ErrorKind::ProxyBroadcastFailed));
        assert_eq!(healthy.sends.load(Ordering::SeqCst), 2);
        assert_eq!(
            state_of(&connections, &proxy(2)).await,
            Some(ConnectionState::Disconnected)
        );
        assert_eq!(
            state_of(&connections, &proxy(1)).await,
            Some(ConnectionState::Connected)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_send_times_out_alone() {
        let mut set = ConnectionSet::new();
        set.mark_connected(&proxy(1), Arc::new(StalledConnection));
        set.mark_connected(
            &proxy(2),
            Arc::new(CountingConnection {
                sends: AtomicUsize::new(0),
            }),
        );
        let targets = set.publish_targets();
        let connections = shared(set);

        let result = FanOutEngine::new(Duration::from_millis(50))
            .broadcast(
                targets,
                Bytes::from_static(b"msg"),
                connections.clone(),
                Arc::from("s#0"),
                1,
            )
            .await;

        assert_eq!(result.succeeded(), &[proxy(2)]);
        assert!(result.failed()[0].message().contains("timed out"));
        // A timeout says nothing about the connection itself.
        assert_eq!(
            state_of(&connections, &proxy(1)).await,
            Some(ConnectionState::Connected)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_broadcast_still_records_lost_connections() {
        let healthy = Arc::new(CountingConnection {
            sends: AtomicUsize::new(0),
        });
        let mut set = ConnectionSet::new();
        set.mark_connected(
            &proxy(1),
            Arc::new(ClosedConnection {
                delay: Duration::from_millis(200),
            }),
        );
        set.mark_connected(&proxy(2), healthy.clone());
        let targets = set.publish_targets();
        let connections = shared(set);

        let engine = FanOutEngine::new(Duration::from_secs(1));
        let cancelled = tokio::time::timeout(
            Duration::from_millis(50),
            engine.broadcast(
                targets,
                Bytes::from_static(b"msg"),
                connections.clone(),
                Arc::from("s#0"),
                1,
            ),
        )
        .await;
        assert!(cancelled.is_err());

        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(
            state_of(&connections, &proxy(1)).await,
            Some(ConnectionState::Disconnected)
        );
        assert_eq!(healthy.sends.load(Ordering::SeqCst), 1);
    }
}
