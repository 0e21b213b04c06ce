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

//! Per-client record of known proxies and their connection state.

use crate::data_plane::fan_out::PublishTarget;
use crate::proxy::Proxy;
use crate::transport::ProxyConnection;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A client's connection set, shared with the send tasks of its publishes.
pub(crate) type SharedConnectionSet = Arc<Mutex<ConnectionSet>>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    /// The last dial failed for the given reason.
    Failed(String),
}

pub(crate) struct ConnectionEntry {
    proxy: Proxy,
    state: ConnectionState,
    connection: Option<Arc<dyn ProxyConnection>>,
}

/// Proxies in first-insertion order with their current state.
///
/// A live connection is held only by `Connected` entries.
#[derive(Default)]
pub(crate) struct ConnectionSet {
    entries: Vec<ConnectionEntry>,
}

impl ConnectionSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn state(&self, proxy: &Proxy) -> Option<&ConnectionState> {
        self.entry(proxy).map(|entry| &entry.state)
    }

    pub(crate) fn is_connected(&self, proxy: &Proxy) -> bool {
        self.state(proxy) == Some(&ConnectionState::Connected)
    }

    pub(crate) fn mark_connected(&mut self, proxy: &Proxy, connection: Arc<dyn ProxyConnection>) {
        let entry = self.entry_or_insert(proxy);
        entry.state = ConnectionState::Connected;
        entry.connection = Some(connection);
    }

    /// Records a failed dial, dropping any connection the entry still held.
    pub(crate) fn mark_failed(&mut self, proxy: &Proxy, reason: impl Into<String>) {
        let entry = self.entry_or_insert(proxy);
        entry.state = ConnectionState::Failed(reason.into());
        entry.connection = None;
    }

    /// Drops `connection` from the entry for `proxy`, unless the entry has since moved
    /// on to a different connection.
    pub(crate) fn mark_disconnected(
        &mut self,
        proxy: &Proxy,
        connection: &Arc<dyn ProxyConnection>,
    ) {
        let Some(entry) = self.entry_mut(proxy) else {
            return;
        };

        let current = entry
            .connection
            .as_ref()
            .is_some_and(|held| same_connection(held, connection));
        if current {
            entry.state = ConnectionState::Disconnected;
            entry.connection = None;
        }
    }

    /// Every entry in order, connected or not, as publish targets.
    pub(crate) fn publish_targets(&self) -> Vec<PublishTarget> {
        self.entries
            .iter()
            .map(|entry| PublishTarget {
                proxy: entry.proxy.clone(),
                connection: entry.connection.clone(),
            })
            .collect()
    }

    pub(crate) fn connected_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.state == ConnectionState::Connected)
            .count()
    }

    /// Empties the set and returns the live connections it held.
    pub(crate) fn drain_connected(&mut self) -> Vec<(Proxy, Arc<dyn ProxyConnection>)> {
        self.entries
            .drain(..)
            .filter_map(|entry| entry.connection.map(|connection| (entry.proxy, connection)))
            .collect()
    }

    pub(crate) fn snapshot(&self) -> Vec<(Proxy, ConnectionState)> {
        self.entries
            .iter()
            .map(|entry| (entry.proxy.clone(), entry.state.clone()))
            .collect()
    }

    fn entry(&self, proxy: &Proxy) -> Option<&ConnectionEntry> {
        self.entries.iter().find(|entry| &entry.proxy == proxy)
    }

    fn entry_mut(&mut self, proxy: &Proxy) -> Option<&mut ConnectionEntry> {
        self.entries.iter_mut().find(|entry| &entry.proxy == proxy)
    }

    fn entry_or_insert(&mut self, proxy: &Proxy) -> &mut ConnectionEntry {
        let position = match self.entries.iter().position(|entry| &entry.proxy == proxy) {
            Some(position) => position,
            None => {
                self.entries.push(ConnectionEntry {
                    proxy: proxy.clone(),
                    state: ConnectionState::Disconnected,
                    connection: None,
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[position]
    }
}

fn same_connection(a: &Arc<dyn ProxyConnection>, b: &Arc<dyn ProxyConnection>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}
