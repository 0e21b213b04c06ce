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

//! Partitioned per-proxy outcome of a connect, publish or teardown.

use crate::error::{ClientError, ErrorKind};
use crate::proxy::Proxy;

/// Attempted proxies split into those that succeeded and those that failed.
///
/// Every attempted proxy lands in exactly one of the two sequences. Order follows the
/// order the proxies were attempted in.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OperationResult {
    succeeded: Vec<Proxy>,
    failed: Vec<ClientError>,
}

impl OperationResult {
    pub fn from_parts(succeeded: Vec<Proxy>, failed: Vec<ClientError>) -> Self {
        Self { succeeded, failed }
    }

    /// A result carrying a single client-scoped failure and no successes.
    pub fn client_failure(error: ClientError) -> Self {
        Self {
            succeeded: Vec::new(),
            failed: vec![error],
        }
    }

    pub fn succeeded(&self) -> &[Proxy] {
        &self.succeeded
    }

    pub fn failed(&self) -> &[ClientError] {
        &self.failed
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of proxies that were attempted and reported.
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn into_parts(self) -> (Vec<Proxy>, Vec<ClientError>) {
        (self.succeeded, self.failed)
    }

    /// Appends `other` after the entries already present.
    pub fn merge(&mut self, other: OperationResult) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }
}

/// Collects per-proxy outcomes that may arrive in any order and emits them in
/// attempt order.
///
/// Slots that were never recorded are reported as failures of `missing_kind`, so a
/// lost outcome can never drop a proxy from the partition.
pub(crate) struct ResultAggregator {
    slots: Vec<(Proxy, Option<Result<(), ClientError>>)>,
    missing_kind: ErrorKind,
}

impl ResultAggregator {
    pub(crate) fn new(attempted: impl IntoIterator<Item = Proxy>, missing_kind: ErrorKind) -> Self {
        Self {
            slots: attempted.into_iter().map(|proxy| (proxy, None)).collect(),
            missing_kind,
        }
    }

    pub(crate) fn record_success(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.1 = Some(Ok(()));
        }
    }

    /// Records a failure for the proxy at `index`, attributing `error` to it.
    pub(crate) fn record_failure(&mut self, index: usize, error: ClientError) {
        if let Some(slot) = self.slots.get_mut(index) {
            let error = error.with_proxy(slot.0.clone());
            slot.1 = Some(Err(error));
        }
    }

    pub(crate) fn finish(self) -> OperationResult {
        let mut result = OperationResult::default();

        for (proxy, outcome) in self.slots {
            match outcome {
                Some(Ok(())) => result.succeeded.push(proxy),
                Some(Err(error)) => result.failed.push(error),
                None => result.failed.push(
                    ClientError::new(self.missing_kind, "no outcome recorded for proxy")
                        .with_proxy(proxy),
                ),
            }
        }

        result
    }
}
