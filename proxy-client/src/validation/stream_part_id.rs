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

use super::EthereumAddress;
use crate::error::{ClientError, ErrorKind};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Exclusive upper bound for a stream partition number.
pub const MAX_PARTITION_COUNT: u32 = 100;

const PARTITION_DELIMITER: char = '#';
const PATH_DELIMITER: char = '/';
const ENS_NAME_MARKER: char = '.';

/// One partition of a stream: `<stream-id>#<partition>`.
///
/// The stream id is either `<domain>/<path>` where the domain is an address or an
/// ENS name, or a legacy id without any `/`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct StreamPartId {
    raw: String,
    stream_id_len: usize,
    partition: u32,
}

impl StreamPartId {
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let invalid = |reason: &str| {
            ClientError::new(
                ErrorKind::InvalidStreamPartId,
                format!("invalid stream part id {raw:?}: {reason}"),
            )
        };

        let (stream_id, partition) = raw
            .rsplit_once(PARTITION_DELIMITER)
            .ok_or_else(|| invalid("missing partition delimiter"))?;

        let partition = parse_partition(partition).ok_or_else(|| invalid("bad partition"))?;
        if partition >= MAX_PARTITION_COUNT {
            return Err(invalid("partition out of range"));
        }

        check_stream_id(stream_id).map_err(invalid)?;

        Ok(Self {
            raw: raw.to_string(),
            stream_id_len: stream_id.len(),
            partition,
        })
    }

    pub fn stream_id(&self) -> &str {
        &self.raw[..self.stream_id_len]
    }

    pub fn partition(&self) -> u32 {
        self.partition
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn parse_partition(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn check_stream_id(stream_id: &str) -> Result<(), &'static str> {
    if stream_id.is_empty() {
        return Err("empty stream id");
    }

    let Some((domain, _path)) = stream_id.split_once(PATH_DELIMITER) else {
        // Legacy stream id.
        return Ok(());
    };

    if domain.is_empty() {
        return Err("stream path without domain");
    }

    if domain.contains(ENS_NAME_MARKER) || EthereumAddress::parse(domain).is_ok() {
        Ok(())
    } else {
        Err("domain is neither an address nor an ENS name")
    }
}

impl FromStr for StreamPartId {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for StreamPartId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
