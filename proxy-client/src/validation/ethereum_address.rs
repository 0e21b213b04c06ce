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

use crate::error::{ClientError, ErrorKind};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const PREFIX: &str = "0x";
const HEX_DIGITS: usize = 40;

/// Account-style address: `0x` followed by 40 hex digits.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct EthereumAddress {
    raw: String,
    bytes: [u8; 20],
}

impl EthereumAddress {
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let invalid = || {
            ClientError::new(
                ErrorKind::InvalidEthereumAddress,
                format!("invalid ethereum address: {raw:?}"),
            )
        };

        let digits = raw.strip_prefix(PREFIX).ok_or_else(invalid)?;
        if digits.len() != HEX_DIGITS {
            return Err(invalid());
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| invalid())?;

        Ok(Self {
            raw: raw.to_string(),
            bytes,
        })
    }

    /// Address rendered in lowercase from its 20 raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self {
            raw: format!("{PREFIX}{}", hex::encode(bytes)),
            bytes,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `0x`-prefixed lowercase form, used wherever the address is rendered into a
    /// signature payload.
    pub fn to_lowercase_hex(&self) -> String {
        self.raw.to_ascii_lowercase()
    }

    pub fn to_bytes(&self) -> [u8; 20] {
        self.bytes
    }
}

impl FromStr for EthereumAddress {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for EthereumAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for EthereumAddress {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}
