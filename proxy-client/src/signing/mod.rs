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

//! Signing collaborator used by the publish path.
//!
//! Signing is stateless. A [`Signer`] only turns a payload and a [`Credential`] into a
//! [`Signature`]; absent credentials are handled by the caller, which publishes unsigned.
//! The default [`Secp256k1Signer`] produces recoverable signatures, so a receiver can
//! check them against the message's publisher address.

mod ed25519;
mod secp256k1;

pub use ed25519::Ed25519Signer;
pub use secp256k1::Secp256k1Signer;

use crate::validation::EthereumAddress;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Signature scheme tag carried on the wire next to the signature bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignatureType {
    Secp256k1,
    Ed25519,
}

/// Private key material, as hex with an optional `0x` prefix.
#[derive(Clone, Eq, PartialEq)]
pub struct Credential(String);

impl Credential {
    pub fn new(private_key_hex: impl Into<String>) -> Self {
        Self(private_key_hex.into())
    }

    pub fn is_empty(&self) -> bool {
        self.hex_digits().is_empty()
    }

    pub(crate) fn hex_digits(&self) -> &str {
        let trimmed = self.0.trim();
        trimmed.strip_prefix("0x").unwrap_or(trimmed)
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

/// The credential could not be turned into a signing key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SigningError {
    MalformedCredential(String),
    Failed(String),
}

impl Display for SigningError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningError::MalformedCredential(reason) => {
                write!(f, "malformed signing credential: {reason}")
            }
            SigningError::Failed(reason) => write!(f, "signing failed: {reason}"),
        }
    }
}

impl Error for SigningError {}

pub trait Signer: Send + Sync {
    fn signature_type(&self) -> SignatureType;

    fn sign(&self, payload: &[u8], credential: &Credential) -> Result<Signature, SigningError>;

    /// Address the credential signs as, for schemes bound to an account address.
    fn signer_address(
        &self,
        _credential: &Credential,
    ) -> Result<Option<EthereumAddress>, SigningError> {
        Ok(None)
    }
}
