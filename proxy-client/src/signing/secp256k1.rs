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

use super::{Credential, Signature, SignatureType, Signer, SigningError};
use crate::validation::EthereumAddress;
use k256::ecdsa::{RecoveryId, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use sha3::{Digest, Keccak256};

const SIGN_MAGIC: &[u8] = b"\x19Ethereum Signed Message:\n";
const PRIVATE_KEY_LEN: usize = 32;
const SIGNATURE_LEN: usize = 65;
const RECOVERY_ID_OFFSET: u8 = 27;

/// Default signer: recoverable secp256k1 ECDSA over the keccak-256 hash of the
/// prefixed payload. Signatures are 65 bytes, `r ‖ s ‖ v` with `v` in `{27, 28}`.
///
/// The credential is a 32-byte private key; the publisher address a receiver
/// recovers from a signature is the address of that key.
#[derive(Clone, Copy, Debug, Default)]
pub struct Secp256k1Signer;

impl Secp256k1Signer {
    pub fn new() -> Self {
        Self
    }

    pub fn address(&self, credential: &Credential) -> Result<EthereumAddress, SigningError> {
        Ok(address_of(signing_key(credential)?.verifying_key()))
    }

    /// Address that produced `signature` over `payload`, or `None` if the signature
    /// does not recover.
    pub fn recover_address(&self, payload: &[u8], signature: &Signature) -> Option<EthereumAddress> {
        let bytes = signature.as_bytes();
        if bytes.len() != SIGNATURE_LEN {
            return None;
        }

        let ecdsa = k256::ecdsa::Signature::from_slice(&bytes[..SIGNATURE_LEN - 1]).ok()?;
        let recovery_id =
            RecoveryId::from_byte(bytes[SIGNATURE_LEN - 1].checked_sub(RECOVERY_ID_OFFSET)?)?;
        let key =
            VerifyingKey::recover_from_prehash(&message_hash(payload), &ecdsa, recovery_id).ok()?;

        Some(address_of(&key))
    }
}

impl Signer for Secp256k1Signer {
    fn signature_type(&self) -> SignatureType {
        SignatureType::Secp256k1
    }

    fn sign(&self, payload: &[u8], credential: &Credential) -> Result<Signature, SigningError> {
        let key = signing_key(credential)?;
        let (signature, recovery_id) = key
            .sign_prehash_recoverable(&message_hash(payload))
            .map_err(|err| SigningError::Failed(err.to_string()))?;

        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(RECOVERY_ID_OFFSET + recovery_id.to_byte());
        Ok(Signature::from_bytes(bytes))
    }

    fn signer_address(
        &self,
        credential: &Credential,
    ) -> Result<Option<EthereumAddress>, SigningError> {
        self.address(credential).map(Some)
    }
}

/// keccak-256 of `SIGN_MAGIC`, the decimal payload length and the payload.
fn message_hash(payload: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(SIGN_MAGIC);
    hasher.update(payload.len().to_string().as_bytes());
    hasher.update(payload);

    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}

/// Last 20 bytes of the keccak-256 of the uncompressed public key, without its
/// SEC1 tag byte.
fn address_of(key: &VerifyingKey) -> EthereumAddress {
    let point = PublicKey::from(key).to_encoded_point(false);
    let digest = Keccak256::digest(&point.as_bytes()[1..]);

    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    EthereumAddress::from_bytes(bytes)
}

fn signing_key(credential: &Credential) -> Result<SigningKey, SigningError> {
    let digits = credential.hex_digits();
    let mut secret = [0u8; PRIVATE_KEY_LEN];

    if digits.len() != PRIVATE_KEY_LEN * 2 {
        return Err(SigningError::MalformedCredential(format!(
            "expected {} hex digits, got {}",
            PRIVATE_KEY_LEN * 2,
            digits.len()
        )));
    }
    hex::decode_to_slice(digits, &mut secret)
        .map_err(|err| SigningError::MalformedCredential(err.to_string()))?;

    SigningKey::from_slice(&secret)
        .map_err(|_| SigningError::MalformedCredential("not a valid secp256k1 scalar".to_string()))
}
