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
use ed25519_dalek::{Signer as _, SigningKey, Verifier, VerifyingKey};

const SEED_LEN: usize = 32;

/// Default signer: the credential is a 32-byte Ed25519 seed.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Signer;

impl Ed25519Signer {
    pub fn new() -> Self {
        Self
    }

    /// Public key matching `credential`, for receivers that verify signatures.
    pub fn verifying_key(&self, credential: &Credential) -> Result<[u8; 32], SigningError> {
        Ok(signing_key(credential)?.verifying_key().to_bytes())
    }

    pub fn verify(&self, payload: &[u8], signature: &Signature, public_key: &[u8; 32]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(public_key) else {
            return false;
        };
        let Ok(signature) = ed25519_dalek::Signature::from_slice(signature.as_bytes()) else {
            return false;
        };
        key.verify(payload, &signature).is_ok()
    }
}

fn signing_key(credential: &Credential) -> Result<SigningKey, SigningError> {
    let digits = credential.hex_digits();
    let mut seed = [0u8; SEED_LEN];

    if digits.len() != SEED_LEN * 2 {
        return Err(SigningError::MalformedCredential(format!(
            "expected {} hex digits, got {}",
            SEED_LEN * 2,
            digits.len()
        )));
    }
    hex::decode_to_slice(digits, &mut seed)
        .map_err(|err| SigningError::MalformedCredential(err.to_string()))?;

    Ok(SigningKey::from_bytes(&seed))
}

impl Signer for Ed25519Signer {
    fn signature_type(&self) -> SignatureType {
        SignatureType::Ed25519
    }

    fn sign(&self, payload: &[u8], credential: &Credential) -> Result<Signature, SigningError> {
        let key = signing_key(credential)?;
        Ok(Signature::from_bytes(key.sign(payload).to_bytes().to_vec()))
    }
}
