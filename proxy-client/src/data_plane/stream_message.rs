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

//! Envelope broadcast to proxies and the bytes its signature covers.

use crate::signing::{Credential, SignatureType, Signer, SigningError};
use crate::validation::{EthereumAddress, StreamPartId};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageId {
    pub stream_id: String,
    pub stream_partition: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub sequence_number: u64,
    pub publisher_id: String,
    pub message_chain_id: String,
}

impl MessageId {
    pub(crate) fn new(
        stream_part_id: &StreamPartId,
        publisher: &EthereumAddress,
        message_chain_id: &str,
        timestamp: u64,
        sequence_number: u64,
    ) -> Self {
        Self {
            stream_id: stream_part_id.stream_id().to_string(),
            stream_partition: stream_part_id.partition(),
            timestamp,
            sequence_number,
            publisher_id: publisher.to_lowercase_hex(),
            message_chain_id: message_chain_id.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    Binary,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMessage {
    pub message_id: MessageId,
    pub content_type: ContentType,
    #[serde(with = "hex_content")]
    pub content: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_type: Option<SignatureType>,
    /// Lowercase hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl StreamMessage {
    pub(crate) fn unsigned(message_id: MessageId, content: Vec<u8>) -> Self {
        Self {
            message_id,
            content_type: ContentType::Binary,
            content,
            signature_type: None,
            signature: None,
        }
    }

    /// Bytes covered by the signature: every message id field in declaration order,
    /// numbers in decimal, followed by the raw content.
    pub fn signature_payload(&self) -> Vec<u8> {
        let id = &self.message_id;
        let header = format!(
            "{}{}{}{}{}{}",
            id.stream_id,
            id.stream_partition,
            id.timestamp,
            id.sequence_number,
            id.publisher_id,
            id.message_chain_id
        );

        let mut payload = Vec::with_capacity(header.len() + self.content.len());
        payload.extend_from_slice(header.as_bytes());
        payload.extend_from_slice(&self.content);
        payload
    }

    pub(crate) fn sign(
        &mut self,
        signer: &dyn Signer,
        credential: &Credential,
    ) -> Result<(), SigningError> {
        let signature = signer.sign(&self.signature_payload(), credential)?;
        self.signature_type = Some(signer.signature_type());
        self.signature = Some(signature.to_hex());
        Ok(())
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn encode(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

mod hex_content {
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(content: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(content))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(encoded).map_err(serde::de::Error::custom)
    }
}
