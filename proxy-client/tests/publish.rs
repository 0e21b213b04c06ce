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

mod support;

use integration_test_utils::{OWN_ETHEREUM_ADDRESS, SIGNER_ETHEREUM_ADDRESS, SIGNING_KEY};
use proxy_client::{
    ClientConfig, ConnectionState, ContentType, Credential, Ed25519Signer, ErrorKind,
    ProxyClientLibrary, Secp256k1Signer, Signature, SignatureType, StreamMessage,
};
use std::sync::Arc;
use std::time::Duration;
use support::{
    assert_connect_all_ok, make_client, make_library, make_library_with_config, make_network,
    make_signing_client, received_messages,
};

fn signature_of(message: &StreamMessage) -> Signature {
    let signature_hex = message.signature.clone().expect("message should be signed");
    Signature::from_bytes(hex::decode(signature_hex).expect("signature should be hex"))
}

const HOSTS: [&str; 3] = [
    "proxy-a.example.com",
    "proxy-b.example.com",
    "proxy-c.example.com",
];

#[tokio::test]
async fn publish_reaches_every_connected_proxy() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS).await;
    let library = make_library(Arc::new(network.transport()));
    let handle = make_client(&library).await;
    assert_connect_all_ok(&library, handle, &proxies).await;

    let result = library.publish(handle, b"hello", None).await.unwrap();

    assert_eq!(result.succeeded(), &proxies[..]);
    assert!(result.failed().is_empty());
    for node in &nodes {
        assert_eq!(node.received_count().await, 1);
    }
}

#[tokio::test]
async fn every_proxy_receives_identical_bytes() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS).await;
    let library = make_library(Arc::new(network.transport()));
    let handle = make_signing_client(&library).await;
    assert_connect_all_ok(&library, handle, &proxies).await;

    library
        .publish(handle, b"same everywhere", Some(&Credential::new(SIGNING_KEY)))
        .await
        .unwrap();

    let first = nodes[0].received().await;
    for node in &nodes[1..] {
        assert_eq!(node.received().await, first);
    }
}

#[tokio::test]
async fn unsigned_publish_carries_no_signature() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS[..1]).await;
    let library = make_library(Arc::new(network.transport()));
    let handle = make_client(&library).await;
    assert_connect_all_ok(&library, handle, &proxies).await;

    library.publish(handle, b"plain", None).await.unwrap();
    // An empty credential is the same as none.
    library
        .publish(handle, b"plain", Some(&Credential::new("")))
        .await
        .unwrap();

    for message in received_messages(&nodes[0]).await {
        assert!(!message.is_signed());
        assert_eq!(message.signature_type, None);
        assert_eq!(message.content, b"plain");
        assert_eq!(message.content_type, ContentType::Binary);
    }
}

#[tokio::test]
async fn signed_publish_recovers_to_the_publisher_address() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS[..1]).await;
    let library = make_library(Arc::new(network.transport()));
    let handle = make_signing_client(&library).await;
    assert_connect_all_ok(&library, handle, &proxies).await;

    let result = library
        .publish(handle, b"signed payload", Some(&Credential::new(SIGNING_KEY)))
        .await
        .unwrap();
    assert!(result.is_complete_success(), "{:?}", result.failed());

    let message = received_messages(&nodes[0]).await.remove(0);
    assert_eq!(message.signature_type, Some(SignatureType::Secp256k1));
    assert_eq!(message.message_id.publisher_id, SIGNER_ETHEREUM_ADDRESS);
    let signature = signature_of(&message);
    assert_eq!(signature.as_bytes().len(), 65);

    let signer = Secp256k1Signer::new();
    let recovered = signer
        .recover_address(&message.signature_payload(), &signature)
        .expect("signature should recover");
    assert_eq!(recovered.as_str(), message.message_id.publisher_id);

    let mut tampered = message.clone();
    tampered.content = b"other payload".to_vec();
    assert_ne!(
        signer.recover_address(&tampered.signature_payload(), &signature),
        Some(recovered)
    );
}

#[tokio::test]
async fn credential_of_another_address_is_refused() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS[..1]).await;
    let library = make_library(Arc::new(network.transport()));
    let handle = make_client(&library).await;
    assert_connect_all_ok(&library, handle, &proxies).await;

    let result = library
        .publish(handle, b"payload", Some(&Credential::new(SIGNING_KEY)))
        .await
        .unwrap();

    assert!(result.succeeded().is_empty());
    assert_eq!(result.failed().len(), 1);
    assert_eq!(result.failed()[0].kind(), ErrorKind::ProxyBroadcastFailed);
    assert!(result.failed()[0].is_client_scoped());
    assert!(result.failed()[0].message().contains(SIGNER_ETHEREUM_ADDRESS));
    assert_eq!(nodes[0].received_count().await, 0);
}

#[tokio::test]
async fn ed25519_signer_can_be_plugged_in() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS[..1]).await;
    let library = ProxyClientLibrary::builder(Arc::new(network.transport()))
        .signer(Arc::new(Ed25519Signer::new()))
        .init()
        .unwrap();
    let handle = make_client(&library).await;
    assert_connect_all_ok(&library, handle, &proxies).await;
    let credential = Credential::new(SIGNING_KEY);

    library
        .publish(handle, b"signed payload", Some(&credential))
        .await
        .unwrap();

    let message = received_messages(&nodes[0]).await.remove(0);
    assert_eq!(message.signature_type, Some(SignatureType::Ed25519));
    let signature = signature_of(&message);

    let signer = Ed25519Signer::new();
    let public_key = signer.verifying_key(&credential).unwrap();
    assert!(signer.verify(&message.signature_payload(), &signature, &public_key));

    let mut tampered = message.clone();
    tampered.content = b"other payload".to_vec();
    assert!(!signer.verify(&tampered.signature_payload(), &signature, &public_key));
}

#[tokio::test]
async fn malformed_credential_fails_the_whole_publish() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS[..1]).await;
    let library = make_library(Arc::new(network.transport()));
    let handle = make_client(&library).await;
    assert_connect_all_ok(&library, handle, &proxies).await;

    let result = library
        .publish(handle, b"payload", Some(&Credential::new("0xnot-a-key")))
        .await
        .unwrap();

    assert!(result.succeeded().is_empty());
    assert_eq!(result.failed().len(), 1);
    assert_eq!(result.failed()[0].kind(), ErrorKind::ProxyBroadcastFailed);
    assert!(result.failed()[0].is_client_scoped());
    assert_eq!(nodes[0].received_count().await, 0);
}

#[tokio::test]
async fn refused_publish_does_not_consume_a_sequence_number() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS[..1]).await;
    let library = make_library(Arc::new(network.transport()));
    let handle = make_client(&library).await;
    assert_connect_all_ok(&library, handle, &proxies).await;

    for credential in ["0xnot-a-key", SIGNING_KEY] {
        let refused = library
            .publish(handle, b"refused", Some(&Credential::new(credential)))
            .await
            .unwrap();
        assert!(refused.succeeded().is_empty());
    }
    library.publish(handle, b"first", None).await.unwrap();
    library.publish(handle, b"second", None).await.unwrap();

    let sequence_numbers: Vec<_> = received_messages(&nodes[0])
        .await
        .iter()
        .map(|message| message.message_id.sequence_number)
        .collect();
    assert_eq!(sequence_numbers, vec![1, 2]);
}

#[tokio::test]
async fn message_ids_form_one_chain_with_increasing_sequence_numbers() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS[..1]).await;
    let library = make_library(Arc::new(network.transport()));
    let handle = make_client(&library).await;
    assert_connect_all_ok(&library, handle, &proxies).await;

    for content in [b"one", b"two", b"six"] {
        library.publish(handle, content, None).await.unwrap();
    }

    let messages = received_messages(&nodes[0]).await;
    let sequence_numbers: Vec<_> = messages
        .iter()
        .map(|message| message.message_id.sequence_number)
        .collect();
    assert_eq!(sequence_numbers, vec![1, 2, 3]);

    let first = &messages[0].message_id;
    assert_eq!(first.stream_id, "0xa000000000000000000000000000000000000000");
    assert_eq!(first.stream_partition, 1);
    assert_eq!(first.publisher_id, OWN_ETHEREUM_ADDRESS);
    assert!(uuid::Uuid::parse_str(&first.message_chain_id).is_ok());
    for message in &messages[1..] {
        assert_eq!(message.message_id.message_chain_id, first.message_chain_id);
        assert!(message.message_id.timestamp >= first.timestamp);
    }
}

#[tokio::test]
async fn configured_message_chain_id_is_used() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS[..1]).await;
    let config = ClientConfig::default().with_message_chain_id("chain-under-test");
    let library = make_library_with_config(Arc::new(network.transport()), config);
    let handle = make_client(&library).await;
    assert_connect_all_ok(&library, handle, &proxies).await;

    library.publish(handle, b"payload", None).await.unwrap();

    let message = received_messages(&nodes[0]).await.remove(0);
    assert_eq!(message.message_id.message_chain_id, "chain-under-test");
}

#[tokio::test]
async fn rejecting_proxy_fails_only_its_own_slot() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS).await;
    let library = make_library(Arc::new(network.transport()));
    let handle = make_client(&library).await;
    assert_connect_all_ok(&library, handle, &proxies).await;
    nodes[1].set_fail_sends(true);

    let result = library.publish(handle, b"payload", None).await.unwrap();

    assert_eq!(result.succeeded(), &[proxies[0].clone(), proxies[2].clone()]);
    assert_eq!(result.failed().len(), 1);
    assert_eq!(result.failed()[0].kind(), ErrorKind::ProxyBroadcastFailed);
    assert_eq!(result.failed()[0].proxy(), Some(&proxies[1]));
    // A rejected send does not tear the connection down.
    assert_eq!(
        library.connection_states(handle).await.unwrap()[1].1,
        ConnectionState::Connected
    );
}

#[tokio::test]
async fn dropped_connection_is_marked_disconnected() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS[..2]).await;
    let library = make_library(Arc::new(network.transport()));
    let handle = make_client(&library).await;
    assert_connect_all_ok(&library, handle, &proxies).await;
    nodes[0].set_online(false);

    let first = library.publish(handle, b"payload", None).await.unwrap();
    assert_eq!(first.succeeded(), &proxies[1..]);
    assert_eq!(first.failed()[0].proxy(), Some(&proxies[0]));
    assert_eq!(
        library.connection_states(handle).await.unwrap()[0].1,
        ConnectionState::Disconnected
    );

    let second = library.publish(handle, b"payload", None).await.unwrap();
    assert_eq!(second.failed()[0].kind(), ErrorKind::ProxyBroadcastFailed);
    assert!(second.failed()[0].message().contains("not connected"));

    nodes[0].set_online(true);
    assert_connect_all_ok(&library, handle, &proxies).await;
    let third = library.publish(handle, b"payload", None).await.unwrap();
    assert_eq!(third.succeeded(), &proxies[..]);
    assert_eq!(nodes[0].connections_opened(), 2);
}

#[tokio::test(start_paused = true)]
async fn abandoned_publish_still_records_a_dropped_connection() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS[..2]).await;
    let library = make_library(Arc::new(network.transport()));
    let handle = make_client(&library).await;
    assert_connect_all_ok(&library, handle, &proxies).await;
    nodes[0].set_send_delay(Some(Duration::from_millis(200))).await;

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        library.publish(handle, b"payload", None),
    )
    .await;
    assert!(abandoned.is_err());

    nodes[0].set_online(false);
    tokio::time::sleep(Duration::from_millis(400)).await;

    let states = library.connection_states(handle).await.unwrap();
    assert_eq!(states[0].1, ConnectionState::Disconnected);
    assert_eq!(states[1].1, ConnectionState::Connected);
    assert_eq!(nodes[0].received_count().await, 0);
    assert_eq!(nodes[1].received_count().await, 1);

    nodes[0].set_online(true);
    nodes[0].set_send_delay(None).await;
    assert_connect_all_ok(&library, handle, &proxies).await;
    assert_eq!(nodes[0].connections_opened(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_proxy_times_out_without_holding_back_the_rest() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS).await;
    let config = ClientConfig::default().with_publish_timeout(Duration::from_millis(100));
    let library = make_library_with_config(Arc::new(network.transport()), config);
    let handle = make_client(&library).await;
    assert_connect_all_ok(&library, handle, &proxies).await;
    nodes[2].set_send_delay(Some(Duration::from_secs(10))).await;

    let result = library.publish(handle, b"payload", None).await.unwrap();

    assert_eq!(result.succeeded(), &proxies[..2]);
    assert_eq!(result.failed().len(), 1);
    assert_eq!(result.failed()[0].kind(), ErrorKind::ProxyBroadcastFailed);
    assert_eq!(result.failed()[0].proxy(), Some(&proxies[2]));
    assert_eq!(nodes[2].received_count().await, 0);
}

#[tokio::test]
async fn publish_with_failed_connections_reports_each_proxy() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS[..2]).await;
    let library = make_library(Arc::new(network.transport()));
    let handle = make_client(&library).await;
    nodes[1].set_online(false);
    library.connect(handle, &proxies).await.unwrap();

    let result = library.publish(handle, b"payload", None).await.unwrap();

    assert_eq!(result.succeeded(), &proxies[..1]);
    assert_eq!(result.failed()[0].proxy(), Some(&proxies[1]));
}

#[tokio::test]
async fn publish_before_connect_is_a_client_scoped_failure() {
    integration_test_utils::init_logging();
    let (network, _nodes, _proxies) = make_network(&HOSTS[..1]).await;
    let library = make_library(Arc::new(network.transport()));
    let handle = make_client(&library).await;

    let result = library.publish(handle, b"payload", None).await.unwrap();

    assert_eq!(result.failed().len(), 1);
    assert_eq!(result.failed()[0].kind(), ErrorKind::ProxyBroadcastFailed);
    assert!(result.failed()[0].is_client_scoped());
}

#[tokio::test]
async fn empty_content_is_published() {
    integration_test_utils::init_logging();
    let (network, nodes, proxies) = make_network(&HOSTS[..1]).await;
    let library = make_library(Arc::new(network.transport()));
    let handle = make_client(&library).await;
    assert_connect_all_ok(&library, handle, &proxies).await;

    let result = library.publish(handle, &[], None).await.unwrap();

    assert!(result.is_complete_success());
    assert!(received_messages(&nodes[0]).await[0].content.is_empty());
}
