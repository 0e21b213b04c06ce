use integration_test_utils::{
    proxy, OWN_ETHEREUM_ADDRESS, PROXY_ETHEREUM_ADDRESS, SIGNER_ETHEREUM_ADDRESS, STREAM_PART_ID,
};
use proxy_client::transport::memory::{MemoryNetwork, MemoryProxy};
use proxy_client::transport::ProxyTransport;
use proxy_client::{ClientConfig, ClientHandle, Proxy, ProxyClientLibrary, StreamMessage};
use std::sync::Arc;

pub(crate) fn make_library(transport: Arc<dyn ProxyTransport>) -> ProxyClientLibrary {
    make_library_with_config(transport, ClientConfig::default())
}

#[allow(dead_code)]
pub(crate) fn make_library_with_config(
    transport: Arc<dyn ProxyTransport>,
    config: ClientConfig,
) -> ProxyClientLibrary {
    ProxyClientLibrary::builder(transport)
        .config(config)
        .init()
        .expect("library init should succeed")
}

pub(crate) async fn make_client(library: &ProxyClientLibrary) -> ClientHandle {
    library
        .new_client(OWN_ETHEREUM_ADDRESS, STREAM_PART_ID)
        .await
        .expect("client creation should succeed")
}

/// Client whose identity is the address of `SIGNING_KEY`.
#[allow(dead_code)]
pub(crate) async fn make_signing_client(library: &ProxyClientLibrary) -> ClientHandle {
    library
        .new_client(SIGNER_ETHEREUM_ADDRESS, STREAM_PART_ID)
        .await
        .expect("client creation should succeed")
}

/// One online in-memory proxy per host, returned alongside the matching client-side
/// descriptors.
pub(crate) async fn make_network(hosts: &[&str]) -> (MemoryNetwork, Vec<MemoryProxy>, Vec<Proxy>) {
    let network = MemoryNetwork::new();
    let mut nodes = Vec::with_capacity(hosts.len());
    let mut proxies = Vec::with_capacity(hosts.len());

    for host in hosts {
        let websocket_url = format!("ws://{host}");
        let node = network
            .add_proxy(&websocket_url, PROXY_ETHEREUM_ADDRESS)
            .await
            .expect("proxy registration should succeed");
        nodes.push(node);
        proxies.push(proxy(&websocket_url));
    }

    (network, nodes, proxies)
}

#[allow(dead_code)]
pub(crate) async fn received_messages(node: &MemoryProxy) -> Vec<StreamMessage> {
    node.received()
        .await
        .iter()
        .map(|payload| StreamMessage::decode(payload).expect("payload should decode"))
        .collect()
}

pub(crate) async fn assert_connect_all_ok(
    library: &ProxyClientLibrary,
    handle: ClientHandle,
    proxies: &[Proxy],
) {
    let result = library
        .connect(handle, proxies)
        .await
        .expect("connect should find the client");
    assert!(result.is_complete_success(), "{:?}", result.failed());
    assert_eq!(result.succeeded(), proxies);
}
