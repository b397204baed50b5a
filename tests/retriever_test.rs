mod common;

use rootgate::base::neterror::NetError;
use rootgate::dns::{DnsResolverWithOverrides, GaiResolver, Name, Resolve, Resolving};
use rootgate::socket::retriever::{ChainRetriever, RetrieveChain, RetrieverConfig};
use rootgate::validation::endpoint::EndpointKey;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[tokio::test]
async fn test_retrieves_presented_chain() {
    let root = common::root_ca("Retriever Root");
    let leaf = common::leaf("localhost", &root, 30);
    let (addr, mut closed) = common::tls_server(&[&leaf, &root]).await;

    let key = EndpointKey::parse(&format!("https://{}/some/path?q=1", addr)).unwrap();
    let chain = ChainRetriever::new().retrieve(&key).await.unwrap();

    assert_eq!(chain.len(), 2);
    assert_eq!(chain.leaf(), &leaf.bytes());
    assert_eq!(chain.issuer(), Some(&root.bytes()));

    // The retriever must not keep the session open.
    let closed = tokio::time::timeout(Duration::from_secs(5), closed.recv()).await;
    assert!(matches!(closed, Ok(Some(()))), "server never saw the client hang up");
}

#[tokio::test]
async fn test_untrusted_chain_still_observed() {
    // Nothing anchors this root; retrieval observes it anyway.
    let root = common::root_ca("Unknown Root");
    let leaf = common::expired_leaf("localhost", &root);
    let (addr, _closed) = common::tls_server(&[&leaf]).await;

    let key = EndpointKey::parse(&format!("https://{}/", addr)).unwrap();
    let chain = ChainRetriever::new().retrieve(&key).await.unwrap();
    assert_eq!(chain.len(), 1);
}

#[tokio::test]
async fn test_handshake_timeout_closes_socket() {
    let (addr, mut closed) = common::silent_server().await;
    let retriever = ChainRetriever::new().with_config(
        RetrieverConfig::default().handshake_timeout(Duration::from_millis(200)),
    );

    let key = EndpointKey::parse(&format!("https://{}/", addr)).unwrap();
    let result = retriever.retrieve(&key).await;
    assert!(matches!(result, Err(NetError::ConnectionTimedOut)));

    let closed = tokio::time::timeout(Duration::from_secs(5), closed.recv()).await;
    assert!(matches!(closed, Ok(Some(()))), "socket leaked after timeout");
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let key = EndpointKey::parse(&format!("https://{}/", addr)).unwrap();
    let result = ChainRetriever::new().retrieve(&key).await;
    assert!(matches!(result, Err(NetError::ConnectionRefused)));
}

/// Resolver whose lookups never complete.
struct StalledResolver;

impl Resolve for StalledResolver {
    fn resolve(&self, _name: Name) -> Resolving {
        Box::pin(futures::future::pending())
    }
}

#[tokio::test]
async fn test_stalled_dns_times_out() {
    let retriever = ChainRetriever::new()
        .with_resolver(Arc::new(StalledResolver))
        .with_config(RetrieverConfig::default().connect_timeout(Duration::from_millis(200)));

    let key = EndpointKey::parse("https://never.test/").unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), retriever.retrieve(&key))
        .await
        .expect("DNS stall not bounded by the connect timeout");
    assert!(matches!(result, Err(NetError::ConnectionTimedOut)));
}

#[tokio::test]
async fn test_resolver_override() {
    let root = common::root_ca("Override Root");
    let leaf = common::leaf("pinned.test", &root, 30);
    let (addr, _closed) = common::tls_server(&[&leaf, &root]).await;

    let resolver = DnsResolverWithOverrides::new(Arc::new(GaiResolver::new()))
        .with_override("pinned.test", vec![addr]);
    let retriever = ChainRetriever::new().with_resolver(Arc::new(resolver));

    let key = EndpointKey::parse(&format!("https://pinned.test:{}/", addr.port())).unwrap();
    let chain = retriever.retrieve(&key).await.unwrap();
    assert_eq!(chain.leaf(), &leaf.bytes());
}
