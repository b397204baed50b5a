//! Retrieval of the certificate chain an endpoint presents.
//!
//! The handshake deliberately trusts everything: the chain is only observed
//! here and evaluated later against the application's own anchors.

use crate::base::neterror::NetError;
use crate::dns::{GaiResolver, Resolve};
use crate::socket::connectjob::ConnectJob;
use crate::socket::tls::TlsConfig;
use crate::tls::chain::{CertificateBytes, CertificateChain};
use crate::validation::endpoint::EndpointKey;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Future returned by [`RetrieveChain::retrieve`].
pub type Retrieving = Pin<Box<dyn Future<Output = Result<CertificateChain, NetError>> + Send>>;

/// Fetches the chain an endpoint presents during a TLS handshake.
pub trait RetrieveChain: Send + Sync {
    fn retrieve(&self, target: &EndpointKey) -> Retrieving;
}

/// Timeouts bounding one retrieval.
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    pub connect_timeout: Duration,
    pub handshake_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            handshake_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(1),
        }
    }
}

impl RetrieverConfig {
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}

/// Opens a fresh TLS session per call and closes it once the chain is read.
#[derive(Clone)]
pub struct ChainRetriever {
    resolver: Arc<dyn Resolve>,
    tls: TlsConfig,
    config: RetrieverConfig,
}

impl Default for ChainRetriever {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainRetriever {
    pub fn new() -> Self {
        Self {
            resolver: Arc::new(GaiResolver::new()),
            tls: TlsConfig::observe_only(),
            config: RetrieverConfig::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_config(mut self, config: RetrieverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    async fn fetch(
        resolver: Arc<dyn Resolve>,
        tls: TlsConfig,
        config: RetrieverConfig,
        target: EndpointKey,
    ) -> Result<CertificateChain, NetError> {
        let job = ConnectJob::new(resolver.as_ref(), &tls)
            .with_timeouts(config.connect_timeout, config.handshake_timeout);
        let mut stream = job.connect(target.url()).await?;

        let presented: Vec<CertificateBytes> = match stream.ssl().peer_cert_chain() {
            Some(stack) => stack
                .iter()
                .map(|cert| cert.to_der().map(CertificateBytes::from))
                .collect::<Result<_, _>>()
                .map_err(|_| NetError::SslServerCertBadFormat)?,
            None => Vec::new(),
        };

        // Close politely; the session is torn down on drop either way.
        if tokio::time::timeout(config.shutdown_timeout, stream.shutdown())
            .await
            .is_err()
        {
            tracing::debug!(endpoint = %target, "TLS shutdown timed out");
        }
        drop(stream);

        tracing::debug!(endpoint = %target, certs = presented.len(), "retrieved peer chain");
        CertificateChain::from_der_list(presented)
    }
}

impl RetrieveChain for ChainRetriever {
    fn retrieve(&self, target: &EndpointKey) -> Retrieving {
        Box::pin(Self::fetch(
            Arc::clone(&self.resolver),
            self.tls.clone(),
            self.config.clone(),
            target.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let config = RetrieverConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.handshake_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_builder() {
        let config = RetrieverConfig::default()
            .connect_timeout(Duration::from_millis(250))
            .handshake_timeout(Duration::from_millis(500));
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.handshake_timeout, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_plain_http_refused() {
        let retriever = ChainRetriever::new();
        let key = EndpointKey::parse("http://127.0.0.1:1/").unwrap();
        let result = retriever.retrieve(&key).await;
        assert!(matches!(result, Err(NetError::ExpectedSecureTransport)));
    }
}
