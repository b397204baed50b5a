//! Entry point for TLS errors raised by the platform validator.

use crate::socket::retriever::{ChainRetriever, RetrieveChain, RetrieverConfig};
use crate::tls::anchors::AnchorSupplier;
use crate::tls::ct::CtComplianceOracle;
use crate::tls::ctverifier::LogListOracle;
use crate::tls::logsource::CtLogSource;
use crate::validation::cache::EndpointResultCache;
use crate::validation::callback::{deliver, Decision, DecisionCallback, DecisionGuard, DecisionSender};
use crate::validation::endpoint::EndpointKey;
use crate::validation::task::{Pipeline, ValidationTask};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Why the platform rejected the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslErrorKind {
    NotYetValid,
    Expired,
    IdMismatch,
    /// Chain does not lead to a platform root.
    Untrusted,
    DateInvalid,
    Invalid,
}

/// A handshake error as reported to the embedding application.
#[derive(Debug, Clone)]
pub struct SslError {
    primary: SslErrorKind,
    url: String,
}

impl SslError {
    pub fn new(primary: SslErrorKind, url: impl Into<String>) -> Self {
        Self {
            primary,
            url: url.into(),
        }
    }

    pub fn primary(&self) -> SslErrorKind {
        self.primary
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Decides whether an untrusted endpoint may proceed under custom anchors and CT.
///
/// Verdicts are memoized per endpoint; a cached verdict is answered on the
/// calling thread, anything else is validated on the runtime and answered
/// through the [`DecisionQueue`](crate::validation::callback::DecisionQueue).
pub struct SslErrorHandler {
    pipeline: Pipeline,
    runtime: Handle,
    decisions: DecisionSender,
}

impl SslErrorHandler {
    pub fn builder(
        anchors: Arc<dyn AnchorSupplier>,
        log_source: Arc<dyn CtLogSource>,
    ) -> SslErrorHandlerBuilder {
        SslErrorHandlerBuilder {
            anchors,
            log_source,
            retriever: None,
            retriever_config: RetrieverConfig::default(),
            oracle: None,
            cache: None,
        }
    }

    pub fn cache(&self) -> &EndpointResultCache {
        &self.pipeline.cache
    }

    /// Returns `true` if the error was claimed, in which case `callback` runs
    /// exactly once. Only [`SslErrorKind::Untrusted`] is claimed.
    pub fn handle(&self, error: &SslError, callback: Box<dyn DecisionCallback>) -> bool {
        if error.primary() != SslErrorKind::Untrusted {
            tracing::debug!(kind = ?error.primary(), url = %error.url(), "not handling SSL error");
            return false;
        }

        let endpoint = match EndpointKey::parse(error.url()) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                tracing::error!(url = %error.url(), error = %e, "cannot derive endpoint from URL");
                deliver(callback, Decision::Cancel);
                return true;
            }
        };

        if let Some(verdict) = self.pipeline.cache.lookup(&endpoint) {
            tracing::debug!(endpoint = %endpoint, verdict = ?verdict, "cached verdict");
            deliver(callback, Decision::from(&verdict));
            return true;
        }

        let guard = DecisionGuard::new(endpoint.clone(), callback, self.decisions.clone());
        let task = ValidationTask::new(self.pipeline.clone(), endpoint);
        self.runtime.spawn(async move {
            let verdict = task.run().await;
            guard.complete(Decision::from(&verdict));
        });
        true
    }
}

pub struct SslErrorHandlerBuilder {
    anchors: Arc<dyn AnchorSupplier>,
    log_source: Arc<dyn CtLogSource>,
    retriever: Option<Arc<dyn RetrieveChain>>,
    retriever_config: RetrieverConfig,
    oracle: Option<Arc<dyn CtComplianceOracle>>,
    cache: Option<EndpointResultCache>,
}

impl SslErrorHandlerBuilder {
    /// Replace the network retriever, e.g. to route through a custom resolver.
    pub fn retriever(mut self, retriever: Arc<dyn RetrieveChain>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Timeouts for the default retriever. Ignored when a retriever is supplied.
    pub fn retriever_config(mut self, config: RetrieverConfig) -> Self {
        self.retriever_config = config;
        self
    }

    pub fn oracle(mut self, oracle: Arc<dyn CtComplianceOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Share a cache between handlers.
    pub fn cache(mut self, cache: EndpointResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self, runtime: Handle, decisions: DecisionSender) -> SslErrorHandler {
        let retriever = self.retriever.unwrap_or_else(|| {
            Arc::new(ChainRetriever::new().with_config(self.retriever_config))
        });
        let oracle = self
            .oracle
            .unwrap_or_else(|| Arc::new(LogListOracle::new()));

        SslErrorHandler {
            pipeline: Pipeline {
                anchors: self.anchors,
                log_source: self.log_source,
                retriever,
                oracle,
                cache: self.cache.unwrap_or_default(),
            },
            runtime,
            decisions,
        }
    }
}
