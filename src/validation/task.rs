//! One background validation of one endpoint.

use crate::base::neterror::NetError;
use crate::base::stage::ValidationStage;
use crate::socket::retriever::RetrieveChain;
use crate::tls::anchors::AnchorSupplier;
use crate::tls::chain::CertificateChain;
use crate::tls::ct::{check_compliance, CtComplianceOracle};
use crate::tls::logsource::CtLogSource;
use crate::tls::verifier::TrustAnchorVerifier;
use crate::validation::cache::{EndpointResultCache, Verdict};
use crate::validation::endpoint::EndpointKey;
use std::sync::Arc;

/// Collaborators shared by every task a handler spawns.
#[derive(Clone)]
pub(crate) struct Pipeline {
    pub anchors: Arc<dyn AnchorSupplier>,
    pub log_source: Arc<dyn CtLogSource>,
    pub retriever: Arc<dyn RetrieveChain>,
    pub oracle: Arc<dyn CtComplianceOracle>,
    pub cache: EndpointResultCache,
}

struct StageTracker {
    endpoint: EndpointKey,
    stage: ValidationStage,
}

impl StageTracker {
    fn advance(&mut self, to: ValidationStage) {
        debug_assert!(to == self.stage.next() || to == ValidationStage::CacheWriting);
        tracing::debug!(
            endpoint = %self.endpoint,
            from = self.stage.as_str(),
            to = to.as_str(),
            blocking = to.is_blocking(),
            "validation stage"
        );
        self.stage = to;
    }
}

pub(crate) struct ValidationTask {
    pipeline: Pipeline,
    tracker: StageTracker,
}

impl ValidationTask {
    /// Starts past the cache check, which the handler already did.
    pub(crate) fn new(pipeline: Pipeline, endpoint: EndpointKey) -> Self {
        Self {
            pipeline,
            tracker: StageTracker {
                endpoint,
                stage: ValidationStage::CacheCheck,
            },
        }
    }

    /// Drive every stage and record the verdict. Never fails: errors become rejections.
    /// A verdict from an aborted worker is returned but not recorded.
    pub(crate) async fn run(mut self) -> Verdict {
        let endpoint = self.tracker.endpoint.clone();

        self.tracker.advance(ValidationStage::Retrieving);
        let outcome = match self.pipeline.retriever.retrieve(&endpoint).await {
            Ok(chain) => self.evaluate(chain).await,
            Err(e) => Err(e),
        };

        self.tracker.advance(ValidationStage::CacheWriting);
        let verdict = match outcome {
            Ok(()) => {
                tracing::debug!(endpoint = %endpoint, "endpoint accepted");
                Verdict::Accepted
            }
            // An aborted worker says nothing about the endpoint; a later error retries it.
            Err(NetError::ValidationAborted) => {
                self.tracker.advance(ValidationStage::Done);
                return Verdict::rejected(NetError::ValidationAborted.to_string());
            }
            Err(e) => {
                if e.is_configuration_error() {
                    tracing::error!(endpoint = %endpoint, error = %e, "validation misconfigured");
                } else {
                    tracing::warn!(endpoint = %endpoint, error = %e, "endpoint rejected");
                }
                Verdict::rejected(e.to_string())
            }
        };
        self.pipeline.cache.record(&endpoint, verdict.clone());

        self.tracker.advance(ValidationStage::Done);
        verdict
    }

    /// Anchors, chain validation and CT all block, so they share one pool thread.
    async fn evaluate(&mut self, chain: CertificateChain) -> Result<(), NetError> {
        let pipeline = self.pipeline.clone();
        let tracker = StageTracker {
            endpoint: self.tracker.endpoint.clone(),
            stage: self.tracker.stage,
        };

        let (tracker, result) = tokio::task::spawn_blocking(move || {
            let mut tracker = tracker;
            let result = evaluate_blocking(&pipeline, &mut tracker, &chain);
            (tracker, result)
        })
        .await
        .map_err(|e| {
            tracing::error!(endpoint = %self.tracker.endpoint, error = %e, "validation worker failed");
            NetError::ValidationAborted
        })?;

        self.tracker.stage = tracker.stage;
        result
    }
}

fn evaluate_blocking(
    pipeline: &Pipeline,
    tracker: &mut StageTracker,
    chain: &CertificateChain,
) -> Result<(), NetError> {
    tracker.advance(ValidationStage::AnchorBuilding);
    let verifier = TrustAnchorVerifier::new(&pipeline.anchors.provide())?;
    tracing::debug!(anchors = verifier.anchor_count(), "anchor store built");

    tracker.advance(ValidationStage::ChainValidating);
    let verified = verifier.verify(chain)?;

    tracker.advance(ValidationStage::CtChecking);
    check_compliance(
        pipeline.oracle.as_ref(),
        &verified,
        pipeline.log_source.as_ref(),
    )
}
