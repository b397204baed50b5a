//! Decision callbacks and their delivery back to the caller's thread.
//!
//! Background validations never run callbacks themselves: they push a
//! [`PendingDecision`] onto an unbounded channel, and whoever owns the
//! [`DecisionQueue`] (typically the UI loop) runs it.

use crate::validation::cache::Verdict;
use crate::validation::endpoint::EndpointKey;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Cancel,
}

impl From<&Verdict> for Decision {
    fn from(verdict: &Verdict) -> Self {
        if verdict.is_accepted() {
            Decision::Proceed
        } else {
            Decision::Cancel
        }
    }
}

/// Continues or aborts the suspended connection. Invoked exactly once.
pub trait DecisionCallback: Send + 'static {
    fn on_proceeded(self: Box<Self>);
    fn on_canceled(self: Box<Self>);
}

impl<F> DecisionCallback for F
where
    F: FnOnce(Decision) + Send + 'static,
{
    fn on_proceeded(self: Box<Self>) {
        (*self)(Decision::Proceed)
    }

    fn on_canceled(self: Box<Self>) {
        (*self)(Decision::Cancel)
    }
}

pub(crate) fn deliver(callback: Box<dyn DecisionCallback>, decision: Decision) {
    match decision {
        Decision::Proceed => callback.on_proceeded(),
        Decision::Cancel => callback.on_canceled(),
    }
}

/// A callback waiting to run on the consumer's thread.
pub struct PendingDecision {
    endpoint: EndpointKey,
    decision: Decision,
    callback: Box<dyn DecisionCallback>,
}

impl PendingDecision {
    pub fn endpoint(&self) -> &EndpointKey {
        &self.endpoint
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn run(self) {
        tracing::debug!(endpoint = %self.endpoint, decision = ?self.decision, "delivering decision");
        deliver(self.callback, self.decision);
    }
}

/// Producer half, held by the handler.
#[derive(Clone)]
pub struct DecisionSender {
    tx: mpsc::UnboundedSender<PendingDecision>,
}

/// Consumer half, drained on the thread that must run callbacks.
pub struct DecisionQueue {
    rx: mpsc::UnboundedReceiver<PendingDecision>,
}

pub fn decision_channel() -> (DecisionSender, DecisionQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DecisionSender { tx }, DecisionQueue { rx })
}

impl DecisionSender {
    pub(crate) fn send(&self, endpoint: EndpointKey, decision: Decision, callback: Box<dyn DecisionCallback>) {
        let pending = PendingDecision {
            endpoint,
            decision,
            callback,
        };
        if let Err(mpsc::error::SendError(lost)) = self.tx.send(pending) {
            tracing::error!(endpoint = %lost.endpoint, "decision queue closed, callback dropped");
        }
    }
}

impl DecisionQueue {
    /// Run every callback already queued without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(pending) = self.rx.try_recv() {
            pending.run();
            ran += 1;
        }
        ran
    }

    /// Wait for the next callback and run it.
    pub async fn next(&mut self) -> Option<Decision> {
        let pending = self.rx.recv().await?;
        let decision = pending.decision();
        pending.run();
        Some(decision)
    }

    /// Blocking form of [`next`](Self::next), for threads outside the runtime.
    pub fn blocking_next(&mut self) -> Option<Decision> {
        let pending = self.rx.blocking_recv()?;
        let decision = pending.decision();
        pending.run();
        Some(decision)
    }
}

/// Owns a callback until a decision is delivered; cancels it if dropped first.
pub(crate) struct DecisionGuard {
    endpoint: EndpointKey,
    callback: Option<Box<dyn DecisionCallback>>,
    sender: DecisionSender,
}

impl DecisionGuard {
    pub(crate) fn new(endpoint: EndpointKey, callback: Box<dyn DecisionCallback>, sender: DecisionSender) -> Self {
        Self {
            endpoint,
            callback: Some(callback),
            sender,
        }
    }

    pub(crate) fn complete(mut self, decision: Decision) {
        if let Some(callback) = self.callback.take() {
            self.sender.send(self.endpoint.clone(), decision, callback);
        }
    }
}

impl Drop for DecisionGuard {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            tracing::error!(endpoint = %self.endpoint, "validation ended without a verdict, canceling");
            self.sender.send(self.endpoint.clone(), Decision::Cancel, callback);
        }
    }
}
