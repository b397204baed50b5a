//! Endpoint validation against custom anchors and CT.
//!
//! - [`handler`]: claims untrusted-certificate errors and answers them
//! - [`cache`]: verdicts memoized per endpoint
//! - [`callback`]: exactly-once decisions delivered to the caller's thread

pub mod cache;
pub mod callback;
pub mod endpoint;
pub mod handler;
mod task;

pub use cache::{EndpointResultCache, Verdict};
pub use callback::{decision_channel, Decision, DecisionCallback, DecisionQueue, DecisionSender, PendingDecision};
pub use endpoint::EndpointKey;
pub use handler::{SslError, SslErrorHandler, SslErrorHandlerBuilder, SslErrorKind};
