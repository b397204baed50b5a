//! # rootgate
//!
//! Second-chance TLS trust decisions for applications that ship their own roots.
//!
//! When the platform validator rejects a handshake as untrusted, `rootgate`
//! re-fetches the endpoint's chain, validates it against the application's
//! embedded trust anchors, requires Certificate Transparency compliance, and
//! remembers the verdict for that endpoint.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rootgate::tls::{NetworkLogSource, PemFileAnchors};
//! use rootgate::validation::{decision_channel, Decision, SslError, SslErrorHandler, SslErrorKind};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (sender, mut decisions) = decision_channel();
//!     let handler = SslErrorHandler::builder(
//!         Arc::new(PemFileAnchors::new("anchors.pem")),
//!         Arc::new(NetworkLogSource::chrome().unwrap()),
//!     )
//!     .build(tokio::runtime::Handle::current(), sender);
//!
//!     let error = SslError::new(SslErrorKind::Untrusted, "https://internal.example/");
//!     handler.handle(&error, Box::new(|d: Decision| println!("{d:?}")));
//!     decisions.next().await;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error codes, validation stages, context helpers
//! - [`dns`] - Resolvers used for outbound connections
//! - [`socket`] - TLS connections and chain retrieval
//! - [`tls`] - Chains, anchors, path validation, CT compliance
//! - [`validation`] - The handler, verdict cache and callback delivery
//!
//! ## Security
//!
//! - Chains are only ever trusted through the supplied anchors; the
//!   trust-all retrieval handshake never grants trust by itself
//! - No anchors means rejection, never acceptance
//! - CT failures and undeterminable CT results both reject

pub mod base;
pub mod dns;
pub mod socket;
pub mod tls;
pub mod validation;
