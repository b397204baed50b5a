//! Outbound connections.
//!
//! - [`connectjob`]: DNS → TCP → TLS connection flow
//! - [`tls`]: connector settings with BoringSSL
//! - [`retriever`]: observe the chain an endpoint presents

pub mod connectjob;
pub mod retriever;
pub mod tls;

pub use retriever::{ChainRetriever, RetrieveChain, RetrieverConfig, Retrieving};
