//! DNS Resolution Module
//!
//! Pluggable resolution for the outbound connections this crate opens
//! (chain retrieval and log list downloads):
//! - System resolver (getaddrinfo via thread pool)
//! - Hostname-to-IP override table
//!
//! The [`Resolve`] trait is the seam; tests and embedders substitute their own.

mod gai;
mod resolve;

pub use gai::{ip_literal, GaiResolver};
pub use resolve::{Addrs, DnsResolverWithOverrides, Name, Resolve, Resolving};
