//! Ergonomic error context helpers.
//!
//! Converts IO errors from sockets, resolvers and files into context-rich
//! `NetError` variants.

use crate::base::neterror::NetError;
use std::io;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add connection context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use rootgate::base::context::IoResultExt;
    ///
    /// let stream = TcpStream::connect(addr).await
    ///     .connection_context("example.com", 443)?;
    /// // Refused and reset map to their own variants; anything else becomes
    /// // "Connection to example.com:443 failed: ..."
    /// ```
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError>;

    /// Add DNS resolution context to an IO error.
    fn dns_context(self, domain: &str) -> Result<T, NetError>;

    /// Map a failed read of a log list into `CtLogListUnavailable`, logging the cause.
    fn log_list_context(self, origin: &str) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError> {
        self.map_err(|e| match e.kind() {
            io::ErrorKind::ConnectionRefused => {
                tracing::debug!(host = %host, port, "connection refused");
                NetError::ConnectionRefused
            }
            io::ErrorKind::ConnectionReset => {
                tracing::debug!(host = %host, port, "connection reset");
                NetError::ConnectionReset
            }
            _ => NetError::connection_failed_to(host, port, e),
        })
    }

    fn dns_context(self, domain: &str) -> Result<T, NetError> {
        self.map_err(|e| NetError::dns_failed(domain, e))
    }

    fn log_list_context(self, origin: &str) -> Result<T, NetError> {
        self.map_err(|e| {
            tracing::error!(origin = %origin, error = %e, "failed to read CT log list");
            NetError::CtLogListUnavailable
        })
    }
}
