//! Certificate Transparency (CT) compliance.
//!
//! The pipeline only sees [`CtComplianceOracle`] and [`check_compliance`]; the
//! oracle decides, the adapter feeds it the log list on demand. Based loosely
//! on Chromium's net/cert/ct_policy_enforcer.h.

use crate::base::neterror::NetError;
use crate::tls::chain::CertificateChain;
use crate::tls::logsource::CtLogSource;
use time::OffsetDateTime;

/// Signed Certificate Timestamp from a CT log (RFC 6962, section 3.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sct {
    /// Always 0 (v1).
    pub version: u8,
    /// SHA-256 of the log's public key.
    pub log_id: [u8; 32],
    /// Milliseconds since the Unix epoch, as signed.
    pub timestamp_ms: u64,
    pub extensions: Vec<u8>,
    /// TLS HashAlgorithm; 4 is SHA-256.
    pub hash_algorithm: u8,
    /// TLS SignatureAlgorithm; 1 is RSA, 3 is ECDSA.
    pub signature_algorithm: u8,
    pub signature: Vec<u8>,
}

impl Sct {
    pub fn timestamp(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(self.timestamp_ms as i128 * 1_000_000).ok()
    }
}

/// Result of verifying one SCT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SctStatus {
    Valid,
    InvalidSignature,
    UnknownLog,
    FutureTimestamp,
    /// The log exists but could not issue a usable SCT at that time.
    LogNotQualified,
}

/// Verdict of a compliance oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtCompliance {
    Compliant,
    NonCompliant { reason: String },
}

impl CtCompliance {
    pub fn non_compliant(reason: impl Into<String>) -> Self {
        CtCompliance::NonCompliant {
            reason: reason.into(),
        }
    }
}

/// Decides whether a trusted chain is CT compliant.
///
/// Called from the blocking pool, so implementations may block on I/O.
pub trait CtComplianceOracle: Send + Sync {
    fn check(
        &self,
        chain: &CertificateChain,
        log_list: &LogListAdapter<'_>,
    ) -> Result<CtCompliance, NetError>;
}

/// Log list access handed to the oracle.
pub struct LogListAdapter<'a> {
    source: &'a dyn CtLogSource,
}

impl<'a> LogListAdapter<'a> {
    pub fn new(source: &'a dyn CtLogSource) -> Self {
        Self { source }
    }

    /// Fetch the raw log list. May block.
    pub fn raw_log(&self) -> Result<Vec<u8>, NetError> {
        self.source.raw_log()
    }

    pub fn caching_enabled(&self) -> bool {
        self.source.cache_policy().is_some()
    }

    /// Without a policy every copy counts as expired.
    pub fn is_expired(&self, last_write: OffsetDateTime, now: OffsetDateTime) -> bool {
        match self.source.cache_policy() {
            Some(policy) => policy.is_expired(last_write, now),
            None => true,
        }
    }
}

/// Run the oracle; anything short of [`CtCompliance::Compliant`] is an error.
pub fn check_compliance(
    oracle: &dyn CtComplianceOracle,
    chain: &CertificateChain,
    source: &dyn CtLogSource,
) -> Result<(), NetError> {
    let adapter = LogListAdapter::new(source);
    match oracle.check(chain, &adapter) {
        Ok(CtCompliance::Compliant) => Ok(()),
        Ok(CtCompliance::NonCompliant { reason }) => {
            tracing::debug!(reason = %reason, "CT compliance failed");
            Err(NetError::CertificateTransparencyRequired { reason })
        }
        Err(e) => {
            tracing::error!(error = %e, "CT compliance check failed");
            Err(NetError::CtComplianceUndetermined)
        }
    }
}
