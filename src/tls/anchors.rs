//! Trust anchors embedded by the application.
//!
//! Suppliers hand out raw bytes; [`TrustAnchorSet`] turns them into parsed
//! certificates for one validation and is never reused across validations.

use crate::tls::chain::CertificateBytes;
use boring::x509::X509;
use std::path::PathBuf;

/// Source of the application's trust anchors. Callable from any thread.
///
/// An empty result is not "trust everyone": validation fails closed.
pub trait AnchorSupplier: Send + Sync {
    fn provide(&self) -> Vec<CertificateBytes>;
}

impl<F> AnchorSupplier for F
where
    F: Fn() -> Vec<CertificateBytes> + Send + Sync,
{
    fn provide(&self) -> Vec<CertificateBytes> {
        self()
    }
}

/// Anchors compiled into the binary or loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticAnchors {
    anchors: Vec<CertificateBytes>,
}

impl StaticAnchors {
    pub fn new(anchors: Vec<CertificateBytes>) -> Self {
        Self { anchors }
    }

    /// One anchor holding the whole blob; a PEM bundle is split when the set is built.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(vec![CertificateBytes::new(bytes)])
    }
}

impl AnchorSupplier for StaticAnchors {
    fn provide(&self) -> Vec<CertificateBytes> {
        self.anchors.clone()
    }
}

/// Anchors read from a DER or PEM file on every validation.
#[derive(Debug, Clone)]
pub struct PemFileAnchors {
    path: PathBuf,
}

impl PemFileAnchors {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AnchorSupplier for PemFileAnchors {
    fn provide(&self) -> Vec<CertificateBytes> {
        match std::fs::read(&self.path) {
            Ok(bytes) => vec![CertificateBytes::new(bytes)],
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "failed to read trust anchors");
                Vec::new()
            }
        }
    }
}

/// Parsed anchors for one validation.
pub struct TrustAnchorSet {
    anchors: Vec<X509>,
}

impl TrustAnchorSet {
    /// Parse every entry, skipping the ones that are not certificates.
    ///
    /// Each entry may be DER, or PEM holding one or more certificates.
    pub fn from_bytes(entries: &[CertificateBytes]) -> Self {
        let mut anchors = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let bytes = entry.as_bytes();
            if let Ok(cert) = X509::from_der(bytes) {
                anchors.push(cert);
                continue;
            }
            match X509::stack_from_pem(bytes) {
                Ok(certs) if !certs.is_empty() => anchors.extend(certs),
                Ok(_) => {
                    tracing::error!(index, "failed to extract certificate from bytes: no certificate found");
                }
                Err(e) => {
                    tracing::error!(index, error = %e, "failed to extract certificate from bytes");
                }
            }
        }
        Self { anchors }
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

impl IntoIterator for TrustAnchorSet {
    type Item = X509;
    type IntoIter = std::vec::IntoIter<X509>;

    fn into_iter(self) -> Self::IntoIter {
        self.anchors.into_iter()
    }
}
