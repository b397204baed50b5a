//! Certificate bytes and peer chains.

use crate::base::neterror::NetError;
use boring::hash::{hash, MessageDigest};
use boring::x509::{X509Ref, X509};
use std::fmt;
use std::sync::Arc;

/// SHA-256 hash of a certificate's SPKI (Subject Public Key Info).
pub type SpkiHash = [u8; 32];

/// One DER-encoded X.509 certificate. Immutable and cheap to clone.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CertificateBytes(Arc<[u8]>);

impl CertificateBytes {
    pub fn new(der: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(der.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse as a DER certificate.
    pub fn to_x509(&self) -> Result<X509, NetError> {
        X509::from_der(&self.0).map_err(|_| NetError::SslServerCertBadFormat)
    }
}

impl From<Vec<u8>> for CertificateBytes {
    fn from(der: Vec<u8>) -> Self {
        Self::new(der)
    }
}

impl From<&[u8]> for CertificateBytes {
    fn from(der: &[u8]) -> Self {
        Self::new(der.to_vec())
    }
}

impl AsRef<[u8]> for CertificateBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for CertificateBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CertificateBytes")
            .field(&format_args!("{} bytes", self.0.len()))
            .finish()
    }
}

/// Certificates as presented by a peer, leaf first.
///
/// Never empty, and every element parsed as X.509 when the chain was built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateChain {
    certs: Vec<CertificateBytes>,
}

impl CertificateChain {
    /// Build a chain, rejecting it if it is empty or any element is malformed.
    pub fn from_der_list(certs: Vec<CertificateBytes>) -> Result<Self, NetError> {
        if certs.is_empty() {
            return Err(NetError::EmptyCertificateChain);
        }
        for (index, cert) in certs.iter().enumerate() {
            if let Err(e) = cert.to_x509() {
                tracing::error!(index, len = cert.len(), "malformed certificate in chain");
                return Err(e);
            }
        }
        Ok(Self { certs })
    }

    pub fn leaf(&self) -> &CertificateBytes {
        &self.certs[0]
    }

    /// Certificate that issued `leaf`, when the chain carries it.
    pub fn issuer(&self) -> Option<&CertificateBytes> {
        self.certs.get(1)
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CertificateBytes> {
        self.certs.iter()
    }

    pub fn to_x509(&self) -> Result<Vec<X509>, NetError> {
        self.certs.iter().map(CertificateBytes::to_x509).collect()
    }
}

/// SHA-256 over the certificate's SubjectPublicKeyInfo.
pub fn spki_hash(cert: &X509Ref) -> Result<SpkiHash, NetError> {
    let pubkey = cert
        .public_key()
        .map_err(|_| NetError::SslServerCertBadFormat)?;
    let spki_der = pubkey
        .public_key_to_der()
        .map_err(|_| NetError::SslServerCertBadFormat)?;
    let digest =
        hash(MessageDigest::sha256(), &spki_der).map_err(|_| NetError::SslServerCertBadFormat)?;

    let mut result = [0u8; 32];
    result.copy_from_slice(&digest);
    Ok(result)
}
