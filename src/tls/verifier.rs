//! Chain verification anchored exclusively at the application's own roots.
//!
//! The platform trust store is never loaded. Path validation covers signature
//! chaining, validity windows and basic constraints; hostname binding is the
//! caller's concern.

use crate::base::neterror::NetError;
use crate::tls::anchors::TrustAnchorSet;
use crate::tls::chain::{CertificateBytes, CertificateChain};
use boring::stack::Stack;
use boring::x509::store::{X509Store, X509StoreBuilder};
use boring::x509::verify::X509VerifyFlags;
use boring::x509::X509StoreContext;

pub struct TrustAnchorVerifier {
    store: X509Store,
    anchor_count: usize,
}

impl TrustAnchorVerifier {
    /// Build a verifier from raw anchor bytes; malformed entries are skipped.
    pub fn new(anchors: &[CertificateBytes]) -> Result<Self, NetError> {
        Self::from_anchor_set(TrustAnchorSet::from_bytes(anchors))
    }

    pub fn from_anchor_set(anchors: TrustAnchorSet) -> Result<Self, NetError> {
        if anchors.is_empty() {
            tracing::error!("no usable anchors");
            return Err(NetError::NoUsableAnchors);
        }

        let mut builder = X509StoreBuilder::new().map_err(|e| {
            tracing::error!(error = %e, "failed to create anchor store");
            NetError::AnchorStoreCreationFailed
        })?;

        let mut anchor_count = 0;
        for anchor in anchors {
            match builder.add_cert(anchor) {
                Ok(()) => anchor_count += 1,
                Err(e) => {
                    tracing::error!(error = %e, "failed to store certificate in anchor store");
                }
            }
        }
        if anchor_count == 0 {
            tracing::error!("no usable anchors");
            return Err(NetError::NoUsableAnchors);
        }
        // Any anchor may end a path, self-signed or not.
        builder.set_flags(X509VerifyFlags::PARTIAL_CHAIN);

        Ok(Self {
            store: builder.build(),
            anchor_count,
        })
    }

    pub fn anchor_count(&self) -> usize {
        self.anchor_count
    }

    /// Validate `chain` and return the verified path, leaf up to the anchor.
    pub fn verify(&self, chain: &CertificateChain) -> Result<CertificateChain, NetError> {
        let mut certs = chain.to_x509()?.into_iter();
        let leaf = certs.next().ok_or(NetError::EmptyCertificateChain)?;

        let mut untrusted = Stack::new().map_err(|_| NetError::AnchorStoreCreationFailed)?;
        for cert in certs {
            untrusted
                .push(cert)
                .map_err(|_| NetError::SslServerCertBadFormat)?;
        }

        let mut context = X509StoreContext::new().map_err(|e| {
            tracing::error!(error = %e, "failed to create verification context");
            NetError::AnchorStoreCreationFailed
        })?;

        let outcome = context
            .init(&self.store, &leaf, &untrusted, |ctx| {
                if !ctx.verify_cert()? {
                    let reason = match ctx.verify_result() {
                        Err(e) => e.error_string().to_string(),
                        Ok(()) => "verification failed".to_string(),
                    };
                    return Ok(Err(reason));
                }
                let path = ctx
                    .chain()
                    .map(|stack| {
                        stack
                            .iter()
                            .map(|cert| cert.to_der())
                            .collect::<Result<Vec<_>, _>>()
                    })
                    .transpose()?;
                Ok(Ok(path.unwrap_or_default()))
            })
            .map_err(|e| NetError::CertAuthorityInvalid {
                reason: e.to_string(),
            })?;

        match outcome {
            Ok(path) if !path.is_empty() => {
                CertificateChain::from_der_list(path.into_iter().map(CertificateBytes::from).collect())
            }
            Ok(_) => Ok(chain.clone()),
            Err(reason) => {
                tracing::debug!(reason = %reason, "chain rejected by custom anchors");
                Err(NetError::CertAuthorityInvalid { reason })
            }
        }
    }
}
