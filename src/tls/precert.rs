//! Embedded SCTs and the precertificate entry they were signed over.
//!
//! A log signs the precertificate TBS, which is the final certificate's TBS
//! without the SCT list extension (RFC 6962, section 3.2).

use crate::base::neterror::NetError;
use boring::x509::X509Ref;
use const_oid::ObjectIdentifier;
use der::asn1::OctetString;
use der::{Decode, Encode};
use x509_cert::ext::Extension;
use x509_cert::{Certificate, TbsCertificate};

/// Embedded SCT list extension - 1.3.6.1.4.1.11129.2.4.2
pub const SCT_LIST_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.11129.2.4.2");

/// Parsed TBSCertificate of a leaf, as seen by CT.
#[derive(Debug, Clone)]
pub struct LeafTbs {
    tbs: TbsCertificate,
}

impl LeafTbs {
    pub fn from_der(cert: &[u8]) -> Result<Self, der::Error> {
        let cert = Certificate::from_der(cert)?;
        Ok(Self {
            tbs: cert.tbs_certificate,
        })
    }

    pub fn extension(&self, oid: &ObjectIdentifier) -> Option<&Extension> {
        self.tbs
            .extensions
            .as_ref()
            .and_then(|exts| exts.iter().find(|ext| &ext.extn_id == oid))
    }

    /// TLS-encoded SCT list from the embedded extension, if present.
    pub fn embedded_sct_list(&self) -> Result<Option<Vec<u8>>, der::Error> {
        let Some(ext) = self.extension(&SCT_LIST_OID) else {
            return Ok(None);
        };
        // extnValue holds a second OCTET STRING wrapping the list.
        let list = OctetString::from_der(ext.extn_value.as_bytes())?;
        Ok(Some(list.as_bytes().to_vec()))
    }

    /// DER of the TBS with the SCT list removed; an emptied extension list is dropped.
    pub fn precert_tbs(&self) -> Result<Vec<u8>, der::Error> {
        let mut tbs = self.tbs.clone();
        if let Some(exts) = tbs.extensions.as_mut() {
            exts.retain(|ext| ext.extn_id != SCT_LIST_OID);
            if exts.is_empty() {
                tbs.extensions = None;
            }
        }
        tbs.to_der()
    }
}

/// notAfter minus notBefore.
pub fn validity_period(cert: &X509Ref) -> Result<time::Duration, NetError> {
    let diff = cert
        .not_before()
        .diff(cert.not_after())
        .map_err(|_| NetError::SslServerCertBadFormat)?;
    Ok(time::Duration::days(diff.days.into()) + time::Duration::seconds(diff.secs.into()))
}
