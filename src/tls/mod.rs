//! Certificate chains, custom trust anchors, and CT compliance.

pub mod anchors;
pub mod chain;
pub mod ct;
pub mod ctverifier;
pub mod logsource;
pub mod precert;
pub mod verifier;

pub use anchors::{AnchorSupplier, PemFileAnchors, StaticAnchors, TrustAnchorSet};
pub use chain::{spki_hash, CertificateBytes, CertificateChain, SpkiHash};
pub use ct::{check_compliance, CtCompliance, CtComplianceOracle, LogListAdapter, Sct, SctStatus};
pub use ctverifier::{
    decode_sct_list, encode_sct_list, CtLog, CtPolicy, LogList, LogListOracle, LogState,
    MultiLogCtVerifier, SignedEntry,
};
pub use logsource::{
    CachePolicy, CtLogSource, DefaultCachePolicy, FileLogSource, LogFetchConfig,
    NetworkLogSource, StringLogSource, DEFAULT_LOG_LIST_URL,
};
pub use precert::{LeafTbs, SCT_LIST_OID};
pub use verifier::TrustAnchorVerifier;
