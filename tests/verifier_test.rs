mod common;

use rootgate::base::neterror::NetError;
use rootgate::tls::anchors::{AnchorSupplier, PemFileAnchors, StaticAnchors, TrustAnchorSet};
use rootgate::tls::chain::CertificateBytes;
use rootgate::tls::verifier::TrustAnchorVerifier;
use std::io::Write;

#[test]
fn test_chain_to_anchor_accepted() {
    let root = common::root_ca("Root A");
    let leaf = common::leaf("a.example", &root, 90);

    let verifier = TrustAnchorVerifier::new(&[root.bytes()]).unwrap();
    assert_eq!(verifier.anchor_count(), 1);

    let path = verifier.verify(&common::chain(&[&leaf])).unwrap();
    assert_eq!(path.leaf(), &leaf.bytes());
    assert_eq!(path.iter().last(), Some(&root.bytes()));
}

#[test]
fn test_intermediate_anchor_accepted() {
    let root = common::root_ca("Root A");
    let intermediate = common::intermediate_ca("Issuing CA", &root);
    let leaf = common::leaf("i.example", &intermediate, 90);

    // Only the intermediate is trusted; its root is never presented.
    let verifier = TrustAnchorVerifier::new(&[intermediate.bytes()]).unwrap();
    let path = verifier
        .verify(&common::chain(&[&leaf, &intermediate]))
        .unwrap();
    assert_eq!(path.leaf(), &leaf.bytes());
    assert_eq!(path.iter().last(), Some(&intermediate.bytes()));
}

#[test]
fn test_chain_to_other_root_rejected() {
    let root_a = common::root_ca("Root A");
    let root_b = common::root_ca("Root B");
    let leaf = common::leaf("b.example", &root_b, 90);

    let verifier = TrustAnchorVerifier::new(&[root_a.bytes()]).unwrap();
    let result = verifier.verify(&common::chain(&[&leaf, &root_b]));
    assert!(matches!(result, Err(NetError::CertAuthorityInvalid { .. })));
}

#[test]
fn test_expired_leaf_rejected() {
    let root = common::root_ca("Root A");
    let leaf = common::expired_leaf("a.example", &root);

    let verifier = TrustAnchorVerifier::new(&[root.bytes()]).unwrap();
    let result = verifier.verify(&common::chain(&[&leaf, &root]));
    assert!(matches!(result, Err(NetError::CertAuthorityInvalid { .. })));
}

#[test]
fn test_malformed_anchor_skipped() {
    let root = common::root_ca("Root A");
    let leaf = common::leaf("a.example", &root, 90);
    let anchors = vec![CertificateBytes::from(&b"junk"[..]), root.bytes()];

    let verifier = TrustAnchorVerifier::new(&anchors).unwrap();
    assert_eq!(verifier.anchor_count(), 1);
    assert!(verifier.verify(&common::chain(&[&leaf])).is_ok());
}

#[test]
fn test_pem_bundle_anchors() {
    let root_a = common::root_ca("Root A");
    let root_b = common::root_ca("Root B");
    let mut bundle = root_a.cert.to_pem().unwrap();
    bundle.extend(root_b.cert.to_pem().unwrap());

    let set = TrustAnchorSet::from_bytes(&StaticAnchors::from_bytes(bundle).provide());
    assert_eq!(set.len(), 2);

    let verifier = TrustAnchorVerifier::from_anchor_set(set).unwrap();
    let leaf = common::leaf("b.example", &root_b, 30);
    assert!(verifier.verify(&common::chain(&[&leaf])).is_ok());
}

#[test]
fn test_pem_file_anchors() {
    let root = common::root_ca("File Root");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&root.cert.to_pem().unwrap()).unwrap();

    let supplier = PemFileAnchors::new(file.path());
    let verifier = TrustAnchorVerifier::new(&supplier.provide()).unwrap();

    let leaf = common::leaf("file.example", &root, 30);
    assert!(verifier.verify(&common::chain(&[&leaf])).is_ok());
}

#[test]
fn test_empty_anchors_never_trust() {
    assert!(matches!(
        TrustAnchorVerifier::new(&StaticAnchors::default().provide()),
        Err(NetError::NoUsableAnchors)
    ));
}
