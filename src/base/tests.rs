use crate::base::neterror::NetError;
use crate::base::stage::ValidationStage;

#[test]
fn test_net_error_roundtrip() {
    // Standard Chromium error
    let original = NetError::ConnectionRefused;
    let code = original.as_i32();
    assert_eq!(code, -102);
    let converted = NetError::from(code);
    assert!(matches!(converted, NetError::ConnectionRefused));

    // Custom error
    let custom = NetError::NoUsableAnchors;
    let custom_code = custom.as_i32();
    assert_eq!(custom_code, -1001);
    let custom_converted = NetError::from(custom_code);
    assert!(matches!(custom_converted, NetError::NoUsableAnchors));

    assert!(matches!(
        NetError::from(NetError::ValidationAborted.as_i32()),
        NetError::ValidationAborted
    ));
}

#[test]
fn test_unknown_error() {
    let err = NetError::from(-9999);
    assert!(matches!(err, NetError::Unknown(-9999)));
}

#[test]
fn test_cert_errors_use_chromium_codes() {
    let err = NetError::CertAuthorityInvalid {
        reason: "unable to get local issuer certificate".into(),
    };
    assert_eq!(err.as_i32(), -202);

    let ct = NetError::CertificateTransparencyRequired {
        reason: "too few SCTs".into(),
    };
    assert_eq!(ct.as_i32(), -214);
}

#[test]
fn test_configuration_errors() {
    assert!(NetError::NoUsableAnchors.is_configuration_error());
    assert!(NetError::AnchorStoreCreationFailed.is_configuration_error());
    assert!(!NetError::ConnectionTimedOut.is_configuration_error());
    assert!(!NetError::CtComplianceUndetermined.is_configuration_error());
}

#[test]
fn test_error_messages() {
    assert_eq!(NetError::NoUsableAnchors.to_string(), "No usable anchors");
    assert_eq!(
        NetError::ExpectedSecureTransport.to_string(),
        "Expected secure transport"
    );
    assert_eq!(
        NetError::CertificateTransparencyRequired {
            reason: "x".into()
        }
        .to_string(),
        "CT compliance failed: x"
    );
}

#[test]
fn test_stage_progression() {
    let mut stage = ValidationStage::default();
    let mut seen = vec![stage];
    while stage != ValidationStage::Done {
        stage = stage.next();
        seen.push(stage);
    }

    assert_eq!(
        seen,
        vec![
            ValidationStage::Idle,
            ValidationStage::CacheCheck,
            ValidationStage::Retrieving,
            ValidationStage::AnchorBuilding,
            ValidationStage::ChainValidating,
            ValidationStage::CtChecking,
            ValidationStage::CacheWriting,
            ValidationStage::Done,
        ]
    );
    assert!(ValidationStage::Retrieving.is_blocking());
    assert!(!ValidationStage::CacheCheck.is_blocking());
}
