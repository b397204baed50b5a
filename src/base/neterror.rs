use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Connection Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Connection to {host}:{port} failed: {source}")]
    ConnectionFailedTo {
        host: String,
        port: u16,
        #[source]
        source: Arc<std::io::Error>,
    },
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Name not resolved for {domain}: {source}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: Arc<std::io::Error>,
    },
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("Connection timed out")]
    ConnectionTimedOut,

    // Certificate Errors
    #[error("Certificate authority invalid: {reason}")]
    CertAuthorityInvalid { reason: String },
    #[error("SSL server cert bad format")]
    SslServerCertBadFormat,
    #[error("Empty certificate chain")]
    EmptyCertificateChain,
    #[error("No usable anchors")]
    NoUsableAnchors,
    #[error("Anchor store creation failed")]
    AnchorStoreCreationFailed,

    // Certificate Transparency Errors
    #[error("CT compliance failed: {reason}")]
    CertificateTransparencyRequired { reason: String },
    #[error("CT compliance could not be determined")]
    CtComplianceUndetermined,
    #[error("CT log list unavailable")]
    CtLogListUnavailable,
    #[error("CT log list invalid: {reason}")]
    CtLogListInvalid { reason: String },

    #[error("Validation aborted before reaching a verdict")]
    ValidationAborted,

    // URL / HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Expected secure transport")]
    ExpectedSecureTransport,
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Response body too big to drain")]
    ResponseBodyTooBigToDrain,

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    pub fn connection_failed_to(host: &str, port: u16, source: std::io::Error) -> Self {
        NetError::ConnectionFailedTo {
            host: host.to_string(),
            port,
            source: Arc::new(source),
        }
    }

    pub fn dns_failed(domain: &str, source: std::io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.to_string(),
            source: Arc::new(source),
        }
    }

    /// Errors that point at a packaging defect rather than a network condition.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            NetError::NoUsableAnchors | NetError::AnchorStoreCreationFailed
        )
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::ConnectionClosed => -100,
            NetError::ConnectionReset => -101,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionFailed | NetError::ConnectionFailedTo { .. } => -104,
            NetError::NameNotResolved | NetError::NameNotResolvedFor { .. } => -105,
            NetError::SslProtocolError => -107,
            NetError::ConnectionTimedOut => -118,
            NetError::SslServerCertBadFormat => -167,

            NetError::CertAuthorityInvalid { .. } => -202,
            NetError::CertificateTransparencyRequired { .. } => -214,

            NetError::InvalidUrl => -300,
            NetError::ExpectedSecureTransport => -301,
            NetError::InvalidResponse => -320,
            NetError::ResponseBodyTooBigToDrain => -345,

            // Custom codes starting at -1000
            NetError::EmptyCertificateChain => -1000,
            NetError::NoUsableAnchors => -1001,
            NetError::AnchorStoreCreationFailed => -1002,
            NetError::CtComplianceUndetermined => -1003,
            NetError::CtLogListUnavailable => -1004,
            NetError::CtLogListInvalid { .. } => -1005,
            NetError::ValidationAborted => -1006,
            NetError::Unknown(code) => *code,
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -100 => NetError::ConnectionClosed,
            -101 => NetError::ConnectionReset,
            -102 => NetError::ConnectionRefused,
            -104 => NetError::ConnectionFailed,
            -105 => NetError::NameNotResolved,
            -107 => NetError::SslProtocolError,
            -118 => NetError::ConnectionTimedOut,
            -167 => NetError::SslServerCertBadFormat,
            -300 => NetError::InvalidUrl,
            -301 => NetError::ExpectedSecureTransport,
            -320 => NetError::InvalidResponse,
            -345 => NetError::ResponseBodyTooBigToDrain,
            -1000 => NetError::EmptyCertificateChain,
            -1001 => NetError::NoUsableAnchors,
            -1002 => NetError::AnchorStoreCreationFailed,
            -1003 => NetError::CtComplianceUndetermined,
            -1004 => NetError::CtLogListUnavailable,
            -1006 => NetError::ValidationAborted,
            _ => NetError::Unknown(code),
        }
    }
}
