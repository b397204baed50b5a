use crate::base::neterror::NetError;
use boring::ssl::{SslConnector, SslMethod, SslVerifyMode, SslVersion};

/// How the connector treats the certificate the peer presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerVerification {
    /// Accept anything. Only used to observe the chain; never gates trust.
    TrustAll,
    /// Verify against the platform's default trust store and the hostname.
    Platform,
}

/// Client-side TLS settings for the connections this crate opens itself.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    pub alpn_protos: Vec<String>,
    pub curves: Vec<String>,
    pub verification: PeerVerification,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self::observe_only()
    }
}

impl TlsConfig {
    /// Trust-all configuration for chain retrieval.
    pub fn observe_only() -> Self {
        Self {
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            alpn_protos: Vec::new(),
            curves: vec![
                "X25519".to_string(),
                "P-256".to_string(),
                "P-384".to_string(),
            ],
            verification: PeerVerification::TrustAll,
        }
    }

    /// Platform-verified configuration for downloading log lists over HTTP/1.1.
    pub fn platform_verified() -> Self {
        Self {
            alpn_protos: vec!["http/1.1".to_string()],
            verification: PeerVerification::Platform,
            ..Self::observe_only()
        }
    }

    /// Build a connector from this configuration.
    pub fn build_connector(&self) -> Result<SslConnector, NetError> {
        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;

        if let Some(min) = self.min_version {
            builder
                .set_min_proto_version(Some(min))
                .map_err(|_| NetError::SslProtocolError)?;
        }
        if let Some(max) = self.max_version {
            builder
                .set_max_proto_version(Some(max))
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.alpn_protos.is_empty() {
            let mut alpn_wire = Vec::new();
            for proto in &self.alpn_protos {
                if proto.len() > 255 {
                    return Err(NetError::SslProtocolError);
                }
                alpn_wire.push(proto.len() as u8);
                alpn_wire.extend_from_slice(proto.as_bytes());
            }
            builder
                .set_alpn_protos(&alpn_wire)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.curves.is_empty() {
            builder
                .set_curves_list(&self.curves.join(":"))
                .map_err(|_| NetError::SslProtocolError)?;
        }

        match self.verification {
            PeerVerification::TrustAll => builder.set_verify(SslVerifyMode::NONE),
            PeerVerification::Platform => {
                builder
                    .set_default_verify_paths()
                    .map_err(|_| NetError::SslProtocolError)?;
                builder.set_verify(SslVerifyMode::PEER);
            }
        }

        Ok(builder.build())
    }

    /// Check if SNI should be set for this host.
    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
    pub fn should_set_sni(host: &str) -> bool {
        host.parse::<std::net::IpAddr>().is_err()
    }
}
