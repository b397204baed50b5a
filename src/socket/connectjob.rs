use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::dns::{ip_literal, Name, Resolve};
use crate::socket::tls::{PeerVerification, TlsConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_boring::SslStream;
use url::Url;

/// Manages the connection process: DNS -> TCP -> SSL.
/// Roughly equivalent to net::ConnectJob, without proxies or pooling.
///
/// Every step runs under its own timeout. The TCP socket is owned by the
/// future, so a timeout or error drops it before `connect` returns.
pub struct ConnectJob<'a> {
    resolver: &'a dyn Resolve,
    tls: &'a TlsConfig,
    connect_timeout: Duration,
    handshake_timeout: Duration,
}

impl<'a> ConnectJob<'a> {
    pub fn new(resolver: &'a dyn Resolve, tls: &'a TlsConfig) -> Self {
        Self {
            resolver,
            tls,
            connect_timeout: Duration::from_secs(10),
            handshake_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeouts(mut self, connect: Duration, handshake: Duration) -> Self {
        self.connect_timeout = connect;
        self.handshake_timeout = handshake;
        self
    }

    pub async fn connect(&self, url: &Url) -> Result<SslStream<TcpStream>, NetError> {
        if url.scheme() != "https" {
            tracing::error!(url = %url, "expected secure transport");
            return Err(NetError::ExpectedSecureTransport);
        }
        let raw_host = url.host_str().ok_or(NetError::InvalidUrl)?;
        let port = url.port_or_known_default().ok_or(NetError::InvalidUrl)?;
        let host = raw_host.trim_start_matches('[').trim_end_matches(']');

        // 1. DNS Resolution (skipped for IP literals)
        let addrs: Vec<SocketAddr> = match ip_literal(host, port) {
            Some(addr) => vec![addr],
            None => {
                let resolved = tokio::time::timeout(
                    self.connect_timeout,
                    self.resolver.resolve(Name::new(host)),
                )
                .await
                .map_err(|_| {
                    tracing::debug!(host = %host, "DNS resolution timed out");
                    NetError::ConnectionTimedOut
                })??;
                resolved
                    .map(|mut addr| {
                        addr.set_port(port);
                        addr
                    })
                    .collect()
            }
        };

        // 2. TCP Connect
        let stream = self.connect_tcp(host, port, addrs).await?;

        // 3. SSL Handshake
        let connector = self.tls.build_connector()?;
        let mut config = connector
            .configure()
            .map_err(|_| NetError::SslProtocolError)?;
        let sni = TlsConfig::should_set_sni(host);
        config.set_use_server_name_indication(sni);
        if self.tls.verification == PeerVerification::TrustAll {
            config.set_verify_hostname(false);
        }

        match tokio::time::timeout(
            self.handshake_timeout,
            tokio_boring::connect(config, host, stream),
        )
        .await
        {
            Err(_) => {
                tracing::debug!(host = %host, port, "TLS handshake timed out");
                Err(NetError::ConnectionTimedOut)
            }
            Ok(Err(e)) => {
                tracing::debug!(host = %host, port, error = ?e, "TLS handshake failed");
                Err(NetError::SslProtocolError)
            }
            Ok(Ok(stream)) => Ok(stream),
        }
    }

    async fn connect_tcp(
        &self,
        host: &str,
        port: u16,
        addrs: Vec<SocketAddr>,
    ) -> Result<TcpStream, NetError> {
        let mut last_err = NetError::ConnectionFailed;
        for addr in addrs {
            match tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr)).await {
                Ok(result) => match result.connection_context(host, port) {
                    Ok(stream) => return Ok(stream),
                    Err(e) => {
                        tracing::debug!(addr = %addr, error = %e, "TCP connect failed");
                        last_err = e;
                    }
                },
                Err(_) => {
                    tracing::debug!(addr = %addr, "TCP connect timed out");
                    last_err = NetError::ConnectionTimedOut;
                }
            }
        }
        Err(last_err)
    }
}
