//! Where the CT log list comes from, and how long a copy stays fresh.
//!
//! Sources are blocking by contract: they are only called from the blocking
//! pool, never from an async task.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::dns::{GaiResolver, Resolve};
use crate::socket::connectjob::ConnectJob;
use crate::socket::tls::TlsConfig;
use bytes::Bytes;
use http::header::{HOST, USER_AGENT};
use http::{Method, Request};
use http_body_util::{BodyExt, Empty, LengthLimitError, Limited};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use url::Url;

/// Published Chrome log list, version 3 schema.
pub const DEFAULT_LOG_LIST_URL: &str = "https://www.gstatic.com/ct/log_list/v3/log_list.json";

/// Decides whether a cached log list is stale.
pub trait CachePolicy: Send + Sync {
    fn is_expired(&self, last_write: OffsetDateTime, now: OffsetDateTime) -> bool;
}

/// Expires a cached list a fixed time after it was written.
#[derive(Debug, Clone, Copy)]
pub struct DefaultCachePolicy {
    max_age: time::Duration,
}

impl Default for DefaultCachePolicy {
    fn default() -> Self {
        Self {
            max_age: time::Duration::days(1),
        }
    }
}

impl DefaultCachePolicy {
    pub fn with_max_age(max_age: time::Duration) -> Self {
        Self { max_age }
    }

    pub fn max_age(&self) -> time::Duration {
        self.max_age
    }
}

impl CachePolicy for DefaultCachePolicy {
    fn is_expired(&self, last_write: OffsetDateTime, now: OffsetDateTime) -> bool {
        now >= last_write + self.max_age
    }
}

/// Supplies the raw log list JSON.
///
/// A source with no cache policy is read on every check.
pub trait CtLogSource: Send + Sync {
    fn raw_log(&self) -> Result<Vec<u8>, NetError>;

    fn cache_policy(&self) -> Option<Arc<dyn CachePolicy>> {
        None
    }
}

/// Log list held in memory.
#[derive(Debug, Clone)]
pub struct StringLogSource {
    json: String,
}

impl StringLogSource {
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

impl CtLogSource for StringLogSource {
    fn raw_log(&self) -> Result<Vec<u8>, NetError> {
        Ok(self.json.as_bytes().to_vec())
    }
}

/// Log list bundled with the application as a file.
#[derive(Debug, Clone)]
pub struct FileLogSource {
    path: PathBuf,
}

impl FileLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CtLogSource for FileLogSource {
    fn raw_log(&self) -> Result<Vec<u8>, NetError> {
        let origin = self.path.display().to_string();
        std::fs::read(&self.path).log_list_context(&origin)
    }
}

/// Limits applied when downloading a log list.
#[derive(Debug, Clone)]
pub struct LogFetchConfig {
    /// Bounds the whole download: connect, handshake, headers and body.
    pub timeout: Duration,
    /// Largest body accepted, in bytes.
    pub max_size: usize,
}

impl Default for LogFetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_size: 1024 * 1024,
        }
    }
}

/// Log list downloaded over HTTPS, verified against the platform trust store.
pub struct NetworkLogSource {
    url: Url,
    resolver: Arc<dyn Resolve>,
    tls: TlsConfig,
    config: LogFetchConfig,
    policy: Arc<dyn CachePolicy>,
}

impl NetworkLogSource {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            resolver: Arc::new(GaiResolver::new()),
            tls: TlsConfig::platform_verified(),
            config: LogFetchConfig::default(),
            policy: Arc::new(DefaultCachePolicy::default()),
        }
    }

    /// Source for [`DEFAULT_LOG_LIST_URL`].
    pub fn chrome() -> Result<Self, NetError> {
        let url = Url::parse(DEFAULT_LOG_LIST_URL).map_err(|_| NetError::InvalidUrl)?;
        Ok(Self::new(url))
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_config(mut self, config: LogFetchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cache_policy(mut self, policy: Arc<dyn CachePolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the TLS settings, e.g. to reach a mirror with a private root.
    pub fn with_tls_config(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn download(&self) -> Result<Vec<u8>, NetError> {
        let fetch = async {
            let stream = ConnectJob::new(self.resolver.as_ref(), &self.tls)
                .with_timeouts(self.config.timeout, self.config.timeout)
                .connect(&self.url)
                .await?;

            let (mut sender, conn) = http1::handshake(TokioIo::new(stream))
                .await
                .map_err(|e| {
                    tracing::debug!(error = %e, "HTTP/1.1 handshake failed");
                    NetError::ConnectionFailed
                })?;
            let driver = tokio::spawn(async move {
                if let Err(e) = conn.await {
                    tracing::debug!(error = %e, "log list connection closed with error");
                }
            });

            let host = self.url.host_str().ok_or(NetError::InvalidUrl)?;
            let authority = match self.url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            let request = Request::builder()
                .method(Method::GET)
                .uri(&self.url[url::Position::BeforePath..])
                .header(HOST, authority)
                .header(USER_AGENT, concat!("rootgate/", env!("CARGO_PKG_VERSION")))
                .body(Empty::<Bytes>::new())
                .map_err(|_| NetError::InvalidUrl)?;

            let response = sender.send_request(request).await.map_err(|e| {
                tracing::debug!(error = %e, "log list request failed");
                NetError::ConnectionClosed
            })?;
            if !response.status().is_success() {
                tracing::error!(status = %response.status(), url = %self.url, "unexpected log list status");
                driver.abort();
                return Err(NetError::InvalidResponse);
            }

            let body = Limited::new(response.into_body(), self.config.max_size)
                .collect()
                .await
                .map_err(|e| {
                    if e.downcast_ref::<LengthLimitError>().is_some() {
                        NetError::ResponseBodyTooBigToDrain
                    } else {
                        NetError::InvalidResponse
                    }
                })?
                .to_bytes();
            driver.abort();
            Ok(body.to_vec())
        };

        tokio::time::timeout(self.config.timeout, fetch)
            .await
            .map_err(|_| NetError::ConnectionTimedOut)?
    }
}

impl CtLogSource for NetworkLogSource {
    fn raw_log(&self) -> Result<Vec<u8>, NetError> {
        let result = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle.block_on(self.download()),
            Err(_) => tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| {
                    tracing::error!(error = %e, "failed to build runtime for log list download");
                    NetError::CtLogListUnavailable
                })?
                .block_on(self.download()),
        };

        result.map_err(|e| {
            tracing::error!(url = %self.url, error = %e, "failed to download CT log list");
            NetError::CtLogListUnavailable
        })
    }

    fn cache_policy(&self) -> Option<Arc<dyn CachePolicy>> {
        Some(Arc::clone(&self.policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_expires_after_a_day() {
        let policy = DefaultCachePolicy::default();
        let written = OffsetDateTime::now_utc();
        assert!(!policy.is_expired(written, written + time::Duration::hours(23)));
        assert!(policy.is_expired(written, written + time::Duration::days(1)));
    }

    #[test]
    fn test_string_source_has_no_policy() {
        let source = StringLogSource::new("{}");
        assert_eq!(source.raw_log().unwrap(), b"{}");
        assert!(source.cache_policy().is_none());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let source = FileLogSource::new("/nonexistent/rootgate/log_list.json");
        assert!(matches!(
            source.raw_log(),
            Err(NetError::CtLogListUnavailable)
        ));
    }

    #[test]
    fn test_network_source_defaults() {
        let source = NetworkLogSource::chrome().unwrap();
        assert_eq!(source.url().as_str(), DEFAULT_LOG_LIST_URL);
        assert!(source.cache_policy().is_some());
        assert_eq!(LogFetchConfig::default().max_size, 1024 * 1024);
        assert_eq!(LogFetchConfig::default().timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_network_source_requires_https() {
        let source = NetworkLogSource::new(Url::parse("http://127.0.0.1:1/list.json").unwrap());
        assert!(matches!(
            source.raw_log(),
            Err(NetError::CtLogListUnavailable)
        ));
    }
}
