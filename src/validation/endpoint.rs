use crate::base::neterror::NetError;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Normalized connection target used as the cache key.
///
/// Keeps scheme, host and port; the path collapses to `/` and query,
/// fragment and credentials are dropped, so every request to one origin
/// shares a key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EndpointKey {
    url: Url,
}

impl EndpointKey {
    pub fn parse(raw: &str) -> Result<Self, NetError> {
        let mut url = Url::parse(raw).map_err(|e| {
            tracing::debug!(url = %raw, error = %e, "unparseable endpoint");
            NetError::InvalidUrl
        })?;
        if url.cannot_be_a_base() || url.host_str().map_or(true, str::is_empty) {
            return Err(NetError::InvalidUrl);
        }

        url.set_query(None);
        url.set_fragment(None);
        url.set_path("/");
        url.set_username("").map_err(|_| NetError::InvalidUrl)?;
        url.set_password(None).map_err(|_| NetError::InvalidUrl)?;
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port_or_known_default()
    }
}

impl FromStr for EndpointKey {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl fmt::Debug for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EndpointKey({})", self.url)
    }
}
