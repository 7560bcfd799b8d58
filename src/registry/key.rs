use std::fmt;

use url::Url;

use crate::types::Result;
use crate::ErrorKind;

/// A type-safe representation of a destination authority (`host:port`).
///
/// This extracts and normalizes the authority component from URLs so that
/// all requests to the same destination share one connection context and one
/// concurrency limiter. Hostnames are lowercased; the port falls back to the
/// scheme default when not spelled out.
///
/// # Examples
///
/// ```
/// use volley::HostKey;
/// use url::Url;
///
/// let url = Url::parse("http://Test1.Hell:8100/abc/").unwrap();
/// let key = HostKey::try_from(&url).unwrap();
/// assert_eq!(key.as_str(), "test1.hell:8100");
///
/// let url = Url::parse("http://example.com/").unwrap();
/// assert_eq!(HostKey::try_from(&url).unwrap().as_str(), "example.com:80");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostKey(String);

impl HostKey {
    /// Get the authority as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the authority as an owned String
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<&Url> for HostKey {
    type Error = ErrorKind;

    fn try_from(url: &Url) -> Result<Self> {
        let host = url.host_str().ok_or(ErrorKind::InvalidUrlHost)?;

        // Normalize to lowercase for consistent lookup
        let host = host.to_lowercase();
        Ok(match url.port_or_known_default() {
            Some(port) => HostKey(format!("{host}:{port}")),
            None => HostKey(host),
        })
    }
}

impl TryFrom<Url> for HostKey {
    type Error = ErrorKind;

    fn try_from(url: Url) -> Result<Self> {
        HostKey::try_from(&url)
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for HostKey {
    fn from(authority: String) -> Self {
        HostKey(authority.to_lowercase())
    }
}

impl From<&str> for HostKey {
    fn from(authority: &str) -> Self {
        HostKey(authority.to_lowercase())
    }
}
