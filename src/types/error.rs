use http::StatusCode;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::registry::HostKey;

/// Possible errors when dispatching requests with `volley`
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The given string can not be parsed into a valid URL
    #[error("Cannot parse {0} as a URL: {1}")]
    ParseUrl(String, #[source] url::ParseError),
    /// The given URL is missing a host, so no destination can be derived
    #[error("URL is missing a host")]
    InvalidUrlHost,
    /// Opening a connection context for a never-seen destination failed.
    /// Fatal to the tasks queued for that destination only.
    #[error("Cannot open connection to `{0}`: {1}")]
    OpenConnection(HostKey, #[source] Box<ErrorKind>),
    /// The underlying HTTP client could not be constructed
    #[error("Cannot build HTTP client")]
    BuildHttpClient(#[source] reqwest::Error),
    /// Network error while sending a request
    #[error("Network error while trying to connect to an endpoint")]
    NetworkRequest(#[source] reqwest::Error),
    /// Network error while reading a response body
    #[error("Network error while reading the response body")]
    ReadResponseBody(#[source] reqwest::Error),
    /// The endpoint answered with an unexpected status code
    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(StatusCode),
    /// A successful response was deliberately downgraded to a failure by the
    /// configured fault-injection hook
    #[error("Injected fault after successful response")]
    InjectedFault,
    /// A scheduled request task panicked or was aborted before settling
    #[error("Request task failed to complete")]
    TaskFailure(#[from] tokio::task::JoinError),
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::ParseUrl(s1, e1), Self::ParseUrl(s2, e2)) => s1 == s2 && e1 == e2,
            (Self::OpenConnection(h1, e1), Self::OpenConnection(h2, e2)) => h1 == h2 && e1 == e2,
            (Self::BuildHttpClient(e1), Self::BuildHttpClient(e2))
            | (Self::NetworkRequest(e1), Self::NetworkRequest(e2))
            | (Self::ReadResponseBody(e1), Self::ReadResponseBody(e2)) => {
                e1.to_string() == e2.to_string()
            }
            (Self::UnexpectedStatus(c1), Self::UnexpectedStatus(c2)) => c1 == c2,
            (Self::TaskFailure(e1), Self::TaskFailure(e2)) => e1.to_string() == e2.to_string(),
            (Self::InvalidUrlHost, Self::InvalidUrlHost)
            | (Self::InjectedFault, Self::InjectedFault) => true,
            _ => false,
        }
    }
}

impl Eq for ErrorKind {}

impl Serialize for ErrorKind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ErrorKind::UnexpectedStatus(StatusCode::NOT_FOUND).to_string(),
            "Unexpected status code: 404 Not Found"
        );
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(ErrorKind::InjectedFault, ErrorKind::InjectedFault);
        assert_ne!(
            ErrorKind::InjectedFault,
            ErrorKind::UnexpectedStatus(StatusCode::BAD_GATEWAY)
        );

        let open = |host: &str| {
            ErrorKind::OpenConnection(HostKey::from(host), Box::new(ErrorKind::InvalidUrlHost))
        };
        assert_eq!(open("a.example.com:80"), open("a.example.com:80"));
        assert_ne!(open("a.example.com:80"), open("b.example.com:80"));
    }
}
