use std::fmt::Display;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::{ErrorKind, WorkItem};

const ICON_OK: &str = "✔";
const ICON_ERROR: &str = "✗";

/// Terminal state of one dispatched request task.
///
/// Every scheduled task ends in exactly one of these; there are no
/// transitions out of either.
#[derive(Debug, PartialEq, Eq)]
pub enum Status {
    /// The request succeeded; carries the full response body
    Completed(String),
    /// The request failed (transport error, unexpected status, or an
    /// injected fault)
    Faulted(ErrorKind),
}

impl Status {
    /// Returns `true` if the request completed successfully
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Status::Completed(_))
    }

    /// Returns `true` if the request failed
    #[inline]
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Status::Faulted(_))
    }

    /// The response body, if the request completed
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Status::Completed(body) => Some(body),
            Status::Faulted(_) => None,
        }
    }

    /// The failure cause, if the request faulted
    #[must_use]
    pub const fn error(&self) -> Option<&ErrorKind> {
        match self {
            Status::Completed(_) => None,
            Status::Faulted(e) => Some(e),
        }
    }

    const fn icon(&self) -> &str {
        match self {
            Status::Completed(_) => ICON_OK,
            Status::Faulted(_) => ICON_ERROR,
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Completed(_) => f.write_str("OK"),
            Status::Faulted(e) => write!(f, "{e}"),
        }
    }
}

impl Serialize for Status {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("Status", 2)?;
        s.serialize_field("text", &self.to_string())?;
        match self {
            Status::Completed(body) => s.serialize_field("bytes", &body.len())?,
            Status::Faulted(e) => s.serialize_field("details", &e.to_string())?,
        }
        s.end()
    }
}

/// Encapsulates the result of one dispatched [`WorkItem`]
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// The item which was dispatched
    pub item: WorkItem,
    /// Terminal state of the item's request task
    pub status: Status,
}

impl Outcome {
    /// Create a new outcome
    #[inline]
    #[must_use]
    pub const fn new(item: WorkItem, status: Status) -> Self {
        Outcome { item, status }
    }

    /// Shorthand for a successfully completed item
    #[inline]
    #[must_use]
    pub const fn completed(item: WorkItem, body: String) -> Self {
        Outcome::new(item, Status::Completed(body))
    }

    /// Shorthand for a faulted item
    #[inline]
    #[must_use]
    pub const fn faulted(item: WorkItem, error: ErrorKind) -> Self {
        Outcome::new(item, Status::Faulted(error))
    }

    /// Returns `true` if the item completed successfully
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.icon(), self.item)?;

        if self.status.is_success() {
            // Don't print anything else on success.
            // The output gets too verbose otherwise.
            return Ok(());
        }

        write!(f, " | {}", self.status)
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use pretty_assertions::assert_eq;
    use url::Url;

    use super::*;

    fn item() -> WorkItem {
        WorkItem::new(0, Url::parse("http://test1.hell:8100/a/").unwrap())
    }

    #[test]
    fn test_display_success_is_terse() {
        let outcome = Outcome::completed(item(), "body".into());
        assert_eq!(outcome.to_string(), "✔ #0 http://test1.hell:8100/a/");
    }

    #[test]
    fn test_display_failure_has_details() {
        let outcome = Outcome::faulted(item(), ErrorKind::UnexpectedStatus(StatusCode::NOT_FOUND));
        assert_eq!(
            outcome.to_string(),
            "✗ #0 http://test1.hell:8100/a/ | Unexpected status code: 404 Not Found"
        );
    }

    #[test]
    fn test_serialize_faulted() {
        let outcome = Outcome::faulted(item(), ErrorKind::InjectedFault);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json["status"]["details"],
            "Injected fault after successful response"
        );
    }
}
