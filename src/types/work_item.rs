use std::fmt::Display;

use serde::Serialize;
use url::Url;

/// One logical unit of request work which can be dispatched by `volley`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WorkItem {
    /// Position of this item in its generated sequence.
    ///
    /// Monotonically increasing per batch and used purely for observability
    /// (log lines naming which request is starting or finishing). Completion
    /// order is not guaranteed to match it.
    id: usize,

    /// The endpoint to send a GET request to
    url: Url,
}

impl WorkItem {
    /// Instantiate a new `WorkItem` object
    #[inline]
    #[must_use]
    pub const fn new(id: usize, url: Url) -> Self {
        WorkItem { id, url }
    }

    /// Sequence identifier of this item
    #[inline]
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Target URL of this item
    #[inline]
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

impl Display for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}", self.id, self.url)
    }
}
