use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use url::Url;

use crate::registry::HostKey;
use crate::transport::{Connection, ResponseHandle, Transport};
use crate::types::Result;
use crate::ErrorKind;

#[macro_export]
/// Creates a mock web server, which responds with a predefined status when
/// handling a matching request
macro_rules! mock_server {
    ($status:expr $(, $func:tt ($($arg:expr),*))*) => {{
        let mock_server = wiremock::MockServer::start().await;
        let response_template = wiremock::ResponseTemplate::new(http::StatusCode::from($status));
        let template = response_template$(.$func($($arg),*))*;
        wiremock::Mock::given(wiremock::matchers::method("GET")).respond_with(template).mount(&mock_server).await;
        mock_server
    }};
}

/// Shared observable state of a [`MockTransport`] and all connections it
/// opened. Tests keep a handle to it after the transport has been moved
/// into a dispatcher.
#[derive(Debug)]
pub(crate) struct MockState {
    opened: AtomicUsize,
    closed: AtomicUsize,
    bodies_read: AtomicUsize,
    current_in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    status: Mutex<StatusCode>,
    delay: Mutex<Option<Duration>>,
    failing: Mutex<HashSet<String>>,
}

impl Default for MockState {
    fn default() -> Self {
        MockState {
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            bodies_read: AtomicUsize::new(0),
            current_in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            status: Mutex::new(StatusCode::OK),
            delay: Mutex::new(None),
            failing: Mutex::new(HashSet::new()),
        }
    }
}

impl MockState {
    pub(crate) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn bodies_read(&self) -> usize {
        self.bodies_read.load(Ordering::SeqCst)
    }

    /// Highest number of requests observed in flight at the same time
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Respond with this status instead of 200
    pub(crate) fn set_status(&self, status: StatusCode) {
        *self.status.lock().unwrap() = status;
    }

    /// Hold each request for this long, so overlap becomes observable
    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Make `open` fail for the given destination
    pub(crate) fn fail_open_for(&self, authority: &str) {
        self.failing.lock().unwrap().insert(authority.to_string());
    }

    /// Make `open` succeed again for the given destination
    pub(crate) fn recover(&self, authority: &str) {
        self.failing.lock().unwrap().remove(authority);
    }
}

/// An in-memory [`Transport`] which records opens, closes, and concurrent
/// use, and always answers with a canned response
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    /// A handle to the transport's observable state
    pub(crate) fn state(&self) -> Arc<MockState> {
        self.state.clone()
    }

    pub(crate) fn opened(&self) -> usize {
        self.state.opened()
    }

    pub(crate) fn closed(&self) -> usize {
        self.state.closed()
    }

    pub(crate) fn fail_open_for(&self, authority: &str) {
        self.state.fail_open_for(authority);
    }

    pub(crate) fn recover(&self, authority: &str) {
        self.state.recover(authority);
    }
}

impl Transport for MockTransport {
    fn open(&self, key: &HostKey) -> Result<Arc<dyn Connection>> {
        if self.state.failing.lock().unwrap().contains(key.as_str()) {
            return Err(ErrorKind::InvalidUrlHost);
        }
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockConnection {
            state: self.state.clone(),
        }))
    }
}

struct MockConnection {
    state: Arc<MockState>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn get(&self, _url: &Url) -> Result<Box<dyn ResponseHandle>> {
        let in_flight = self.state.current_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.state.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.state.current_in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(Box::new(MockResponse {
            status: *self.state.status.lock().unwrap(),
            state: self.state.clone(),
        }))
    }

    async fn close(&self) {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockResponse {
    status: StatusCode,
    state: Arc<MockState>,
}

#[async_trait]
impl ResponseHandle for MockResponse {
    fn status(&self) -> StatusCode {
        self.status
    }

    async fn text(self: Box<Self>) -> Result<String> {
        self.state.bodies_read.fetch_add(1, Ordering::SeqCst);
        Ok("mock body".to_string())
    }
}
