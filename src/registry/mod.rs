//! Destination registry: one connection context and one concurrency limiter
//! per destination.
//!
//! The registry maps a [`HostKey`] (authority, `host:port`) to the reusable
//! [`Connection`] and the [`Semaphore`] shared by every request targeting
//! that destination. Entries are created lazily on first use and live until
//! [`Registry::close_all`] tears the run down. There is no eviction and no
//! re-creation within a run.

mod key;

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Semaphore;
use url::Url;

pub use key::HostKey;

use crate::transport::{Connection, Transport};
use crate::types::Result;
use crate::ErrorKind;

/// The per-destination pair owned by the registry: a reusable connection
/// context and the limiter bounding concurrent use of it.
#[derive(Clone)]
pub struct HostSlot {
    connection: Arc<dyn Connection>,
    limiter: Arc<Semaphore>,
}

impl HostSlot {
    /// The reusable connection context for this destination
    #[must_use]
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// The admission gate bounding in-flight requests to this destination
    #[must_use]
    pub fn limiter(&self) -> &Arc<Semaphore> {
        &self.limiter
    }
}

impl std::fmt::Debug for HostSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostSlot")
            .field("available_permits", &self.limiter.available_permits())
            .finish_non_exhaustive()
    }
}

/// Maps destinations to their shared connection context and limiter.
///
/// Slot creation is race-free: the existence check and the insert happen
/// under a single map entry guard with no await point in between, so two
/// tasks resolving the same new destination can never create two contexts.
#[derive(Debug)]
pub struct Registry {
    hosts: DashMap<HostKey, Arc<HostSlot>>,
    transport: Arc<dyn Transport>,
    max_concurrency_per_host: usize,
}

impl Registry {
    /// Create an empty registry which opens connection contexts through the
    /// given transport and gates each destination at the given capacity
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, max_concurrency_per_host: usize) -> Self {
        Registry {
            hosts: DashMap::new(),
            transport,
            max_concurrency_per_host,
        }
    }

    /// Look up the slot for the destination of `url`, creating it on first
    /// encounter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrlHost` if `url` has no authority, or
    /// `OpenConnection` if the transport fails to open a context for a new
    /// destination. An open failure is not cached; a later resolve for the
    /// same destination tries again.
    pub fn resolve(&self, url: &Url) -> Result<Arc<HostSlot>> {
        let key = HostKey::try_from(url)?;

        match self.hosts.entry(key) {
            Entry::Occupied(slot) => Ok(slot.get().clone()),
            Entry::Vacant(vacant) => {
                log::debug!("Opening connection context for {}", vacant.key());
                let connection = self
                    .transport
                    .open(vacant.key())
                    .map_err(|e| ErrorKind::OpenConnection(vacant.key().clone(), Box::new(e)))?;
                let slot = Arc::new(HostSlot {
                    connection,
                    limiter: Arc::new(Semaphore::new(self.max_concurrency_per_host)),
                });
                vacant.insert(slot.clone());
                Ok(slot)
            }
        }
    }

    /// Number of destinations with a live connection context
    #[must_use]
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Close every connection context exactly once and empty the registry.
    ///
    /// Idempotent: a second call finds nothing left to close.
    pub async fn close_all(&self) {
        let keys: Vec<HostKey> = self.hosts.iter().map(|entry| entry.key().clone()).collect();
        for key in keys {
            if let Some((key, slot)) = self.hosts.remove(&key) {
                log::debug!("Closing connection context for {key}");
                slot.connection.close().await;
            }
        }
    }
}
