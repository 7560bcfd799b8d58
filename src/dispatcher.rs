//! Handler of fan-out dispatch runs.
//!
//! This module defines two structs, [`Dispatcher`] and [`DispatcherBuilder`].
//! `Dispatcher` takes a batch of work items, schedules one task per item,
//! and drains the batch to completion. `DispatcherBuilder` exposes a finer
//! level of granularity for building a `Dispatcher`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use tokio::task::JoinSet;
use typed_builder::TypedBuilder;

use crate::fault::{FaultInjector, NoFaults};
use crate::registry::{HostSlot, Registry};
use crate::transport::{ReqwestTransport, Transport, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::types::{Outcome, Result, Status, WorkItem};
use crate::ErrorKind;

/// Default number of requests which may be in flight against one
/// destination at the same time, 10.
pub const DEFAULT_MAX_CONCURRENCY_PER_HOST: usize = 10;

/// Builder for [`Dispatcher`].
///
/// See crate-level documentation for usage example.
#[derive(TypedBuilder, Debug, Clone)]
#[builder(field_defaults(default))]
#[builder(builder_method(doc = "
Create a builder for building `DispatcherBuilder`.

On the builder call, call methods with same name as its fields to set their values.

Finally, call `.build()` to create the instance of `DispatcherBuilder`.
"))]
pub struct DispatcherBuilder {
    /// Maximum number of concurrent in-flight requests per destination.
    ///
    /// Each destination gets its own limiter of this capacity, so the
    /// overall concurrency of a run is `destinations * capacity`.
    #[builder(default = DEFAULT_MAX_CONCURRENCY_PER_HOST)]
    max_concurrency_per_host: usize,

    /// Hook deciding whether an otherwise-successful response is downgraded
    /// to a failure. Defaults to [`NoFaults`].
    #[builder(setter(
        transform = |f: impl FaultInjector + 'static| Some(Arc::new(f) as Arc<dyn FaultInjector>)
    ))]
    fault_injector: Option<Arc<dyn FaultInjector>>,

    /// The transport used to open per-destination connection contexts.
    /// Defaults to [`ReqwestTransport`]; tests substitute mocks here.
    #[builder(setter(
        transform = |t: impl Transport + 'static| Some(Arc::new(t) as Arc<dyn Transport>)
    ))]
    transport: Option<Arc<dyn Transport>>,

    /// User agent sent by the default transport
    #[builder(setter(into, strip_option))]
    user_agent: Option<String>,

    /// Overall per-request timeout applied by the default transport
    #[builder(setter(strip_option))]
    timeout: Option<Duration>,
}

impl DispatcherBuilder {
    /// Consume the builder and produce a `Dispatcher`
    #[must_use]
    pub fn dispatcher(self) -> Dispatcher {
        let Self {
            max_concurrency_per_host,
            fault_injector,
            transport,
            user_agent,
            timeout,
        } = self;

        let transport = transport.unwrap_or_else(|| {
            Arc::new(ReqwestTransport::new(
                user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                Some(timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS as u64))),
            ))
        });

        Dispatcher {
            registry: Registry::new(transport, max_concurrency_per_host),
            fault_injector: fault_injector.unwrap_or_else(|| Arc::new(NoFaults)),
        }
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        DispatcherBuilder::builder().build()
    }
}

/// Fans a batch of work items out over per-destination connection contexts.
///
/// The dispatcher owns its [`Registry`], so independent dispatchers never
/// share connection state.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Registry,
    fault_injector: Arc<dyn FaultInjector>,
}

impl Dispatcher {
    /// Dispatch every item in the batch and drain the run to completion.
    ///
    /// For each item in order, the destination is resolved synchronously and
    /// one task is scheduled; items whose destination cannot be resolved
    /// fault immediately without affecting their siblings. All scheduled
    /// tasks are then awaited, whether they succeed or fail, and every
    /// connection context opened during the run is closed afterwards.
    ///
    /// One-shot: no retries. Returns one [`Outcome`] per item, ordered by
    /// item id.
    ///
    /// Dropping the returned future mid-run aborts the outstanding tasks;
    /// call [`close`](Self::close) afterwards to tear the contexts down.
    pub async fn run(&self, items: impl IntoIterator<Item = WorkItem>) -> Vec<Outcome> {
        let mut tasks = JoinSet::new();
        let mut scheduled: HashMap<tokio::task::Id, WorkItem> = HashMap::new();
        let mut outcomes = Vec::new();

        for item in items {
            match self.registry.resolve(item.url()) {
                Ok(slot) => {
                    let injector = self.fault_injector.clone();
                    let handle = tasks.spawn(execute(item.clone(), slot, injector));
                    scheduled.insert(handle.id(), item);
                }
                Err(e) => {
                    log::warn!("Request {} failed before scheduling: {e}", item.id());
                    outcomes.push(Outcome::faulted(item, e));
                }
            }
        }

        // Wait for every scheduled task, including ones which already
        // settled; one task's failure must neither cancel its siblings nor
        // block collection of their results.
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, outcome)) => {
                    scheduled.remove(&id);
                    outcomes.push(outcome);
                }
                Err(e) => {
                    if let Some(item) = scheduled.remove(&e.id()) {
                        log::warn!("Request {} panicked: {e}", item.id());
                        outcomes.push(Outcome::faulted(item, e.into()));
                    }
                }
            }
        }

        self.close().await;

        outcomes.sort_by_key(|outcome| outcome.item.id());
        outcomes
    }

    /// Close every connection context opened so far.
    ///
    /// [`run`](Self::run) does this on its own; this is for tearing down
    /// after an abandoned run.
    pub async fn close(&self) {
        self.registry.close_all().await;
    }

    /// The dispatcher's destination registry
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Run one work item to its terminal state. Never returns an error; every
/// failure is folded into the item's [`Outcome`].
async fn execute(item: WorkItem, slot: Arc<HostSlot>, faults: Arc<dyn FaultInjector>) -> Outcome {
    let status = match request(&item, &slot, faults.as_ref()).await {
        Ok(body) => Status::Completed(body),
        Err(e) => {
            log::warn!("Request {} failed: {e}", item.id());
            Status::Faulted(e)
        }
    };
    Outcome::new(item, status)
}

async fn request(item: &WorkItem, slot: &HostSlot, faults: &dyn FaultInjector) -> Result<String> {
    // Scoped admission: the permit drops (and frees a slot) on every exit
    // path, success or failure.
    let _permit = slot
        .limiter()
        .acquire()
        .await
        // SAFETY: this should not panic as we never close the semaphore
        .expect("Semaphore was closed unexpectedly");

    log::info!("Starting request {}", item.id());
    let response = slot.connection().get(item.url()).await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(ErrorKind::UnexpectedStatus(status));
    }
    if faults.should_fail(item) {
        return Err(ErrorKind::InjectedFault);
    }

    let text = response.text().await?;
    log::info!("Request {} finished", item.id());
    Ok(text)
}
