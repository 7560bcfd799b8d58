//! `volley` fires a bounded batch of HTTP GET requests at a set of
//! destinations, reusing one keep-alive session per destination and capping
//! how many requests may be in flight against each destination at once.
//!
//! "Hello world" example:
//! ```no_run
//! use volley::{random_workload, DispatcherBuilder};
//!
//! #[tokio::main]
//! async fn main() -> volley::Result<()> {
//!   let dispatcher = DispatcherBuilder::builder().build().dispatcher();
//!   let items = random_workload(30, &["example.com:8100".into()])?;
//!   for outcome in dispatcher.run(items).await {
//!       println!("{outcome}");
//!   }
//!   Ok(())
//! }
//! ```
//!
//! The `DispatcherBuilder` grants full flexibility: per-host concurrency
//! limits, a custom transport (e.g. a mock for tests), and a fault-injection
//! hook which downgrades a fraction of successful responses to failures in
//! order to exercise failure handling downstream:
//! ```no_run
//! use volley::{DispatcherBuilder, RandomFaults};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let dispatcher = DispatcherBuilder::builder()
//!     .max_concurrency_per_host(4)
//!     .fault_injector(RandomFaults::default())
//!     .build()
//!     .dispatcher();
//! # }
//! ```
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod dispatcher;
mod fault;
mod registry;
mod transport;
mod types;
mod workload;

#[cfg(test)]
#[macro_use]
pub mod test_utils;

pub use dispatcher::{Dispatcher, DispatcherBuilder, DEFAULT_MAX_CONCURRENCY_PER_HOST};
pub use fault::{FaultInjector, NoFaults, RandomFaults, DEFAULT_FAULT_PROBABILITY};
pub use registry::{HostKey, HostSlot, Registry};
pub use transport::{
    Connection, ReqwestTransport, ResponseHandle, Transport, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT,
};
pub use types::*;
pub use workload::random_workload;
