//! Fault injection for exercising failure handling downstream.
//!
//! A [`FaultInjector`] gets to veto a response after a successful status has
//! arrived but before the body is read; a vetoed response surfaces as
//! [`ErrorKind::InjectedFault`](crate::ErrorKind::InjectedFault). The
//! decision is a pluggable capability so tests can force deterministic
//! outcomes instead of patching randomness.

use std::fmt;

use rand::Rng;

use crate::types::WorkItem;

/// Default probability with which [`RandomFaults`] downgrades a successful
/// response, 0.5.
pub const DEFAULT_FAULT_PROBABILITY: f64 = 0.5;

/// Decides whether an otherwise-successful response is downgraded to a
/// failure
pub trait FaultInjector: Send + Sync + fmt::Debug {
    /// Called once per 200-status response, before the body is read.
    /// Returning `true` fails the item with an injected fault.
    fn should_fail(&self, item: &WorkItem) -> bool;
}

/// Never injects a fault. The library default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaults;

impl FaultInjector for NoFaults {
    fn should_fail(&self, _item: &WorkItem) -> bool {
        false
    }
}

/// Downgrades a uniformly-random fraction of successful responses to
/// failures
#[derive(Debug, Clone, Copy)]
pub struct RandomFaults {
    probability: f64,
}

impl RandomFaults {
    /// Create an injector which fails each successful response with the
    /// given probability
    ///
    /// # Panics
    ///
    /// Panics if `probability` is not within `0.0..=1.0`
    #[must_use]
    pub fn new(probability: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&probability),
            "fault probability must be within 0.0..=1.0"
        );
        RandomFaults { probability }
    }
}

impl Default for RandomFaults {
    fn default() -> Self {
        RandomFaults::new(DEFAULT_FAULT_PROBABILITY)
    }
}

impl FaultInjector for RandomFaults {
    fn should_fail(&self, _item: &WorkItem) -> bool {
        rand::rng().random_bool(self.probability)
    }
}
