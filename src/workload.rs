//! Bounded random work generation.
//!
//! Mirrors the classic load-generation setup this crate grew out of: a fixed
//! number of GET targets with random paths, spread uniformly over a small
//! set of destinations.

use rand::distr::{Alphanumeric, SampleString};
use rand::seq::IndexedRandom;
use url::Url;

use crate::types::{Result, WorkItem};
use crate::ErrorKind;

/// Length of the random path segment of each generated URL
const PATH_LEN: usize = 10;

/// Generate a bounded batch of work items.
///
/// Produces `count` items with ids `0..count`, each targeting
/// `http://{authority}/{random path}/` where the authority (`host:port`) is
/// chosen uniformly from `authorities`. The count is fixed up front and
/// items are immutable; completion order of a later dispatch is unrelated
/// to the id order assigned here.
///
/// # Errors
///
/// Returns `ParseUrl` if an authority does not form a valid HTTP URL.
///
/// # Panics
///
/// Panics if `authorities` is empty while `count` is non-zero.
pub fn random_workload(count: usize, authorities: &[String]) -> Result<Vec<WorkItem>> {
    assert!(
        count == 0 || !authorities.is_empty(),
        "cannot generate work items without destinations"
    );

    let mut rng = rand::rng();
    (0..count)
        .map(|id| {
            let path = Alphanumeric.sample_string(&mut rng, PATH_LEN);
            let authority = authorities
                .choose(&mut rng)
                .expect("authorities checked non-empty above");
            let raw = format!("http://{authority}/{path}/");
            let url = Url::parse(&raw).map_err(|e| ErrorKind::ParseUrl(raw, e))?;
            Ok(WorkItem::new(id, url))
        })
        .collect()
}
