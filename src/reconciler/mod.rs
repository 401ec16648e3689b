//! Reconciliation of container limits with host-wide counters.
//!
//! A [`Reconciler`] answers every metric from the container view when that view has a usable
//! value, and falls back to the [`HostProbe`] otherwise. The only state it keeps is the
//! [`CpuLoadHistory`] used to turn cumulative CPU counters into a load ratio between calls.

mod cpu;
mod cpuset;
#[cfg(test)]
pub(crate) mod fakes;
mod memory;

use std::sync::{Mutex, PoisonError};

pub use cpu::CpuLoadHistory;
pub use memory::MAX_SWAP_ATTEMPTS;

use crate::container::ContainerMetrics;
use crate::host::HostProbe;

/// Combines a host probe with an optional container view.
///
/// Whether a container view exists is decided once, at construction. All methods take `&self`
/// and may be called concurrently; the CPU load history is serialized internally.
#[derive(Debug)]
pub struct Reconciler<H, C> {
    host: H,
    container: Option<C>,
    history: Mutex<CpuLoadHistory>,
}

impl<H: HostProbe, C: ContainerMetrics> Reconciler<H, C> {
    pub fn new(host: H, container: Option<C>) -> Self {
        Self {
            host,
            container,
            history: Mutex::default(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn container(&self) -> Option<&C> {
        self.container.as_ref()
    }

    /// Advances the CPU load history with a new pair of cumulative samples.
    ///
    /// Only the history update runs under the lock; callers read their samples beforehand.
    fn ratio_from_delta(&self, usage: Option<u64>, total: Option<u64>) -> Option<f64> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ratio_from_delta(usage, total)
    }
}
