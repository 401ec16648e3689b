//! The public metrics facade.
//!
//! [`OperatingSystemMetrics`] exposes every reconciled value in the numeric form monitoring
//! consumers expect: byte and time counts as `i64`, loads as `f64`, and `-1` / `-1.0` where a
//! value cannot be determined.

use crate::cgroup::CgroupV2Metrics;
use crate::container::ContainerMetrics;
use crate::host::{HostProbe, ProcfsHostProbe};
use crate::reconciler::Reconciler;

/// Returned for byte counts, times and descriptor counts that cannot be determined.
pub const UNAVAILABLE: i64 = -1;

/// Returned for loads that cannot be determined.
pub const INDETERMINATE: f64 = -1.0;

/// The facade over a Linux host with optional cgroup v2 container support.
pub type LinuxMetrics = OperatingSystemMetrics<ProcfsHostProbe, CgroupV2Metrics>;

#[derive(Debug)]
pub struct OperatingSystemMetrics<H, C> {
    reconciler: Reconciler<H, C>,
}

impl<H: HostProbe, C: ContainerMetrics> OperatingSystemMetrics<H, C> {
    pub fn new(host: H, container: Option<C>) -> Self {
        if container.is_some() {
            log::info!("Container support active, metrics reflect container limits");
        }
        Self {
            reconciler: Reconciler::new(host, container),
        }
    }

    pub fn reconciler(&self) -> &Reconciler<H, C> {
        &self.reconciler
    }

    pub fn container_present(&self) -> bool {
        self.reconciler.container().is_some()
    }

    pub fn total_swap_space_size(&self) -> i64 {
        to_sentinel(self.reconciler.total_swap_space_size())
    }

    pub fn free_swap_space_size(&self) -> i64 {
        to_sentinel(self.reconciler.free_swap_space_size())
    }

    pub fn total_physical_memory_size(&self) -> i64 {
        to_sentinel(self.reconciler.total_physical_memory_size())
    }

    pub fn free_physical_memory_size(&self) -> i64 {
        to_sentinel(self.reconciler.free_physical_memory_size())
    }

    /// Recent CPU load in `[0.0, 1.0]`, or [`INDETERMINATE`].
    ///
    /// Every call advances the measurement window, so concurrent callers each see the load since
    /// whichever call came before theirs.
    pub fn system_cpu_load(&self) -> f64 {
        self.reconciler.system_cpu_load().unwrap_or(INDETERMINATE)
    }

    pub fn process_cpu_load(&self) -> f64 {
        self.reconciler
            .host()
            .process_cpu_load()
            .unwrap_or(INDETERMINATE)
    }

    /// CPU time used by this process, in nanoseconds.
    pub fn process_cpu_time(&self) -> i64 {
        to_sentinel(self.reconciler.host().process_cpu_time())
    }

    pub fn committed_virtual_memory_size(&self) -> i64 {
        to_sentinel(self.reconciler.host().committed_virtual_memory())
    }

    pub fn open_file_descriptor_count(&self) -> i64 {
        to_sentinel(self.reconciler.host().open_file_descriptor_count())
    }

    pub fn max_file_descriptor_count(&self) -> i64 {
        to_sentinel(self.reconciler.host().max_file_descriptor_count())
    }

    pub fn available_processors(&self) -> u32 {
        self.reconciler.available_processors()
    }

    /// Reads every metric once.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            container_present: self.container_present(),
            available_processors: self.available_processors(),
            total_swap_space_size: self.total_swap_space_size(),
            free_swap_space_size: self.free_swap_space_size(),
            total_physical_memory_size: self.total_physical_memory_size(),
            free_physical_memory_size: self.free_physical_memory_size(),
            system_cpu_load: self.system_cpu_load(),
            process_cpu_load: self.process_cpu_load(),
            process_cpu_time: self.process_cpu_time(),
            committed_virtual_memory_size: self.committed_virtual_memory_size(),
            open_file_descriptor_count: self.open_file_descriptor_count(),
            max_file_descriptor_count: self.max_file_descriptor_count(),
        }
    }
}

/// All facade values at one point in time, with the same sentinels as the getters.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub container_present: bool,
    pub available_processors: u32,
    pub total_swap_space_size: i64,
    pub free_swap_space_size: i64,
    pub total_physical_memory_size: i64,
    pub free_physical_memory_size: i64,
    pub system_cpu_load: f64,
    pub process_cpu_load: f64,
    pub process_cpu_time: i64,
    pub committed_virtual_memory_size: i64,
    pub open_file_descriptor_count: i64,
    pub max_file_descriptor_count: i64,
}

fn to_sentinel(value: Option<u64>) -> i64 {
    value.map_or(UNAVAILABLE, |v| i64::try_from(v).unwrap_or(i64::MAX))
}
