//! The container-level view of resource limits and usage.
//!
//! A [`ContainerMetrics`] implementation reports the limits a container runtime configured for
//! the current process and the live usage counters the kernel keeps for it. Every value is
//! optional: `None` means the limit is not set or the metric is not supported on this system.

/// Container limits and live usage, as consumed by the
/// [`Reconciler`](crate::reconciler::Reconciler).
///
/// Implementations read fresh values on every call; callers must not assume two calls observe
/// the same instant.
pub trait ContainerMetrics: Send + Sync {
    /// Hard memory limit in bytes; `None` when unlimited.
    fn memory_limit(&self) -> Option<u64>;

    /// Combined memory and swap limit in bytes; `None` when either is unlimited.
    fn memory_and_swap_limit(&self) -> Option<u64>;

    /// Current memory usage in bytes.
    fn memory_usage(&self) -> Option<u64>;

    /// Current combined memory and swap usage in bytes.
    fn memory_and_swap_usage(&self) -> Option<u64>;

    /// CPU time in microseconds the container may use per period; `None` when no quota is set.
    fn cpu_quota(&self) -> Option<u64>;

    /// Length of the quota enforcement period in microseconds.
    fn cpu_period(&self) -> Option<u64>;

    /// Cumulative number of elapsed enforcement periods.
    fn cpu_num_periods(&self) -> Option<u64>;

    /// Relative CPU weight in cgroup v1 share units; `None` when not configured.
    fn cpu_shares(&self) -> Option<u64>;

    /// Cumulative CPU time consumed by the container, in nanoseconds.
    fn cpu_usage(&self) -> Option<u64>;

    /// CPUs the container is configured to run on; empty when unsupported.
    fn cpu_set_cpus(&self) -> Vec<u32>;

    /// CPUs the container can actually be scheduled on; empty when unsupported.
    fn effective_cpu_set_cpus(&self) -> Vec<u32>;
}
