use crate::container::ContainerMetrics;
use crate::host::HostProbe;

use super::Reconciler;

const NANOS_PER_MICRO: u64 = 1_000;
const SHARES_PER_CPU: u64 = 1024;

/// The previous pair of cumulative CPU samples a load ratio is measured from.
///
/// A fresh history is all zeros, so the first ratio covers everything since the counters
/// started.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CpuLoadHistory {
    last_usage_ticks: u64,
    last_total_ticks: u64,
}

impl CpuLoadHistory {
    /// Returns the share of `total` elapsed since the previous call that `usage` consumed.
    ///
    /// The history always advances to the new samples. A missing sample is stored as zero and
    /// yields `None`; a total of zero is treated as missing. Elapsed deltas that are zero or
    /// negative give `0.0`. The result is clamped to `[0.0, 1.0]`.
    pub fn ratio_from_delta(&mut self, usage: Option<u64>, total: Option<u64>) -> Option<f64> {
        let total = total.filter(|t| *t > 0);
        let prev = std::mem::replace(
            self,
            CpuLoadHistory {
                last_usage_ticks: usage.unwrap_or(0),
                last_total_ticks: total.unwrap_or(0),
            },
        );
        let (usage, total) = (usage?, total?);

        let used = usage.checked_sub(prev.last_usage_ticks).filter(|d| *d > 0);
        let elapsed = total.checked_sub(prev.last_total_ticks).filter(|d| *d > 0);
        let load = match (used, elapsed) {
            (Some(used), Some(elapsed)) => used as f64 / elapsed as f64,
            _ => 0.0,
        };
        Some(load.clamp(0.0, 1.0))
    }
}

impl<H: HostProbe, C: ContainerMetrics> Reconciler<H, C> {
    /// Recent CPU load of the environment the process runs in, in `[0.0, 1.0]`.
    ///
    /// With a CPU quota the load is usage relative to the quota granted since the previous call.
    /// With CPU shares it is usage relative to the host's CPU time scaled down to the container's
    /// processor count. Otherwise it is the load of the CPUs the container may run on.
    pub fn system_cpu_load(&self) -> Option<f64> {
        let Some(container) = &self.container else {
            return self.host.system_cpu_load();
        };

        if let Some(quota) = container.cpu_quota().filter(|q| *q > 0) {
            let usage = container.cpu_usage();
            let granted = container
                .cpu_num_periods()
                .and_then(|periods| quota.checked_mul(periods))
                .and_then(|micros| micros.checked_mul(NANOS_PER_MICRO));
            return self.ratio_from_delta(usage, granted);
        }

        if container.cpu_shares().is_some_and(|s| s > 0) {
            let usage = container.cpu_usage();
            let capacity = self.share_scaled_host_ticks();
            return self.ratio_from_delta(usage, capacity);
        }

        self.cpu_set_load(container)
    }

    /// Number of processors available to the process, at least 1.
    ///
    /// Starts from the container's CPU set (or the host's online CPUs) and is narrowed by the
    /// CPU shares and quota when those are set.
    pub fn available_processors(&self) -> u32 {
        let host_cpus = self.host.host_online_cpu_count().unwrap_or(1);
        let Some(container) = &self.container else {
            return host_cpus.max(1);
        };

        let set_size = u32::try_from(container_cpu_set(container).len()).unwrap_or(u32::MAX);
        let mut cpus = if set_size > 0 { set_size } else { host_cpus };

        if let Some(shares) = container.cpu_shares().filter(|s| *s > 0) {
            cpus = cpus.min(ceil_div_u32(shares, SHARES_PER_CPU));
        }
        if let Some(quota) = container.cpu_quota().filter(|q| *q > 0) {
            if let Some(period) = container.cpu_period().filter(|p| *p > 0) {
                cpus = cpus.min(ceil_div_u32(quota, period));
            }
        }
        cpus.max(1)
    }

    /// The host's cumulative CPU time scaled to the container's share of the host's processors.
    fn share_scaled_host_ticks(&self) -> Option<u64> {
        let ticks = self.host.host_total_cpu_ticks()?;
        let host_cpus = self.host.host_online_cpu_count().filter(|n| *n > 0)?;
        let container_cpus = self.available_processors().min(host_cpus);

        let scaled = u128::from(ticks) * u128::from(container_cpus) / u128::from(host_cpus);
        u64::try_from(scaled).ok()
    }
}

/// The CPUs the container may run on: the effective set, or the configured set if the effective
/// one is unavailable.
pub(super) fn container_cpu_set(container: &impl ContainerMetrics) -> Vec<u32> {
    let effective = container.effective_cpu_set_cpus();
    if effective.is_empty() {
        container.cpu_set_cpus()
    } else {
        effective
    }
}

fn ceil_div_u32(value: u64, divisor: u64) -> u32 {
    u32::try_from(value.div_ceil(divisor)).unwrap_or(u32::MAX)
}
