use crate::container::ContainerMetrics;
use crate::host::HostProbe;

use super::Reconciler;
use super::cpu::container_cpu_set;

impl<H: HostProbe, C: ContainerMetrics> Reconciler<H, C> {
    /// Load of the CPUs in the container's CPU set, or of the whole host if the set covers it.
    pub(super) fn cpu_set_load(&self, container: &C) -> Option<f64> {
        let cpus = container_cpu_set(container);
        if self.covers_host(&cpus) {
            return self.host.system_cpu_load();
        }
        self.average_load(&cpus)
    }

    /// Whether a CPU set is as large as the host's online CPUs, i.e. unrestricted.
    fn covers_host(&self, cpus: &[u32]) -> bool {
        self.host
            .host_online_cpu_count()
            .is_some_and(|online| usize::try_from(online).is_ok_and(|n| n == cpus.len()))
    }

    /// Mean of the single CPU loads; `None` if the set is empty or any CPU's load is unknown.
    fn average_load(&self, cpus: &[u32]) -> Option<f64> {
        if cpus.is_empty() {
            return None;
        }
        let mut sum = 0.0;
        for &cpu in cpus {
            sum += self.host.single_cpu_load(cpu)?;
        }
        Some(sum / cpus.len() as f64)
    }
}
