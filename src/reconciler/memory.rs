use crate::container::ContainerMetrics;
use crate::host::HostProbe;

use super::Reconciler;

/// How often the free swap calculation re-reads the container usage pair before giving up.
///
/// Memory and swap usage come from two separate reads that can straddle a page moving between
/// RAM and swap, so a single pair may be inconsistent.
pub const MAX_SWAP_ATTEMPTS: usize = 10;

impl<H: HostProbe, C: ContainerMetrics> Reconciler<H, C> {
    /// Swap space available to the process, in bytes.
    ///
    /// Inside a container with both limits set this is the headroom between the memory limit
    /// and the combined memory and swap limit.
    pub fn total_swap_space_size(&self) -> Option<u64> {
        if let Some(swap_limit) = self.container.as_ref().and_then(container_swap_limit) {
            return Some(swap_limit);
        }
        self.host.total_swap()
    }

    /// Swap space not yet used by the process, in bytes.
    ///
    /// Returns `0` without sampling usage if the container permits no swap. Falls back to the
    /// host value if no consistent usage pair is observed within [`MAX_SWAP_ATTEMPTS`] reads.
    pub fn free_swap_space_size(&self) -> Option<u64> {
        if let Some(container) = &self.container {
            if let (Some(swap_and_memory), Some(memory)) =
                (container.memory_and_swap_limit(), container.memory_limit())
            {
                let Some(swap_limit) = swap_and_memory.checked_sub(memory).filter(|l| *l > 0)
                else {
                    return Some(0);
                };

                for _ in 0..MAX_SWAP_ATTEMPTS {
                    if let Some(free) = sample_free_swap(container, swap_limit) {
                        return Some(free);
                    }
                }
                log::debug!(
                    "no consistent swap usage after {MAX_SWAP_ATTEMPTS} attempts, using host value"
                );
            }
        }
        self.host.free_swap()
    }

    /// Physical memory available to the process, in bytes.
    pub fn total_physical_memory_size(&self) -> Option<u64> {
        self.container
            .as_ref()
            .and_then(|container| container.memory_limit())
            .or_else(|| self.host.total_physical_memory())
    }

    /// Physical memory not yet used by the process, in bytes.
    pub fn free_physical_memory_size(&self) -> Option<u64> {
        let container_free = self.container.as_ref().and_then(|container| {
            let usage = container.memory_usage().filter(|u| *u > 0)?;
            let limit = container.memory_limit()?;
            Some(limit.saturating_sub(usage))
        });
        container_free.or_else(|| self.host.free_physical_memory())
    }
}

fn container_swap_limit(container: &impl ContainerMetrics) -> Option<u64> {
    let swap_and_memory = container.memory_and_swap_limit()?;
    let memory = container.memory_limit()?;
    Some(swap_and_memory.saturating_sub(memory))
}

/// One attempt at reading a consistent usage pair; `None` means retry.
fn sample_free_swap(container: &impl ContainerMetrics, swap_limit: u64) -> Option<u64> {
    let swap_and_memory = container.memory_and_swap_usage().filter(|u| *u > 0)?;
    let memory = container.memory_usage().filter(|u| *u > 0)?;
    let swap_usage = swap_and_memory.checked_sub(memory)?;
    swap_limit.checked_sub(swap_usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::fakes::{ContainerState, FakeContainer, FakeHost, HostState};

    const MIB: u64 = 1024 * 1024;

    fn host() -> FakeHost {
        FakeHost::new(HostState {
            total_swap: Some(8192 * MIB),
            free_swap: Some(4096 * MIB),
            total_physical_memory: Some(16384 * MIB),
            free_physical_memory: Some(2048 * MIB),
            ..Default::default()
        })
    }

    fn limited(memory: u64, memory_and_swap: u64) -> ContainerState {
        ContainerState {
            memory_limit: Some(memory),
            memory_and_swap_limit: Some(memory_and_swap),
            ..Default::default()
        }
    }

    fn reconciler(state: ContainerState) -> Reconciler<FakeHost, FakeContainer> {
        Reconciler::new(host(), Some(FakeContainer::new(state)))
    }

    #[test]
    fn test_total_swap_from_container_limits() {
        let r = reconciler(limited(512 * MIB, 768 * MIB));
        assert_eq!(r.total_swap_space_size(), Some(256 * MIB));
    }

    #[test]
    fn test_total_swap_with_reversed_limits_is_zero() {
        let r = reconciler(limited(512 * MIB, 256 * MIB));
        assert_eq!(r.total_swap_space_size(), Some(0));
    }

    #[test]
    fn test_total_swap_falls_back_without_limits() {
        let r = reconciler(ContainerState {
            memory_limit: Some(512 * MIB),
            ..Default::default()
        });
        assert_eq!(r.total_swap_space_size(), Some(8192 * MIB));

        let r = Reconciler::<_, FakeContainer>::new(host(), None);
        assert_eq!(r.total_swap_space_size(), Some(8192 * MIB));
    }

    #[test]
    fn test_free_swap_within_limits() {
        let r = reconciler(ContainerState {
            memory_usage: Some(300 * MIB),
            memory_and_swap_usage: Some(400 * MIB),
            ..limited(512 * MIB, 768 * MIB)
        });
        assert_eq!(r.free_swap_space_size(), Some(156 * MIB));
        assert_eq!(r.container().unwrap().swap_usage_reads(), 1);
    }

    #[test]
    fn test_free_swap_without_permitted_swap_is_zero() {
        let r = reconciler(ContainerState {
            memory_usage: Some(300 * MIB),
            memory_and_swap_usage: Some(400 * MIB),
            ..limited(512 * MIB, 512 * MIB)
        });
        assert_eq!(r.free_swap_space_size(), Some(0));
        assert_eq!(r.container().unwrap().swap_usage_reads(), 0);
    }

    #[test]
    fn test_free_swap_with_reversed_limits_is_zero() {
        let r = reconciler(limited(512 * MIB, 256 * MIB));
        assert_eq!(r.free_swap_space_size(), Some(0));
        assert_eq!(r.container().unwrap().swap_usage_reads(), 0);
    }

    #[test]
    fn test_free_swap_retries_inconsistent_pair() {
        let mut state = ContainerState {
            memory_usage: Some(300 * MIB),
            memory_and_swap_usage: Some(350 * MIB),
            ..limited(512 * MIB, 768 * MIB)
        };
        // Swap usage below memory usage, then a zero reading.
        state
            .queued_memory_and_swap_usage
            .extend([Some(200 * MIB), Some(0)]);
        let r = reconciler(state);

        assert_eq!(r.free_swap_space_size(), Some(206 * MIB));
        assert_eq!(r.container().unwrap().swap_usage_reads(), 3);
    }

    #[test]
    fn test_free_swap_falls_back_after_exhausting_attempts() {
        let r = reconciler(ContainerState {
            memory_usage: Some(300 * MIB),
            memory_and_swap_usage: Some(200 * MIB),
            ..limited(512 * MIB, 768 * MIB)
        });
        assert_eq!(r.free_swap_space_size(), Some(4096 * MIB));
        assert_eq!(
            r.container().unwrap().swap_usage_reads(),
            MAX_SWAP_ATTEMPTS
        );
    }

    #[test]
    fn test_free_swap_usage_above_limit_falls_back() {
        let r = reconciler(ContainerState {
            memory_usage: Some(100 * MIB),
            memory_and_swap_usage: Some(600 * MIB),
            ..limited(512 * MIB, 768 * MIB)
        });
        assert_eq!(r.free_swap_space_size(), Some(4096 * MIB));
    }

    #[test]
    fn test_physical_memory_from_container() {
        let r = reconciler(ContainerState {
            memory_usage: Some(100 * MIB),
            ..limited(512 * MIB, 768 * MIB)
        });
        assert_eq!(r.total_physical_memory_size(), Some(512 * MIB));
        assert_eq!(r.free_physical_memory_size(), Some(412 * MIB));
    }

    #[test]
    fn test_physical_memory_usage_above_limit_is_zero_free() {
        let r = reconciler(ContainerState {
            memory_usage: Some(600 * MIB),
            ..limited(512 * MIB, 768 * MIB)
        });
        assert_eq!(r.free_physical_memory_size(), Some(0));
    }

    #[test]
    fn test_physical_memory_falls_back_to_host() {
        let r = reconciler(ContainerState {
            memory_usage: Some(100 * MIB),
            ..Default::default()
        });
        assert_eq!(r.total_physical_memory_size(), Some(16384 * MIB));
        assert_eq!(r.free_physical_memory_size(), Some(2048 * MIB));

        let r = reconciler(ContainerState {
            memory_usage: Some(0),
            ..limited(512 * MIB, 768 * MIB)
        });
        assert_eq!(r.free_physical_memory_size(), Some(2048 * MIB));
    }
}
