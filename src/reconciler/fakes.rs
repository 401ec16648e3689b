//! In-memory collaborators for exercising the reconciler without a real host.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::container::ContainerMetrics;
use crate::host::HostProbe;

#[derive(Debug, Default, Clone)]
pub(crate) struct HostState {
    pub total_swap: Option<u64>,
    pub free_swap: Option<u64>,
    pub total_physical_memory: Option<u64>,
    pub free_physical_memory: Option<u64>,
    pub system_cpu_load: Option<f64>,
    pub single_cpu_loads: Vec<Option<f64>>,
    pub host_total_cpu_ticks: Option<u64>,
    pub host_online_cpu_count: Option<u32>,
    pub host_configured_cpu_count: Option<u32>,
    pub process_cpu_load: Option<f64>,
    pub process_cpu_time: Option<u64>,
    pub committed_virtual_memory: Option<u64>,
    pub open_file_descriptor_count: Option<u64>,
    pub max_file_descriptor_count: Option<u64>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeHost {
    state: Mutex<HostState>,
}

impl FakeHost {
    pub fn new(state: HostState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut HostState)) {
        f(&mut self.state.lock().unwrap());
    }

    fn get<T>(&self, f: impl FnOnce(&HostState) -> T) -> T {
        f(&self.state.lock().unwrap())
    }
}

impl HostProbe for FakeHost {
    fn total_swap(&self) -> Option<u64> {
        self.get(|s| s.total_swap)
    }

    fn free_swap(&self) -> Option<u64> {
        self.get(|s| s.free_swap)
    }

    fn total_physical_memory(&self) -> Option<u64> {
        self.get(|s| s.total_physical_memory)
    }

    fn free_physical_memory(&self) -> Option<u64> {
        self.get(|s| s.free_physical_memory)
    }

    fn system_cpu_load(&self) -> Option<f64> {
        self.get(|s| s.system_cpu_load)
    }

    fn single_cpu_load(&self, cpu: u32) -> Option<f64> {
        self.get(|s| s.single_cpu_loads.get(cpu as usize).copied().flatten())
    }

    fn host_total_cpu_ticks(&self) -> Option<u64> {
        self.get(|s| s.host_total_cpu_ticks)
    }

    fn host_online_cpu_count(&self) -> Option<u32> {
        self.get(|s| s.host_online_cpu_count)
    }

    fn host_configured_cpu_count(&self) -> Option<u32> {
        self.get(|s| s.host_configured_cpu_count)
    }

    fn process_cpu_load(&self) -> Option<f64> {
        self.get(|s| s.process_cpu_load)
    }

    fn process_cpu_time(&self) -> Option<u64> {
        self.get(|s| s.process_cpu_time)
    }

    fn committed_virtual_memory(&self) -> Option<u64> {
        self.get(|s| s.committed_virtual_memory)
    }

    fn open_file_descriptor_count(&self) -> Option<u64> {
        self.get(|s| s.open_file_descriptor_count)
    }

    fn max_file_descriptor_count(&self) -> Option<u64> {
        self.get(|s| s.max_file_descriptor_count)
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ContainerState {
    pub memory_limit: Option<u64>,
    pub memory_and_swap_limit: Option<u64>,
    pub memory_usage: Option<u64>,
    pub memory_and_swap_usage: Option<u64>,
    /// Served before `memory_and_swap_usage`, one per call.
    pub queued_memory_and_swap_usage: VecDeque<Option<u64>>,
    pub cpu_quota: Option<u64>,
    pub cpu_period: Option<u64>,
    pub cpu_num_periods: Option<u64>,
    pub cpu_shares: Option<u64>,
    pub cpu_usage: Option<u64>,
    pub cpu_set_cpus: Vec<u32>,
    pub effective_cpu_set_cpus: Vec<u32>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeContainer {
    state: Mutex<ContainerState>,
    swap_usage_reads: AtomicUsize,
}

impl FakeContainer {
    pub fn new(state: ContainerState) -> Self {
        Self {
            state: Mutex::new(state),
            swap_usage_reads: AtomicUsize::new(0),
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut ContainerState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn swap_usage_reads(&self) -> usize {
        self.swap_usage_reads.load(Ordering::SeqCst)
    }

    fn get<T>(&self, f: impl FnOnce(&ContainerState) -> T) -> T {
        f(&self.state.lock().unwrap())
    }
}

impl ContainerMetrics for FakeContainer {
    fn memory_limit(&self) -> Option<u64> {
        self.get(|s| s.memory_limit)
    }

    fn memory_and_swap_limit(&self) -> Option<u64> {
        self.get(|s| s.memory_and_swap_limit)
    }

    fn memory_usage(&self) -> Option<u64> {
        self.get(|s| s.memory_usage)
    }

    fn memory_and_swap_usage(&self) -> Option<u64> {
        self.swap_usage_reads.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        match state.queued_memory_and_swap_usage.pop_front() {
            Some(usage) => usage,
            None => state.memory_and_swap_usage,
        }
    }

    fn cpu_quota(&self) -> Option<u64> {
        self.get(|s| s.cpu_quota)
    }

    fn cpu_period(&self) -> Option<u64> {
        self.get(|s| s.cpu_period)
    }

    fn cpu_num_periods(&self) -> Option<u64> {
        self.get(|s| s.cpu_num_periods)
    }

    fn cpu_shares(&self) -> Option<u64> {
        self.get(|s| s.cpu_shares)
    }

    fn cpu_usage(&self) -> Option<u64> {
        self.get(|s| s.cpu_usage)
    }

    fn cpu_set_cpus(&self) -> Vec<u32> {
        self.get(|s| s.cpu_set_cpus.clone())
    }

    fn effective_cpu_set_cpus(&self) -> Vec<u32> {
        self.get(|s| s.effective_cpu_set_cpus.clone())
    }
}
