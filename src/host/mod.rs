//! Host-wide operating system counters.
//!
//! [`HostProbe`] is the fallback source for every metric the container view cannot provide, and
//! the only source of CPU tick counters. [`ProcfsHostProbe`] implements it on Linux from `/proc`
//! and `/sys`.

mod cpu_times;
mod meminfo;
mod process;
mod procfs;

pub use cpu_times::{CpuTimes, ProcStat};
pub use meminfo::Meminfo;
pub use process::ProcessStat;
pub use procfs::ProcfsHostProbe;

/// Host-wide counters of the machine the process runs on.
///
/// Every method returns `None` when the value cannot be determined on this platform. Loads are
/// ratios in `[0.0, 1.0]`.
pub trait HostProbe: Send + Sync {
    /// Total swap space in bytes.
    fn total_swap(&self) -> Option<u64>;

    /// Free swap space in bytes.
    fn free_swap(&self) -> Option<u64>;

    /// Total physical memory in bytes.
    fn total_physical_memory(&self) -> Option<u64>;

    /// Free physical memory in bytes.
    fn free_physical_memory(&self) -> Option<u64>;

    /// Load across all CPUs since the previous call.
    fn system_cpu_load(&self) -> Option<f64>;

    /// Load of a single CPU since the previous call for that CPU.
    fn single_cpu_load(&self, cpu: u32) -> Option<f64>;

    /// Cumulative CPU time of all CPUs since boot, in nanoseconds.
    fn host_total_cpu_ticks(&self) -> Option<u64>;

    /// Number of CPUs currently online.
    fn host_online_cpu_count(&self) -> Option<u32>;

    /// Number of CPUs present in the machine, online or not.
    fn host_configured_cpu_count(&self) -> Option<u32>;

    /// Share of the host's CPU time used by this process since the previous call.
    fn process_cpu_load(&self) -> Option<f64>;

    /// Cumulative CPU time of this process, in nanoseconds.
    fn process_cpu_time(&self) -> Option<u64>;

    /// Virtual memory reserved by this process, in bytes.
    fn committed_virtual_memory(&self) -> Option<u64>;

    /// Number of file descriptors this process has open.
    fn open_file_descriptor_count(&self) -> Option<u64>;

    /// Maximum number of file descriptors this process may open.
    fn max_file_descriptor_count(&self) -> Option<u64>;
}
