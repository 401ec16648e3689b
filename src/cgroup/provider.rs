use std::path::{Path, PathBuf};

use crate::container::ContainerMetrics;
use crate::error::ResultOkLogExt;
use crate::fsutil;
use crate::mountinfo;

use super::membership::read_unified_cgroup_path;
use super::stats::{
    CpuMax, CpuSet, CpuStat, CpuWeight, KeyValueStat, MemoryLimit, MemoryUsage, SingleLineStat,
};
use super::{Error, Result};

const NANOS_PER_MICRO: u64 = 1_000;

/// [`ContainerMetrics`] backed by the interface files of a single cgroup v2 directory.
///
/// Files are opened anew on every read, so values always reflect the kernel's current state and
/// a file that appears later (e.g. after a controller is enabled) is picked up.
#[derive(Debug, Clone)]
pub struct CgroupV2Metrics {
    dir: PathBuf,
}

impl CgroupV2Metrics {
    /// Creates a provider reading from the given cgroup directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Locates the cgroup of the current process.
    ///
    /// The cgroup2 mount is taken from `<proc_root>/self/mountinfo` and the process's position in
    /// the hierarchy from `<proc_root>/self/cgroup`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if no cgroup2 mount or membership is found, or if the resolved
    /// directory is not visible.
    pub fn detect(proc_root: impl AsRef<Path>) -> Result<Self> {
        let proc_root = proc_root.as_ref();
        let mount = mountinfo::detect_cgroup2_mount(proc_root.join("self/mountinfo"))?;
        let cgroup_path = read_unified_cgroup_path(proc_root.join("self/cgroup"))?;

        let dir = mount
            .resolve(&cgroup_path)
            .ok_or_else(|| Error::OutsideMount {
                cgroup_path: cgroup_path.clone(),
                root: mount.root.clone(),
            })?;
        if !dir.is_dir() {
            return Err(Error::MissingDirectory { path: dir });
        }

        log::debug!("Using cgroup directory: {}", dir.display());
        Ok(Self::new(dir))
    }

    /// The cgroup directory this provider reads from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: SingleLineStat>(&self, file: &str) -> Option<T> {
        fsutil::parse_file(self.dir.join(file), T::from_reader).ok_log()
    }

    fn read_cpu_stat(&self) -> Option<CpuStat> {
        fsutil::parse_file(self.dir.join("cpu.stat"), CpuStat::from_reader).ok_log()
    }

    fn read_cpu_set(&self, file: &str) -> Vec<u32> {
        self.read::<CpuSet>(file)
            .map(|set| set.cpus)
            .unwrap_or_default()
    }
}

impl ContainerMetrics for CgroupV2Metrics {
    fn memory_limit(&self) -> Option<u64> {
        self.read::<MemoryLimit>("memory.max")?.limit_bytes
    }

    fn memory_and_swap_limit(&self) -> Option<u64> {
        let swap_limit = self.read::<MemoryLimit>("memory.swap.max")?.limit_bytes?;
        let memory_limit = self.memory_limit()?;
        memory_limit.checked_add(swap_limit)
    }

    fn memory_usage(&self) -> Option<u64> {
        self.read::<MemoryUsage>("memory.current")
            .map(|usage| usage.usage_bytes)
    }

    fn memory_and_swap_usage(&self) -> Option<u64> {
        let memory_usage = self.memory_usage()?;
        let swap_usage = fsutil::parse_file(
            self.dir.join("memory.swap.current"),
            MemoryUsage::from_reader,
        )
        .ok_trace()
        .map_or(0, |usage| usage.usage_bytes);
        memory_usage.checked_add(swap_usage)
    }

    fn cpu_quota(&self) -> Option<u64> {
        self.read::<CpuMax>("cpu.max")?.quota
    }

    fn cpu_period(&self) -> Option<u64> {
        self.read::<CpuMax>("cpu.max").map(|max| max.period)
    }

    fn cpu_num_periods(&self) -> Option<u64> {
        self.read_cpu_stat().map(|stat| stat.nr_periods)
    }

    fn cpu_shares(&self) -> Option<u64> {
        self.read::<CpuWeight>("cpu.weight")?.to_shares()
    }

    fn cpu_usage(&self) -> Option<u64> {
        self.read_cpu_stat()?.usage_usec.checked_mul(NANOS_PER_MICRO)
    }

    fn cpu_set_cpus(&self) -> Vec<u32> {
        self.read_cpu_set("cpuset.cpus")
    }

    fn effective_cpu_set_cpus(&self) -> Vec<u32> {
        self.read_cpu_set("cpuset.cpus.effective")
    }
}
