use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;

use crate::cgroup::stats::{CpuSet, KeyValueStat, SingleLineStat};
use crate::error::ResultOkLogExt;
use crate::fsutil;

use super::{CpuTimes, HostProbe, Meminfo, ProcStat, ProcessStat};

const NANOS_PER_SEC: u128 = 1_000_000_000;
const FALLBACK_CLOCK_TICKS: u64 = 100;

/// Previous sample of the process CPU load calculation.
#[derive(Debug, Default, Clone, Copy)]
struct ProcessSample {
    process_ticks: u64,
    host_ticks: u64,
}

/// [`HostProbe`] reading `/proc` and `/sys` of a Linux host.
///
/// Load values are measured between consecutive calls: the probe remembers the last counters
/// it read for the whole machine, for each CPU, and for the process. The first call of each
/// kind measures the average since boot.
#[derive(Debug)]
pub struct ProcfsHostProbe {
    proc_root: PathBuf,
    sys_root: PathBuf,
    clock_ticks: u64,
    // `None` keys the aggregate line.
    cpu_history: DashMap<Option<u32>, CpuTimes>,
    process_history: Mutex<ProcessSample>,
}

impl Default for ProcfsHostProbe {
    fn default() -> Self {
        Self::new("/proc", "/sys")
    }
}

impl ProcfsHostProbe {
    /// Creates a probe reading from the given procfs and sysfs mount points.
    pub fn new(proc_root: impl Into<PathBuf>, sys_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            sys_root: sys_root.into(),
            clock_ticks: system_clock_ticks(),
            cpu_history: DashMap::new(),
            process_history: Mutex::default(),
        }
    }

    /// Overrides the clock tick rate used to convert `/proc` tick counters to nanoseconds.
    pub fn with_clock_ticks(mut self, clock_ticks: u64) -> Self {
        self.clock_ticks = clock_ticks.max(1);
        self
    }

    fn proc_path(&self, relative: &str) -> PathBuf {
        self.proc_root.join(relative)
    }

    fn meminfo(&self) -> Option<Meminfo> {
        fsutil::parse_file(self.proc_path("meminfo"), Meminfo::from_reader).ok_log()
    }

    fn proc_stat(&self) -> Option<ProcStat> {
        fsutil::parse_file(self.proc_path("stat"), ProcStat::from_reader).ok_log()
    }

    fn process_stat(&self) -> Option<ProcessStat> {
        fsutil::parse_file(self.proc_path("self/stat"), ProcessStat::from_reader).ok_log()
    }

    fn cpu_count(&self, file: &str, fallback: libc::c_int) -> Option<u32> {
        let path = self.sys_root.join("devices/system/cpu").join(file);
        match fsutil::parse_file(&path, CpuSet::from_reader).ok_log() {
            Some(set) if !set.cpus.is_empty() => u32::try_from(set.cpus.len()).ok(),
            _ => sysconf_count(fallback),
        }
    }

    /// Records `times` as the latest sample for `cpu` and returns the load since the previous
    /// one.
    fn load_since_last(&self, cpu: Option<u32>, times: CpuTimes) -> f64 {
        let prev = self.cpu_history.insert(cpu, times).unwrap_or_default();
        times.load_since(&prev)
    }

    fn ticks_to_nanos(&self, ticks: u64) -> Option<u64> {
        let nanos = u128::from(ticks) * NANOS_PER_SEC / u128::from(self.clock_ticks);
        u64::try_from(nanos).ok()
    }
}

impl HostProbe for ProcfsHostProbe {
    fn total_swap(&self) -> Option<u64> {
        self.meminfo().map(|info| info.swap_total)
    }

    fn free_swap(&self) -> Option<u64> {
        self.meminfo().map(|info| info.swap_free)
    }

    fn total_physical_memory(&self) -> Option<u64> {
        self.meminfo().map(|info| info.mem_total)
    }

    fn free_physical_memory(&self) -> Option<u64> {
        self.meminfo().map(|info| info.mem_free)
    }

    fn system_cpu_load(&self) -> Option<f64> {
        let stat = self.proc_stat()?;
        Some(self.load_since_last(None, stat.all))
    }

    fn single_cpu_load(&self, cpu: u32) -> Option<f64> {
        let times = self.proc_stat()?.cpu(cpu)?;
        Some(self.load_since_last(Some(cpu), times))
    }

    fn host_total_cpu_ticks(&self) -> Option<u64> {
        self.ticks_to_nanos(self.proc_stat()?.all.total)
    }

    fn host_online_cpu_count(&self) -> Option<u32> {
        self.cpu_count("online", libc::_SC_NPROCESSORS_ONLN)
    }

    fn host_configured_cpu_count(&self) -> Option<u32> {
        self.cpu_count("possible", libc::_SC_NPROCESSORS_CONF)
    }

    fn process_cpu_load(&self) -> Option<f64> {
        let process_ticks = self.process_stat()?.cpu_ticks();
        let host_ticks = self.proc_stat()?.all.total;

        let mut history = self
            .process_history
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let prev = std::mem::replace(
            &mut *history,
            ProcessSample {
                process_ticks,
                host_ticks,
            },
        );

        let used = process_ticks.saturating_sub(prev.process_ticks);
        match host_ticks.checked_sub(prev.host_ticks) {
            Some(elapsed) if elapsed > 0 => Some((used as f64 / elapsed as f64).clamp(0.0, 1.0)),
            _ => Some(0.0),
        }
    }

    fn process_cpu_time(&self) -> Option<u64> {
        self.ticks_to_nanos(self.process_stat()?.cpu_ticks())
    }

    fn committed_virtual_memory(&self) -> Option<u64> {
        self.process_stat().map(|stat| stat.vsize)
    }

    fn open_file_descriptor_count(&self) -> Option<u64> {
        let path = self.proc_path("self/fd");
        let entries = std::fs::read_dir(&path)
            .map_err(|source| fsutil::FileReadError { path, source })
            .ok_log()?;
        // The listing itself holds one descriptor open.
        let count = entries.filter_map(Result::ok).count().saturating_sub(1);
        u64::try_from(count).ok()
    }

    fn max_file_descriptor_count(&self) -> Option<u64> {
        let mut limit = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: `limit` is a valid, writable rlimit struct for the duration of the call.
        let result = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) };
        if result != 0 || limit.rlim_cur == libc::RLIM_INFINITY {
            return None;
        }
        u64::try_from(limit.rlim_cur).ok()
    }
}

fn system_clock_ticks() -> u64 {
    // SAFETY: sysconf has no preconditions and only reads static configuration.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    match u64::try_from(ticks) {
        Ok(ticks) if ticks > 0 => ticks,
        _ => {
            log::warn!("sysconf(_SC_CLK_TCK) failed, assuming {FALLBACK_CLOCK_TICKS} Hz");
            FALLBACK_CLOCK_TICKS
        }
    }
}

fn sysconf_count(name: libc::c_int) -> Option<u32> {
    // SAFETY: sysconf has no preconditions and only reads static configuration.
    let count = unsafe { libc::sysconf(name) };
    u32::try_from(count).ok().filter(|count| *count > 0)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    struct FakeHost {
        root: tempfile::TempDir,
    }

    impl FakeHost {
        fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            fs::create_dir_all(root.path().join("proc/self/fd")).unwrap();
            fs::create_dir_all(root.path().join("sys/devices/system/cpu")).unwrap();
            Self { root }
        }

        fn write(&self, relative: &str, contents: &str) {
            fs::write(self.root.path().join(relative), contents).unwrap();
        }

        fn probe(&self) -> ProcfsHostProbe {
            ProcfsHostProbe::new(self.root.path().join("proc"), self.root.path().join("sys"))
                .with_clock_ticks(100)
        }
    }

    fn proc_stat(all: [u64; 4], cpu0: [u64; 4], cpu1: [u64; 4]) -> String {
        let line = |label: &str, t: [u64; 4]| format!("{label} {} 0 {} {} {} 0 0 0\n", t[0], t[1], t[2], t[3]);
        format!("{}{}{}intr 0\n", line("cpu ", all), line("cpu0", cpu0), line("cpu1", cpu1))
    }

    #[test]
    fn test_memory_from_meminfo() {
        let host = FakeHost::new();
        host.write(
            "proc/meminfo",
            "MemTotal: 4096 kB\nMemFree: 1024 kB\nSwapTotal: 2048 kB\nSwapFree: 512 kB\n",
        );
        let probe = host.probe();

        assert_eq!(probe.total_physical_memory(), Some(4096 * 1024));
        assert_eq!(probe.free_physical_memory(), Some(1024 * 1024));
        assert_eq!(probe.total_swap(), Some(2048 * 1024));
        assert_eq!(probe.free_swap(), Some(512 * 1024));
    }

    #[test]
    fn test_missing_meminfo_is_unavailable() {
        let host = FakeHost::new();
        assert_eq!(host.probe().total_swap(), None);
    }

    #[test]
    fn test_system_and_single_cpu_load_between_calls() {
        let host = FakeHost::new();
        let probe = host.probe();

        // user system idle iowait
        host.write("proc/stat", &proc_stat([100, 0, 100, 0], [50, 0, 50, 0], [50, 0, 50, 0]));
        assert_eq!(probe.system_cpu_load(), Some(0.5));
        assert_eq!(probe.single_cpu_load(0), Some(0.5));

        host.write("proc/stat", &proc_stat([175, 25, 180, 20], [150, 0, 50, 0], [25, 25, 130, 20]));
        assert_eq!(probe.system_cpu_load(), Some(0.5));
        assert_eq!(probe.single_cpu_load(0), Some(1.0));
        // First sample of cpu1 measures since boot.
        assert_eq!(probe.single_cpu_load(1), Some(0.25));
        assert_eq!(probe.single_cpu_load(5), None);
    }

    #[test]
    fn test_host_total_cpu_ticks_in_nanos() {
        let host = FakeHost::new();
        host.write("proc/stat", &proc_stat([100, 50, 240, 10], [0; 4], [0; 4]));

        assert_eq!(host.probe().host_total_cpu_ticks(), Some(4_000_000_000));
    }

    #[test]
    fn test_cpu_counts_from_sysfs() {
        let host = FakeHost::new();
        host.write("sys/devices/system/cpu/online", "0-5,8\n");
        host.write("sys/devices/system/cpu/possible", "0-15\n");
        let probe = host.probe();

        assert_eq!(probe.host_online_cpu_count(), Some(7));
        assert_eq!(probe.host_configured_cpu_count(), Some(16));
    }

    #[test]
    fn test_process_metrics() {
        let host = FakeHost::new();
        let stat = |utime: u64| {
            format!("77 (app) R 1 77 77 0 -1 0 0 0 0 0 {utime} 50 0 0 20 0 4 0 100 8192000 512\n")
        };
        host.write("proc/self/stat", &stat(150));
        host.write("proc/stat", &proc_stat([400, 100, 500, 0], [0; 4], [0; 4]));
        let probe = host.probe();

        assert_eq!(probe.process_cpu_time(), Some(2_000_000_000));
        assert_eq!(probe.committed_virtual_memory(), Some(8_192_000));
        assert_eq!(probe.process_cpu_load(), Some(0.2));

        host.write("proc/self/stat", &stat(250));
        host.write("proc/stat", &proc_stat([800, 200, 1000, 0], [0; 4], [0; 4]));
        assert_eq!(probe.process_cpu_load(), Some(0.1));
    }

    #[test]
    fn test_open_file_descriptor_count_excludes_listing() {
        let host = FakeHost::new();
        // stdin, stdout, stderr and a socket.
        for fd in 0..4 {
            host.write(&format!("proc/self/fd/{fd}"), "");
        }
        // The descriptor `read_dir` holds while listing.
        host.write("proc/self/fd/4", "");

        assert_eq!(host.probe().open_file_descriptor_count(), Some(4));
    }

    #[test]
    fn test_concurrent_cpu_loads_keep_per_cpu_history() {
        let host = FakeHost::new();
        host.write("proc/stat", &proc_stat([100, 0, 100, 0], [50, 0, 50, 0], [25, 0, 75, 0]));
        let probe = host.probe();

        std::thread::scope(|scope| {
            for cpu in [None, Some(0), Some(1)] {
                let probe = &probe;
                scope.spawn(move || match cpu {
                    None => assert_eq!(probe.system_cpu_load(), Some(0.5)),
                    Some(cpu) => {
                        probe.single_cpu_load(cpu);
                    }
                });
            }
        });

        assert_eq!(probe.cpu_history.len(), 3);
        assert_eq!(
            probe.cpu_history.get(&Some(1)).map(|t| *t),
            Some(CpuTimes { busy: 25, total: 100 })
        );
        assert_eq!(probe.single_cpu_load(1), Some(0.0));
    }

    #[test]
    fn test_max_file_descriptor_count_is_positive() {
        let max = ProcfsHostProbe::default().max_file_descriptor_count();
        assert!(max.is_none_or(|max| max > 0));
    }
}
