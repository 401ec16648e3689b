//! Parser for the `cpu` lines of `/proc/stat` and the load ratio derived from two samples.
//!
//! ```text
//! cpu  10132153 290696 3084719 46828483 16683 0 25195 0 0 0
//! cpu0 1393280 32966 572056 13343292 6130 0 17875 0 0 0
//! ```
//!
//! Columns are user, nice, system, idle, iowait, irq, softirq, steal, guest, guest_nice, all in
//! clock ticks. Guest time is already part of user time and is not counted again.

use std::io::BufRead;

use crate::cgroup::stats::StatParseError;

/// Cumulative tick counters of one `cpu` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuTimes {
    /// Ticks spent doing work: user, nice, system, irq, softirq and steal.
    pub busy: u64,
    /// All ticks, i.e. `busy` plus idle and iowait.
    pub total: u64,
}

impl CpuTimes {
    /// Share of the ticks elapsed since `prev` that were busy, in `[0.0, 1.0]`.
    ///
    /// Returns `0.0` if no ticks elapsed or the counters went backwards.
    pub fn load_since(&self, prev: &CpuTimes) -> f64 {
        let busy = self.busy.saturating_sub(prev.busy);
        match self.total.checked_sub(prev.total) {
            Some(total) if total > 0 => (busy as f64 / total as f64).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

/// The CPU section of `/proc/stat`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcStat {
    /// The aggregate `cpu` line, summed over all CPUs.
    pub all: CpuTimes,
    /// The `cpuN` lines, in file order. Offline CPUs have no line.
    pub per_cpu: Vec<(u32, CpuTimes)>,
}

impl ProcStat {
    /// Looks up the counters of a single CPU.
    pub fn cpu(&self, index: u32) -> Option<CpuTimes> {
        self.per_cpu
            .iter()
            .find(|(cpu, _)| *cpu == index)
            .map(|(_, times)| *times)
    }

    /// Parses the `cpu` lines of a `/proc/stat` buffer, stopping at the first other line.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` of kind `InvalidData` if a tick counter is not a number.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut stat = ProcStat::default();
        let mut line = String::new();
        let mut lineno = 0;

        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            let mut fields = line.split_whitespace();
            let Some(label) = fields.next().and_then(|l| l.strip_prefix("cpu")) else {
                break;
            };
            let times = parse_ticks(fields, lineno)?;
            if label.is_empty() {
                stat.all = times;
            } else if let Ok(index) = label.parse::<u32>() {
                stat.per_cpu.push((index, times));
            }
            line.clear();
        }

        Ok(stat)
    }
}

fn parse_ticks<'a>(
    fields: impl Iterator<Item = &'a str>,
    lineno: usize,
) -> Result<CpuTimes, StatParseError> {
    let mut times = CpuTimes::default();
    // user nice system idle iowait irq softirq steal
    for (column, value) in fields.take(8).enumerate() {
        let ticks = value
            .parse::<u64>()
            .map_err(|source| StatParseError::InvalidValue {
                value: value.to_string(),
                line: lineno,
                source,
            })?;
        times.total += ticks;
        if column != 3 && column != 4 {
            times.busy += ticks;
        }
    }
    Ok(times)
}
