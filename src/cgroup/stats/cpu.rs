//! Parsers for the cgroup v2 CPU controller files.
//!
//! - `cpu.stat`: key-value pairs; only the cumulative usage and the elapsed period count are kept.
//! - `cpu.max`: `<quota> <period>` where quota may be `max` (no limit).
//! - `cpu.weight`: a single relative weight in `1..=10000`, `100` by default.
//!
//! # Examples
//!
//! ```rust
//! use cgroup_os_metrics::cgroup::stats::{CpuMax, CpuStat, CpuWeight, KeyValueStat, SingleLineStat};
//!
//! let stat = CpuStat::from_reader(&mut "usage_usec 1000\nnr_periods 10\n".as_bytes()).unwrap();
//! assert_eq!(stat.usage_usec, 1000);
//!
//! let max = CpuMax::from_line("50000 100000").unwrap();
//! assert_eq!(max.quota, Some(50000));
//!
//! let weight = CpuWeight::from_line("79").unwrap();
//! assert_eq!(weight.to_shares(), Some(2048));
//! ```

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::LazyLock;

use super::parser::read_trimmed_line;
use super::{KeyValueStat, SingleLineStat, StatParseError};

/// Parsed data from a cgroup `cpu.stat` file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuStat {
    /// Total CPU time consumed by the cgroup, in microseconds.
    pub usage_usec: u64,
    /// Number of enforcement periods that have elapsed while the cgroup was runnable.
    pub nr_periods: u64,
}

type Setter = fn(&mut CpuStat, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(2);

    m.insert("usage_usec", |s, v| s.usage_usec = v);
    m.insert("nr_periods", |s, v| s.nr_periods = v);

    m
});

impl KeyValueStat for CpuStat {
    const ALLOW_DUPLICATE_KEYS: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}

/// CPU bandwidth limit from `cpu.max`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuMax {
    /// Maximum CPU time in microseconds per period; `None` when unlimited (`max`).
    pub quota: Option<u64>,
    /// Length of each enforcement period in microseconds.
    pub period: u64,
}

const DEFAULT_PERIOD: u64 = 100_000;

impl Default for CpuMax {
    fn default() -> Self {
        Self {
            quota: None,
            period: DEFAULT_PERIOD,
        }
    }
}

impl SingleLineStat for CpuMax {
    /// Parses `<quota> [<period>]`.
    ///
    /// An empty file or a `max` quota yields `quota: None`; a missing period falls back to
    /// `100_000`.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::InvalidValue`] if either number is malformed.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let line = read_trimmed_line(buf)?;
        let mut parts = line.split_whitespace();

        let quota = match parts.next() {
            None | Some("max") => None,
            Some(value) => Some(parse_value(value)?),
        };
        let period = match parts.next() {
            None => DEFAULT_PERIOD,
            Some(value) => parse_value(value)?,
        };

        Ok(CpuMax { quota, period })
    }
}

/// Relative CPU weight from `cpu.weight`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuWeight {
    pub weight: u64,
}

const DEFAULT_WEIGHT: u64 = 100;
const PER_CPU_SHARES: u64 = 1024;

impl Default for CpuWeight {
    fn default() -> Self {
        Self {
            weight: DEFAULT_WEIGHT,
        }
    }
}

impl CpuWeight {
    /// Translates the weight back into cgroup v1 style CPU shares.
    ///
    /// Container runtimes map OCI shares `x` to a weight `y` via
    /// `y = 1 + ((x - 2) * 9999) / 262142`; this applies the inverse and rounds to the nearest
    /// multiple of 1024, so that whole-CPU share requests survive the round trip.
    /// The default weight means no shares were requested and yields `None`.
    pub fn to_shares(&self) -> Option<u64> {
        if self.weight == DEFAULT_WEIGHT || self.weight == 0 {
            return None;
        }

        let shares = (262_142 * self.weight - 1) / 9_999 + 2;
        if shares <= PER_CPU_SHARES {
            return Some(PER_CPU_SHARES);
        }

        let lower = shares / PER_CPU_SHARES * PER_CPU_SHARES;
        let upper = lower + PER_CPU_SHARES;
        if shares - lower <= upper - shares {
            Some(lower)
        } else {
            Some(upper)
        }
    }
}

impl SingleLineStat for CpuWeight {
    /// # Errors
    ///
    /// Returns [`StatParseError::InvalidValue`] if the weight is not a number.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let line = read_trimmed_line(buf)?;
        Ok(CpuWeight {
            weight: parse_value(&line)?,
        })
    }
}

fn parse_value(value: &str) -> Result<u64, StatParseError> {
    value
        .parse::<u64>()
        .map_err(|source| StatParseError::InvalidValue {
            value: value.to_string(),
            line: 1,
            source,
        })
}
