//! Parsers for the single-value cgroup v2 memory controller files.
//!
//! - [`MemoryUsage`] reads `memory.current` and `memory.swap.current`.
//! - [`MemoryLimit`] reads `memory.max` and `memory.swap.max`, where `max` means no limit.
//!
//! # Examples
//!
//! ```rust
//! use cgroup_os_metrics::cgroup::stats::{MemoryLimit, MemoryUsage, SingleLineStat};
//!
//! let usage = MemoryUsage::from_line("8192\n").unwrap();
//! assert_eq!(usage.usage_bytes, 8192);
//!
//! let limit = MemoryLimit::from_line("max\n").unwrap();
//! assert_eq!(limit.limit_bytes, None);
//! ```

use std::io::BufRead;

use super::parser::read_trimmed_line;
use super::{SingleLineStat, StatParseError};

/// Current usage in bytes from `memory.current` or `memory.swap.current`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryUsage {
    pub usage_bytes: u64,
}

impl SingleLineStat for MemoryUsage {
    /// # Errors
    ///
    /// Returns an error of kind `std::io::ErrorKind::InvalidData` if the value cannot be parsed
    /// as a `u64`.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let line = read_trimmed_line(buf)?;
        let usage_bytes = line
            .parse::<u64>()
            .map_err(|source| StatParseError::InvalidValue {
                value: line.clone(),
                line: 1,
                source,
            })?;

        Ok(MemoryUsage { usage_bytes })
    }
}

/// Hard limit in bytes from `memory.max` or `memory.swap.max`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryLimit {
    /// `None` represents `max`, i.e. no limit is set.
    pub limit_bytes: Option<u64>,
}

impl SingleLineStat for MemoryLimit {
    /// # Errors
    ///
    /// Returns an error of kind `std::io::ErrorKind::InvalidData` if the value is neither `max`
    /// nor a `u64`.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let line = read_trimmed_line(buf)?;
        let limit_bytes = match line.as_str() {
            "max" => None,
            value => Some(
                value
                    .parse::<u64>()
                    .map_err(|source| StatParseError::InvalidValue {
                        value: value.to_string(),
                        line: 1,
                        source,
                    })?,
            ),
        };

        Ok(MemoryLimit { limit_bytes })
    }
}
