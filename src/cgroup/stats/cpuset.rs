//! Parser for `cpuset.cpus` and `cpuset.cpus.effective`, both in the kernel `cpulist` format
//! (`0-3,8,10-11`).

use std::io::BufRead;

use super::parser::read_trimmed_line;
use super::{SingleLineStat, StatParseError};

/// A set of CPU indices in ascending order without duplicates.
///
/// An empty set means the file was empty, which the kernel uses for "inherit from parent".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuSet {
    pub cpus: Vec<u32>,
}

impl SingleLineStat for CpuSet {
    /// # Errors
    ///
    /// Returns [`StatParseError::InvalidCpuList`] wrapped in an `io::Error` if the line is not a
    /// valid cpulist.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let line = read_trimmed_line(buf)?;
        let cpus = cpulist::parse(&line).map_err(|source| StatParseError::InvalidCpuList {
            value: line.clone(),
            source,
        })?;

        Ok(CpuSet { cpus })
    }
}
