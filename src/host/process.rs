//! Parser for `/proc/<pid>/stat`.
//!
//! The second field is the command name in parentheses and may itself contain spaces or
//! parentheses, so fields are counted from the last `)`.

use std::io::BufRead;

use crate::cgroup::stats::StatParseError;

// Positions after the closing parenthesis; field 3 (state) is index 0.
const UTIME_INDEX: usize = 11;
const STIME_INDEX: usize = 12;
const VSIZE_INDEX: usize = 20;

/// CPU time and address space size of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessStat {
    /// Time scheduled in user mode, in clock ticks.
    pub utime: u64,
    /// Time scheduled in kernel mode, in clock ticks.
    pub stime: u64,
    /// Virtual memory size in bytes.
    pub vsize: u64,
}

impl ProcessStat {
    /// Total CPU time in clock ticks.
    pub fn cpu_ticks(&self) -> u64 {
        self.utime + self.stime
    }

    /// # Errors
    ///
    /// Returns an `io::Error` of kind `InvalidData` if the line is truncated or a field is not
    /// a number.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut line = String::new();
        buf.read_line(&mut line)?;

        let after_comm = line
            .rsplit_once(')')
            .map(|(_, rest)| rest)
            .ok_or_else(|| truncated(&line))?;
        let fields: Vec<&str> = after_comm.split_whitespace().collect();

        let field = |index: usize| -> Result<u64, StatParseError> {
            let value = fields.get(index).ok_or_else(|| truncated(&line))?;
            value
                .parse::<u64>()
                .map_err(|source| StatParseError::InvalidValue {
                    value: value.to_string(),
                    line: 1,
                    source,
                })
        };

        Ok(ProcessStat {
            utime: field(UTIME_INDEX)?,
            stime: field(STIME_INDEX)?,
            vsize: field(VSIZE_INDEX)?,
        })
    }
}

fn truncated(line: &str) -> StatParseError {
    StatParseError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("truncated process stat line: `{}`", line.trim_end()),
    ))
}
