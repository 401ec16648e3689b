//! Typed parsers for the cgroup v2 interface files and the procfs files that share their shape.
//!
//! Each type maps one file format:
//!
//! - [`CpuStat`]: `cpu.stat`
//! - [`CpuMax`]: `cpu.max`
//! - [`CpuWeight`]: `cpu.weight`
//! - [`CpuSet`]: `cpuset.cpus`, `cpuset.cpus.effective`
//! - [`MemoryUsage`]: `memory.current`, `memory.swap.current`
//! - [`MemoryLimit`]: `memory.max`, `memory.swap.max`
//!
//! The parsing traits [`KeyValueStat`] and [`SingleLineStat`] are also used for `/proc/meminfo`
//! and the CPU topology files under `/sys`.

mod cpu;
mod cpuset;
pub(crate) mod error;
mod memory;
mod parser;

pub use cpu::{CpuMax, CpuStat, CpuWeight};
pub use cpuset::CpuSet;
pub use error::StatParseError;
pub use memory::{MemoryLimit, MemoryUsage};
pub use parser::{KeyValueStat, SingleLineStat};
