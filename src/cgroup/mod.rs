//! Container limits and usage read from the Linux cgroup v2 filesystem.
//!
//! The process's own cgroup is located once, from `/proc/self/mountinfo` (where the unified
//! hierarchy is mounted) and `/proc/self/cgroup` (where the process sits in it). After that,
//! [`CgroupV2Metrics`] reads the interface files of that directory on demand.
//!
//! # Supported Files
//!
//! - `memory.max`, `memory.current`, `memory.swap.max`, `memory.swap.current`
//! - `cpu.max`, `cpu.stat`, `cpu.weight`
//! - `cpuset.cpus`, `cpuset.cpus.effective`
//!
//! # Platform Requirements
//!
//! - Linux with a mounted cgroup v2 (unified) hierarchy.
//! - Read access to the process's cgroup directory.
mod error;
mod membership;
mod provider;
pub mod stats;

pub use error::{Error, Result};
pub use membership::read_unified_cgroup_path;
pub use provider::CgroupV2Metrics;
