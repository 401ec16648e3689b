//! Parser for `/proc/meminfo`.
//!
//! ```text
//! MemTotal:       16318916 kB
//! MemFree:          412636 kB
//! SwapTotal:       8388604 kB
//! SwapFree:        8312572 kB
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::cgroup::stats::KeyValueStat;

const BYTES_PER_KIB: u64 = 1024;

/// The host-wide memory and swap totals from `/proc/meminfo`, in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Meminfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

type Setter = fn(&mut Meminfo, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(4);

    m.insert("MemTotal", |s, kib| s.mem_total = kib.saturating_mul(BYTES_PER_KIB));
    m.insert("MemFree", |s, kib| s.mem_free = kib.saturating_mul(BYTES_PER_KIB));
    m.insert("SwapTotal", |s, kib| s.swap_total = kib.saturating_mul(BYTES_PER_KIB));
    m.insert("SwapFree", |s, kib| s.swap_free = kib.saturating_mul(BYTES_PER_KIB));

    m
});

impl KeyValueStat for Meminfo {
    const ALLOW_DUPLICATE_KEYS: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}
