//! Generic traits for parsing kernel stat files into structured types.
//!
//! Two shapes cover every file this crate reads:
//!
//! - [`KeyValueStat`]: one `key value [unit]` pair per line, as in `cpu.stat` or `/proc/meminfo`.
//!   A trailing `:` on the key is ignored, so `MemTotal:  16318916 kB` yields the key `MemTotal`.
//! - [`SingleLineStat`]: one value on the first line, as in `memory.max` or `cpuset.cpus`.
//!
//! # Example: Implementing `KeyValueStat`
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::OnceLock;
//! use cgroup_os_metrics::cgroup::stats::KeyValueStat;
//!
//! #[derive(Default)]
//! struct MyStat {
//!     foo: u64,
//! }
//!
//! static HANDLERS: OnceLock<HashMap<&'static str, fn(&mut MyStat, u64)>> = OnceLock::new();
//!
//! impl KeyValueStat for MyStat {
//!     const ALLOW_DUPLICATE_KEYS: bool = false;
//!
//!     fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
//!         HANDLERS.get_or_init(|| {
//!             let mut map = HashMap::new();
//!             map.insert("foo", (|s: &mut MyStat, v: u64| s.foo = v) as fn(&mut MyStat, u64));
//!             map
//!         })
//!     }
//! }
//!
//! let stat = MyStat::from_reader(&mut "foo 42\nbar 7\n".as_bytes()).unwrap();
//! assert_eq!(stat.foo, 42);
//! ```

use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use super::StatParseError;

/// A trait for parsing line-oriented `key value` files.
///
/// Implementors name the keys they care about and how to store each value; unknown keys are
/// skipped. Parsing stops early once every known key has been seen, unless duplicates are
/// allowed.
pub trait KeyValueStat: Default
where
    Self: 'static,
{
    /// If `true`, a repeated key overwrites (or accumulates into) the earlier value.
    /// If `false`, encountering the same key more than once is an error.
    const ALLOW_DUPLICATE_KEYS: bool;

    /// Returns the known field names and the functions applying a parsed value to `Self`.
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)>;

    /// Parses a key-value formatted buffer.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if reading fails, or a [`StatParseError`] wrapped in `io::Error`
    /// if a known key carries a non-numeric value or appears twice.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut stat = Self::default();
        let handlers = Self::field_handlers();
        let mut seen_keys = HashSet::with_capacity(handlers.len());

        let mut line = String::new();
        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            let mut parts = line.split_whitespace();
            if let (Some(key), Some(val)) = (parts.next(), parts.next()) {
                let key = key.strip_suffix(':').unwrap_or(key);
                if let Some((k, handler)) = handlers.get_key_value(key) {
                    let parsed =
                        val.parse::<u64>()
                            .map_err(|source| StatParseError::InvalidKeyValue {
                                key: key.to_string(),
                                value: val.to_string(),
                                line: lineno,
                                source,
                            })?;
                    if !Self::ALLOW_DUPLICATE_KEYS && !seen_keys.insert(*k) {
                        return Err(StatParseError::DuplicateField {
                            field: key.to_string(),
                            line: lineno,
                        }
                        .into());
                    }
                    handler(&mut stat, parsed);
                }
            }

            if !Self::ALLOW_DUPLICATE_KEYS && seen_keys.len() == handlers.len() {
                break;
            }
            line.clear();
        }

        Ok(stat)
    }
}

/// A trait for parsing single-line statistics such as `memory.current`, `memory.max` or
/// `cpuset.cpus`.
pub trait SingleLineStat: Sized + Default {
    /// Parses the statistic from the first line of `buf`.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if reading fails or the value is malformed.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self>;

    /// Parses the statistic from a string slice.
    ///
    /// # Errors
    ///
    /// See [`SingleLineStat::from_reader`].
    fn from_line(line: &str) -> std::io::Result<Self> {
        Self::from_reader(&mut line.as_bytes())
    }
}

/// Reads the first line of `buf`, trimmed of surrounding whitespace.
pub(super) fn read_trimmed_line<R: BufRead>(buf: &mut R) -> std::io::Result<String> {
    let mut line = String::new();
    buf.read_line(&mut line)?;
    Ok(line.trim().to_owned())
}
