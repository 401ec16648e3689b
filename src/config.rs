//! Runtime configuration read from the environment.

use std::ffi::OsString;
use std::path::PathBuf;

pub const PROC_MOUNT_PATH: &str = "PROC_MOUNT_PATH";
pub const SYSFS_MOUNT_PATH: &str = "SYSFS_MOUNT_PATH";
pub const METRICS_LISTEN_ADDR: &str = "METRICS_LISTEN_ADDR";
pub const USE_CONTAINER_SUPPORT: &str = "USE_CONTAINER_SUPPORT";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("environment variable `{name}` is not valid unicode")]
    NotUnicode { name: &'static str },
    #[error("environment variable `{name}` must be a boolean, got `{value}`")]
    InvalidBool { name: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where procfs is mounted; `/proc` unless the host's is bind-mounted elsewhere.
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
    pub listen_addr: String,
    /// Whether container limits are consulted at all.
    pub use_container_support: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
            listen_addr: String::from("0.0.0.0:3000"),
            use_container_support: true,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if a variable is set to a value that cannot be interpreted.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = lookup(PROC_MOUNT_PATH) {
            config.proc_root = PathBuf::from(path);
        }
        if let Some(path) = lookup(SYSFS_MOUNT_PATH) {
            config.sys_root = PathBuf::from(path);
        }
        if let Some(addr) = lookup(METRICS_LISTEN_ADDR) {
            config.listen_addr = addr.into_string().map_err(|_| Error::NotUnicode {
                name: METRICS_LISTEN_ADDR,
            })?;
        }
        if let Some(value) = lookup(USE_CONTAINER_SUPPORT) {
            config.use_container_support = parse_bool(USE_CONTAINER_SUPPORT, value)?;
        }

        log::debug!("Configuration: {config:?}");
        Ok(config)
    }
}

fn parse_bool(name: &'static str, value: OsString) -> Result<bool> {
    let value = value.into_string().map_err(|_| Error::NotUnicode { name })?;
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(Error::InvalidBool { name, value }),
    }
}
