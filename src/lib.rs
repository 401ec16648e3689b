//! Container-aware operating system metrics.
//!
//! Reports swap, physical memory and CPU load as the process actually experiences them. When
//! the process runs inside a cgroup v2 container, container limits and usage counters take
//! precedence over host-wide values; anything the container view cannot answer falls back to
//! the host.
//!
//! The layers, bottom up:
//! - [`host`] and [`cgroup`] read raw counters from `/proc`, `/sys` and the cgroup filesystem.
//! - [`reconciler`] combines both views into effective values.
//! - [`metrics`] exposes them with `-1` sentinels for unavailable values.
//! - [`api`] serves a JSON snapshot over HTTP.
use std::sync::Arc;

use cgroup::CgroupV2Metrics;
use config::Config;
use host::ProcfsHostProbe;
use metrics::{LinuxMetrics, OperatingSystemMetrics};

pub mod api;
pub mod cgroup;
pub mod config;
pub mod container;
pub mod error;
pub mod fsutil;
pub mod host;
pub mod metrics;
pub mod mountinfo;
pub mod reconciler;

/// Builds the metrics facade for the host described by `config`.
///
/// Container support is detected once here. A process outside any cgroup v2 hierarchy, or one
/// whose cgroup directory is not visible, gets host-only metrics. Every metric is read once
/// before returning, which starts the CPU load windows.
pub fn build_metrics(config: &Config) -> LinuxMetrics {
    let host = ProcfsHostProbe::new(config.proc_root.clone(), config.sys_root.clone());

    let container = if config.use_container_support {
        match CgroupV2Metrics::detect(&config.proc_root) {
            Ok(container) => Some(container),
            Err(err) => {
                log::info!("No container limits detected, using host metrics: {err}");
                None
            }
        }
    } else {
        log::info!("Container support disabled");
        None
    };

    let metrics = OperatingSystemMetrics::new(host, container);
    // Opens the load measurement windows, so the first request sees a recent load.
    let initial = metrics.snapshot();
    log::debug!(
        "Initial snapshot: {}",
        serde_json::to_string(&initial).unwrap_or_default()
    );
    metrics
}

/// Runs the metrics service.
///
/// Reads the configuration from the environment, detects container support and serves
/// `GET /metrics` until the server fails.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the listen address cannot be bound.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let metrics = Arc::new(build_metrics(&config));

    api::APIServer::new(metrics)
        .listen(config.listen_addr.as_str())
        .await?;
    Ok(())
}
