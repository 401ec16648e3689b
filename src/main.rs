/// Entry point for the container-aware metrics service.
///
/// Serves the current swap, memory and CPU load figures as JSON on `GET /metrics`. Logging is
/// controlled through `RUST_LOG`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the listen address cannot be bound.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug METRICS_LISTEN_ADDR=127.0.0.1:9100 cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    cgroup_os_metrics::run().await
}
