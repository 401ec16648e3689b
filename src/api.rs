use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::ToSocketAddrs;

use crate::container::ContainerMetrics;
use crate::host::HostProbe;
use crate::metrics::OperatingSystemMetrics;

async fn metrics_snapshot<H, C>(State(metrics): State<Arc<OperatingSystemMetrics<H, C>>>) -> Response
where
    H: HostProbe + 'static,
    C: ContainerMetrics + 'static,
{
    // Collaborators do blocking file reads.
    match tokio::task::spawn_blocking(move || metrics.snapshot()).await {
        Ok(snapshot) => (axum::http::StatusCode::OK, Json(snapshot)).into_response(),
        Err(err) => {
            log::error!("Failed to collect metrics: {}", err);
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "failed to collect metrics",
            )
                .into_response()
        }
    }
}

pub struct APIServer {
    router: axum::Router,
}

impl APIServer {
    pub fn new<H, C>(metrics: Arc<OperatingSystemMetrics<H, C>>) -> Self
    where
        H: HostProbe + 'static,
        C: ContainerMetrics + 'static,
    {
        let router = axum::Router::new()
            .route("/metrics", get(metrics_snapshot::<H, C>))
            .with_state(metrics);
        Self { router }
    }

    pub fn into_router(self) -> axum::Router {
        self.router
    }

    /// Serves the API until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the address cannot be bound or serving fails.
    pub async fn listen(self, addr: impl ToSocketAddrs) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        log::info!("Serving metrics on {}", listener.local_addr()?);
        axum::serve(listener, self.router.into_make_service()).await
    }
}
