// src/server/mod.rs

//! HTTP control surface.
//!
//! | Method | Path                                  | Operation      |
//! |--------|---------------------------------------|----------------|
//! | POST   | `/api/experiments/{job_id}/run`       | start          |
//! | GET    | `/api/experiments/{job_id}/status`    | status         |
//! | GET    | `/api/experiments/{job_id}/logs`      | log tail (SSE) |
//! | GET    | `/api/experiments/results`            | list all       |
//! | GET    | `/api/experiments/cost-estimate`      | cost table     |
//! | GET    | `/health`                             | liveness       |

pub mod error;
pub mod routes;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::engine::Orchestrator;

pub use error::ApiError;
pub use routes::router;

pub struct HttpServer {
    orchestrator: Arc<Orchestrator>,
    listen_addr: SocketAddr,
    allowed_origins: Vec<HeaderValue>,
}

impl HttpServer {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        listen_addr: SocketAddr,
        allowed_origins: &[String],
    ) -> Self {
        let allowed_origins = allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(origin = %origin, error = %e, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        Self {
            orchestrator,
            listen_addr,
            allowed_origins,
        }
    }

    fn app(&self) -> axum::Router {
        let cors = CorsLayer::new()
            .allow_origin(self.allowed_origins.clone())
            .allow_methods(Any)
            .allow_headers(Any);

        router(Arc::clone(&self.orchestrator)).layer(cors)
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let listener = TcpListener::bind(self.listen_addr)
            .await
            .with_context(|| format!("binding HTTP listener on {}", self.listen_addr))?;

        info!(addr = %self.listen_addr, "jobtower listening");

        axum::serve(listener, self.app())
            .with_graceful_shutdown(shutdown)
            .await
            .context("serving HTTP")?;

        info!("http server stopped");
        Ok(())
    }
}
