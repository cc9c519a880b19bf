use crate::backend::ApiClient;
use crate::config::Config;
use crate::errors::{ConsoleError, ConsoleErrorType, Result};
use crate::routes::{self, Sessions, SharedBackend};
use crate::session::SessionManager;

use std::sync::{Arc, Mutex};
use tokio::signal;

pub struct Server {
    sessions: Sessions,
    backend: SharedBackend,
    port: u16,
}

impl Server {
    pub async fn start(&self) -> Result<()> {
        let routes = routes::routes(self.sessions.clone(), self.backend.clone());
        let (addr, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(([127, 0, 0, 1], self.port), async {
                if let Err(e) = signal::ctrl_c().await {
                    tracing::error!("Could not listen for shutdown signal: {}", e);
                }
            })
            .map_err(|e| {
                ConsoleError::new(
                    ConsoleErrorType::InternalError,
                    format!("Could not bind port {}: {}", self.port, e),
                )
            })?;
        tracing::info!("Workspace server listening on {}", addr);
        server.await;
        tracing::info!("Shutting down server...");
        Ok(())
    }
}

pub fn get_server(config: &Config) -> Server {
    tracing::info!("Using backend at {}", config.api_base_url);
    Server {
        sessions: Arc::new(Mutex::new(SessionManager::new())),
        backend: Arc::new(ApiClient::new(config)),
        port: config.port,
    }
}
