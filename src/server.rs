// ABOUTME: HTTP/WebSocket server bootstrap for the hub
// ABOUTME: Builds the router with tracing and CORS layers and serves it until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

use anyhow::{Context, Result};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::middleware::setup_cors;
use crate::orchestrator::SessionOrchestrator;
use crate::routes::HubRoutes;

/// The hub process: one orchestrator behind one listener
pub struct HubServer {
    config: ServerConfig,
    orchestrator: Arc<SessionOrchestrator>,
}

impl HubServer {
    /// Server with a fresh orchestrator on the wall clock
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let orchestrator = Arc::new(SessionOrchestrator::new(config.alarm.clone()));
        Self::with_orchestrator(config, orchestrator)
    }

    /// Server around an existing orchestrator
    #[must_use]
    pub const fn with_orchestrator(
        config: ServerConfig,
        orchestrator: Arc<SessionOrchestrator>,
    ) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    /// Shared orchestrator
    #[must_use]
    pub fn orchestrator(&self) -> Arc<SessionOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    /// Complete router with middleware
    pub fn router(&self) -> Router {
        HubRoutes::routes(self.orchestrator())
            .layer(TraceLayer::new_for_http())
            .layer(setup_cors(&self.config))
    }

    /// Bind the configured address and serve until Ctrl-C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or serving fails
    pub async fn run(self) -> Result<()> {
        let address = self.config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {address}"))?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, "Sleephub listening (HTTP + WebSocket at /ws)");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")?;

        info!("Sleephub server stopped");
        Ok(())
    }
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Ctrl-C received, shutting down"),
        () = terminate => info!("SIGTERM received, shutting down"),
    }
}
