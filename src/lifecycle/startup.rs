//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Load the recording store
//! - Bind the listener and spawn the server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, nothing is served
//! - Listener binds last (traffic only when recordings are loaded)
//! - Each server owns its statistics; nothing is process-global

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::admin::ApiHandler;
use crate::config::{validation::validate_config, ConfigError, TroxyConfig};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::recording::{LoadError, RecordingStore};

/// Errors while starting or stopping a server.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Handle to a running server.
pub struct EmbeddedServer {
    local_addr: SocketAddr,
    api: ApiHandler,
    shutdown: Shutdown,
    task: JoinHandle<Result<(), std::io::Error>>,
}

impl EmbeddedServer {
    /// Address the server is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `http://<local_addr>`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Statistics facade for this server.
    pub fn api_handler(&self) -> ApiHandler {
        self.api.clone()
    }

    /// Stop accepting connections, drain in-flight requests and wait for exit.
    pub async fn stop(self) -> Result<(), StartupError> {
        self.shutdown.trigger();
        self.task.await??;
        tracing::info!(address = %self.local_addr, "Server stopped");
        Ok(())
    }
}

/// Load recordings, bind the listener and start serving.
pub async fn start(config: TroxyConfig) -> Result<EmbeddedServer, StartupError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    let store = Arc::new(RecordingStore::load(&config.recordings.sources)?);
    if store.is_empty() {
        tracing::warn!("No recordings loaded; every request will be unmatched");
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;
    let local_addr = listener.local_addr()?;

    let server = HttpServer::new(config, store);
    let api = server.api_handler();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tracing::info!(
        address = %local_addr,
        recordings = api.recording_count(),
        "Troxy started"
    );

    Ok(EmbeddedServer {
        local_addr,
        api,
        shutdown,
        task,
    })
}

/// Entry point for embedding Troxy in tests and other programs.
pub struct TroxyEmbedded;

impl TroxyEmbedded {
    /// Serve the given recording files on `127.0.0.1:<port>` (`0` picks a free port).
    pub async fn run<I, S>(sources: I, port: u16) -> Result<EmbeddedServer, StartupError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        start(TroxyConfig::for_recordings(sources, port)).await
    }
}
