//! # OCPP 1.6-J Central System
//!
//! Accepts charge point WebSocket connections, answers the calls they send
//! and lets operators issue remote operations against any connected charger.
//!
//! ## Layout
//!
//! - [`pending`]: outstanding outbound calls keyed by unique id
//! - [`rpc`]: per-connection engine correlating calls with their replies
//! - [`router`]: action name to handler dispatch for inbound calls
//! - [`handlers`]: built-in core profile handlers
//! - [`registry`]: charger id to live session directory
//! - [`facade`]: typed remote operations addressed by charger id
//! - [`api`] and [`server`]: HTTP control plane and listeners

pub mod api;
pub mod config;
pub mod error;
pub mod facade;
pub mod handlers;
pub mod pending;
pub mod registry;
pub mod router;
pub mod rpc;
pub mod server;
pub mod session;

pub use config::Config;
pub use error::*;
pub use facade::CentralSystem;

use chrono::{DateTime, Utc};
use handlers::CoreHandlers;
use registry::SessionRegistry;
use rpc::{reason, CallDefaults};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Central system process: configuration, session registry and listeners
pub struct Csms {
    config: Config,
    csms: CentralSystem,
    started_at: DateTime<Utc>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Csms {
    pub fn new(config: Config) -> CsmsResult<Self> {
        config::validate_config(&config).map_err(|message| CsmsError::Configuration { message })?;
        info!("Initializing OCPP CSMS");

        let router = Arc::new(CoreHandlers::from_config(&config)).into_router();
        let registry = SessionRegistry::new(
            Arc::new(router),
            CallDefaults {
                timeout: config.ocpp.call_timeout(),
            },
        );

        Ok(Self {
            config,
            csms: CentralSystem::new(registry),
            started_at: Utc::now(),
            server_handle: None,
        })
    }

    /// Start the listeners in the background
    pub fn start(&mut self) -> CsmsResult<()> {
        if self.server_handle.is_some() {
            return Err(CsmsError::Internal {
                message: "CSMS already started".to_string(),
            });
        }
        info!(
            "Starting OCPP CSMS (ws {}, http {})",
            self.config.websocket_addr(),
            self.config.http_addr()
        );

        let server = server::CsmsServer::new(self.config.clone(), self.csms.clone());
        self.server_handle = Some(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("CSMS server error: {}", e);
            }
        }));
        Ok(())
    }

    /// Stop the listeners and close every session
    pub async fn stop(&mut self) -> CsmsResult<()> {
        info!("Stopping OCPP CSMS");

        if let Some(handle) = self.server_handle.take() {
            handle.abort();
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!("Error stopping server: {}", e);
                }
            }
        }

        let closed = self.csms.registry().close_all(reason::SHUTDOWN).await;
        info!("CSMS stopped, {} sessions closed", closed);
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn central_system(&self) -> &CentralSystem {
        &self.csms
    }

    pub fn registry(&self) -> &SessionRegistry {
        self.csms.registry()
    }

    pub fn stats(&self) -> CsmsStats {
        let sessions = self.registry().sessions();
        CsmsStats {
            connected_chargers: sessions.len(),
            pending_calls: sessions.iter().map(|s| s.engine().pending_count()).sum(),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }
}

/// CSMS statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsmsStats {
    pub connected_chargers: usize,
    pub pending_calls: usize,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

/// Utility functions
pub mod utils {
    use super::*;

    /// Initialize tracing; `RUST_LOG` overrides `level`
    pub fn init_tracing(level: &str) -> CsmsResult<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    format!("ocpp_csms={},ocpp_transport={},tower_http={}", level, level, level).into()
                }),
            )
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| CsmsError::Internal {
                message: format!("Failed to initialize tracing: {}", e),
            })
    }
}
