//! Listeners for charge point connections and the HTTP control plane

use crate::api::{self, ApiState};
use crate::config::Config;
use crate::facade::CentralSystem;
use crate::registry::SessionRegistry;
use crate::{CsmsError, CsmsResult};
use ocpp_transport::server::OcppAcceptor;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

/// Serves charge point WebSockets and the HTTP API
pub struct CsmsServer {
    config: Config,
    csms: CentralSystem,
    acceptor: OcppAcceptor,
}

impl CsmsServer {
    pub fn new(config: Config, csms: CentralSystem) -> Self {
        let acceptor = OcppAcceptor::new(config.transport());
        Self {
            config,
            csms,
            acceptor,
        }
    }

    /// Bind both listeners and serve until one of them fails
    pub async fn run(self) -> CsmsResult<()> {
        info!("Starting OCPP CSMS server");

        let ws_listener = bind(&self.config.websocket_addr(), "WebSocket").await?;
        let http_listener = bind(&self.config.http_addr(), "HTTP API").await?;

        let ws_server = serve_websocket(ws_listener, self.acceptor.clone(), self.csms.registry().clone());
        let http_server = serve_http(
            http_listener,
            ApiState::new(self.csms.clone(), self.config.auth.api_key.clone()),
        );

        tokio::select! {
            result = ws_server => {
                error!("WebSocket server exited: {:?}", result);
                result
            }
            result = http_server => {
                error!("HTTP server exited: {:?}", result);
                result
            }
        }
    }
}

async fn bind(addr: &str, what: &str) -> CsmsResult<TcpListener> {
    info!("Starting {} server on {}", what, addr);
    TcpListener::bind(addr).await.map_err(|e| CsmsError::Io {
        message: format!("Failed to bind {} server on {}: {}", what, addr, e),
    })
}

/// Accept charge point connections and register each one
pub async fn serve_websocket(
    listener: TcpListener,
    acceptor: OcppAcceptor,
    registry: SessionRegistry,
) -> CsmsResult<()> {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                continue;
            }
        };
        debug!("TCP connection from {}", addr);
        tokio::spawn(handle_connection(stream, addr, acceptor.clone(), registry.clone()));
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    acceptor: OcppAcceptor,
    registry: SessionRegistry,
) {
    let connection = match acceptor.accept(stream).await {
        Ok(connection) => connection,
        Err(e) => {
            warn!("Handshake with {} failed: {}", addr, e);
            return;
        }
    };
    info!("Charger {} connected from {}", connection.charger_id, addr);
    registry
        .register(
            &connection.charger_id,
            connection.reader,
            Arc::new(connection.writer),
            connection.subprotocol,
        )
        .await;
}

/// Serve the control plane on a bound listener
pub async fn serve_http(listener: TcpListener, state: ApiState) -> CsmsResult<()> {
    let app = api::create_app(state);
    axum::serve(listener, app.into_make_service())
        .await
        .map_err(|e| CsmsError::Internal {
            message: format!("HTTP server error: {}", e),
        })
}
