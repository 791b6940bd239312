//! # OCPP Transport
//!
//! Moves OCPP-J text frames between the CSMS and a charge point. The session
//! layer only sees the two halves defined here: a [`FrameReader`] owned by the
//! session's read loop and a shared [`FrameWriter`] used by the read loop and
//! by every outbound call.
//!
//! Two implementations are provided: [`websocket`] over tokio-tungstenite, and
//! [`channel`], an in-memory pair used to drive sessions without sockets.

pub mod channel;
pub mod error;
pub mod server;
pub mod websocket;

pub use error::*;
pub use server::{AcceptedConnection, OcppAcceptor};

use ocpp_types::OCPP16_SUBPROTOCOL;
use std::sync::Arc;
use std::time::Duration;

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Maximum message size in bytes
    pub max_message_size: usize,
    /// Time allowed for the WebSocket upgrade
    pub handshake_timeout: Duration,
    /// Subprotocols the acceptor is willing to speak, in preference order
    pub sub_protocols: Vec<String>,
    /// Longest charger id accepted from the connection path
    pub max_charger_id_len: usize,
    /// Frames queued for the writer task before `write_frame` waits
    pub outbound_buffer: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_message_size: 65536, // 64KB
            handshake_timeout: Duration::from_secs(10),
            sub_protocols: vec![OCPP16_SUBPROTOCOL.to_string()],
            max_charger_id_len: 48,
            outbound_buffer: 64,
        }
    }
}

/// Inbound half of a connection
#[async_trait::async_trait]
pub trait FrameReader: Send {
    /// Next text frame, or `None` once the peer has closed the connection
    async fn read_frame(&mut self) -> TransportResult<Option<String>>;
}

/// Outbound half of a connection, shared by everything that writes to it
#[async_trait::async_trait]
pub trait FrameWriter: Send + Sync {
    /// Queue one text frame
    async fn write_frame(&self, frame: String) -> TransportResult<()>;

    /// Close the connection. Later writes fail with `ConnectionClosed`.
    async fn close(&self) -> TransportResult<()>;
}

pub type BoxedReader = Box<dyn FrameReader>;
pub type SharedWriter = Arc<dyn FrameWriter>;

/// Utility functions
pub mod utils {
    /// Charger id from the connection path: its last non-empty segment.
    ///
    /// `/CP1`, `/ocpp/CP1` and `/ocpp/CP1/` all yield `CP1`.
    pub fn extract_charge_point_id(path: &str) -> Option<&str> {
        path.split('?')
            .next()
            .unwrap_or(path)
            .split('/')
            .filter(|segment| !segment.is_empty())
            .last()
    }

    /// Select the first requested subprotocol we support.
    ///
    /// `Ok(None)` when the client requested none; `Err` with the offer when
    /// nothing in it is supported.
    pub fn select_subprotocol(
        requested: Option<&str>,
        supported: &[String],
    ) -> Result<Option<String>, String> {
        let requested = match requested {
            Some(header) if !header.trim().is_empty() => header,
            _ => return Ok(None),
        };
        requested
            .split(',')
            .map(str::trim)
            .find(|p| supported.iter().any(|s| s == p))
            .map(|p| Some(p.to_string()))
            .ok_or_else(|| requested.to_string())
    }
}
