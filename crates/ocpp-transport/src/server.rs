//! WebSocket acceptor for charge point connections
//!
//! Performs the HTTP upgrade, takes the charger id from the request path and
//! negotiates the OCPP subprotocol, then hands back the split transport.

use crate::websocket::{WebSocketTransport, WsReader, WsWriter};
use crate::{utils, TransportConfig, TransportError, TransportResult};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async_with_config;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{header, HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{debug, info, warn};

/// Outcome of a valid upgrade request
#[derive(Debug, Clone, PartialEq)]
pub struct Handshake {
    pub charger_id: String,
    pub subprotocol: Option<String>,
}

/// A charge point connection ready to be registered
pub struct AcceptedConnection<S> {
    pub charger_id: String,
    pub subprotocol: Option<String>,
    pub reader: WsReader<S>,
    pub writer: WsWriter,
}

/// Accepts charge point WebSocket connections
#[derive(Debug, Clone, Default)]
pub struct OcppAcceptor {
    config: TransportConfig,
}

impl OcppAcceptor {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Run the upgrade handshake on a freshly accepted stream
    pub async fn accept<S>(&self, stream: S) -> TransportResult<AcceptedConnection<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let mut handshake: Option<Handshake> = None;
        let callback = |request: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
            let accepted = validate_handshake_request(request, &self.config)?;
            if let Some(protocol) = &accepted.subprotocol {
                let value = HeaderValue::from_str(protocol)
                    .map_err(|_| reject(StatusCode::INTERNAL_SERVER_ERROR, "bad subprotocol"))?;
                response
                    .headers_mut()
                    .insert(header::SEC_WEBSOCKET_PROTOCOL, value);
            }
            handshake = Some(accepted);
            Ok(response)
        };

        let ws_config = WebSocketConfig {
            max_message_size: Some(self.config.max_message_size),
            max_frame_size: Some(self.config.max_message_size),
            ..Default::default()
        };

        let stream = timeout(
            self.config.handshake_timeout,
            accept_hdr_async_with_config(stream, callback, Some(ws_config)),
        )
        .await
        .map_err(|_| TransportError::Timeout {
            timeout_secs: self.config.handshake_timeout.as_secs(),
        })?
        .map_err(|e| TransportError::HandshakeError {
            message: e.to_string(),
        })?;

        let Handshake {
            charger_id,
            subprotocol,
        } = handshake.ok_or_else(|| TransportError::HandshakeError {
            message: "handshake completed without a charger id".to_string(),
        })?;

        info!(
            "Accepted connection for {} (subprotocol {:?})",
            charger_id, subprotocol
        );
        let (reader, writer) = WebSocketTransport::split(stream, &self.config);
        Ok(AcceptedConnection {
            charger_id,
            subprotocol,
            reader,
            writer,
        })
    }
}

fn reject(status: StatusCode, reason: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(reason.to_string()));
    *response.status_mut() = status;
    response
}

/// Validate WebSocket handshake request
pub fn validate_handshake_request(
    request: &Request,
    config: &TransportConfig,
) -> Result<Handshake, ErrorResponse> {
    let path = request.uri().path();
    debug!("Upgrade request for {}", path);

    let charger_id = match utils::extract_charge_point_id(path) {
        Some(id) if id.len() <= config.max_charger_id_len => id.to_string(),
        Some(id) => {
            warn!("Rejecting connection: charger id of {} chars", id.len());
            return Err(reject(StatusCode::BAD_REQUEST, "charger id too long"));
        }
        None => {
            warn!("Rejecting connection without charger id: {}", path);
            return Err(reject(StatusCode::BAD_REQUEST, "missing charger id"));
        }
    };

    let requested = request
        .headers()
        .get(header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|h| h.to_str().ok());
    let subprotocol = utils::select_subprotocol(requested, &config.sub_protocols).map_err(|offer| {
        warn!("Rejecting {}: unsupported subprotocols {}", charger_id, offer);
        reject(StatusCode::BAD_REQUEST, "unsupported subprotocol")
    })?;

    Ok(Handshake {
        charger_id,
        subprotocol,
    })
}
