//! Transport layer error types

use ocpp_types::OcppError;
use thiserror::Error;

/// Transport layer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The connection is gone; nothing more can be written
    #[error("Connection closed: {reason}")]
    ConnectionClosed { reason: String },

    /// WebSocket protocol error
    #[error("WebSocket protocol error: {message}")]
    ProtocolError { message: String },

    /// Message too large
    #[error("Message too large: {size} bytes exceeds limit of {limit} bytes")]
    MessageTooLarge { size: usize, limit: usize },

    /// Handshake did not complete in time
    #[error("Handshake timeout after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Upgrade request refused or failed
    #[error("WebSocket handshake error: {message}")]
    HandshakeError { message: String },

    /// IO error
    #[error("IO error: {message}")]
    IoError { message: String },

    /// Internal error
    #[error("Internal transport error: {message}")]
    Internal { message: String },
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<tungstenite::Error> for TransportError {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                TransportError::ConnectionClosed {
                    reason: "WebSocket closed".to_string(),
                }
            }
            tungstenite::Error::Protocol(msg) => TransportError::ProtocolError {
                message: msg.to_string(),
            },
            tungstenite::Error::Capacity(msg) => TransportError::ProtocolError {
                message: msg.to_string(),
            },
            tungstenite::Error::Io(io_err) => TransportError::IoError {
                message: io_err.to_string(),
            },
            _ => TransportError::Internal {
                message: err.to_string(),
            },
        }
    }
}

impl From<TransportError> for OcppError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ConnectionClosed { reason } => OcppError::ConnectionClosed { reason },
            other => OcppError::Transport {
                message: other.to_string(),
            },
        }
    }
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let error = TransportError::MessageTooLarge {
            size: 100000,
            limit: 65536,
        };
        let message = error.to_string();
        assert!(message.contains("100000"));
        assert!(message.contains("65536"));
    }

    #[test]
    fn test_error_conversion_from_io() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "Connection reset");
        match TransportError::from(io_error) {
            TransportError::IoError { message } => assert!(message.contains("reset")),
            other => panic!("Expected IoError, got {:?}", other),
        }
    }

    #[test]
    fn test_error_conversion_from_tungstenite() {
        let transport_error = TransportError::from(tungstenite::Error::ConnectionClosed);
        assert!(matches!(
            transport_error,
            TransportError::ConnectionClosed { .. }
        ));
    }

    #[test]
    fn test_closed_maps_to_connection_closed() {
        let err: OcppError = TransportError::ConnectionClosed {
            reason: "peer went away".to_string(),
        }
        .into();
        assert_eq!(
            err,
            OcppError::ConnectionClosed {
                reason: "peer went away".to_string()
            }
        );

        let err: OcppError = TransportError::IoError {
            message: "broken pipe".to_string(),
        }
        .into();
        assert!(matches!(err, OcppError::Transport { .. }));
    }
}
