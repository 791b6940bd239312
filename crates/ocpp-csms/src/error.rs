//! Error types for CSMS startup and serving
//!
//! Protocol and RPC failures stay [`OcppError`]; this type covers what the
//! process itself can fail on.

use ocpp_transport::TransportError;
use ocpp_types::OcppError;
use thiserror::Error;

/// Main error type for CSMS operations
#[derive(Error, Debug)]
pub enum CsmsError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Transport error
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Socket bind or accept failure
    #[error("IO error: {message}")]
    Io { message: String },

    /// Operation failed at the protocol level
    #[error("OCPP error: {0}")]
    Ocpp(OcppError),

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<OcppError> for CsmsError {
    fn from(err: OcppError) -> Self {
        match err {
            OcppError::Transport { message } => CsmsError::Transport { message },
            other => CsmsError::Ocpp(other),
        }
    }
}

impl From<TransportError> for CsmsError {
    fn from(err: TransportError) -> Self {
        CsmsError::Transport {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CsmsError {
    fn from(err: std::io::Error) -> Self {
        CsmsError::Io {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CsmsError {
    fn from(err: toml::de::Error) -> Self {
        CsmsError::Configuration {
            message: err.to_string(),
        }
    }
}

/// Result type for CSMS operations
pub type CsmsResult<T> = Result<T, CsmsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ocpp_error() {
        let err = CsmsError::from(OcppError::NotConnected {
            charger_id: "CP1".to_string(),
        });
        assert!(matches!(err, CsmsError::Ocpp(OcppError::NotConnected { .. })));

        let err = CsmsError::from(OcppError::Transport {
            message: "reset".to_string(),
        });
        assert!(matches!(err, CsmsError::Transport { .. }));
    }

    #[test]
    fn test_from_transport_error() {
        let err = CsmsError::from(TransportError::Timeout { timeout_secs: 10 });
        assert!(err.to_string().contains("10 seconds"));
    }

    #[test]
    fn test_from_toml_error() {
        let err = toml::from_str::<toml::Value>("[server").unwrap_err();
        assert!(matches!(
            CsmsError::from(err),
            CsmsError::Configuration { .. }
        ));
    }
}
