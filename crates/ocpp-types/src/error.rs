//! Error types for the OCPP protocol engine

use std::time::Duration;
use thiserror::Error;

/// Errors raised while decoding frames, dispatching actions or waiting on
/// outbound calls
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OcppError {
    /// Inbound text is not a well-formed OCPP-J frame
    #[error("Malformed frame: {message}")]
    MalformedFrame { message: String },

    /// Payload does not match the shape expected for the action
    #[error("Invalid payload for {action}: {message}")]
    InvalidPayload { action: String, message: String },

    /// No handler is registered for the action
    #[error("Action not implemented: {action}")]
    NotImplemented { action: String },

    /// The action is known but the receiver refuses it
    #[error("Feature not supported: {feature}")]
    NotSupported { feature: String },

    /// A handler failed while processing a request
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Any other handler failure
    #[error("Generic error: {message}")]
    Generic { message: String },

    /// The targeted charger has no active session
    #[error("Charger {charger_id} is not connected")]
    NotConnected { charger_id: String },

    /// No response arrived before the call deadline
    #[error("{action} timed out after {timeout:?}")]
    Timeout { action: String, timeout: Duration },

    /// The session went away while the call was outstanding
    #[error("Connection closed: {reason}")]
    ConnectionClosed { reason: String },

    /// The charge point answered with a CallError
    #[error("Remote error {}: {description}", code.as_str())]
    RemoteError {
        code: CallErrorCode,
        description: String,
        details: serde_json::Value,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {message}")]
    Json { message: String },

    /// Transport error
    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl OcppError {
    /// CallError code and description sent back to a charge point when this
    /// error ends the processing of one of its requests
    pub fn to_call_error(&self) -> (CallErrorCode, String) {
        let code = match self {
            OcppError::MalformedFrame { .. } => CallErrorCode::FormationViolation,
            OcppError::InvalidPayload { .. } | OcppError::Json { .. } => {
                CallErrorCode::FormationViolation
            }
            OcppError::NotImplemented { .. } => CallErrorCode::NotImplemented,
            OcppError::NotSupported { .. } => CallErrorCode::NotSupported,
            OcppError::Internal { .. } => CallErrorCode::InternalError,
            _ => CallErrorCode::GenericError,
        };
        (code, self.to_string())
    }
}

impl From<serde_json::Error> for OcppError {
    fn from(err: serde_json::Error) -> Self {
        OcppError::Json {
            message: err.to_string(),
        }
    }
}

/// OCPP-J CallError codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CallErrorCode {
    /// Requested Action is not known by receiver
    NotImplemented,
    /// Requested Action is recognized but not supported by the receiver
    NotSupported,
    /// An internal error occurred and the receiver was not able to process the requested Action
    InternalError,
    /// Payload for Action is incomplete
    ProtocolError,
    /// A security issue prevented the receiver from completing the Action
    SecurityError,
    /// Payload for Action is syntactically incorrect
    FormationViolation,
    /// At least one field contains an invalid value
    PropertyConstraintViolation,
    /// At least one field violates occurrence constraints
    OccurrenceConstraintViolation,
    /// At least one field violates data type constraints
    TypeConstraintViolation,
    /// Any other error not covered by the above
    GenericError,
}

impl CallErrorCode {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CallErrorCode::NotImplemented => "NotImplemented",
            CallErrorCode::NotSupported => "NotSupported",
            CallErrorCode::InternalError => "InternalError",
            CallErrorCode::ProtocolError => "ProtocolError",
            CallErrorCode::SecurityError => "SecurityError",
            CallErrorCode::FormationViolation => "FormationViolation",
            CallErrorCode::PropertyConstraintViolation => "PropertyConstraintViolation",
            CallErrorCode::OccurrenceConstraintViolation => "OccurrenceConstraintViolation",
            CallErrorCode::TypeConstraintViolation => "TypeConstraintViolation",
            CallErrorCode::GenericError => "GenericError",
        }
    }

    /// Parse a wire code. Codes outside the OCPP 1.6 set become `GenericError`
    /// so a vendor-specific code still resolves the call it answers.
    pub fn from_wire(code: &str) -> Self {
        match code {
            "NotImplemented" => CallErrorCode::NotImplemented,
            "NotSupported" => CallErrorCode::NotSupported,
            "InternalError" => CallErrorCode::InternalError,
            "ProtocolError" => CallErrorCode::ProtocolError,
            "SecurityError" => CallErrorCode::SecurityError,
            "FormationViolation" | "FormatViolation" => CallErrorCode::FormationViolation,
            "PropertyConstraintViolation" => CallErrorCode::PropertyConstraintViolation,
            "OccurrenceConstraintViolation" | "OccurenceConstraintViolation" => {
                CallErrorCode::OccurrenceConstraintViolation
            }
            "TypeConstraintViolation" => CallErrorCode::TypeConstraintViolation,
            _ => CallErrorCode::GenericError,
        }
    }
}

impl std::fmt::Display for CallErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type alias for OCPP operations
pub type OcppResult<T> = Result<T, OcppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_error_code_wire_names() {
        assert_eq!(CallErrorCode::NotImplemented.as_str(), "NotImplemented");
        assert_eq!(
            CallErrorCode::from_wire("PropertyConstraintViolation"),
            CallErrorCode::PropertyConstraintViolation
        );
        // OCPP 1.6 errata spelling
        assert_eq!(
            CallErrorCode::from_wire("OccurenceConstraintViolation"),
            CallErrorCode::OccurrenceConstraintViolation
        );
        assert_eq!(
            CallErrorCode::from_wire("VendorSpecificFailure"),
            CallErrorCode::GenericError
        );
    }

    #[test]
    fn test_call_error_code_serialization() {
        let json = serde_json::to_string(&CallErrorCode::NotSupported).unwrap();
        assert_eq!(json, "\"NotSupported\"");
    }

    #[test]
    fn test_to_call_error_mapping() {
        let (code, _) = OcppError::NotImplemented {
            action: "Foo".to_string(),
        }
        .to_call_error();
        assert_eq!(code, CallErrorCode::NotImplemented);

        let (code, description) = OcppError::Internal {
            message: "boom".to_string(),
        }
        .to_call_error();
        assert_eq!(code, CallErrorCode::InternalError);
        assert!(description.contains("boom"));

        let (code, _) = OcppError::InvalidPayload {
            action: "Heartbeat".to_string(),
            message: "expected object".to_string(),
        }
        .to_call_error();
        assert_eq!(code, CallErrorCode::FormationViolation);

        let (code, _) = OcppError::Generic {
            message: "rejected".to_string(),
        }
        .to_call_error();
        assert_eq!(code, CallErrorCode::GenericError);
    }

    #[test]
    fn test_remote_error_display() {
        let error = OcppError::RemoteError {
            code: CallErrorCode::NotSupported,
            description: "no reservations".to_string(),
            details: serde_json::json!({}),
        };
        assert_eq!(
            error.to_string(),
            "Remote error NotSupported: no reservations"
        );
    }

    #[test]
    fn test_ocpp_error_from_serde_json() {
        let json_error = serde_json::from_str::<i32>("invalid json").unwrap_err();
        match OcppError::from(json_error) {
            OcppError::Json { message } => assert!(!message.is_empty()),
            other => panic!("Expected Json error, got {:?}", other),
        }
    }
}
