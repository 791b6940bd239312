//! # OCPP Messages
//!
//! Typed OCPP 1.6-J payloads for every action the CSMS receives or sends,
//! the [`OcppAction`] trait tying a request to its action name and response,
//! and the frame [`codec`].

pub mod codec;
pub mod v16j;
pub mod validation;

pub use ocpp_types::{CallErrorMessage, CallMessage, CallResultMessage, Message, MessageType};
use ocpp_types::{OcppError, OcppResult};

/// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A request payload of one OCPP action
pub trait OcppAction: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The action name carried in the Call frame
    const ACTION_NAME: &'static str;
    /// Payload of the matching CallResult
    type Response: Serialize + DeserializeOwned + Send + 'static;

    /// Check field constraints that the JSON shape alone does not express
    fn validate(&self) -> OcppResult<()> {
        Ok(())
    }
}

/// Utilities for working with OCPP payloads
pub mod utils {
    use super::*;
    use serde_json::Value;

    /// Build a Call frame for a typed request
    pub fn create_call<T: OcppAction>(unique_id: impl Into<String>, action: &T) -> OcppResult<CallMessage> {
        CallMessage::new(unique_id, T::ACTION_NAME, action)
    }

    /// Decode and validate a request payload for action `T`.
    ///
    /// Shape and constraint failures are both reported as `InvalidPayload`.
    pub fn parse_request<T: OcppAction>(payload: Value) -> OcppResult<T> {
        let request: T = serde_json::from_value(payload).map_err(|e| OcppError::InvalidPayload {
            action: T::ACTION_NAME.to_string(),
            message: e.to_string(),
        })?;
        request.validate().map_err(|e| match e {
            OcppError::InvalidPayload { .. } => e,
            other => OcppError::InvalidPayload {
                action: T::ACTION_NAME.to_string(),
                message: other.to_string(),
            },
        })?;
        Ok(request)
    }

    /// Decode the CallResult payload answering a `T` request
    pub fn parse_response<T: OcppAction>(payload: Value) -> OcppResult<T::Response> {
        serde_json::from_value(payload).map_err(|e| OcppError::InvalidPayload {
            action: T::ACTION_NAME.to_string(),
            message: format!("unexpected response: {}", e),
        })
    }
}
