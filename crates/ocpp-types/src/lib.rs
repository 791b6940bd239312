//! # OCPP Types
//!
//! Foundational types for the OCPP-J protocol engine: the three frame shapes
//! exchanged over a charge point connection, the error taxonomy shared by the
//! codec, the RPC engine and the remote operations, and the OCPP 1.6 value
//! types used inside action payloads.

pub mod common;
pub mod error;
pub mod message;
pub mod v16j;

pub use error::*;
pub use message::*;

/// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

/// WebSocket subprotocol identifier for OCPP 1.6-J
pub const OCPP16_SUBPROTOCOL: &str = "ocpp1.6";

/// Message type identifier, the first element of every OCPP-J frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Call = 2,
    CallResult = 3,
    CallError = 4,
}

impl TryFrom<u64> for MessageType {
    type Error = OcppError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(MessageType::Call),
            3 => Ok(MessageType::CallResult),
            4 => Ok(MessageType::CallError),
            _ => Err(OcppError::MalformedFrame {
                message: format!("unknown message type {}", value),
            }),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(msg_type: MessageType) -> Self {
        msg_type as u8
    }
}

/// Identifier token presented by a driver (RFID or app token)
pub type IdToken = String;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_conversion() {
        assert_eq!(MessageType::try_from(2).unwrap(), MessageType::Call);
        assert_eq!(MessageType::try_from(3).unwrap(), MessageType::CallResult);
        assert_eq!(MessageType::try_from(4).unwrap(), MessageType::CallError);
        assert!(matches!(
            MessageType::try_from(5),
            Err(OcppError::MalformedFrame { .. })
        ));

        assert_eq!(u8::from(MessageType::Call), 2);
        assert_eq!(u8::from(MessageType::CallError), 4);
    }
}
