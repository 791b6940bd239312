//! OCPP-J frame codec
//!
//! `decode` turns one text message into a [`Message`], checking the array
//! structure and, for Calls of actions the CSMS handles, the payload shape.
//! `encode` is the inverse and cannot fail for a constructed frame.

use crate::utils::parse_request;
use crate::v16j::*;
use ocpp_types::{
    CallErrorCode, CallErrorMessage, CallMessage, CallResultMessage, Message, MessageType,
    OcppError, OcppResult,
};
use serde_json::Value;
use thiserror::Error;

/// A frame that could not be decoded, with whatever could be recovered from it
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct DecodeError {
    /// Frame type, when the discriminator was readable
    pub message_type: Option<MessageType>,
    /// Message id, when it was readable
    pub unique_id: Option<String>,
    pub error: OcppError,
}

impl DecodeError {
    fn bare(error: OcppError) -> Self {
        Self {
            message_type: None,
            unique_id: None,
            error,
        }
    }

    /// CallError to send back, if the frame was a Call with a readable id.
    ///
    /// Undecodable responses never get an answer.
    pub fn reply(&self) -> Option<CallErrorMessage> {
        match (self.message_type, &self.unique_id) {
            (Some(MessageType::Call), Some(id)) => {
                let (code, description) = self.error.to_call_error();
                Some(CallErrorMessage::new(id.clone(), code, description, None))
            }
            _ => None,
        }
    }
}

fn malformed(message: impl Into<String>) -> OcppError {
    OcppError::MalformedFrame {
        message: message.into(),
    }
}

/// Decode one OCPP-J text frame
pub fn decode(raw: &str) -> Result<Message, DecodeError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| DecodeError::bare(malformed(format!("invalid JSON: {}", e))))?;

    let array = match value {
        Value::Array(array) => array,
        _ => return Err(DecodeError::bare(malformed("frame is not a JSON array"))),
    };

    let message_type = array
        .first()
        .and_then(Value::as_u64)
        .ok_or_else(|| DecodeError::bare(malformed("missing message type")))
        .and_then(|t| MessageType::try_from(t).map_err(DecodeError::bare))?;

    let unique_id = match array.get(1) {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        _ => {
            return Err(DecodeError {
                message_type: Some(message_type),
                unique_id: None,
                error: malformed("message id must be a non-empty string"),
            })
        }
    };

    let fail = |error: OcppError| DecodeError {
        message_type: Some(message_type),
        unique_id: Some(unique_id.clone()),
        error,
    };

    match message_type {
        MessageType::Call => {
            if array.len() != 4 {
                return Err(fail(malformed(format!(
                    "Call must have 4 elements, got {}",
                    array.len()
                ))));
            }
            let action = array[2]
                .as_str()
                .ok_or_else(|| fail(malformed("action must be a string")))?
                .to_string();
            let payload = array[3].clone();
            if !payload.is_object() {
                return Err(fail(OcppError::InvalidPayload {
                    action,
                    message: "payload must be a JSON object".to_string(),
                }));
            }
            validate_inbound(&action, &payload).map_err(fail)?;
            Ok(Message::Call(CallMessage {
                unique_id: unique_id.clone(),
                action,
                payload,
            }))
        }
        MessageType::CallResult => {
            if array.len() != 3 {
                return Err(fail(malformed(format!(
                    "CallResult must have 3 elements, got {}",
                    array.len()
                ))));
            }
            let payload = array[2].clone();
            if !payload.is_object() {
                return Err(fail(OcppError::InvalidPayload {
                    action: "CallResult".to_string(),
                    message: "payload must be a JSON object".to_string(),
                }));
            }
            Ok(Message::CallResult(CallResultMessage {
                unique_id: unique_id.clone(),
                payload,
            }))
        }
        MessageType::CallError => {
            // Some charge points omit the details element
            if array.len() != 4 && array.len() != 5 {
                return Err(fail(malformed(format!(
                    "CallError must have 5 elements, got {}",
                    array.len()
                ))));
            }
            let missing = |field: &str| OcppError::InvalidPayload {
                action: "CallError".to_string(),
                message: format!("{} must be a string", field),
            };
            let code = array[2].as_str().ok_or_else(|| fail(missing("errorCode")))?;
            let description = array[3]
                .as_str()
                .ok_or_else(|| fail(missing("errorDescription")))?;
            let details = array.get(4).filter(|d| d.is_object()).cloned();
            Ok(Message::CallError(CallErrorMessage::new(
                unique_id.clone(),
                CallErrorCode::from_wire(code),
                description,
                details,
            )))
        }
    }
}

/// Encode a frame for the wire
pub fn encode(message: &Message) -> String {
    message.to_value().to_string()
}

/// Shape check for the payloads of actions a charge point may send.
/// Actions outside this set are left to the router.
pub fn validate_inbound(action: &str, payload: &Value) -> OcppResult<()> {
    let payload = payload.clone();
    match action {
        "Authorize" => parse_request::<AuthorizeRequest>(payload).map(drop),
        "BootNotification" => parse_request::<BootNotificationRequest>(payload).map(drop),
        "DataTransfer" => parse_request::<DataTransferRequest>(payload).map(drop),
        "FirmwareStatusNotification" => {
            parse_request::<FirmwareStatusNotificationRequest>(payload).map(drop)
        }
        "Heartbeat" => parse_request::<HeartbeatRequest>(payload).map(drop),
        "MeterValues" => parse_request::<MeterValuesRequest>(payload).map(drop),
        "StartTransaction" => parse_request::<StartTransactionRequest>(payload).map(drop),
        "StatusNotification" => parse_request::<StatusNotificationRequest>(payload).map(drop),
        "StopTransaction" => parse_request::<StopTransactionRequest>(payload).map(drop),
        _ => Ok(()),
    }
}
