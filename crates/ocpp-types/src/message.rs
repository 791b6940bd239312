//! Frame types for the OCPP-J protocol
//!
//! A frame is one JSON array on the wire:
//!
//! - Call: `[2, uniqueId, action, payload]`
//! - CallResult: `[3, uniqueId, payload]`
//! - CallError: `[4, uniqueId, errorCode, errorDescription, errorDetails]`
//!
//! The unique id is opaque and only meaningful inside the connection that
//! produced it.

use crate::{CallErrorCode, MessageType, OcppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One OCPP-J frame
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Request
    Call(CallMessage),
    /// Successful response
    CallResult(CallResultMessage),
    /// Error response
    CallError(CallErrorMessage),
}

impl Message {
    /// Get the message type
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Call(_) => MessageType::Call,
            Message::CallResult(_) => MessageType::CallResult,
            Message::CallError(_) => MessageType::CallError,
        }
    }

    /// Get the unique message ID
    pub fn unique_id(&self) -> &str {
        match self {
            Message::Call(msg) => &msg.unique_id,
            Message::CallResult(msg) => &msg.unique_id,
            Message::CallError(msg) => &msg.unique_id,
        }
    }

    /// Wire representation as a JSON array
    pub fn to_value(&self) -> Value {
        match self {
            Message::Call(msg) => Value::Array(vec![
                Value::from(u8::from(MessageType::Call)),
                Value::String(msg.unique_id.clone()),
                Value::String(msg.action.clone()),
                msg.payload.clone(),
            ]),
            Message::CallResult(msg) => Value::Array(vec![
                Value::from(u8::from(MessageType::CallResult)),
                Value::String(msg.unique_id.clone()),
                msg.payload.clone(),
            ]),
            Message::CallError(msg) => Value::Array(vec![
                Value::from(u8::from(MessageType::CallError)),
                Value::String(msg.unique_id.clone()),
                Value::String(msg.error_code.as_str().to_string()),
                Value::String(msg.error_description.clone()),
                msg.error_details.clone(),
            ]),
        }
    }
}

impl From<CallMessage> for Message {
    fn from(msg: CallMessage) -> Self {
        Message::Call(msg)
    }
}

impl From<CallResultMessage> for Message {
    fn from(msg: CallResultMessage) -> Self {
        Message::CallResult(msg)
    }
}

impl From<CallErrorMessage> for Message {
    fn from(msg: CallErrorMessage) -> Self {
        Message::CallError(msg)
    }
}

/// Call frame (request)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallMessage {
    /// Unique message identifier chosen by the sender
    pub unique_id: String,
    /// Action name (e.g., "Authorize", "StartTransaction")
    pub action: String,
    /// Request payload
    pub payload: Value,
}

impl CallMessage {
    /// Create a new Call frame
    pub fn new<T>(unique_id: impl Into<String>, action: impl Into<String>, payload: T) -> OcppResult<Self>
    where
        T: Serialize,
    {
        Ok(CallMessage {
            unique_id: unique_id.into(),
            action: action.into(),
            payload: serde_json::to_value(payload)?,
        })
    }
}

/// CallResult frame (successful response)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResultMessage {
    /// Unique message identifier (same as corresponding Call)
    pub unique_id: String,
    /// Response payload
    pub payload: Value,
}

impl CallResultMessage {
    /// Create a new CallResult frame
    pub fn new<T>(unique_id: impl Into<String>, payload: T) -> OcppResult<Self>
    where
        T: Serialize,
    {
        Ok(CallResultMessage {
            unique_id: unique_id.into(),
            payload: serde_json::to_value(payload)?,
        })
    }
}

/// CallError frame (error response)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallErrorMessage {
    /// Unique message identifier (same as corresponding Call)
    pub unique_id: String,
    /// Error code
    pub error_code: CallErrorCode,
    /// Human-readable error description
    pub error_description: String,
    /// Additional error details
    pub error_details: Value,
}

impl CallErrorMessage {
    /// Create a new CallError frame; missing details become `{}`
    pub fn new(
        unique_id: impl Into<String>,
        error_code: CallErrorCode,
        error_description: impl Into<String>,
        error_details: Option<Value>,
    ) -> Self {
        CallErrorMessage {
            unique_id: unique_id.into(),
            error_code,
            error_description: error_description.into(),
            error_details: error_details.unwrap_or(Value::Object(Default::default())),
        }
    }
}
