//! Charge point sessions

use crate::rpc::{RpcEngine, SessionState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// What a charge point reported about itself
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargerInfo {
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,
    pub booted_at: Option<DateTime<Utc>>,
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl ChargerInfo {
    pub fn update_heartbeat(&mut self) {
        self.last_heartbeat = Some(Utc::now());
    }
}

/// One connected charge point
pub struct ChargeSession {
    id: Uuid,
    engine: Arc<RpcEngine>,
    connected_at: DateTime<Utc>,
    subprotocol: Option<String>,
}

/// Shared handle to a registered session
pub type SessionHandle = Arc<ChargeSession>;

impl ChargeSession {
    pub fn new(engine: Arc<RpcEngine>, subprotocol: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            engine,
            connected_at: Utc::now(),
            subprotocol,
        }
    }

    /// Distinguishes this connection from earlier ones of the same charger
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn charger_id(&self) -> &str {
        self.engine.charger_id()
    }

    pub fn engine(&self) -> &Arc<RpcEngine> {
        &self.engine
    }

    pub fn state(&self) -> SessionState {
        self.engine.state()
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    pub fn subprotocol(&self) -> Option<&str> {
        self.subprotocol.as_deref()
    }

    pub fn info(&self) -> ChargerInfo {
        self.engine.context().info()
    }

    pub async fn close(&self, reason: &str) -> bool {
        self.engine.close(reason).await
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            charger_id: self.charger_id().to_string(),
            session_id: self.id,
            state: self.state(),
            connected_at: self.connected_at,
            subprotocol: self.subprotocol.clone(),
            info: self.info(),
            pending_calls: self.engine.pending_count(),
        }
    }
}

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub charger_id: String,
    pub session_id: Uuid,
    pub state: SessionState,
    pub connected_at: DateTime<Utc>,
    pub subprotocol: Option<String>,
    #[serde(flatten)]
    pub info: ChargerInfo,
    pub pending_calls: usize,
}
