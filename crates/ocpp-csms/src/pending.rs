//! Outstanding outbound calls of one session
//!
//! Every call waiting for a CallResult/CallError has an entry keyed by its
//! message id. An entry leaves the table exactly once: through [`PendingCalls::resolve`]
//! when the answer arrives, through [`PendingCalls::remove`] when the caller
//! gives up, or through [`PendingCalls::fail_all`] when the session closes.

use chrono::{DateTime, Utc};
use ocpp_types::{OcppError, OcppResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// Outcome delivered to the waiting caller
pub type CallOutcome = OcppResult<Value>;

/// One outbound call awaiting its response
#[derive(Debug)]
pub struct PendingCall {
    pub action: String,
    pub submitted_at: DateTime<Utc>,
    tx: oneshot::Sender<CallOutcome>,
}

#[derive(Debug, Default)]
struct Table {
    calls: HashMap<String, PendingCall>,
    closed: Option<String>,
}

/// Message-id keyed table of outstanding calls
#[derive(Debug, Default)]
pub struct PendingCalls {
    next_id: AtomicU64,
    table: Mutex<Table>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        // Entries stay consistent even if a holder panicked
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a message id and park a call under it.
    ///
    /// Fails with `ConnectionClosed` once the table has been failed, so no
    /// call can be left behind by a session that is already gone.
    pub fn register(&self, action: &str) -> OcppResult<(String, oneshot::Receiver<CallOutcome>)> {
        let mut table = self.lock();
        if let Some(reason) = &table.closed {
            return Err(OcppError::ConnectionClosed {
                reason: reason.clone(),
            });
        }

        let mut id = self.next_id();
        while table.calls.contains_key(&id) {
            id = self.next_id();
        }

        let (tx, rx) = oneshot::channel();
        table.calls.insert(
            id.clone(),
            PendingCall {
                action: action.to_string(),
                submitted_at: Utc::now(),
                tx,
            },
        );
        Ok((id, rx))
    }

    fn next_id(&self) -> String {
        (self.next_id.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }

    /// Complete the call registered under `unique_id`.
    ///
    /// Returns the action name, or `None` when no such call is outstanding
    /// (already answered, timed out, or never sent).
    pub fn resolve(&self, unique_id: &str, outcome: CallOutcome) -> Option<String> {
        let call = self.lock().calls.remove(unique_id)?;
        // The caller may have been cancelled; the entry is gone either way
        let _ = call.tx.send(outcome);
        Some(call.action)
    }

    /// Drop a call without completing it
    pub fn remove(&self, unique_id: &str) -> Option<PendingCall> {
        self.lock().calls.remove(unique_id)
    }

    /// Fail every outstanding call with `ConnectionClosed` and refuse new
    /// ones. Returns how many calls were failed.
    pub fn fail_all(&self, reason: &str) -> usize {
        let drained: Vec<PendingCall> = {
            let mut table = self.lock();
            if table.closed.is_none() {
                table.closed = Some(reason.to_string());
            }
            table.calls.drain().map(|(_, call)| call).collect()
        };

        let count = drained.len();
        for call in drained {
            let _ = call.tx.send(Err(OcppError::ConnectionClosed {
                reason: reason.to_string(),
            }));
        }
        count
    }

    pub fn len(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, unique_id: &str) -> bool {
        self.lock().calls.contains_key(unique_id)
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_and_resolve() {
        let pending = PendingCalls::new();
        let (id, rx) = pending.register("Reset").unwrap();
        assert!(pending.contains(&id));

        assert_eq!(
            pending.resolve(&id, Ok(json!({"status": "Accepted"}))),
            Some("Reset".to_string())
        );
        assert_eq!(rx.await.unwrap(), Ok(json!({"status": "Accepted"})));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_ids_unique_while_outstanding() {
        let pending = PendingCalls::new();
        let mut ids: Vec<String> = (0..100)
            .map(|_| pending.register("Heartbeat").unwrap().0)
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_second_resolution_is_discarded() {
        let pending = PendingCalls::new();
        let (id, _rx) = pending.register("Reset").unwrap();

        assert!(pending.resolve(&id, Ok(json!({}))).is_some());
        assert!(pending.resolve(&id, Ok(json!({}))).is_none());
        assert!(pending.resolve("unknown", Ok(json!({}))).is_none());
    }

    #[tokio::test]
    async fn test_fail_all_closes_table() {
        let pending = PendingCalls::new();
        let (_, rx1) = pending.register("Reset").unwrap();
        let (_, rx2) = pending.register("GetConfiguration").unwrap();

        assert_eq!(pending.fail_all("peer closed"), 2);
        for rx in [rx1, rx2] {
            assert_eq!(
                rx.await.unwrap(),
                Err(OcppError::ConnectionClosed {
                    reason: "peer closed".to_string()
                })
            );
        }

        assert!(pending.is_closed());
        assert!(matches!(
            pending.register("Reset"),
            Err(OcppError::ConnectionClosed { .. })
        ));
        assert_eq!(pending.fail_all("again"), 0);
    }

    #[test]
    fn test_remove_drops_call() {
        let pending = PendingCalls::new();
        let (id, mut rx) = pending.register("Reset").unwrap();
        let call = pending.remove(&id).unwrap();
        assert_eq!(call.action, "Reset");
        drop(call);
        assert!(rx.try_recv().is_err());
        assert!(pending.resolve(&id, Ok(json!({}))).is_none());
    }
}
