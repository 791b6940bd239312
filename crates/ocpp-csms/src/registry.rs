//! Charger session registry
//!
//! Directory of connected charge points keyed by charger id. Holds at most
//! one session per id: registering an id that is already present replaces
//! the old session and closes it. A session's entry is removed either by
//! [`SessionRegistry::disconnect`] or by its own read loop on exit, and the
//! read loop only removes the entry if it still points at the same session.

use crate::router::ActionRouter;
use crate::rpc::{reason, CallDefaults, RpcEngine};
use crate::session::{ChargeSession, SessionHandle, SessionSummary};
use dashmap::DashMap;
use ocpp_transport::{FrameReader, SharedWriter};
use ocpp_types::{OcppError, OcppResult};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, SessionHandle>>,
    router: Arc<ActionRouter>,
    defaults: CallDefaults,
}

impl SessionRegistry {
    pub fn new(router: Arc<ActionRouter>, defaults: CallDefaults) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            router,
            defaults,
        }
    }

    pub fn defaults(&self) -> CallDefaults {
        self.defaults
    }

    /// Install a session for `charger_id` and start its read loop
    pub async fn register<R>(
        &self,
        charger_id: &str,
        reader: R,
        writer: SharedWriter,
        subprotocol: Option<String>,
    ) -> SessionHandle
    where
        R: FrameReader + 'static,
    {
        let engine = Arc::new(RpcEngine::new(
            charger_id,
            writer,
            self.router.clone(),
            self.defaults,
        ));
        let session = Arc::new(ChargeSession::new(engine, subprotocol));

        let previous = self
            .sessions
            .insert(charger_id.to_string(), session.clone());
        session.engine().mark_active();
        self.spawn_read_loop(session.clone(), reader);

        if let Some(previous) = previous {
            warn!(
                "Charger {} reconnected, replacing session {}",
                charger_id,
                previous.id()
            );
            previous.close(reason::REPLACED).await;
        }

        info!(
            "Charger {} registered (session {}, {} connected)",
            charger_id,
            session.id(),
            self.sessions.len()
        );
        session
    }

    fn spawn_read_loop<R>(&self, session: SessionHandle, mut reader: R)
    where
        R: FrameReader + 'static,
    {
        let sessions = self.sessions.clone();
        let engine = session.engine().clone();
        tokio::spawn(async move {
            // Session cleanup on exit
            let _cleanup = scopeguard::guard(session, move |session| {
                let removed = sessions
                    .remove_if(session.charger_id(), |_, current| current.id() == session.id())
                    .is_some();
                if removed {
                    info!("Charger {} unregistered", session.charger_id());
                }
            });

            engine.run(&mut reader).await;
        });
    }

    /// Active session for `charger_id`
    pub fn lookup(&self, charger_id: &str) -> OcppResult<SessionHandle> {
        self.sessions
            .get(charger_id)
            .map(|entry| entry.value().clone())
            .filter(|session| session.state().is_open())
            .ok_or_else(|| OcppError::NotConnected {
                charger_id: charger_id.to_string(),
            })
    }

    /// Remove a session and close it, failing its pending calls
    pub async fn disconnect(&self, charger_id: &str) -> OcppResult<()> {
        let (_, session) =
            self.sessions
                .remove(charger_id)
                .ok_or_else(|| OcppError::NotConnected {
                    charger_id: charger_id.to_string(),
                })?;
        info!("Disconnecting charger {}", charger_id);
        session.close(reason::FORCED_DISCONNECT).await;
        Ok(())
    }

    /// Snapshot of the registered sessions
    pub fn sessions(&self) -> Vec<SessionHandle> {
        self.sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Visit every session registered at the time of the call. Sessions may
    /// come and go while the callback runs.
    pub fn for_each(&self, mut f: impl FnMut(&SessionHandle)) {
        for session in self.sessions() {
            f(&session);
        }
    }

    pub fn snapshot(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> =
            self.sessions().iter().map(|s| s.summary()).collect();
        summaries.sort_by(|a, b| a.charger_id.cmp(&b.charger_id));
        summaries
    }

    pub fn contains(&self, charger_id: &str) -> bool {
        self.sessions.contains_key(charger_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close and remove every session; returns how many were closed
    pub async fn close_all(&self, why: &str) -> usize {
        let mut closed = 0;
        for session in self.sessions() {
            self.sessions
                .remove_if(session.charger_id(), |_, current| current.id() == session.id());
            if session.close(why).await {
                closed += 1;
            }
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::SessionState;
    use ocpp_transport::channel::{self, PeerHandle};
    use ocpp_transport::{FrameWriter, TransportResult};
    use serde_json::json;
    use std::time::Duration;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(ActionRouter::new()), CallDefaults::default())
    }

    async fn connect(registry: &SessionRegistry, charger_id: &str) -> (SessionHandle, PeerHandle) {
        let (reader, writer, peer) = channel::pair();
        let session = registry
            .register(charger_id, reader, Arc::new(writer), Some("ocpp1.6".to_string()))
            .await;
        (session, peer)
    }

    /// Writer whose peer never drains the connection
    struct StalledWriter;

    #[async_trait::async_trait]
    impl FrameWriter for StalledWriter {
        async fn write_frame(&self, _frame: String) -> TransportResult<()> {
            std::future::pending().await
        }

        async fn close(&self) -> TransportResult<()> {
            std::future::pending().await
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = registry();
        let (session, _peer) = connect(&registry, "CP1").await;

        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(registry.lookup("CP1").unwrap().id(), session.id());
        assert_eq!(registry.len(), 1);
        assert!(matches!(
            registry.lookup("CP2"),
            Err(OcppError::NotConnected { ref charger_id }) if charger_id == "CP2"
        ));
    }

    #[tokio::test]
    async fn test_reregistration_replaces_session() {
        let registry = registry();
        let (old, mut old_peer) = connect(&registry, "CP1").await;

        let pending = tokio::spawn({
            let engine = old.engine().clone();
            async move { engine.send_call("Reset", json!({"type": "Soft"}), None).await }
        });
        old_peer.recv_frame().await.unwrap();

        let (new, _new_peer) = connect(&registry, "CP1").await;
        assert_ne!(old.id(), new.id());
        assert_eq!(old.state(), SessionState::Closed);
        assert_eq!(
            pending.await.unwrap(),
            Err(OcppError::ConnectionClosed {
                reason: reason::REPLACED.to_string()
            })
        );
        assert!(old_peer.recv_frame().await.is_none());

        // The old read loop exits without touching the replacement
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(registry.lookup("CP1").unwrap().id(), new.id());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_fails_pending_and_removes() {
        let registry = registry();
        let (session, mut peer) = connect(&registry, "CP1").await;

        let pending = tokio::spawn({
            let engine = session.engine().clone();
            async move { engine.send_call("GetConfiguration", json!({}), None).await }
        });
        peer.recv_frame().await.unwrap();

        registry.disconnect("CP1").await.unwrap();
        assert!(matches!(
            pending.await.unwrap(),
            Err(OcppError::ConnectionClosed { .. })
        ));
        assert!(!registry.contains("CP1"));
        assert!(matches!(
            registry.disconnect("CP1").await,
            Err(OcppError::NotConnected { .. })
        ));
    }

    #[tokio::test]
    async fn test_peer_close_unregisters() {
        let registry = registry();
        let (session, mut peer) = connect(&registry, "CP1").await;
        let (_other, _other_peer) = connect(&registry, "CP2").await;

        peer.close();
        wait_until(|| !registry.contains("CP1")).await;
        assert_eq!(session.state(), SessionState::Closed);
        assert!(registry.lookup("CP2").is_ok());
    }

    #[tokio::test]
    async fn test_snapshot_and_for_each() {
        let registry = registry();
        let _b = connect(&registry, "CP-B").await;
        let _a = connect(&registry, "CP-A").await;

        let ids: Vec<String> = registry
            .snapshot()
            .into_iter()
            .map(|summary| summary.charger_id)
            .collect();
        assert_eq!(ids, vec!["CP-A".to_string(), "CP-B".to_string()]);

        let mut visited = 0;
        registry.for_each(|session| {
            // Removing during iteration is allowed
            registry.sessions.remove(session.charger_id());
            visited += 1;
        });
        assert_eq!(visited, 2);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_close_all() {
        let registry = registry();
        let (_s1, mut p1) = connect(&registry, "CP1").await;
        let (_s2, mut p2) = connect(&registry, "CP2").await;

        assert_eq!(registry.close_all(reason::SHUTDOWN).await, 2);
        assert!(registry.is_empty());
        assert!(p1.recv_frame().await.is_none());
        assert!(p2.recv_frame().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_over_stalled_session() {
        let registry = registry();
        let (old_reader, _old_writer, _old_peer) = channel::pair();
        let old = registry
            .register("CP1", old_reader, Arc::new(StalledWriter), None)
            .await;

        let (reader, writer, mut peer) = channel::pair();
        let register = tokio::spawn({
            let registry = registry.clone();
            async move {
                registry
                    .register("CP1", reader, Arc::new(writer), Some("ocpp1.6".to_string()))
                    .await
            }
        });
        wait_until(|| registry.lookup("CP1").map(|s| s.id() != old.id()).unwrap_or(false)).await;

        // The replacement serves calls while the old transport is still closing
        peer.send_json(&json!([2, "h1", "Heartbeat", {}])).unwrap();
        let reply = peer.recv_json().await.unwrap();
        assert_eq!(reply[0], 4);
        assert_eq!(reply[1], "h1");
        assert!(!register.is_finished());

        let new = register.await.unwrap();
        assert_eq!(old.state(), SessionState::Closed);
        assert_eq!(registry.lookup("CP1").unwrap().id(), new.id());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_stalled_session() {
        let registry = registry();
        let (reader, _writer, _peer) = channel::pair();
        let session = registry
            .register("CP1", reader, Arc::new(StalledWriter), None)
            .await;

        registry.disconnect("CP1").await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(!registry.contains("CP1"));
    }
}
