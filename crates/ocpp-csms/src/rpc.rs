//! Per-session OCPP-J RPC engine
//!
//! Owns the writer and the pending-call table of one charge point. Outbound
//! calls from any task go through [`RpcEngine::send_call`] and are matched to
//! their answers by message id only, so any number of them may be in flight
//! and answered in any order. The session's read loop ([`RpcEngine::run`]) is
//! the only caller of [`RpcEngine::handle_frame`].

use crate::pending::PendingCalls;
use crate::router::{ActionRouter, CallContext};
use ocpp_messages::{codec, utils, OcppAction};
use ocpp_transport::{FrameReader, SharedWriter};
use ocpp_types::{CallMessage, Message, OcppError, OcppResult};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Lifecycle of a charge point session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Connecting,
    Active,
    Closing,
    Closed,
}

impl SessionState {
    pub fn is_open(&self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Active)
    }
}

/// Settings applied to outbound calls that do not carry their own
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallDefaults {
    pub timeout: Duration,
}

impl Default for CallDefaults {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Longest wait for the transport to release on close
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Close reasons used by the session layer
pub mod reason {
    pub const PEER_CLOSED: &str = "peer closed";
    pub const FORCED_DISCONNECT: &str = "forced disconnect";
    pub const REPLACED: &str = "replaced";
    pub const SHUTDOWN: &str = "shutdown";
}

pub struct RpcEngine {
    ctx: CallContext,
    writer: SharedWriter,
    router: Arc<ActionRouter>,
    pending: PendingCalls,
    state: Mutex<SessionState>,
    shutdown: watch::Sender<bool>,
    defaults: CallDefaults,
}

impl RpcEngine {
    pub fn new(
        charger_id: impl Into<String>,
        writer: SharedWriter,
        router: Arc<ActionRouter>,
        defaults: CallDefaults,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            ctx: CallContext::new(charger_id),
            writer,
            router,
            pending: PendingCalls::new(),
            state: Mutex::new(SessionState::Connecting),
            shutdown,
            defaults,
        }
    }

    pub fn charger_id(&self) -> &str {
        self.ctx.charger_id()
    }

    pub fn context(&self) -> &CallContext {
        &self.ctx
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SessionState {
        *self.lock_state()
    }

    /// Connecting -> Active; no effect once closing
    pub fn mark_active(&self) {
        let mut state = self.lock_state();
        if *state == SessionState::Connecting {
            *state = SessionState::Active;
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn defaults(&self) -> CallDefaults {
        self.defaults
    }

    async fn write(&self, message: &Message) -> OcppResult<()> {
        let frame = codec::encode(message);
        debug!("{} <- {}", self.charger_id(), frame);
        self.writer.write_frame(frame).await.map_err(OcppError::from)
    }

    /// Send a Call and wait for its answer.
    ///
    /// `timeout` falls back to the engine default and covers queueing the
    /// frame as well as waiting for the answer. The pending entry is gone
    /// when this returns, including when the returned future is dropped early.
    pub async fn send_call(
        &self,
        action: &str,
        payload: Value,
        timeout: Option<Duration>,
    ) -> OcppResult<Value> {
        let timeout = timeout.unwrap_or(self.defaults.timeout);
        let (unique_id, mut rx) = self.pending.register(action)?;
        let _cleanup = scopeguard::guard(unique_id.clone(), |id| {
            self.pending.remove(&id);
        });

        let call = Message::Call(CallMessage {
            unique_id: unique_id.clone(),
            action: action.to_string(),
            payload,
        });
        let exchange = async {
            self.write(&call).await?;
            (&mut rx).await.unwrap_or_else(|_| {
                Err(OcppError::ConnectionClosed {
                    reason: "session dropped".to_string(),
                })
            })
        };

        let result = tokio::time::timeout(timeout, exchange).await;
        match result {
            Ok(outcome) => outcome,
            Err(_) => {
                if self.pending.remove(&unique_id).is_some() {
                    warn!(
                        "{} {} ({}) timed out after {:?}",
                        self.charger_id(),
                        action,
                        unique_id,
                        timeout
                    );
                    Err(OcppError::Timeout {
                        action: action.to_string(),
                        timeout,
                    })
                } else {
                    // Answered in the same instant the deadline fired
                    rx.try_recv().unwrap_or_else(|_| {
                        Err(OcppError::ConnectionClosed {
                            reason: "session dropped".to_string(),
                        })
                    })
                }
            }
        }
    }

    /// Typed [`send_call`](Self::send_call): validates the request first and
    /// parses the answer as `A::Response`
    pub async fn call<A: OcppAction>(
        &self,
        request: &A,
        timeout: Option<Duration>,
    ) -> OcppResult<A::Response> {
        request.validate()?;
        let payload = serde_json::to_value(request)?;
        let response = self.send_call(A::ACTION_NAME, payload, timeout).await?;
        utils::parse_response::<A>(response)
    }

    /// Process one inbound frame.
    ///
    /// Only a failed write is returned as an error; everything wrong with the
    /// frame itself is answered or logged.
    pub async fn handle_frame(&self, raw: &str) -> OcppResult<()> {
        debug!("{} -> {}", self.charger_id(), raw);

        let message = match codec::decode(raw) {
            Ok(message) => message,
            Err(err) => {
                warn!("{} sent an unusable frame: {}", self.charger_id(), err);
                if let Some(reply) = err.reply() {
                    self.write(&Message::CallError(reply)).await?;
                }
                return Ok(());
            }
        };

        match message {
            Message::Call(call) => {
                let reply = self.router.dispatch(call, &self.ctx).await;
                self.write(&reply).await
            }
            Message::CallResult(result) => {
                if self
                    .pending
                    .resolve(&result.unique_id, Ok(result.payload))
                    .is_none()
                {
                    warn!(
                        "{} answered unknown message id {}, discarded",
                        self.charger_id(),
                        result.unique_id
                    );
                }
                Ok(())
            }
            Message::CallError(error) => {
                let outcome = Err(OcppError::RemoteError {
                    code: error.error_code,
                    description: error.error_description,
                    details: error.error_details,
                });
                if self.pending.resolve(&error.unique_id, outcome).is_none() {
                    warn!(
                        "{} sent CallError for unknown message id {}, discarded",
                        self.charger_id(),
                        error.unique_id
                    );
                }
                Ok(())
            }
        }
    }

    /// Read frames until the peer goes away or the session is closed, then
    /// close the session
    pub async fn run<R>(&self, reader: &mut R)
    where
        R: FrameReader + ?Sized,
    {
        let mut shutdown = self.shutdown.subscribe();
        let closed = async move {
            let _ = shutdown.wait_for(|closed| *closed).await;
        };
        tokio::pin!(closed);

        let reason = loop {
            tokio::select! {
                _ = &mut closed => break None,
                frame = reader.read_frame() => match frame {
                    Ok(Some(frame)) => {
                        if let Err(e) = self.handle_frame(&frame).await {
                            break Some(format!("write failed: {}", e));
                        }
                    }
                    Ok(None) => break Some(reason::PEER_CLOSED.to_string()),
                    Err(e) => break Some(e.to_string()),
                },
            }
        };

        if let Some(reason) = reason {
            self.close(&reason).await;
        }
    }

    /// Close the session: fail every pending call with `ConnectionClosed`,
    /// stop the read loop and release the transport.
    ///
    /// Returns `false` if the session was already closing.
    pub async fn close(&self, reason: &str) -> bool {
        {
            let mut state = self.lock_state();
            if !state.is_open() {
                return false;
            }
            *state = SessionState::Closing;
        }

        let failed = self.pending.fail_all(reason);
        self.shutdown.send_replace(true);
        match tokio::time::timeout(CLOSE_TIMEOUT, self.writer.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("{} writer close failed: {}", self.charger_id(), e),
            Err(_) => warn!("{} writer did not close within {:?}", self.charger_id(), CLOSE_TIMEOUT),
        }
        *self.lock_state() = SessionState::Closed;

        info!(
            "Session {} closed: {} ({} pending calls failed)",
            self.charger_id(),
            reason,
            failed
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocpp_messages::v16j::{
        ResetRequest, ResetResponse, StatusNotificationRequest, StatusNotificationResponse,
    };
    use ocpp_transport::channel::{self, PeerHandle};
    use ocpp_transport::{FrameWriter, TransportResult};
    use ocpp_types::v16j::{ResetStatus, ResetType};
    use ocpp_types::CallErrorCode;
    use serde_json::json;

    fn engine() -> (Arc<RpcEngine>, PeerHandle) {
        let (_reader, writer, peer) = channel::pair();
        let engine = RpcEngine::new(
            "CP1",
            Arc::new(writer),
            Arc::new(ActionRouter::new()),
            CallDefaults::default(),
        );
        (Arc::new(engine), peer)
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

    fn stalled_engine() -> Arc<RpcEngine> {
        Arc::new(RpcEngine::new(
            "CP1",
            Arc::new(StalledWriter),
            Arc::new(ActionRouter::new()),
            CallDefaults::default(),
        ))
    }

    /// Next Call written by the engine as (id, action)
    async fn next_call(peer: &mut PeerHandle) -> (String, String) {
        let frame = peer.recv_json().await.unwrap();
        assert_eq!(frame[0], 2);
        (
            frame[1].as_str().unwrap().to_string(),
            frame[2].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_out_of_order_responses_correlate() {
        let (engine, mut peer) = engine();

        let first = tokio::spawn({
            let engine = engine.clone();
            async move { engine.send_call("GetConfiguration", json!({}), None).await }
        });
        let (first_id, _) = next_call(&mut peer).await;

        let second = tokio::spawn({
            let engine = engine.clone();
            async move { engine.send_call("Reset", json!({"type": "Soft"}), None).await }
        });
        let (second_id, action) = next_call(&mut peer).await;
        assert_eq!(action, "Reset");
        assert_ne!(first_id, second_id);

        engine
            .handle_frame(&json!([3, second_id, {"status": "Accepted"}]).to_string())
            .await
            .unwrap();
        engine
            .handle_frame(&json!([3, first_id, {"configurationKey": []}]).to_string())
            .await
            .unwrap();

        assert_eq!(
            second.await.unwrap().unwrap(),
            json!({"status": "Accepted"})
        );
        assert_eq!(
            first.await.unwrap().unwrap(),
            json!({"configurationKey": []})
        );
        assert_eq!(engine.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_id_is_discarded() {
        let (engine, mut peer) = engine();

        let call = tokio::spawn({
            let engine = engine.clone();
            async move { engine.send_call("Reset", json!({"type": "Hard"}), None).await }
        });
        let (id, _) = next_call(&mut peer).await;

        engine
            .handle_frame(&json!([3, "no-such-id", {"status": "Rejected"}]).to_string())
            .await
            .unwrap();
        engine
            .handle_frame(&json!([4, "other", "GenericError", "", {}]).to_string())
            .await
            .unwrap();
        assert_eq!(engine.pending_count(), 1);

        engine
            .handle_frame(&json!([3, id, {"status": "Accepted"}]).to_string())
            .await
            .unwrap();
        assert_eq!(call.await.unwrap().unwrap(), json!({"status": "Accepted"}));

        // Late duplicate
        engine
            .handle_frame(&json!([3, id, {"status": "Rejected"}]).to_string())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_call_error_becomes_remote_error() {
        let (engine, mut peer) = engine();

        let call = tokio::spawn({
            let engine = engine.clone();
            async move { engine.send_call("UnlockConnector", json!({"connectorId": 1}), None).await }
        });
        let (id, _) = next_call(&mut peer).await;
        engine
            .handle_frame(
                &json!([4, id, "NotSupported", "no lock", {"hint": 1}]).to_string(),
            )
            .await
            .unwrap();

        match call.await.unwrap() {
            Err(OcppError::RemoteError {
                code,
                description,
                details,
            }) => {
                assert_eq!(code, CallErrorCode::NotSupported);
                assert_eq!(description, "no lock");
                assert_eq!(details, json!({"hint": 1}));
            }
            other => panic!("Expected RemoteError, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_removes_pending_call() {
        let (engine, mut peer) = engine();

        let call = tokio::spawn({
            let engine = engine.clone();
            async move {
                engine
                    .send_call("GetConfiguration", json!({}), Some(Duration::from_secs(5)))
                    .await
            }
        });
        next_call(&mut peer).await;
        assert_eq!(engine.pending_count(), 1);

        let started = tokio::time::Instant::now();
        let result = call.await.unwrap();
        assert!(matches!(result, Err(OcppError::Timeout { ref action, .. }) if action == "GetConfiguration"));
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(engine.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_close_fails_pending_calls() {
        let (engine, mut peer) = engine();

        let calls: Vec<_> = (0..3)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.send_call("Reset", json!({"type": "Soft"}), None).await })
            })
            .collect();
        for _ in 0..3 {
            next_call(&mut peer).await;
        }

        assert!(engine.close(reason::FORCED_DISCONNECT).await);
        assert!(!engine.close(reason::FORCED_DISCONNECT).await);
        assert_eq!(engine.state(), SessionState::Closed);

        for call in calls {
            assert_eq!(
                call.await.unwrap(),
                Err(OcppError::ConnectionClosed {
                    reason: reason::FORCED_DISCONNECT.to_string()
                })
            );
        }
        assert!(peer.recv_frame().await.is_none());

        let late = engine.send_call("Reset", json!({"type": "Soft"}), None).await;
        assert!(matches!(late, Err(OcppError::ConnectionClosed { .. })));
    }

    #[tokio::test]
    async fn test_typed_call() {
        let (engine, mut peer) = engine();

        let call = tokio::spawn({
            let engine = engine.clone();
            async move {
                engine
                    .call(
                        &ResetRequest {
                            kind: ResetType::Soft,
                        },
                        None,
                    )
                    .await
            }
        });
        let (id, action) = next_call(&mut peer).await;
        assert_eq!(action, "Reset");
        engine
            .handle_frame(&json!([3, id, {"status": "Accepted"}]).to_string())
            .await
            .unwrap();

        assert_eq!(
            call.await.unwrap().unwrap(),
            ResetResponse {
                status: ResetStatus::Accepted
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_call_answered_with_call_error() {
        let (engine, mut peer) = engine();

        engine
            .handle_frame(r#"[2,"77","BootNotification",{"chargePointVendor":""}]"#)
            .await
            .unwrap();
        let reply = peer.recv_json().await.unwrap();
        assert_eq!(reply[0], 4);
        assert_eq!(reply[1], "77");
        assert_eq!(reply[2], "FormationViolation");

        // Nothing to correlate with
        engine.handle_frame("not json").await.unwrap();
        engine.handle_frame("[9,\"1\"]").await.unwrap();
    }

    #[tokio::test]
    async fn test_unrouted_call_not_implemented() {
        let (engine, mut peer) = engine();
        engine
            .handle_frame(r#"[2,"5","DiagnosticsStatusNotification",{"status":"Idle"}]"#)
            .await
            .unwrap();
        let reply = peer.recv_json().await.unwrap();
        assert_eq!(reply, json!([4, "5", "NotImplemented", "Action not implemented: DiagnosticsStatusNotification", {}]));
    }

    #[tokio::test]
    async fn test_run_closes_on_peer_disconnect() {
        let (mut reader, writer, mut peer) = channel::pair();
        let engine = Arc::new(RpcEngine::new(
            "CP1",
            Arc::new(writer),
            Arc::new(ActionRouter::new()),
            CallDefaults::default(),
        ));
        engine.mark_active();

        let call = tokio::spawn({
            let engine = engine.clone();
            async move { engine.send_call("Reset", json!({"type": "Soft"}), None).await }
        });
        next_call(&mut peer).await;

        peer.close();
        engine.run(&mut reader).await;

        assert_eq!(engine.state(), SessionState::Closed);
        assert!(matches!(
            call.await.unwrap(),
            Err(OcppError::ConnectionClosed { .. })
        ));
    }

    #[tokio::test]
    async fn test_run_stops_when_closed() {
        let (mut reader, writer, _peer) = channel::pair();
        let engine = Arc::new(RpcEngine::new(
            "CP1",
            Arc::new(writer),
            Arc::new(ActionRouter::new()),
            CallDefaults::default(),
        ));

        let run = tokio::spawn({
            let engine = engine.clone();
            async move { engine.run(&mut reader).await }
        });
        engine.close(reason::SHUTDOWN).await;
        run.await.unwrap();
        assert_eq!(engine.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_huge_timeout_still_answers() {
        let (engine, mut peer) = engine();

        let call = tokio::spawn({
            let engine = engine.clone();
            async move {
                engine
                    .send_call(
                        "Reset",
                        json!({"type": "Soft"}),
                        Some(Duration::from_secs(u64::MAX)),
                    )
                    .await
            }
        });
        let (id, _) = next_call(&mut peer).await;
        engine
            .handle_frame(&json!([3, id, {"status": "Accepted"}]).to_string())
            .await
            .unwrap();

        assert_eq!(call.await.unwrap().unwrap(), json!({"status": "Accepted"}));
        assert_eq!(engine.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_covers_stalled_write() {
        let engine = stalled_engine();

        let started = tokio::time::Instant::now();
        let result = engine
            .send_call("GetConfiguration", json!({}), Some(Duration::from_secs(5)))
            .await;
        assert!(matches!(result, Err(OcppError::Timeout { ref action, .. }) if action == "GetConfiguration"));
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(engine.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_with_stalled_writer() {
        let engine = stalled_engine();

        assert!(engine.close(reason::FORCED_DISCONNECT).await);
        assert_eq!(engine.state(), SessionState::Closed);
        assert!(matches!(
            engine.send_call("Reset", json!({"type": "Soft"}), None).await,
            Err(OcppError::ConnectionClosed { .. })
        ));
    }

    #[tokio::test]
    async fn test_inbound_call_answered_while_outbound_pending() {
        let (mut reader, writer, mut peer) = channel::pair();
        let mut router = ActionRouter::new();
        router.on::<StatusNotificationRequest, _>(|_, _| Ok(StatusNotificationResponse {}));
        let engine = Arc::new(RpcEngine::new(
            "CP1",
            Arc::new(writer),
            Arc::new(router),
            CallDefaults::default(),
        ));
        engine.mark_active();

        let run = tokio::spawn({
            let engine = engine.clone();
            async move { engine.run(&mut reader).await }
        });
        let call = tokio::spawn({
            let engine = engine.clone();
            async move {
                engine
                    .send_call("RemoteStartTransaction", json!({"idTag": "TAG1"}), None)
                    .await
            }
        });
        let (id, action) = next_call(&mut peer).await;
        assert_eq!(action, "RemoteStartTransaction");

        peer.send_json(&json!([2, "sn1", "StatusNotification", {
            "connectorId": 1,
            "errorCode": "NoError",
            "status": "Available"
        }]))
        .unwrap();
        assert_eq!(peer.recv_json().await.unwrap(), json!([3, "sn1", {}]));
        assert!(!call.is_finished());
        assert_eq!(engine.pending_count(), 1);

        peer.send_json(&json!([3, id, {"status": "Accepted"}])).unwrap();
        assert_eq!(call.await.unwrap().unwrap(), json!({"status": "Accepted"}));

        engine.close(reason::SHUTDOWN).await;
        run.await.unwrap();
    }
}
