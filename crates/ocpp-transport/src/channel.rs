//! In-memory transport
//!
//! [`pair`] returns the server halves of a connection together with a
//! [`PeerHandle`] that plays the charge point. Dropping or closing the peer
//! looks like a disconnect to the server's reader.

use crate::{FrameReader, FrameWriter, TransportError, TransportResult};
use serde_json::Value;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Server-side reader fed by the peer
pub struct ChannelReader {
    inbound: mpsc::UnboundedReceiver<String>,
}

/// Server-side writer delivering to the peer
pub struct ChannelWriter {
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

/// The charge point end of an in-memory connection
pub struct PeerHandle {
    to_server: Option<mpsc::UnboundedSender<String>>,
    from_server: mpsc::UnboundedReceiver<String>,
}

/// Create a connected reader/writer/peer triple
pub fn pair() -> (ChannelReader, ChannelWriter, PeerHandle) {
    let (to_server, inbound) = mpsc::unbounded_channel();
    let (outbound, from_server) = mpsc::unbounded_channel();
    (
        ChannelReader { inbound },
        ChannelWriter {
            outbound: Mutex::new(Some(outbound)),
        },
        PeerHandle {
            to_server: Some(to_server),
            from_server,
        },
    )
}

fn closed() -> TransportError {
    TransportError::ConnectionClosed {
        reason: "channel closed".to_string(),
    }
}

#[async_trait::async_trait]
impl FrameReader for ChannelReader {
    async fn read_frame(&mut self) -> TransportResult<Option<String>> {
        Ok(self.inbound.recv().await)
    }
}

#[async_trait::async_trait]
impl FrameWriter for ChannelWriter {
    async fn write_frame(&self, frame: String) -> TransportResult<()> {
        let guard = self
            .outbound
            .lock()
            .map_err(|_| TransportError::Internal {
                message: "channel writer lock poisoned".to_string(),
            })?;
        match guard.as_ref() {
            Some(tx) => tx.send(frame).map_err(|_| closed()),
            None => Err(closed()),
        }
    }

    async fn close(&self) -> TransportResult<()> {
        if let Ok(mut guard) = self.outbound.lock() {
            guard.take();
        }
        Ok(())
    }
}

impl PeerHandle {
    /// Send a raw frame to the server
    pub fn send_frame(&self, frame: impl Into<String>) -> TransportResult<()> {
        match &self.to_server {
            Some(tx) => tx.send(frame.into()).map_err(|_| closed()),
            None => Err(closed()),
        }
    }

    /// Send a JSON value as a frame
    pub fn send_json(&self, value: &Value) -> TransportResult<()> {
        self.send_frame(value.to_string())
    }

    /// Next frame written by the server; `None` once the server closed
    pub async fn recv_frame(&mut self) -> Option<String> {
        self.from_server.recv().await
    }

    /// Next frame parsed as JSON; unparseable frames come back as strings
    pub async fn recv_json(&mut self) -> Option<Value> {
        let frame = self.recv_frame().await?;
        Some(serde_json::from_str(&frame).unwrap_or(Value::String(frame)))
    }

    /// Stop sending; the server's reader sees end of stream
    pub fn close(&mut self) {
        self.to_server.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (mut reader, writer, mut peer) = pair();

        peer.send_frame(r#"[2,"1","Heartbeat",{}]"#).unwrap();
        assert_eq!(
            reader.read_frame().await.unwrap().as_deref(),
            Some(r#"[2,"1","Heartbeat",{}]"#)
        );

        writer.write_frame(r#"[3,"1",{}]"#.to_string()).await.unwrap();
        assert_eq!(peer.recv_json().await, Some(json!([3, "1", {}])));
    }

    #[tokio::test]
    async fn test_peer_close_ends_reader() {
        let (mut reader, _writer, mut peer) = pair();
        peer.close();
        assert_eq!(reader.read_frame().await.unwrap(), None);
        assert!(peer.send_frame("x").is_err());
    }

    #[tokio::test]
    async fn test_writer_close_is_observed_by_peer() {
        let (_reader, writer, mut peer) = pair();
        writer.close().await.unwrap();
        assert!(peer.recv_frame().await.is_none());
        assert!(matches!(
            writer.write_frame("late".to_string()).await,
            Err(TransportError::ConnectionClosed { .. })
        ));
    }

    #[tokio::test]
    async fn test_dropped_peer_fails_writes() {
        let (_reader, writer, peer) = pair();
        drop(peer);
        assert!(writer.write_frame("x".to_string()).await.is_err());
    }
}
