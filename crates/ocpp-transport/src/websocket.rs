//! WebSocket transport over tokio-tungstenite
//!
//! The stream is split: the reader half stays with the session read loop and
//! the sink moves into a writer task fed through a bounded channel, so writes
//! from concurrent callers never hold up the reader.

use crate::{FrameReader, FrameWriter, TransportConfig, TransportError, TransportResult};
use std::time::Duration;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_tungstenite::{tungstenite::Message, WebSocketStream};
use tracing::{debug, info, warn};

/// Time the writer task gets to flush and send the close frame
const CLOSE_GRACE: Duration = Duration::from_secs(5);

enum Outbound {
    Frame(String),
    Close,
}

/// Constructor for the WebSocket reader/writer halves
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Split an upgraded stream and spawn its writer task
    pub fn split<S>(stream: WebSocketStream<S>, config: &TransportConfig) -> (WsReader<S>, WsWriter)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, stream) = stream.split();
        let (tx, rx) = mpsc::channel(config.outbound_buffer.max(1));
        let writer_task = tokio::spawn(write_loop(sink, rx)).abort_handle();

        (
            WsReader {
                stream,
                max_message_size: config.max_message_size,
            },
            WsWriter {
                tx,
                writer_task,
                max_message_size: config.max_message_size,
            },
        )
    }
}

async fn write_loop<S>(mut sink: SplitSink<WebSocketStream<S>, Message>, mut rx: mpsc::Receiver<Outbound>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(outbound) = rx.recv().await {
        let result = match outbound {
            Outbound::Frame(text) => sink.send(Message::Text(text)).await,
            Outbound::Close => break,
        };
        if let Err(e) = result {
            debug!("WebSocket write failed: {}", e);
            return;
        }
    }
    if let Err(e) = sink.close().await {
        debug!("WebSocket close failed: {}", e);
    }
}

/// Reader half of a WebSocket connection
pub struct WsReader<S> {
    stream: SplitStream<WebSocketStream<S>>,
    max_message_size: usize,
}

#[async_trait::async_trait]
impl<S> FrameReader for WsReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn read_frame(&mut self) -> TransportResult<Option<String>> {
        loop {
            let message = match self.stream.next().await {
                Some(Ok(message)) => message,
                Some(Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed))
                | Some(Err(tokio_tungstenite::tungstenite::Error::AlreadyClosed))
                | None => return Ok(None),
                Some(Err(e)) => return Err(TransportError::from(e)),
            };

            match message {
                Message::Text(text) => {
                    if text.len() > self.max_message_size {
                        return Err(TransportError::MessageTooLarge {
                            size: text.len(),
                            limit: self.max_message_size,
                        });
                    }
                    return Ok(Some(text));
                }
                Message::Binary(data) => {
                    warn!("Ignoring binary frame of {} bytes", data.len());
                }
                // tungstenite queues the pong itself and flushes it on the next read
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(frame) => {
                    info!("Received close frame: {:?}", frame);
                    return Ok(None);
                }
                Message::Frame(_) => {}
            }
        }
    }
}

/// Writer half of a WebSocket connection
#[derive(Clone)]
pub struct WsWriter {
    tx: mpsc::Sender<Outbound>,
    writer_task: AbortHandle,
    max_message_size: usize,
}

#[async_trait::async_trait]
impl FrameWriter for WsWriter {
    async fn write_frame(&self, frame: String) -> TransportResult<()> {
        if frame.len() > self.max_message_size {
            return Err(TransportError::MessageTooLarge {
                size: frame.len(),
                limit: self.max_message_size,
            });
        }
        self.tx
            .send(Outbound::Frame(frame))
            .await
            .map_err(|_| TransportError::ConnectionClosed {
                reason: "writer task stopped".to_string(),
            })
    }

    /// Queue a close after the pending frames without waiting for it.
    ///
    /// A full queue means the peer stopped reading, so the writer task is
    /// dropped at once; otherwise it gets [`CLOSE_GRACE`] to finish.
    async fn close(&self) -> TransportResult<()> {
        match self.tx.try_send(Outbound::Close) {
            Ok(()) => {
                let writer_task = self.writer_task.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(CLOSE_GRACE).await;
                    writer_task.abort();
                });
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("WebSocket writer is stalled, dropping the connection");
                self.writer_task.abort();
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
        Ok(())
    }
}
