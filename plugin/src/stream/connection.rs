//! Stream Socket
//!
//! Owns the WebSocket to the streaming server. The socket runs on its own
//! thread with a private tokio runtime; binary messages go to the decode
//! worker and text commands flow back out through an unbounded queue.

use crossbeam_channel::Sender;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

use crate::stream::client::StreamEvent;
use crate::stream::decoder::{EncodedFrame, FrameDecoder};
use crate::stream::error::{StreamError, StreamResult};
use crate::stream::protocol::ViewerCommand;

/// Link ready states (matching the browser WebSocket API)
pub const LINK_CONNECTING: u32 = 0;
pub const LINK_OPEN: u32 = 1;
pub const LINK_CLOSING: u32 = 2;
pub const LINK_CLOSED: u32 = 3;

/// Abnormal closure, reported when the socket dies without a close frame.
const CLOSE_ABNORMAL: u16 = 1006;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outgoing {
    Text(String),
    Close,
}

/// Handle to the stream socket.
#[derive(Clone)]
pub struct StreamLink {
    sender: mpsc::UnboundedSender<Outgoing>,
    ready_state: Arc<AtomicU32>,
    drawing: Arc<AtomicBool>,
}

impl StreamLink {
    /// Queue a command for the server.
    pub fn send(&self, command: &ViewerCommand) -> StreamResult<()> {
        if self.ready_state() != LINK_OPEN {
            return Err(StreamError::NotOpen);
        }
        let text = command.to_string();
        log::trace!("[Stream] Sending {}", text);
        self.sender
            .send(Outgoing::Text(text))
            .map_err(|_| StreamError::LinkClosed)
    }

    /// Whether incoming frames are handed to the decoder.
    pub fn is_drawing(&self) -> bool {
        self.drawing.load(Ordering::SeqCst)
    }

    /// Pause or resume frame delivery. Frames that arrive while paused are discarded.
    pub fn set_drawing(&self, drawing: bool) {
        self.drawing.store(drawing, Ordering::SeqCst);
    }

    pub fn ready_state(&self) -> u32 {
        self.ready_state.load(Ordering::SeqCst)
    }

    /// Start a normal close of the socket.
    pub fn close(&self) {
        if self.ready_state() == LINK_CLOSED {
            return;
        }
        self.ready_state.store(LINK_CLOSING, Ordering::SeqCst);
        log::info!("[Stream] Closing");
        let _ = self.sender.send(Outgoing::Close);
    }
}

#[cfg(test)]
impl StreamLink {
    /// An open link with no socket behind it; queued messages land in the receiver.
    pub(crate) fn loopback() -> (Self, mpsc::UnboundedReceiver<Outgoing>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let link = Self {
            sender,
            ready_state: Arc::new(AtomicU32::new(LINK_OPEN)),
            drawing: Arc::new(AtomicBool::new(true)),
        };
        (link, receiver)
    }
}

fn fail(ready_state: &AtomicU32, events: &Sender<StreamEvent>, message: String, reason: &str) {
    log::error!("[Stream] {}", message);
    ready_state.store(LINK_CLOSED, Ordering::SeqCst);
    let _ = events.send(StreamEvent::Error(message));
    let _ = events.send(StreamEvent::Closed {
        code: CLOSE_ABNORMAL,
        reason: reason.to_string(),
    });
}

/// Resolve `ws://host[:port]/path` to a TCP address.
fn socket_addr(url: &str) -> StreamResult<String> {
    let url = url::Url::parse(url)?;
    if url.scheme() != "ws" {
        return Err(StreamError::UnsupportedScheme(url.scheme().to_string()));
    }
    let host = url.host_str().unwrap_or("localhost");
    let port = url.port().unwrap_or(80);
    Ok(format!("{}:{}", host, port))
}

/// Open the stream socket. Returns immediately; progress is reported through `events`.
pub fn connect(url: &str, decoder: FrameDecoder, events: Sender<StreamEvent>) -> StreamLink {
    let (tx, mut rx) = mpsc::unbounded_channel::<Outgoing>();
    let ready_state = Arc::new(AtomicU32::new(LINK_CONNECTING));
    let drawing = Arc::new(AtomicBool::new(true));

    let link = StreamLink {
        sender: tx,
        ready_state: ready_state.clone(),
        drawing: drawing.clone(),
    };

    let url = url.to_string();

    // Spawn on a separate thread with its own tokio runtime
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .worker_threads(2)
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                fail(
                    &ready_state,
                    &events,
                    format!("Failed to create runtime: {}", e),
                    "Runtime failed",
                );
                return;
            }
        };

        rt.block_on(async move {
            log::info!("[Stream] Connecting to {}", url);

            let addr = match socket_addr(&url) {
                Ok(addr) => addr,
                Err(e) => {
                    fail(&ready_state, &events, e.to_string(), "Invalid URL");
                    return;
                }
            };

            log::info!("[Stream] Connecting TCP to {}", addr);

            let tcp_stream = match TcpStream::connect(&addr).await {
                Ok(stream) => {
                    log::info!("[Stream] TCP connected");
                    if let Err(e) = stream.set_nodelay(true) {
                        log::warn!("[Stream] Could not disable Nagle: {}", e);
                    }
                    stream
                }
                Err(e) => {
                    fail(
                        &ready_state,
                        &events,
                        format!("TCP connection failed: {}", e),
                        "Connection failed",
                    );
                    return;
                }
            };

            let request = match url.as_str().into_client_request() {
                Ok(req) => req,
                Err(e) => {
                    fail(
                        &ready_state,
                        &events,
                        format!("Invalid request: {}", e),
                        "Invalid request",
                    );
                    return;
                }
            };

            log::info!("[Stream] Performing WebSocket handshake");

            let ws_stream = match tokio_tungstenite::client_async(request, tcp_stream).await {
                Ok((stream, response)) => {
                    log::info!("[Stream] Connected (status: {})", response.status());
                    stream
                }
                Err(e) => {
                    fail(
                        &ready_state,
                        &events,
                        format!("Handshake failed: {}", e),
                        "Handshake failed",
                    );
                    return;
                }
            };

            ready_state.store(LINK_OPEN, Ordering::SeqCst);
            log::info!("WebSocket connection established");
            let _ = events.send(StreamEvent::Opened);

            let (mut write, mut read) = ws_stream.split();

            // Forward outgoing commands, in order, up to the close request
            let send_task = tokio::spawn(async move {
                while let Some(outgoing) = rx.recv().await {
                    match outgoing {
                        Outgoing::Text(text) => {
                            if let Err(e) = write.send(Message::Text(text.into())).await {
                                log::error!("[Stream] Send error: {}", e);
                                break;
                            }
                        }
                        Outgoing::Close => {
                            if let Err(e) = write.send(Message::Close(None)).await {
                                log::warn!("[Stream] Close error: {}", e);
                            }
                            break;
                        }
                    }
                }
            });

            while let Some(msg_result) = read.next().await {
                match msg_result {
                    Ok(Message::Binary(data)) => {
                        if drawing.load(Ordering::SeqCst) {
                            let _ = events.send(StreamEvent::Received(data.len()));
                            decoder.submit(EncodedFrame::new(data.to_vec()));
                        } else {
                            log::trace!("[Stream] Paused, dropped frame ({} bytes)", data.len());
                        }
                    }
                    Ok(Message::Text(text)) => {
                        log::debug!(
                            "[Stream] Received text: {}",
                            text.chars().take(100).collect::<String>()
                        );
                        let _ = events.send(StreamEvent::Text(text.to_string()));
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                        // Handled by tungstenite
                    }
                    Ok(Message::Close(frame)) => {
                        let (code, reason) = frame
                            .map(|f| (f.code.into(), f.reason.to_string()))
                            .unwrap_or((1000, String::new()));
                        log::info!("WebSocket connection closed ({} {})", code, reason);
                        ready_state.store(LINK_CLOSED, Ordering::SeqCst);
                        let _ = events.send(StreamEvent::Closed { code, reason });
                        break;
                    }
                    Ok(Message::Frame(_)) => {}
                    Err(e) => {
                        fail(
                            &ready_state,
                            &events,
                            format!("WebSocket error: {}", e),
                            "Connection error",
                        );
                        break;
                    }
                }
            }

            if ready_state.load(Ordering::SeqCst) != LINK_CLOSED {
                ready_state.store(LINK_CLOSED, Ordering::SeqCst);
                let _ = events.send(StreamEvent::Closed {
                    code: CLOSE_ABNORMAL,
                    reason: "Stream ended".to_string(),
                });
            }

            send_task.abort();
            log::info!("[Stream] Connection ended");
        });
    });

    link
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        assert_eq!(socket_addr("ws://10.0.0.2:10034/ws").unwrap(), "10.0.0.2:10034");
        assert_eq!(socket_addr("ws://example.com/ws").unwrap(), "example.com:80");
    }

    #[test]
    fn test_socket_addr_rejects_other_schemes() {
        assert!(matches!(
            socket_addr("wss://example.com/ws"),
            Err(StreamError::UnsupportedScheme(scheme)) if scheme == "wss"
        ));
        assert!(matches!(
            socket_addr("not a url"),
            Err(StreamError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_unreachable_server_reports_close() {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let (decoder, _handle) = FrameDecoder::spawn(events_tx.clone());
        let link = connect("wss://127.0.0.1:1/ws", decoder, events_tx);

        let timeout = std::time::Duration::from_secs(5);
        assert!(matches!(
            events_rx.recv_timeout(timeout).unwrap(),
            StreamEvent::Error(_)
        ));
        assert!(matches!(
            events_rx.recv_timeout(timeout).unwrap(),
            StreamEvent::Closed { code: 1006, .. }
        ));
        assert_eq!(link.ready_state(), LINK_CLOSED);
        assert!(matches!(
            link.send(&ViewerCommand::SetFrameRate(30)),
            Err(StreamError::NotOpen)
        ));
    }
}
