use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, unbounded};

use crate::stream::connection::{self, StreamLink};
use crate::stream::decoder::{DecodedFrame, FrameDecoder};

/// Events from the socket and decode worker, consumed by the render loop
#[derive(Debug)]
pub enum StreamEvent {
    /// The socket handshake completed
    Opened,
    /// A frame of this many bytes came off the socket and went to the decoder
    Received(usize),
    /// A frame finished decoding
    Frame(DecodedFrame),
    /// The server sent a text message
    Text(String),
    /// Socket failure (always followed by `Closed`)
    Error(String),
    /// The socket is gone
    Closed { code: u16, reason: String },
}

/// Non-blocking receiver for the render loop
pub struct StreamEventReceiver {
    rx: Receiver<StreamEvent>,
}

impl StreamEventReceiver {
    /// Try to receive the next event without blocking
    pub fn try_recv(&self) -> Option<StreamEvent> {
        self.rx.try_recv().ok()
    }
}

impl From<Receiver<StreamEvent>> for StreamEventReceiver {
    fn from(rx: Receiver<StreamEvent>) -> Self {
        Self { rx }
    }
}

/// Wires the socket and the decode worker together.
pub struct StreamClient {
    link: StreamLink,
    _decoder: JoinHandle<()>,
}

impl StreamClient {
    /// Connect to `url`, returning the client and its event receiver
    pub fn connect(url: &str) -> (StreamClient, StreamEventReceiver) {
        let (tx, rx) = unbounded();
        let (decoder, decoder_handle) = FrameDecoder::spawn(tx.clone());
        let link = connection::connect(url, decoder, tx);

        (
            StreamClient {
                link,
                _decoder: decoder_handle,
            },
            rx.into(),
        )
    }

    /// Get a handle to the socket
    pub fn link(&self) -> StreamLink {
        self.link.clone()
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        self.link.close();
    }
}
