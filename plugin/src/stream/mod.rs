//! Stream Transport Module
//!
//! The socket, decode worker and wire codec behind the viewer.
//! No Bevy dependencies - this can be used standalone.

mod client;
mod connection;
mod decoder;
mod error;
pub mod keymap;
mod protocol;
mod stats;

pub use client::{StreamClient, StreamEvent, StreamEventReceiver};
#[cfg(test)]
pub(crate) use connection::Outgoing;
pub use connection::{LINK_CLOSED, LINK_CLOSING, LINK_CONNECTING, LINK_OPEN, StreamLink, connect};
pub use decoder::{DecodedFrame, EncodedFrame, FrameDecoder, decode_jpeg};
pub use error::{StreamError, StreamResult};
pub use protocol::{ProtocolError, RemoteButton, ViewerCommand};
pub use stats::{FrameStats, STATS_WINDOW, StatsSnapshot};
