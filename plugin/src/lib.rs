//! A Bevy viewer for game streams delivered as JPEG frames over a WebSocket.
//!
//! [`stream`] holds the socket, decode worker and command codec and has no
//! Bevy dependencies; [`viewer`] wires it into a Bevy app.

pub mod stream;
pub mod viewer;

pub use stream::{StreamError, ViewerCommand};
pub use viewer::{RenderMode, StreamViewerPlugin, ViewerConfig, ViewerState};
