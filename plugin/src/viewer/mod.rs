//! # Stream Viewer Plugin for Bevy
//!
//! Displays a JPEG-over-WebSocket game stream and sends keyboard and mouse
//! input back to the server.
//!
//! ## Example
//!
//! ```no_run
//! use bevy::prelude::*;
//! use bevy_stream_viewer::{StreamViewerPlugin, ViewerConfig};
//!
//! fn main() {
//!     let config = ViewerConfig::default().with_url("ws://192.168.1.20:10034/ws");
//!
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(StreamViewerPlugin::new(config))
//!         .add_systems(Startup, |mut commands: Commands| {
//!             commands.spawn(Camera2d);
//!         })
//!         .run();
//! }
//! ```
pub mod plugin;

mod config;
mod state;
mod systems;

pub use config::ViewerConfig;
pub use plugin::StreamViewerPlugin;
pub use state::*;
pub use systems::*;
