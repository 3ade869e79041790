//! Stream Viewer Plugin Implementation

use bevy::prelude::*;

use crate::stream::StreamClient;
use crate::viewer::config::ViewerConfig;
use crate::viewer::systems::*;

/// Bevy plugin that connects to a stream server and displays it.
///
/// This plugin:
/// - Opens the stream socket and starts the decode worker
/// - Spawns the stream view, pause overlay and slide-out menu
/// - Presents frames and refreshes the stats every second
/// - Forwards keyboard and mouse input while the stream is captured
///
/// A camera is not spawned; add a `Camera2d` so the UI renders.
pub struct StreamViewerPlugin {
    config: ViewerConfig,
}

impl StreamViewerPlugin {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }
}

impl Default for StreamViewerPlugin {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl Plugin for StreamViewerPlugin {
    fn build(&self, app: &mut App) {
        log::info!("Building stream viewer plugin...");

        let (client, receiver) = StreamClient::connect(&self.config.url);
        let link = client.link();

        app.insert_resource(self.config.initial_state())
            .insert_resource(StreamLinkResource(link))
            .insert_resource(StreamClientResource(client))
            .insert_resource(StreamEvents(receiver))
            .insert_resource(StreamStats::new(self.config.log_stats))
            .insert_resource(StepSizes {
                quality: self.config.quality_step.min(i32::MAX as u32) as i32,
                frame_rate: self.config.frame_rate_step.min(i32::MAX as u32) as i32,
            })
            .init_resource::<CanvasTexture>()
            .add_systems(Startup, setup_viewer_ui)
            .add_systems(Update, (poll_stream_events, refresh_stats).chain())
            .add_systems(
                Update,
                (
                    capture_on_click,
                    release_capture,
                    release_on_focus_loss,
                    track_window_mode,
                    track_visibility,
                    forward_keyboard,
                    forward_mouse_motion,
                    forward_mouse_buttons,
                ),
            )
            .add_systems(
                Update,
                (
                    (
                        handle_menu_buttons,
                        handle_menu_tab,
                        handle_pause_button,
                        handle_overlay_click,
                    ),
                    (
                        sync_drawing,
                        apply_layout,
                        apply_render_mode,
                        refresh_state_labels,
                    ),
                )
                    .chain(),
            );

        log::info!("Stream viewer configured for {}", self.config.url);
    }
}
