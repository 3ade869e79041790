use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::stream::StreamResult;
use crate::viewer::state::{FRAME_RATE_RANGE, QUALITY_RANGE, RenderMode, ViewerState};

/// Viewer settings.
///
/// Every field has a default, so a JSON config file only needs the keys it
/// wants to change:
///
/// ```json
/// { "url": "ws://192.168.1.20:10034/ws", "render_mode": "canvas" }
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Stream server URL (`ws://` only).
    pub url: String,
    /// Initial value of the quality stepper.
    pub quality: u32,
    /// Initial value of the frame-rate stepper.
    pub frame_rate: u32,
    pub render_mode: RenderMode,
    /// Start with the alternate control bindings.
    pub control_swap: bool,
    pub window_title: String,
    /// Window title while the window is hidden and the stream paused.
    pub paused_title: String,
    pub quality_step: u32,
    pub frame_rate_step: u32,
    /// Log each stats window at info level.
    pub log_stats: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:10034/ws".to_string(),
            quality: 60,
            frame_rate: 60,
            render_mode: RenderMode::Image,
            control_swap: false,
            window_title: "Stream Viewer".to_string(),
            paused_title: "Paused".to_string(),
            quality_step: 5,
            frame_rate_step: 5,
            log_stats: false,
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> StreamResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> StreamResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).inspect_err(|e| {
            log::error!("Failed to read viewer config {}: {}", path.display(), e);
        })?;
        Self::from_json_str(&json)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_quality(mut self, quality: u32) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_render_mode(mut self, render_mode: RenderMode) -> Self {
        self.render_mode = render_mode;
        self
    }

    pub fn with_control_swap(mut self, control_swap: bool) -> Self {
        self.control_swap = control_swap;
        self
    }

    pub fn with_window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = title.into();
        self
    }

    pub fn with_log_stats(mut self, log_stats: bool) -> Self {
        self.log_stats = log_stats;
        self
    }

    /// Initial UI state for this config.
    pub fn initial_state(&self) -> ViewerState {
        ViewerState {
            render_mode: self.render_mode,
            control_swap: self.control_swap,
            quality: self.quality.clamp(QUALITY_RANGE.0, QUALITY_RANGE.1),
            frame_rate: self.frame_rate.clamp(FRAME_RATE_RANGE.0, FRAME_RATE_RANGE.1),
            title: self.window_title.clone(),
            paused_title: self.paused_title.clone(),
            ..Default::default()
        }
    }
}
