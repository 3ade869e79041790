//! Viewer UI flags and their transitions.

use bevy::prelude::*;
use serde::Deserialize;

/// Lower and upper bounds for the quality stepper.
pub const QUALITY_RANGE: (u32, u32) = (1, 1000);
/// Lower and upper bounds for the frame-rate stepper.
pub const FRAME_RATE_RANGE: (u32, u32) = (1, 240);

/// How decoded frames reach the screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Every frame becomes a fresh texture that replaces the previous one.
    #[default]
    Image,
    /// Frames are painted into one persistent texture.
    Canvas,
}

/// Which glyph the pause button shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PauseIcon {
    Pause,
    Play,
}

#[derive(Resource, Clone, Debug)]
pub struct ViewerState {
    /// Frames are forwarded to the decoder and drawn.
    pub drawing: bool,
    pub overlay_visible: bool,
    pub pause_icon: PauseIcon,
    pub menu_open: bool,
    pub render_mode: RenderMode,
    /// Alternate control bindings are active.
    pub control_swap: bool,
    pub compression_on: bool,
    pub fullscreen: bool,
    pub pointer_locked: bool,
    pub quality: u32,
    pub frame_rate: u32,
    pub title: String,
    pub paused_title: String,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            drawing: true,
            overlay_visible: false,
            pause_icon: PauseIcon::Pause,
            menu_open: false,
            render_mode: RenderMode::Image,
            control_swap: false,
            compression_on: false,
            fullscreen: false,
            pointer_locked: false,
            quality: 60,
            frame_rate: 60,
            title: "Stream Viewer".to_string(),
            paused_title: "Paused".to_string(),
        }
    }
}

impl ViewerState {
    pub fn toggle_pause(&mut self) {
        if self.pause_icon == PauseIcon::Pause {
            self.pause_icon = PauseIcon::Play;
            self.drawing = false;
            self.overlay_visible = true;
        } else {
            self.pause_icon = PauseIcon::Pause;
            self.drawing = true;
            self.overlay_visible = false;
        }
    }

    /// Click on the pause overlay. Returns whether it was showing.
    pub fn dismiss_overlay(&mut self) -> bool {
        if !self.overlay_visible {
            return false;
        }
        self.overlay_visible = false;
        self.drawing = true;
        self.pause_icon = PauseIcon::Pause;
        true
    }

    /// The window was hidden or shown. Returns the window title to apply, if any.
    ///
    /// Showing the window resumes drawing but leaves the overlay up, so input
    /// stays blocked until the overlay is dismissed.
    pub fn visibility_changed(&mut self, hidden: bool) -> Option<String> {
        if hidden {
            if !self.drawing {
                return None;
            }
            self.pause_icon = PauseIcon::Play;
            self.drawing = false;
            self.overlay_visible = true;
            Some(self.paused_title.clone())
        } else {
            self.drawing = true;
            Some(self.title.clone())
        }
    }

    pub fn fullscreen_changed(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
        if !fullscreen {
            self.pause_icon = PauseIcon::Play;
            self.overlay_visible = true;
        }
    }

    /// Keys are only forwarded while drawing, unobstructed and fullscreen.
    pub fn key_forwarding(&self) -> bool {
        self.drawing && !self.overlay_visible && self.fullscreen
    }

    pub fn mouse_forwarding(&self) -> bool {
        self.pointer_locked
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    pub fn toggle_render_mode(&mut self) {
        self.render_mode = match self.render_mode {
            RenderMode::Image => RenderMode::Canvas,
            RenderMode::Canvas => RenderMode::Image,
        };
    }

    pub fn toggle_control_swap(&mut self) {
        self.control_swap = !self.control_swap;
    }

    pub fn toggle_compression(&mut self) {
        self.compression_on = !self.compression_on;
    }

    pub fn adjust_quality(&mut self, step: i32) {
        self.quality = step_within(self.quality, step, QUALITY_RANGE);
    }

    pub fn adjust_frame_rate(&mut self, step: i32) {
        self.frame_rate = step_within(self.frame_rate, step, FRAME_RATE_RANGE);
    }

    pub fn canvas_label(&self) -> &'static str {
        match self.render_mode {
            RenderMode::Canvas => "Canvas : on",
            RenderMode::Image => "Canvas : off",
        }
    }

    pub fn compression_label(&self) -> &'static str {
        if self.compression_on {
            "Compression : On"
        } else {
            "Compression : Off"
        }
    }

    pub fn controls_label(&self) -> &'static str {
        if self.control_swap {
            "Controls : alternate"
        } else {
            "Controls : default"
        }
    }

    pub fn pause_label(&self) -> &'static str {
        match self.pause_icon {
            PauseIcon::Pause => "||",
            PauseIcon::Play => ">",
        }
    }
}

fn step_within(value: u32, step: i32, (min, max): (u32, u32)) -> u32 {
    value.saturating_add_signed(step).clamp(min, max)
}
