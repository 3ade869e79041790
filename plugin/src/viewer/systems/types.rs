use std::ops::Deref;
use std::time::Instant;

use bevy::prelude::*;

use crate::stream::{FrameStats, StreamClient, StreamEventReceiver, StreamLink};

/// Clickable area holding the stream; clicking it captures the pointer
#[derive(Component)]
pub struct StreamContainer;

/// Image-mode display node
#[derive(Component)]
pub struct StreamImage;

/// Canvas-mode display node
#[derive(Component)]
pub struct StreamCanvas;

#[derive(Component)]
pub struct PauseButton;

/// Full-window overlay shown while paused
#[derive(Component)]
pub struct PauseOverlay;

#[derive(Component)]
pub struct MenuTab;

#[derive(Component)]
pub struct MenuPanel;

/// What a menu button does when pressed
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    QualityDown,
    QualityUp,
    SendQuality,
    FrameRateDown,
    FrameRateUp,
    SendFrameRate,
    ToggleControls,
    ToggleCanvas,
    ToggleCompression,
}

/// Text nodes whose content tracks viewer state or stats
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerLabel {
    Fps,
    DrawnFps,
    Bandwidth,
    FrameSize,
    RenderTime,
    Quality,
    FrameRate,
    Controls,
    Canvas,
    Compression,
    Pause,
}

/// Bevy Resource wrapper for the socket handle.
#[derive(Resource, Clone)]
pub struct StreamLinkResource(pub StreamLink);

impl Deref for StreamLinkResource {
    type Target = StreamLink;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Keeps the socket and decoder threads alive.
#[derive(Resource)]
pub struct StreamClientResource(pub StreamClient);

#[derive(Resource)]
pub struct StreamEvents(pub StreamEventReceiver);

#[derive(Resource)]
pub struct StreamStats {
    pub counters: FrameStats,
    /// Log every snapshot at info level instead of debug
    pub log_snapshots: bool,
}

impl StreamStats {
    pub fn new(log_snapshots: bool) -> Self {
        Self {
            counters: FrameStats::new(Instant::now()),
            log_snapshots,
        }
    }
}

/// The persistent canvas-mode texture, created from the first frame
#[derive(Resource, Default)]
pub struct CanvasTexture {
    pub handle: Option<Handle<Image>>,
}

/// Stepper increments from the config
#[derive(Resource, Clone, Copy, Debug)]
pub struct StepSizes {
    pub quality: i32,
    pub frame_rate: i32,
}
