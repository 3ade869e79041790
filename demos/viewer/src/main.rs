use std::path::PathBuf;

use bevy::prelude::*;
use bevy_stream_viewer::{RenderMode, StreamViewerPlugin, ViewerConfig};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "stream-viewer", version, about)]
struct Args {
    /// Stream server URL.
    ///
    /// Environment variable: `STREAM_VIEWER_URL`.
    #[arg(long, env = "STREAM_VIEWER_URL")]
    url: Option<String>,

    /// JSON config file; command-line flags override its values.
    ///
    /// Environment variable: `STREAM_VIEWER_CONFIG`.
    #[arg(long, env = "STREAM_VIEWER_CONFIG")]
    config: Option<PathBuf>,

    /// Initial quality value.
    #[arg(long)]
    quality: Option<u32>,

    /// Initial frame rate.
    #[arg(long)]
    fps: Option<u32>,

    /// Paint frames into a persistent canvas texture.
    #[arg(long)]
    canvas: bool,

    /// Start with the alternate control bindings.
    #[arg(long)]
    alt_controls: bool,

    /// Log stream stats every second.
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: Args) -> ViewerConfig {
    let mut config = match args.config {
        Some(path) => ViewerConfig::from_path(&path).unwrap_or_else(|e| {
            eprintln!("Ignoring config {}: {}", path.display(), e);
            ViewerConfig::default()
        }),
        None => ViewerConfig::default(),
    };

    if let Some(url) = args.url {
        config = config.with_url(url);
    }
    if let Some(quality) = args.quality {
        config = config.with_quality(quality);
    }
    if let Some(fps) = args.fps {
        config = config.with_frame_rate(fps);
    }
    if args.canvas {
        config = config.with_render_mode(RenderMode::Canvas);
    }
    if args.alt_controls {
        config = config.with_control_swap(true);
    }
    if args.verbose {
        config = config.with_log_stats(true);
    }
    config
}

fn main() {
    let config = load_config(Args::parse());

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: config.window_title.clone(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(StreamViewerPlugin::new(config))
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn(Camera2d);
}
