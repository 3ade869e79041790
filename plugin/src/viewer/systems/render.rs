use std::time::Instant;

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use crate::stream::{DecodedFrame, StreamEvent};
use crate::viewer::state::{RenderMode, ViewerState};
use crate::viewer::systems::types::*;

/// Drain socket and decoder events, then present the newest frame
pub fn poll_stream_events(
    events: Option<Res<StreamEvents>>,
    state: Res<ViewerState>,
    mut stats: ResMut<StreamStats>,
    mut images: ResMut<Assets<Image>>,
    mut canvas: ResMut<CanvasTexture>,
    mut image_nodes: Query<
        (&mut ImageNode, &mut Visibility),
        (With<StreamImage>, Without<StreamCanvas>),
    >,
    mut canvas_nodes: Query<
        (&mut ImageNode, &mut Visibility),
        (With<StreamCanvas>, Without<StreamImage>),
    >,
) {
    let Some(events) = events else {
        return;
    };

    // Frames decoded since the last tick; only the newest one gets drawn
    let mut newest: Option<DecodedFrame> = None;

    while let Some(event) = events.0.try_recv() {
        match event {
            StreamEvent::Received(len) => stats.counters.record_received(len),
            StreamEvent::Frame(frame) => newest = Some(frame),
            StreamEvent::Opened => log::info!("Stream opened"),
            StreamEvent::Text(text) => log::debug!("Server says: {}", text),
            StreamEvent::Error(message) => log::error!("Stream error: {}", message),
            StreamEvent::Closed { code, reason } => {
                log::info!("Stream closed: {} {}", code, reason)
            }
        }
    }

    let Some(frame) = newest else {
        return;
    };
    let received_at = frame.received_at;

    match state.render_mode {
        RenderMode::Image => {
            // Replacing the handle releases the previous frame's texture
            let handle = images.add(frame_to_image(frame, RenderAssetUsages::RENDER_WORLD));
            for (mut node, mut visibility) in &mut image_nodes {
                node.image = handle.clone();
                *visibility = Visibility::Inherited;
            }
        }
        RenderMode::Canvas => {
            let existing = canvas
                .handle
                .as_ref()
                .filter(|handle| images.contains(*handle))
                .cloned();

            match existing {
                Some(handle) => {
                    if let Some(image) = images.get_mut(&handle) {
                        let size = image.size();
                        if let Some(data) = image.data.as_mut() {
                            blit_rgba(data, size.x, size.y, &frame.rgba, frame.width, frame.height);
                        }
                    }
                }
                None => {
                    log::info!("Creating {}x{} canvas", frame.width, frame.height);
                    let handle = images.add(frame_to_image(
                        frame,
                        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
                    ));
                    for (mut node, mut visibility) in &mut canvas_nodes {
                        node.image = handle.clone();
                        *visibility = Visibility::Inherited;
                    }
                    canvas.handle = Some(handle);
                }
            }
        }
    }

    stats.counters.record_drawn(received_at.elapsed());
}

/// Roll the per-second counters and rewrite the stats labels
pub fn refresh_stats(
    mut stats: ResMut<StreamStats>,
    mut labels: Query<(&ViewerLabel, &mut Text)>,
) {
    let Some(snapshot) = stats.counters.roll(Instant::now()) else {
        return;
    };

    if stats.log_snapshots {
        log::info!("Stream stats: {}", snapshot);
    } else {
        log::debug!("Stream stats: {}", snapshot);
    }

    for (label, mut text) in &mut labels {
        let content = match label {
            ViewerLabel::Fps => snapshot.fps_label(),
            ViewerLabel::DrawnFps => snapshot.drawn_label(),
            ViewerLabel::Bandwidth => snapshot.bandwidth_label(),
            ViewerLabel::FrameSize => snapshot.frame_size_label(),
            ViewerLabel::RenderTime => snapshot.render_time_label(),
            _ => continue,
        };
        text.0 = content;
    }
}

/// Show the display node that matches the render mode
pub fn apply_render_mode(
    state: Res<ViewerState>,
    mut image_nodes: Query<&mut Node, (With<StreamImage>, Without<StreamCanvas>)>,
    mut canvas_nodes: Query<&mut Node, (With<StreamCanvas>, Without<StreamImage>)>,
) {
    if !state.is_changed() {
        return;
    }

    let (image_display, canvas_display) = match state.render_mode {
        RenderMode::Image => (Display::Flex, Display::None),
        RenderMode::Canvas => (Display::None, Display::Flex),
    };
    for mut node in &mut image_nodes {
        if node.display != image_display {
            node.display = image_display;
        }
    }
    for mut node in &mut canvas_nodes {
        if node.display != canvas_display {
            node.display = canvas_display;
        }
    }
}

fn frame_to_image(frame: DecodedFrame, usage: RenderAssetUsages) -> Image {
    Image::new(
        Extent3d {
            width: frame.width,
            height: frame.height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        frame.rgba,
        TextureFormat::Rgba8UnormSrgb,
        usage,
    )
}

/// Copy an RGBA8 frame into an RGBA8 surface at the origin, clipping to the
/// smaller of the two.
pub fn blit_rgba(
    dst: &mut [u8],
    dst_width: u32,
    dst_height: u32,
    src: &[u8],
    src_width: u32,
    src_height: u32,
) {
    let columns = dst_width.min(src_width) as usize;
    let rows = dst_height.min(src_height) as usize;
    let row_bytes = columns * 4;
    let dst_stride = dst_width as usize * 4;
    let src_stride = src_width as usize * 4;

    for row in 0..rows {
        let dst_start = row * dst_stride;
        let src_start = row * src_stride;
        let (Some(dst_row), Some(src_row)) = (
            dst.get_mut(dst_start..dst_start + row_bytes),
            src.get(src_start..src_start + row_bytes),
        ) else {
            log::warn!("Frame buffer shorter than its dimensions, stopping blit");
            return;
        };
        dst_row.copy_from_slice(src_row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::STATS_WINDOW;
    use crossbeam_channel::Sender;

    fn frame(width: u32, height: u32, value: u8) -> DecodedFrame {
        DecodedFrame {
            width,
            height,
            rgba: vec![value; (width * height * 4) as usize],
            encoded_len: 100,
            received_at: Instant::now(),
        }
    }

    fn render_app(render_mode: RenderMode) -> (App, Sender<StreamEvent>) {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .insert_resource(ViewerState {
                render_mode,
                ..default()
            })
            .insert_resource(StreamEvents(events_rx.into()))
            .insert_resource(StreamStats::new(false))
            .init_resource::<CanvasTexture>()
            .add_systems(Update, poll_stream_events);
        app.world_mut()
            .spawn((StreamImage, ImageNode::default(), Visibility::Hidden));
        app.world_mut()
            .spawn((StreamCanvas, ImageNode::default(), Visibility::Hidden));
        (app, events_tx)
    }

    fn shown_image<T: Component>(app: &mut App) -> (Handle<Image>, Visibility) {
        let world = app.world_mut();
        let mut query = world.query_filtered::<(&ImageNode, &Visibility), With<T>>();
        let (node, visibility) = query.single(world).unwrap();
        (node.image.clone(), *visibility)
    }

    fn image_size(app: &App, handle: &Handle<Image>) -> UVec2 {
        app.world().resource::<Assets<Image>>().get(handle).unwrap().size()
    }

    #[test]
    fn test_image_mode_draws_newest_frame() {
        let (mut app, events) = render_app(RenderMode::Image);
        for width in [2, 4] {
            events.send(StreamEvent::Received(100)).unwrap();
            events.send(StreamEvent::Frame(frame(width, 2, 7))).unwrap();
        }
        app.update();

        let (first, visibility) = shown_image::<StreamImage>(&mut app);
        assert_eq!(visibility, Visibility::Inherited);
        assert_eq!(image_size(&app, &first), UVec2::new(4, 2));

        // Both frames count as received, only the newest was drawn
        let snapshot = app
            .world_mut()
            .resource_mut::<StreamStats>()
            .counters
            .roll(Instant::now() + STATS_WINDOW)
            .unwrap();
        assert_eq!(snapshot.received_fps, 2);
        assert_eq!(snapshot.drawn_fps, 1);

        events.send(StreamEvent::Frame(frame(8, 2, 9))).unwrap();
        app.update();
        let (second, _) = shown_image::<StreamImage>(&mut app);
        assert_ne!(first, second);
        assert_eq!(image_size(&app, &second), UVec2::new(8, 2));
    }

    #[test]
    fn test_canvas_mode_reuses_texture() {
        let (mut app, events) = render_app(RenderMode::Canvas);
        events.send(StreamEvent::Frame(frame(4, 4, 10))).unwrap();
        app.update();

        let canvas = app.world().resource::<CanvasTexture>().handle.clone().unwrap();
        let (shown, visibility) = shown_image::<StreamCanvas>(&mut app);
        assert_eq!(shown, canvas);
        assert_eq!(visibility, Visibility::Inherited);

        // A smaller frame paints the top-left corner of the same texture
        events.send(StreamEvent::Frame(frame(2, 2, 200))).unwrap();
        app.update();

        assert_eq!(
            app.world().resource::<CanvasTexture>().handle.as_ref(),
            Some(&canvas)
        );
        let images = app.world().resource::<Assets<Image>>();
        let image = images.get(&canvas).unwrap();
        assert_eq!(image.size(), UVec2::new(4, 4));
        let data = image.data.as_ref().unwrap();
        assert_eq!(data[0], 200);
        assert_eq!(data[(3 * 4 + 3) * 4], 10);
    }

    #[test]
    fn test_events_without_frames_draw_nothing() {
        let (mut app, events) = render_app(RenderMode::Image);
        events.send(StreamEvent::Opened).unwrap();
        events.send(StreamEvent::Received(100)).unwrap();
        events.send(StreamEvent::Text("hello".into())).unwrap();
        app.update();

        let (_, visibility) = shown_image::<StreamImage>(&mut app);
        assert_eq!(visibility, Visibility::Hidden);
        assert!(app.world().resource::<CanvasTexture>().handle.is_none());
    }

    fn surface(width: u32, height: u32, value: u8) -> Vec<u8> {
        vec![value; (width * height * 4) as usize]
    }

    #[test]
    fn test_blit_same_size() {
        let mut dst = surface(3, 2, 0);
        let src = surface(3, 2, 7);
        blit_rgba(&mut dst, 3, 2, &src, 3, 2);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_blit_clips_larger_frame() {
        let mut dst = surface(2, 2, 0);
        let mut src = surface(4, 3, 1);
        // Mark the pixel at (1, 1) of the source
        src[(1 * 4 + 1) * 4] = 99;
        blit_rgba(&mut dst, 2, 2, &src, 4, 3);
        assert_eq!(dst[(1 * 2 + 1) * 4], 99);
        assert!(dst.iter().all(|&b| b == 1 || b == 99));
    }

    #[test]
    fn test_blit_smaller_frame_keeps_rest() {
        let mut dst = surface(4, 4, 0);
        let src = surface(2, 1, 5);
        blit_rgba(&mut dst, 4, 4, &src, 2, 1);
        assert!(dst[..8].iter().all(|&b| b == 5));
        assert!(dst[8..].iter().all(|&b| b == 0));
    }
}
