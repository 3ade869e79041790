use bevy::input::ButtonState;
use bevy::input::keyboard::KeyboardInput;
use bevy::input::mouse::{MouseButtonInput, MouseMotion};
use bevy::prelude::*;
use bevy::window::{
    CursorGrabMode, CursorOptions, MonitorSelection, PrimaryWindow, WindowFocused, WindowMode,
    WindowOccluded, WindowResized,
};

use crate::stream::keymap::remote_key;
use crate::stream::{RemoteButton, ViewerCommand};
use crate::viewer::state::ViewerState;
use crate::viewer::systems::types::*;

/// Leaves fullscreen and frees the pointer. Never forwarded to the server.
pub const RELEASE_KEY: KeyCode = KeyCode::F12;

/// The W3C `KeyboardEvent.code` name for a key, as the server expects it.
pub fn key_code_name(key_code: KeyCode) -> Option<String> {
    match key_code {
        KeyCode::Unidentified(_) => None,
        KeyCode::SuperLeft => Some("MetaLeft".to_string()),
        KeyCode::SuperRight => Some("MetaRight".to_string()),
        // Bevy's key names already follow the W3C code names
        other => Some(format!("{:?}", other)),
    }
}

/// Build the command for a key event, if it should be forwarded at all.
pub fn key_command(state: &ViewerState, key_code: KeyCode, pressed: bool) -> Option<ViewerCommand> {
    if key_code == RELEASE_KEY || !state.key_forwarding() {
        return None;
    }
    let name = key_code_name(key_code)?;
    let code = remote_key(&name, state.control_swap)?;
    Some(ViewerCommand::Key {
        pressed,
        code: code.to_string(),
    })
}

/// Add `delta` to the fractional remainder and split off whole pixels.
pub fn split_motion(carry: Vec2, delta: Vec2) -> (IVec2, Vec2) {
    let total = carry + delta;
    let whole = total.trunc();
    (whole.as_ivec2(), total - whole)
}

fn send(link: &StreamLinkResource, command: ViewerCommand) {
    if let Err(e) = link.send(&command) {
        log::debug!("Dropping {}: {}", command, e);
    }
}

/// Forward key presses and releases to the server
pub fn forward_keyboard(
    mut keyboard_events: MessageReader<KeyboardInput>,
    state: Res<ViewerState>,
    link: Option<Res<StreamLinkResource>>,
) {
    let Some(link) = link else {
        return;
    };

    for event in keyboard_events.read() {
        let pressed = event.state == ButtonState::Pressed;
        let Some(command) = key_command(&state, event.key_code, pressed) else {
            continue;
        };
        log::trace!("Keyboard event: key={:?} -> {}", event.key_code, command);
        send(&link, command);
    }
}

/// Forward relative pointer movement while the pointer is captured
pub fn forward_mouse_motion(
    mut motion_events: MessageReader<MouseMotion>,
    state: Res<ViewerState>,
    link: Option<Res<StreamLinkResource>>,
    mut carry: Local<Vec2>,
) {
    let delta: Vec2 = motion_events.read().map(|motion| motion.delta).sum();

    if !state.mouse_forwarding() {
        *carry = Vec2::ZERO;
        return;
    }
    let Some(link) = link else {
        return;
    };

    let (whole, rest) = split_motion(*carry, delta);
    *carry = rest;
    if whole != IVec2::ZERO {
        send(
            &link,
            ViewerCommand::MouseMove {
                dx: whole.x,
                dy: whole.y,
            },
        );
    }
}

/// Forward left and right button presses while the pointer is captured
pub fn forward_mouse_buttons(
    mut button_events: MessageReader<MouseButtonInput>,
    state: Res<ViewerState>,
    link: Option<Res<StreamLinkResource>>,
) {
    let Some(link) = link else {
        return;
    };

    for event in button_events.read() {
        if !state.mouse_forwarding() {
            continue;
        }
        let button = match event.button {
            MouseButton::Left => RemoteButton::Left,
            MouseButton::Right => RemoteButton::Right,
            _ => continue,
        };
        send(
            &link,
            ViewerCommand::MouseButton {
                pressed: event.state == ButtonState::Pressed,
                button,
            },
        );
    }
}

/// Clicking the stream captures the pointer and goes fullscreen
pub fn capture_on_click(
    query: Query<&Interaction, (Changed<Interaction>, With<StreamContainer>)>,
    mut windows: Query<(&mut Window, &mut CursorOptions), With<PrimaryWindow>>,
    mut state: ResMut<ViewerState>,
) {
    if !query.iter().any(|interaction| *interaction == Interaction::Pressed) {
        return;
    }
    let Ok((mut window, mut cursor)) = windows.single_mut() else {
        return;
    };

    cursor.grab_mode = CursorGrabMode::Locked;
    cursor.visible = false;
    window.mode = WindowMode::BorderlessFullscreen(MonitorSelection::Current);
    state.pointer_locked = true;
    log::info!("Pointer captured");
}

/// The release key drops fullscreen and frees the pointer
pub fn release_capture(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut windows: Query<(&mut Window, &mut CursorOptions), With<PrimaryWindow>>,
    mut state: ResMut<ViewerState>,
) {
    if !keyboard.just_pressed(RELEASE_KEY) {
        return;
    }
    let Ok((mut window, mut cursor)) = windows.single_mut() else {
        return;
    };

    cursor.grab_mode = CursorGrabMode::None;
    cursor.visible = true;
    window.mode = WindowMode::Windowed;
    state.pointer_locked = false;
    log::info!("Pointer released");
}

/// Losing focus loses the pointer capture
pub fn release_on_focus_loss(
    mut focus_events: MessageReader<WindowFocused>,
    mut windows: Query<&mut CursorOptions, With<PrimaryWindow>>,
    mut state: ResMut<ViewerState>,
) {
    let lost_focus = focus_events.read().any(|event| !event.focused);
    if !lost_focus || !state.pointer_locked {
        return;
    }

    if let Ok(mut cursor) = windows.single_mut() {
        cursor.grab_mode = CursorGrabMode::None;
        cursor.visible = true;
    }
    state.pointer_locked = false;
    log::info!("Pointer released (focus lost)");
}

/// Follow fullscreen enter/exit
pub fn track_window_mode(
    windows: Query<&Window, (With<PrimaryWindow>, Changed<Window>)>,
    mut state: ResMut<ViewerState>,
) {
    let Ok(window) = windows.single() else {
        return;
    };

    let fullscreen = !matches!(window.mode, WindowMode::Windowed);
    if fullscreen == state.fullscreen {
        return;
    }

    state.fullscreen_changed(fullscreen);
    if fullscreen {
        log::info!("Keyboard locked.");
    } else {
        log::info!("Left fullscreen, pausing input");
    }
}

/// What the window system last reported about the primary window.
///
/// Occlusion is not reported everywhere (X11 never sends it), so losing focus
/// and minimizing count as hidden too.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowExposure {
    pub occluded: bool,
    pub unfocused: bool,
    pub minimized: bool,
}

impl WindowExposure {
    pub fn hidden(&self) -> bool {
        self.occluded || self.unfocused || self.minimized
    }
}

/// Hidden windows pause the stream
pub fn track_visibility(
    mut occluded_events: MessageReader<WindowOccluded>,
    mut focus_events: MessageReader<WindowFocused>,
    mut resize_events: MessageReader<WindowResized>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut state: ResMut<ViewerState>,
    mut exposure: Local<WindowExposure>,
) {
    let was_hidden = exposure.hidden();
    for event in occluded_events.read() {
        exposure.occluded = event.occluded;
    }
    for event in focus_events.read() {
        exposure.unfocused = !event.focused;
    }
    for event in resize_events.read() {
        exposure.minimized = event.width <= 0.0 || event.height <= 0.0;
    }

    let hidden = exposure.hidden();
    if hidden == was_hidden {
        return;
    }
    log::debug!("Window {}", if hidden { "hidden" } else { "visible" });

    let Some(title) = state.visibility_changed(hidden) else {
        return;
    };
    if let Ok(mut window) = windows.single_mut() {
        window.title = title;
    }
}

/// Keep the socket's frame gate in step with the pause state
pub fn sync_drawing(state: Res<ViewerState>, link: Option<Res<StreamLinkResource>>) {
    let Some(link) = link else {
        return;
    };
    if state.is_changed() && link.is_drawing() != state.drawing {
        log::debug!("Frame delivery {}", if state.drawing { "resumed" } else { "paused" });
        link.set_drawing(state.drawing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamLink;

    fn visibility_app() -> (App, Entity) {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_message::<WindowOccluded>()
            .add_message::<WindowFocused>()
            .add_message::<WindowResized>()
            .insert_resource(ViewerState::default())
            .add_systems(Update, track_visibility);
        let window = app
            .world_mut()
            .spawn((
                Window {
                    title: "Stream Viewer".into(),
                    ..default()
                },
                PrimaryWindow,
            ))
            .id();
        (app, window)
    }

    fn window_title(app: &App, window: Entity) -> String {
        app.world().get::<Window>(window).unwrap().title.clone()
    }

    fn forwarding_state() -> ViewerState {
        let mut state = ViewerState::default();
        state.fullscreen_changed(true);
        state
    }

    #[test]
    fn test_key_code_name() {
        assert_eq!(key_code_name(KeyCode::KeyA).as_deref(), Some("KeyA"));
        assert_eq!(key_code_name(KeyCode::ArrowUp).as_deref(), Some("ArrowUp"));
        assert_eq!(key_code_name(KeyCode::ShiftLeft).as_deref(), Some("ShiftLeft"));
        assert_eq!(key_code_name(KeyCode::SuperRight).as_deref(), Some("MetaRight"));
    }

    #[test]
    fn test_key_command_gating() {
        let mut state = ViewerState::default();
        // Not fullscreen yet
        assert_eq!(key_command(&state, KeyCode::KeyW, true), None);

        state.fullscreen_changed(true);
        assert_eq!(
            key_command(&state, KeyCode::KeyW, true),
            Some(ViewerCommand::Key {
                pressed: true,
                code: "KeyW".into()
            })
        );

        state.toggle_pause();
        assert_eq!(key_command(&state, KeyCode::KeyW, false), None);
    }

    #[test]
    fn test_key_command_remap() {
        let mut state = forwarding_state();
        state.toggle_control_swap();
        assert_eq!(
            key_command(&state, KeyCode::Space, false).map(|c| c.to_string()),
            Some("2+0+ShiftLeft".to_string())
        );
        // Unmapped keys are dropped while the alternate layout is on
        assert_eq!(key_command(&state, KeyCode::Enter, true), None);
    }

    #[test]
    fn test_release_key_never_forwarded() {
        let state = forwarding_state();
        assert_eq!(key_command(&state, RELEASE_KEY, true), None);
    }

    #[test]
    fn test_pause_closes_frame_gate() {
        let (link, _outgoing) = StreamLink::loopback();
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(ViewerState::default())
            .insert_resource(StreamLinkResource(link.clone()))
            .add_systems(Update, sync_drawing);
        app.update();
        assert!(link.is_drawing());

        app.world_mut().resource_mut::<ViewerState>().toggle_pause();
        app.update();
        assert!(!link.is_drawing());

        app.world_mut().resource_mut::<ViewerState>().dismiss_overlay();
        app.update();
        assert!(link.is_drawing());
    }

    #[test]
    fn test_focus_loss_pauses() {
        let (mut app, window) = visibility_app();
        app.world_mut().write_message(WindowFocused {
            window,
            focused: false,
        });
        app.update();
        assert!(!app.world().resource::<ViewerState>().drawing);
        assert_eq!(window_title(&app, window), "Paused");

        app.world_mut().write_message(WindowFocused {
            window,
            focused: true,
        });
        app.update();
        let state = app.world().resource::<ViewerState>();
        assert!(state.drawing);
        assert!(state.overlay_visible);
        assert_eq!(window_title(&app, window), "Stream Viewer");
    }

    #[test]
    fn test_minimize_pauses_until_restored() {
        let (mut app, window) = visibility_app();
        app.world_mut().write_message(WindowResized {
            window,
            width: 0.0,
            height: 0.0,
        });
        app.update();
        assert!(!app.world().resource::<ViewerState>().drawing);

        // Regaining focus while still minimized changes nothing
        app.world_mut().write_message(WindowFocused {
            window,
            focused: true,
        });
        app.update();
        assert!(!app.world().resource::<ViewerState>().drawing);

        app.world_mut().write_message(WindowResized {
            window,
            width: 1280.0,
            height: 720.0,
        });
        app.update();
        assert!(app.world().resource::<ViewerState>().drawing);
        assert_eq!(window_title(&app, window), "Stream Viewer");
    }

    #[test]
    fn test_exposure_hidden() {
        let mut exposure = WindowExposure::default();
        assert!(!exposure.hidden());
        exposure.occluded = true;
        assert!(exposure.hidden());
        exposure.occluded = false;
        exposure.unfocused = true;
        assert!(exposure.hidden());
    }

    #[test]
    fn test_split_motion_carries_fraction() {
        let (whole, rest) = split_motion(Vec2::ZERO, Vec2::new(2.75, -1.5));
        assert_eq!(whole, IVec2::new(2, -1));
        let (whole, rest) = split_motion(rest, Vec2::new(0.25, -0.5));
        assert_eq!(whole, IVec2::new(1, -1));
        assert_eq!(rest, Vec2::ZERO);
    }
}
