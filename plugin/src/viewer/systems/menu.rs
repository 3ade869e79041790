use bevy::ecs::hierarchy::ChildSpawnerCommands;
use bevy::prelude::*;
use bevy::ui::FocusPolicy;

use crate::stream::ViewerCommand;
use crate::viewer::state::ViewerState;
use crate::viewer::systems::types::*;

const MENU_WIDTH: f32 = 280.0;
const TAB_WIDTH: f32 = 36.0;

const PANEL_COLOR: Color = Color::srgba(0.08, 0.08, 0.1, 0.92);
const BUTTON_COLOR: Color = Color::srgb(0.2, 0.2, 0.25);
const OVERLAY_COLOR: Color = Color::srgba(0.0, 0.0, 0.0, 0.6);

fn text_bundle(content: String, size: f32) -> impl Bundle {
    (
        Text::new(content),
        TextFont::from_font_size(size),
        TextColor(Color::WHITE),
    )
}

fn spawn_button(
    parent: &mut ChildSpawnerCommands,
    action: MenuAction,
    label: &str,
    tracked: Option<ViewerLabel>,
) {
    parent
        .spawn((
            Button,
            action,
            Node {
                padding: UiRect::axes(Val::Px(8.0), Val::Px(4.0)),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(BUTTON_COLOR),
        ))
        .with_children(|button| {
            let mut text = button.spawn(text_bundle(label.to_string(), 15.0));
            if let Some(tracked) = tracked {
                text.insert(tracked);
            }
        });
}

fn spawn_stepper(
    parent: &mut ChildSpawnerCommands,
    title: &str,
    value: u32,
    label: ViewerLabel,
    (down, up, submit): (MenuAction, MenuAction, MenuAction),
) {
    parent
        .spawn(Node {
            flex_direction: FlexDirection::Row,
            align_items: AlignItems::Center,
            column_gap: Val::Px(6.0),
            ..default()
        })
        .with_children(|row| {
            row.spawn(text_bundle(title.to_string(), 15.0));
            spawn_button(row, down, "-", None);
            row.spawn((text_bundle(value.to_string(), 15.0), label));
            spawn_button(row, up, "+", None);
            spawn_button(row, submit, "Set", None);
        });
}

/// Spawn the stream view, pause controls and the slide-out menu
pub fn setup_viewer_ui(mut commands: Commands, state: Res<ViewerState>) {
    // Stream area
    commands
        .spawn((
            StreamContainer,
            Button,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(Color::BLACK),
        ))
        .with_children(|container| {
            container.spawn((
                StreamImage,
                ImageNode::default(),
                Node {
                    max_width: Val::Percent(100.0),
                    max_height: Val::Percent(100.0),
                    ..default()
                },
                Visibility::Hidden,
            ));
            container.spawn((
                StreamCanvas,
                ImageNode::default(),
                Node {
                    display: Display::None,
                    max_width: Val::Percent(100.0),
                    max_height: Val::Percent(100.0),
                    ..default()
                },
                Visibility::Hidden,
            ));
        });

    // Pause button
    commands
        .spawn((
            PauseButton,
            Button,
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(12.0),
                right: Val::Px(12.0),
                width: Val::Px(40.0),
                height: Val::Px(40.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(BUTTON_COLOR),
            GlobalZIndex(5),
        ))
        .with_children(|button| {
            button.spawn((text_bundle(state.pause_label().to_string(), 20.0), ViewerLabel::Pause));
        });

    // Menu tab
    commands
        .spawn((
            MenuTab,
            Button,
            Node {
                position_type: PositionType::Absolute,
                top: Val::Percent(40.0),
                left: Val::Px(0.0),
                width: Val::Px(TAB_WIDTH),
                height: Val::Px(80.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(PANEL_COLOR),
            GlobalZIndex(5),
        ))
        .with_children(|tab| {
            tab.spawn(text_bundle("=".to_string(), 20.0));
        });

    // Menu panel
    commands
        .spawn((
            MenuPanel,
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(0.0),
                left: Val::Px(-MENU_WIDTH),
                width: Val::Px(MENU_WIDTH),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                padding: UiRect::all(Val::Px(12.0)),
                row_gap: Val::Px(10.0),
                ..default()
            },
            BackgroundColor(PANEL_COLOR),
            GlobalZIndex(5),
            // Keep clicks on the panel from reaching the stream area
            Interaction::default(),
            FocusPolicy::Block,
        ))
        .with_children(|panel| {
            spawn_stepper(
                panel,
                "Quality",
                state.quality,
                ViewerLabel::Quality,
                (MenuAction::QualityDown, MenuAction::QualityUp, MenuAction::SendQuality),
            );
            spawn_stepper(
                panel,
                "FPS",
                state.frame_rate,
                ViewerLabel::FrameRate,
                (
                    MenuAction::FrameRateDown,
                    MenuAction::FrameRateUp,
                    MenuAction::SendFrameRate,
                ),
            );
            spawn_button(
                panel,
                MenuAction::ToggleControls,
                state.controls_label(),
                Some(ViewerLabel::Controls),
            );
            spawn_button(
                panel,
                MenuAction::ToggleCanvas,
                state.canvas_label(),
                Some(ViewerLabel::Canvas),
            );
            spawn_button(
                panel,
                MenuAction::ToggleCompression,
                state.compression_label(),
                Some(ViewerLabel::Compression),
            );

            for label in [
                ViewerLabel::Fps,
                ViewerLabel::DrawnFps,
                ViewerLabel::Bandwidth,
                ViewerLabel::FrameSize,
                ViewerLabel::RenderTime,
            ] {
                panel.spawn((text_bundle(String::new(), 14.0), label));
            }
        });

    // Pause overlay
    commands
        .spawn((
            PauseOverlay,
            Button,
            Node {
                display: if state.overlay_visible {
                    Display::Flex
                } else {
                    Display::None
                },
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(OVERLAY_COLOR),
            GlobalZIndex(10),
        ))
        .with_children(|overlay| {
            overlay.spawn(text_bundle("Paused - click to resume".to_string(), 32.0));
        });

    log::info!("Viewer UI spawned");
}

fn pressed<T: Component>(query: &Query<&Interaction, (Changed<Interaction>, With<T>)>) -> bool {
    query.iter().any(|interaction| *interaction == Interaction::Pressed)
}

/// Steppers, send buttons and toggles in the menu panel
pub fn handle_menu_buttons(
    query: Query<(&Interaction, &MenuAction), Changed<Interaction>>,
    mut state: ResMut<ViewerState>,
    steps: Res<StepSizes>,
    link: Option<Res<StreamLinkResource>>,
) {
    for (interaction, action) in &query {
        if *interaction != Interaction::Pressed {
            continue;
        }
        log::debug!("Menu action: {:?}", action);

        let command = match action {
            MenuAction::QualityDown => {
                state.adjust_quality(-steps.quality);
                None
            }
            MenuAction::QualityUp => {
                state.adjust_quality(steps.quality);
                None
            }
            MenuAction::FrameRateDown => {
                state.adjust_frame_rate(-steps.frame_rate);
                None
            }
            MenuAction::FrameRateUp => {
                state.adjust_frame_rate(steps.frame_rate);
                None
            }
            MenuAction::SendQuality => Some(ViewerCommand::SetQuality(state.quality)),
            MenuAction::SendFrameRate => Some(ViewerCommand::SetFrameRate(state.frame_rate)),
            MenuAction::ToggleControls => {
                state.toggle_control_swap();
                None
            }
            MenuAction::ToggleCanvas => {
                state.toggle_render_mode();
                None
            }
            MenuAction::ToggleCompression => {
                state.toggle_compression();
                None
            }
        };

        if let (Some(command), Some(link)) = (command, link.as_ref()) {
            match link.send(&command) {
                Ok(()) => log::info!("Sent {}", command),
                Err(e) => log::warn!("Could not send {}: {}", command, e),
            }
        }
    }
}

pub fn handle_menu_tab(
    query: Query<&Interaction, (Changed<Interaction>, With<MenuTab>)>,
    mut state: ResMut<ViewerState>,
) {
    if pressed(&query) {
        state.toggle_menu();
    }
}

pub fn handle_pause_button(
    query: Query<&Interaction, (Changed<Interaction>, With<PauseButton>)>,
    mut state: ResMut<ViewerState>,
) {
    if pressed(&query) {
        state.toggle_pause();
    }
}

pub fn handle_overlay_click(
    query: Query<&Interaction, (Changed<Interaction>, With<PauseOverlay>)>,
    mut state: ResMut<ViewerState>,
) {
    if pressed(&query) && state.overlay_visible {
        state.dismiss_overlay();
    }
}

/// Slide the menu and show or hide the overlay to match the state
pub fn apply_layout(
    state: Res<ViewerState>,
    mut panels: Query<&mut Node, (With<MenuPanel>, Without<MenuTab>, Without<PauseOverlay>)>,
    mut tabs: Query<&mut Node, (With<MenuTab>, Without<MenuPanel>, Without<PauseOverlay>)>,
    mut overlays: Query<&mut Node, (With<PauseOverlay>, Without<MenuPanel>, Without<MenuTab>)>,
) {
    if !state.is_changed() {
        return;
    }

    let (panel_left, tab_left) = if state.menu_open {
        (0.0, MENU_WIDTH)
    } else {
        (-MENU_WIDTH, 0.0)
    };
    for mut node in &mut panels {
        node.left = Val::Px(panel_left);
    }
    for mut node in &mut tabs {
        node.left = Val::Px(tab_left);
    }

    let overlay_display = if state.overlay_visible {
        Display::Flex
    } else {
        Display::None
    };
    for mut node in &mut overlays {
        if node.display != overlay_display {
            node.display = overlay_display;
        }
    }
}

/// Rewrite labels that mirror viewer state
pub fn refresh_state_labels(state: Res<ViewerState>, mut labels: Query<(&ViewerLabel, &mut Text)>) {
    if !state.is_changed() {
        return;
    }

    for (label, mut text) in &mut labels {
        let content = match label {
            ViewerLabel::Quality => state.quality.to_string(),
            ViewerLabel::FrameRate => state.frame_rate.to_string(),
            ViewerLabel::Controls => state.controls_label().to_string(),
            ViewerLabel::Canvas => state.canvas_label().to_string(),
            ViewerLabel::Compression => state.compression_label().to_string(),
            ViewerLabel::Pause => state.pause_label().to_string(),
            _ => continue,
        };
        if text.0 != content {
            text.0 = content;
        }
    }
}
