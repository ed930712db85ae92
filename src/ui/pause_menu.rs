use bevy::prelude::*;

use super::menu_kit::{self, MenuCursor, MenuItem};
use crate::input::InputState;
use crate::progress::PersistentProgress;
use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// MARKER COMPONENTS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Component)]
pub struct PauseMenuRoot;

/// The line under the buttons that confirms a manual save.
#[derive(Component)]
pub struct PauseStatusText;

const PAUSE_OPTIONS: &[&str] = &["Resume", "Save", "Toggle Bloom", "Toggle Shadows", "Quit to Menu"];

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SPAWN / DESPAWN
// ═══════════════════════════════════════════════════════════════════════

pub fn spawn_pause_menu(mut commands: Commands) {
    commands.insert_resource(MenuCursor::new(PAUSE_OPTIONS.len()));

    menu_kit::spawn_overlay(&mut commands, PauseMenuRoot).with_children(|parent| {
        parent.spawn(menu_kit::panel_node(360.0)).with_children(|panel| {
            menu_kit::spawn_menu_title(panel, "PAUSED", 36.0);
            for (i, label) in PAUSE_OPTIONS.iter().enumerate() {
                menu_kit::spawn_menu_button(panel, i, label);
            }
            panel.spawn((
                PauseStatusText,
                Text::new(""),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::srgb(0.7, 1.0, 0.75)),
            ));
            menu_kit::spawn_menu_footer(panel, "Esc to resume");
        });
    });
}

pub fn despawn_pause_menu(mut commands: Commands, query: Query<Entity, With<PauseMenuRoot>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
    commands.remove_resource::<MenuCursor>();
}

// ═══════════════════════════════════════════════════════════════════════
// NAVIGATION
// ═══════════════════════════════════════════════════════════════════════

#[allow(clippy::too_many_arguments)]
pub fn pause_menu_navigation(
    input: Res<InputState>,
    bindings: Res<KeyBindings>,
    cursor: Option<ResMut<MenuCursor>>,
    items: Query<(&Interaction, &MenuItem), Changed<Interaction>>,
    mut status: Query<&mut Text, With<PauseStatusText>>,
    mut progress: ResMut<PersistentProgress>,
    mut next_state: ResMut<NextState<GameState>>,
    mut save_events: EventWriter<SaveRequestEvent>,
    mut quit_events: EventWriter<QuitToMenuEvent>,
) {
    if input.just_pressed(bindings.pause) {
        next_state.set(GameState::Playing);
        return;
    }

    let Some(mut cursor) = cursor else { return };
    let Some(choice) = cursor.navigate(&input, &items) else {
        return;
    };

    let message = match choice {
        0 => {
            next_state.set(GameState::Playing);
            return;
        }
        1 => "Saved.".to_string(),
        2 => {
            progress.settings.bloom = !progress.settings.bloom;
            format!("Bloom {}.", on_off(progress.settings.bloom))
        }
        3 => {
            progress.settings.shadows = !progress.settings.shadows;
            format!("Shadows {}.", on_off(progress.settings.shadows))
        }
        _ => {
            quit_events.send(QuitToMenuEvent);
            next_state.set(GameState::MainMenu);
            return;
        }
    };
    save_events.send(SaveRequestEvent);
    if let Ok(mut text) = status.get_single_mut() {
        text.0 = message;
    }
}
