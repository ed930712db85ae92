use bevy::prelude::*;

use super::menu_kit::{self, MenuCursor, MenuItem};
use crate::input::InputState;
use crate::progress::PersistentProgress;
use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// MARKER COMPONENTS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Component)]
pub struct MainMenuRoot;

const MAIN_MENU_OPTIONS: &[&str] = &["Enter the Sanctuary", "Quit"];

// ═══════════════════════════════════════════════════════════════════════
// SPAWN / DESPAWN
// ═══════════════════════════════════════════════════════════════════════

pub fn spawn_main_menu(mut commands: Commands, progress: Res<PersistentProgress>) {
    commands.insert_resource(MenuCursor::new(MAIN_MENU_OPTIONS.len()));

    let returning = progress.play_time_seconds > 0.0;
    let subtitle = if returning {
        format!("Welcome back. Your plant is on day {}.", progress.plant.day)
    } else {
        "A quiet place to rest.".to_string()
    };

    menu_kit::spawn_overlay(&mut commands, MainMenuRoot)
        .insert(BackgroundColor(Color::srgb(0.05, 0.04, 0.12)))
        .with_children(|parent| {
            parent.spawn(menu_kit::panel_node(420.0)).with_children(|panel| {
                menu_kit::spawn_menu_title(panel, "SANCTUARY", 52.0);
                panel.spawn((
                    Text::new(subtitle),
                    TextFont {
                        font_size: 16.0,
                        ..default()
                    },
                    TextColor(Color::srgb(0.8, 0.75, 0.9)),
                ));
                for (i, label) in MAIN_MENU_OPTIONS.iter().enumerate() {
                    menu_kit::spawn_menu_button(panel, i, label);
                }
                menu_kit::spawn_menu_footer(panel, "WASD move | Mouse look | E interact | Esc pause");
            });
        });
}

pub fn despawn_main_menu(mut commands: Commands, query: Query<Entity, With<MainMenuRoot>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
    commands.remove_resource::<MenuCursor>();
}

// ═══════════════════════════════════════════════════════════════════════
// NAVIGATION
// ═══════════════════════════════════════════════════════════════════════

pub fn main_menu_navigation(
    input: Res<InputState>,
    cursor: Option<ResMut<MenuCursor>>,
    items: Query<(&Interaction, &MenuItem), Changed<Interaction>>,
    mut next_state: ResMut<NextState<GameState>>,
    mut sfx: EventWriter<PlaySfxEvent>,
    mut app_exit: EventWriter<AppExit>,
) {
    let Some(mut cursor) = cursor else { return };
    let Some(choice) = cursor.navigate(&input, &items) else {
        return;
    };

    sfx.send(PlaySfxEvent {
        sfx_id: "click".into(),
    });
    match choice {
        0 => {
            info!("Entering the sanctuary");
            next_state.set(GameState::Playing);
        }
        _ => {
            app_exit.send(AppExit::Success);
        }
    }
}
