use bevy::prelude::*;
use bevy::window::{PresentMode, WindowResolution};

use sanctuary::ui::UiPlugin;
use sanctuary::SimulationPlugins;

const SCREEN_WIDTH: f32 = 1280.0;
const SCREEN_HEIGHT: f32 = 720.0;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Sanctuary".into(),
                resolution: WindowResolution::new(SCREEN_WIDTH, SCREEN_HEIGHT),
                present_mode: PresentMode::AutoVsync,
                resizable: true,
                // Keep browser shortcuts (Space scroll, F5) away from the game.
                prevent_default_event_handling: true,
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.03, 0.03, 0.08)))
        // Domain plugins
        .add_plugins(SimulationPlugins)
        .add_plugins(UiPlugin)
        .run();
}
