//! Sanctuary library crate: re-exports all modules for integration testing.
//!
//! The binary crate (`main.rs`) is the actual game entry point.
//! This library crate exposes the same modules so that `tests/` integration
//! tests can import game types, systems, and resources without needing a
//! window or GPU.

pub mod shared;
pub mod config;
pub mod input;
pub mod player;
pub mod interaction;
pub mod progress;
pub mod save;
pub mod data;
pub mod ambient;
pub mod world;
pub mod ui;

use bevy::prelude::*;

use shared::*;

/// Game state, per-frame ordering and the cross-domain events. Shared by
/// `main.rs` and the headless test app.
pub fn register_core(app: &mut App) {
    app.init_state::<GameState>();

    app.configure_sets(
        Update,
        (
            FrameSet::Clock,
            FrameSet::Input,
            FrameSet::Controller,
            FrameSet::Focus,
            FrameSet::Dispatch,
            FrameSet::Ambient,
        )
            .chain(),
    );

    app.add_event::<ToastEvent>()
        .add_event::<PlaySfxEvent>()
        .add_event::<ToggleMusicEvent>()
        .add_event::<CapturePhotoEvent>()
        .add_event::<AchievementUnlockedEvent>()
        .add_event::<WishMadeEvent>()
        .add_event::<SaveRequestEvent>()
        .add_event::<QuitToMenuEvent>()
        .add_event::<FatalErrorEvent>();
}

/// Every domain plugin that runs without a window.
pub struct SimulationPlugins;

impl Plugin for SimulationPlugins {
    fn build(&self, app: &mut App) {
        register_core(app);
        app.add_plugins(config::ConfigPlugin)
            .add_plugins(input::InputPlugin)
            .add_plugins(player::PlayerPlugin)
            .add_plugins(interaction::InteractionPlugin)
            .add_plugins(progress::ProgressPlugin)
            .add_plugins(save::SavePlugin)
            .add_plugins(data::DataPlugin)
            .add_plugins(ambient::AmbientPlugin)
            .add_plugins(world::WorldPlugin);
    }
}
