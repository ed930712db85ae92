pub mod camera;
pub mod movement;

use bevy::prelude::*;

use crate::config::SanctuaryConfig;
use crate::progress::PersistentProgress;
use crate::shared::*;

pub use movement::{integrate_controller, ControllerInput};

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerState>().init_resource::<FrameClock>();

        app.add_systems(Startup, (reset_player_to_spawn, camera::spawn_camera).chain());

        // -- Clock runs every frame, in every state --
        app.add_systems(
            Update,
            (movement::tick_frame_clock, movement::sync_movement_enabled)
                .chain()
                .in_set(FrameSet::Clock),
        );

        // -- Physics only while playing --
        app.add_systems(
            Update,
            (camera::player_look, movement::player_movement)
                .chain()
                .in_set(FrameSet::Controller)
                .run_if(in_state(GameState::Playing)),
        );
        app.add_systems(
            Update,
            camera::camera_follow_player.after(FrameSet::Controller).before(FrameSet::Focus),
        );

        app.add_systems(
            Update,
            camera::apply_bloom_setting.run_if(resource_changed::<PersistentProgress>),
        );

        app.add_systems(OnEnter(GameState::MainMenu), reset_player_to_spawn);
    }
}

/// Back to the configured spawn point, looking straight ahead.
pub fn reset_player_to_spawn(config: Res<SanctuaryConfig>, mut player: ResMut<PlayerState>) {
    *player = PlayerState::at_spawn(config.spawn_point());
}
