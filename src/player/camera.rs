use bevy::core_pipeline::bloom::Bloom;
use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;

use crate::input::InputState;
use crate::progress::PersistentProgress;
use crate::shared::*;

/// Mouse delta to yaw/pitch. Pitch stops short of straight up/down so the
/// view never flips over.
pub fn apply_look(state: &mut PlayerState, mouse_delta: Vec2, sensitivity: f32) {
    if !state.movement_enabled {
        return;
    }
    state.yaw -= mouse_delta.x * sensitivity;
    state.pitch -= mouse_delta.y * sensitivity;
    state.pitch = state.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
}

pub fn player_look(
    input: Res<InputState>,
    progress: Res<PersistentProgress>,
    mut player: ResMut<PlayerState>,
) {
    let delta = input.mouse_delta();
    if delta == Vec2::ZERO {
        return;
    }
    apply_look(&mut player, delta, progress.settings.look_sensitivity);
}

pub fn spawn_camera(mut commands: Commands, player: Res<PlayerState>) {
    commands.spawn((
        PlayerCamera,
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 70.0_f32.to_radians(),
            near: 0.1,
            far: 500.0,
            ..default()
        }),
        Transform::from_translation(player.position).with_rotation(player.rotation()),
        DistanceFog {
            color: Color::srgb(0.04, 0.04, 0.18),
            falloff: FogFalloff::Exponential { density: 0.015 },
            ..default()
        },
    ));
}

/// Bloom needs an HDR target, so both follow the saved toggle.
pub fn apply_bloom_setting(
    mut commands: Commands,
    progress: Res<PersistentProgress>,
    mut cameras: Query<(Entity, &mut Camera, Has<Bloom>), With<PlayerCamera>>,
) {
    let bloom = progress.settings.bloom;
    for (entity, mut camera, has_bloom) in &mut cameras {
        if camera.hdr != bloom {
            camera.hdr = bloom;
        }
        if bloom && !has_bloom {
            commands.entity(entity).insert(Bloom::NATURAL);
        } else if !bloom && has_bloom {
            commands.entity(entity).remove::<Bloom>();
        }
    }
}

/// Copies the controller's result onto the camera transform.
pub fn camera_follow_player(
    player: Res<PlayerState>,
    mut query: Query<&mut Transform, With<PlayerCamera>>,
) {
    if !player.is_changed() {
        return;
    }
    for mut transform in &mut query {
        transform.translation = player.position;
        transform.rotation = player.rotation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_clamped() {
        let mut player = PlayerState {
            movement_enabled: true,
            ..PlayerState::default()
        };
        apply_look(&mut player, Vec2::new(0.0, -100_000.0), 0.002);
        assert_eq!(player.pitch, PITCH_LIMIT);
        apply_look(&mut player, Vec2::new(0.0, 100_000.0), 0.002);
        assert_eq!(player.pitch, -PITCH_LIMIT);
    }

    #[test]
    fn test_look_ignored_when_movement_disabled() {
        let mut player = PlayerState::default();
        apply_look(&mut player, Vec2::new(50.0, 50.0), 0.002);
        assert_eq!(player.yaw, 0.0);
        assert_eq!(player.pitch, 0.0);
    }

    #[test]
    fn test_mouse_right_turns_right() {
        let mut player = PlayerState {
            movement_enabled: true,
            ..PlayerState::default()
        };
        apply_look(&mut player, Vec2::new(100.0, 0.0), 0.002);
        assert!((player.yaw + 0.2).abs() < 1e-6);
        assert!(player.flat_forward().x > 0.0);
    }
}
