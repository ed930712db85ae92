use bevy::prelude::*;

use crate::config::{ControllerTuning, SanctuaryConfig};
use crate::input::InputState;
use crate::shared::*;

/// Directional and jump keys held this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl ControllerInput {
    /// WASD (or the rebound keys) plus the arrow keys.
    pub fn from_input(input: &InputState, bindings: &KeyBindings) -> Self {
        Self {
            forward: input.is_held(bindings.move_forward) || input.is_held(KeyCode::ArrowUp),
            back: input.is_held(bindings.move_back) || input.is_held(KeyCode::ArrowDown),
            left: input.is_held(bindings.move_left) || input.is_held(KeyCode::ArrowLeft),
            right: input.is_held(bindings.move_right) || input.is_held(KeyCode::ArrowRight),
            jump: input.is_held(bindings.jump),
        }
    }

    /// Input axis in camera space: x to the right, y forward.
    fn axis(&self) -> Vec2 {
        let mut axis = Vec2::ZERO;
        if self.forward {
            axis.y += 1.0;
        }
        if self.back {
            axis.y -= 1.0;
        }
        if self.right {
            axis.x += 1.0;
        }
        if self.left {
            axis.x -= 1.0;
        }
        axis
    }
}

/// One controller step. Gravity first, then the ground snap, then walking,
/// then the hard wall, then the jump impulse for the next frame.
///
/// Movement-disabled frames (pointer unlocked, modal open) leave the state
/// untouched.
pub fn integrate_controller(
    state: &mut PlayerState,
    input: &ControllerInput,
    delta: f32,
    tuning: &ControllerTuning,
) {
    if !state.movement_enabled {
        return;
    }

    state.vertical_velocity += tuning.gravity * delta;
    state.position.y += state.vertical_velocity * delta;

    let ground = state.floor_y + tuning.eye_height;
    if state.position.y <= ground {
        state.position.y = ground;
        state.vertical_velocity = 0.0;
        state.grounded = true;
        state.can_jump = true;
    }

    let axis = input.axis();
    if axis != Vec2::ZERO {
        // Normalise so diagonal speed equals cardinal speed.
        let axis = axis.normalize();
        let step = tuning.walk_speed * delta;
        let world_move = state.flat_forward() * (axis.y * step) + state.flat_right() * (axis.x * step);
        state.position.x += world_move.x;
        state.position.z += world_move.z;
    }

    let (x_min, x_max, z_min, z_max) = tuning.bounds_for_floor(state.floor_y);
    state.position.x = state.position.x.clamp(x_min, x_max);
    state.position.z = state.position.z.clamp(z_min, z_max);

    if input.jump && state.grounded && state.can_jump {
        state.vertical_velocity = tuning.jump_impulse;
        state.grounded = false;
        state.can_jump = false;
    }
}

/// Capped per-frame delta for everything downstream.
pub fn tick_frame_clock(time: Res<Time>, config: Res<SanctuaryConfig>, mut clock: ResMut<FrameClock>) {
    clock.advance(
        time.delta_secs(),
        time.elapsed_secs(),
        config.controller.max_frame_delta,
    );
}

/// Movement is only live while playing with the pointer captured.
pub fn sync_movement_enabled(
    state: Res<State<GameState>>,
    lock: Res<PointerLock>,
    mut player: ResMut<PlayerState>,
) {
    let enabled = *state.get() == GameState::Playing && lock.locked;
    if player.movement_enabled != enabled {
        player.movement_enabled = enabled;
    }
}

pub fn player_movement(
    clock: Res<FrameClock>,
    input: Res<InputState>,
    bindings: Res<KeyBindings>,
    config: Res<SanctuaryConfig>,
    mut player: ResMut<PlayerState>,
) {
    let controls = ControllerInput::from_input(&input, &bindings);
    integrate_controller(&mut player, &controls, clock.delta, &config.controller);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walking_player() -> PlayerState {
        PlayerState {
            movement_enabled: true,
            ..PlayerState::default()
        }
    }

    #[test]
    fn test_forward_moves_along_negative_z_at_zero_yaw() {
        let mut player = walking_player();
        let input = ControllerInput {
            forward: true,
            ..default()
        };
        integrate_controller(&mut player, &input, 0.1, &ControllerTuning::default());
        assert!((player.position.z - 4.5).abs() < 1e-5);
        assert!(player.position.x.abs() < 1e-5);
    }

    #[test]
    fn test_standing_player_stays_on_ground() {
        let mut player = walking_player();
        for _ in 0..50 {
            integrate_controller(&mut player, &ControllerInput::default(), 0.016, &ControllerTuning::default());
        }
        assert_eq!(player.position.y, EYE_HEIGHT);
        assert_eq!(player.vertical_velocity, 0.0);
        assert!(player.grounded && player.can_jump);
    }

    #[test]
    fn test_jump_rises_then_lands() {
        let tuning = ControllerTuning::default();
        let mut player = walking_player();
        let jump = ControllerInput {
            jump: true,
            ..default()
        };
        integrate_controller(&mut player, &jump, 0.016, &tuning);
        assert_eq!(player.vertical_velocity, tuning.jump_impulse);
        assert!(!player.can_jump);

        let mut peak = player.position.y;
        for _ in 0..200 {
            integrate_controller(&mut player, &ControllerInput::default(), 0.016, &tuning);
            peak = peak.max(player.position.y);
        }
        assert!(peak > EYE_HEIGHT + 0.5, "jump should leave the ground, peak {}", peak);
        assert_eq!(player.position.y, EYE_HEIGHT);
        assert!(player.can_jump);
    }

    #[test]
    fn test_camera_relative_movement_follows_yaw() {
        let mut player = walking_player();
        player.yaw = std::f32::consts::FRAC_PI_2;
        let input = ControllerInput {
            forward: true,
            ..default()
        };
        integrate_controller(&mut player, &input, 0.1, &ControllerTuning::default());
        // Yaw of +90° turns -Z into -X.
        assert!((player.position.x + 0.5).abs() < 1e-4);
        assert!((player.position.z - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_deck_edge_holds_player() {
        let tuning = ControllerTuning::default();
        let mut player = walking_player();
        player.floor_y = SKY_DECK_FLOOR;
        player.position = Vec3::new(16.0, SKY_DECK_FLOOR + EYE_HEIGHT, -6.5);
        player.yaw = std::f32::consts::FRAC_PI_2;
        let input = ControllerInput {
            forward: true,
            ..default()
        };
        for _ in 0..400 {
            integrate_controller(&mut player, &input, 0.016, &tuning);
        }
        let (x_min, _, _, _) = SKY_DECK_BOUNDS;
        assert_eq!(player.position.x, x_min);
        assert_eq!(player.position.y, SKY_DECK_FLOOR + EYE_HEIGHT);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut player = walking_player();
        let start = player.position;
        let input = ControllerInput {
            forward: true,
            back: true,
            left: true,
            right: true,
            jump: false,
        };
        integrate_controller(&mut player, &input, 0.1, &ControllerTuning::default());
        assert_eq!(player.position, start);
    }
}
