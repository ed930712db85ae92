//! Tunable constants loaded from `assets/config/sanctuary.ron`.
//!
//! A missing file silently yields the defaults baked into `shared`; a file
//! that parses but describes an impossible world (inverted bounds, upward
//! gravity) is the one configuration problem that stops startup.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::shared::*;

pub const CONFIG_PATH: &str = "assets/config/sanctuary.ron";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerTuning {
    pub gravity: f32,
    pub jump_impulse: f32,
    pub walk_speed: f32,
    pub eye_height: f32,
    pub bounds: (f32, f32, f32, f32),
    pub deck_floor: f32,
    pub deck_bounds: (f32, f32, f32, f32),
    pub max_frame_delta: f32,
}

impl Default for ControllerTuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            jump_impulse: JUMP_IMPULSE,
            walk_speed: WALK_SPEED,
            eye_height: EYE_HEIGHT,
            bounds: ROOM_BOUNDS,
            deck_floor: SKY_DECK_FLOOR,
            deck_bounds: SKY_DECK_BOUNDS,
            max_frame_delta: MAX_FRAME_DELTA,
        }
    }
}

impl ControllerTuning {
    /// The walkable rectangle for whichever floor the player stands on.
    pub fn bounds_for_floor(&self, floor_y: f32) -> (f32, f32, f32, f32) {
        if (floor_y - self.deck_floor).abs() < 1e-3 {
            self.deck_bounds
        } else {
            self.bounds
        }
    }
}

fn inverted((x_min, x_max, z_min, z_max): (f32, f32, f32, f32)) -> bool {
    x_min >= x_max || z_min >= z_max
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanctuaryConfig {
    pub controller: ControllerTuning,
    pub max_interaction_distance: f32,
    pub spawn: (f32, f32, f32),
}

impl Default for SanctuaryConfig {
    fn default() -> Self {
        Self {
            controller: ControllerTuning::default(),
            max_interaction_distance: MAX_INTERACTION_DISTANCE,
            spawn: (DEFAULT_SPAWN.x, DEFAULT_SPAWN.y, DEFAULT_SPAWN.z),
        }
    }
}

impl SanctuaryConfig {
    pub fn spawn_point(&self) -> Vec3 {
        Vec3::new(self.spawn.0, self.spawn.1, self.spawn.2)
    }

    /// Rejects values the controller cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        let c = &self.controller;
        let (x_min, x_max, z_min, z_max) = c.bounds;
        if inverted(c.bounds) {
            return Err(format!("Play area bounds are inverted: {:?}", c.bounds));
        }
        if inverted(c.deck_bounds) {
            return Err(format!("Sky deck bounds are inverted: {:?}", c.deck_bounds));
        }
        if c.gravity >= 0.0 {
            return Err(format!("Gravity must pull downwards, got {}", c.gravity));
        }
        if c.jump_impulse <= 0.0 || c.walk_speed <= 0.0 || c.eye_height <= 0.0 {
            return Err("Jump impulse, walk speed and eye height must be positive".into());
        }
        if c.max_frame_delta <= 0.0 {
            return Err(format!("Max frame delta must be positive, got {}", c.max_frame_delta));
        }
        if self.max_interaction_distance <= 0.0 {
            return Err(format!(
                "Interaction distance must be positive, got {}",
                self.max_interaction_distance
            ));
        }
        let spawn = self.spawn_point();
        if spawn.x < x_min || spawn.x > x_max || spawn.z < z_min || spawn.z > z_max {
            return Err(format!("Spawn point {:?} lies outside the play area", spawn));
        }
        Ok(())
    }
}

/// Parse a RON document. Missing fields take their defaults.
pub fn parse_config(text: &str) -> Result<SanctuaryConfig, String> {
    ron::from_str::<SanctuaryConfig>(text).map_err(|e| format!("Config parse failed: {}", e))
}

#[cfg(not(target_arch = "wasm32"))]
fn read_config_file() -> Option<String> {
    std::fs::read_to_string(CONFIG_PATH).ok()
}

#[cfg(target_arch = "wasm32")]
fn read_config_file() -> Option<String> {
    None
}

/// Loads the config, falling back to defaults on absence or parse failure.
pub fn load_config() -> SanctuaryConfig {
    let Some(text) = read_config_file() else {
        info!("No config at {}, using defaults.", CONFIG_PATH);
        return SanctuaryConfig::default();
    };
    match parse_config(&text) {
        Ok(config) => {
            info!("Loaded config from {}.", CONFIG_PATH);
            config
        }
        Err(e) => {
            warn!("{}. Using defaults.", e);
            SanctuaryConfig::default()
        }
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(load_config());
        app.add_systems(OnEnter(GameState::Loading), check_config);
    }
}

fn check_config(config: Res<SanctuaryConfig>, mut fatal: EventWriter<FatalErrorEvent>) {
    if let Err(e) = config.validate() {
        error!("Unusable configuration: {}", e);
        fatal.send(FatalErrorEvent {
            message: format!("Sanctuary could not start: {}. Please fix the config and restart.", e),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SanctuaryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = parse_config("(max_interaction_distance: 4.5)").unwrap();
        assert_eq!(config.max_interaction_distance, 4.5);
        assert_eq!(config.controller, ControllerTuning::default());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut config = SanctuaryConfig::default();
        config.controller.bounds = (5.0, -5.0, -9.0, 6.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_deck_bounds_rejected() {
        let mut config = SanctuaryConfig::default();
        config.controller.deck_bounds = (18.0, 12.0, -8.0, -2.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deck_floor_selects_deck_bounds() {
        let tuning = ControllerTuning::default();
        assert_eq!(tuning.bounds_for_floor(0.0), ROOM_BOUNDS);
        assert_eq!(tuning.bounds_for_floor(SKY_DECK_FLOOR), SKY_DECK_BOUNDS);
    }

    #[test]
    fn test_upward_gravity_rejected() {
        let mut config = SanctuaryConfig::default();
        config.controller.gravity = 9.8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(parse_config("(controller: 12)").is_err());
    }
}
