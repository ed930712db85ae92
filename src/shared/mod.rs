//! Shared components, resources, events, and states for Sanctuary.
//!
//! This is the type contract. Every domain plugin imports from here.
//! No domain imports from any other domain directly, except through the
//! re-exported resource types listed below.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// GAME STATE: top-level state machine
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Loading,
    MainMenu,
    Playing,
    Paused,
    /// A modal panel (plant care, letters, gallery, wish, diary) is open.
    Modal,
}

/// Ordering of the per-frame interaction loop. Configured as a chain in
/// `main.rs` and in the headless test app.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSet {
    Clock,
    Input,
    Controller,
    Focus,
    Dispatch,
    Ambient,
}

// ═══════════════════════════════════════════════════════════════════════
// CLOCK
// ═══════════════════════════════════════════════════════════════════════

/// Per-frame elapsed time, capped so a tab switch or a debugger stall does
/// not produce one giant physics step.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct FrameClock {
    /// Capped delta in seconds.
    pub delta: f32,
    /// Wall clock since app start in seconds. Effects key off this value.
    pub now: f32,
}

impl FrameClock {
    pub fn advance(&mut self, raw_delta: f32, elapsed: f32, max_delta: f32) {
        self.delta = raw_delta.clamp(0.0, max_delta);
        self.now = elapsed;
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PLAYER
// ═══════════════════════════════════════════════════════════════════════

/// Marker for the first-person camera entity.
#[derive(Component, Debug, Clone, Default)]
pub struct PlayerCamera;

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub vertical_velocity: f32,
    /// True only while the pointer is locked in `GameState::Playing`.
    pub movement_enabled: bool,
    pub can_jump: bool,
    pub grounded: bool,
    /// Height of the floor currently stood on (0 for the room).
    pub floor_y: f32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::at_spawn(DEFAULT_SPAWN)
    }
}

impl PlayerState {
    pub fn at_spawn(spawn: Vec3) -> Self {
        Self {
            position: spawn,
            yaw: 0.0,
            pitch: 0.0,
            vertical_velocity: 0.0,
            movement_enabled: false,
            can_jump: true,
            grounded: true,
            floor_y: spawn.y - EYE_HEIGHT,
        }
    }

    /// Camera rotation for the current look angles.
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Full 3D look direction (includes pitch).
    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }

    /// Look direction flattened to the horizontal plane.
    pub fn flat_forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Perpendicular to `flat_forward`, pointing to the player's right.
    pub fn flat_right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// INPUT BINDINGS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Debug, Clone)]
pub struct KeyBindings {
    pub move_forward: KeyCode,
    pub move_back: KeyCode,
    pub move_left: KeyCode,
    pub move_right: KeyCode,
    pub jump: KeyCode,
    pub interact: KeyCode,
    pub pause: KeyCode,
    pub toggle_music: KeyCode,
    pub take_photo: KeyCode,
    pub open_diary: KeyCode,
    pub open_plant: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_forward: KeyCode::KeyW,
            move_back: KeyCode::KeyS,
            move_left: KeyCode::KeyA,
            move_right: KeyCode::KeyD,
            jump: KeyCode::Space,
            interact: KeyCode::KeyE,
            pause: KeyCode::Escape,
            toggle_music: KeyCode::KeyM,
            take_photo: KeyCode::KeyP,
            open_diary: KeyCode::KeyJ,
            open_plant: KeyCode::KeyL,
        }
    }
}

/// Whether the OS cursor is currently captured by the game window.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerLock {
    pub locked: bool,
}

// ═══════════════════════════════════════════════════════════════════════
// INTERACTABLES
// ═══════════════════════════════════════════════════════════════════════

/// Index into the `InteractableRegistry`. Stored on every collider primitive
/// so a ray hit resolves its owner without walking a hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InteractableId(pub usize);

/// What an interactable does when activated. The payload carries exactly
/// what that kind's handler needs.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractableKind {
    Plant,
    DisplayScreen,
    Mailbox,
    TeaSet,
    MeditationSpot,
    WishSpot,
    ElevatorButton { destination_floor: f32, arrival: Vec3 },
    SitPoint { seat: Vec3, facing_yaw: f32 },
    Lamp { light: Entity },
}

/// Which modal panel is open while in `GameState::Modal`.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveModal {
    #[default]
    PlantCare,
    Letters,
    Gallery,
    Wish,
    Diary,
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS: cross-domain communication
// ═══════════════════════════════════════════════════════════════════════

/// Sent by the focus resolver when the focused interactable changes.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct FocusChangedEvent {
    pub focus: Option<InteractableId>,
}

/// Request to open a modal panel.
#[derive(Event, Debug, Clone, Copy)]
pub struct OpenModalEvent {
    pub modal: ActiveModal,
}

/// Request to flush `PersistentProgress` to storage.
#[derive(Event, Debug, Clone, Default)]
pub struct SaveRequestEvent;

#[derive(Event, Debug, Clone)]
pub struct PlaySfxEvent {
    pub sfx_id: String,
}

#[derive(Event, Debug, Clone, Default)]
pub struct ToggleMusicEvent;

/// Toast notification for player feedback.
#[derive(Event, Debug, Clone)]
pub struct ToastEvent {
    pub message: String,
    pub duration_secs: f32,
}

impl ToastEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            duration_secs: 4.0,
        }
    }
}

#[derive(Event, Debug, Clone)]
pub struct AchievementUnlockedEvent {
    pub achievement_id: String,
    pub name: String,
}

/// A wish was made; the world spawns a firework at the wishing star.
#[derive(Event, Debug, Clone)]
pub struct WishMadeEvent {
    pub text: String,
}

/// Ask the photo domain to capture the current frame.
#[derive(Event, Debug, Clone, Default)]
pub struct CapturePhotoEvent;

/// The only error surfaced to the player: the world cannot be shown at all.
#[derive(Event, Debug, Clone)]
pub struct FatalErrorEvent {
    pub message: String,
}

/// Leave the session and return to the main menu.
#[derive(Event, Debug, Clone, Default)]
pub struct QuitToMenuEvent;

// ═══════════════════════════════════════════════════════════════════════
// SERIALIZABLE SETTINGS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub look_sensitivity: f32,
    pub shadows: bool,
    pub bloom: bool,
    pub master_volume: f32,
    pub music_volume: f32,
    pub sfx_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            look_sensitivity: 0.002,
            shadows: true,
            bloom: true,
            master_volume: 0.7,
            music_volume: 0.6,
            sfx_volume: 0.8,
        }
    }
}

impl Settings {
    pub fn clamp(&mut self) {
        self.look_sensitivity = self
            .look_sensitivity
            .clamp(MIN_LOOK_SENSITIVITY, MAX_LOOK_SENSITIVITY);
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

pub const EYE_HEIGHT: f32 = 1.6;
pub const GRAVITY: f32 = -15.0;
pub const JUMP_IMPULSE: f32 = 6.0;
pub const WALK_SPEED: f32 = 5.0;
pub const MAX_FRAME_DELTA: f32 = 0.1;
pub const MAX_INTERACTION_DISTANCE: f32 = 5.0;
pub const PITCH_LIMIT: f32 = std::f32::consts::PI / 2.5;

pub const DEFAULT_SPAWN: Vec3 = Vec3::new(0.0, EYE_HEIGHT, 5.0);

/// Room + terrace footprint (x_min, x_max, z_min, z_max).
pub const ROOM_BOUNDS: (f32, f32, f32, f32) = (-9.0, 19.0, -9.0, 6.0);

/// Floor height of the sky deck reached by the elevator.
pub const SKY_DECK_FLOOR: f32 = 6.0;

/// Walkable part of the sky deck (x_min, x_max, z_min, z_max), inside its
/// railing.
pub const SKY_DECK_BOUNDS: (f32, f32, f32, f32) = (11.5, 18.5, -8.5, -1.5);

pub const MIN_LOOK_SENSITIVITY: f32 = 0.0002;
pub const MAX_LOOK_SENSITIVITY: f32 = 0.01;

/// Wall-clock seconds since the Unix epoch. Zero if the clock is unusable.
#[cfg(not(target_arch = "wasm32"))]
pub fn unix_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(target_arch = "wasm32")]
pub fn unix_timestamp() -> u64 {
    (js_sys::Date::now() / 1000.0) as u64
}
