use std::collections::{HashMap, HashSet};

use bevy::input::keyboard::KeyboardInput;
use bevy::input::mouse::MouseMotion;
use bevy::input::ButtonState;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow, WindowFocused};

use crate::shared::*;

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<InputState>()
            .init_resource::<PointerLock>()
            .init_resource::<KeyBindings>();

        // Already registered by the window and input plugins in the real
        // app; registering again is a no-op.
        app.add_event::<KeyboardInput>()
            .add_event::<MouseMotion>()
            .add_event::<WindowFocused>();

        app.add_systems(
            PreUpdate,
            (read_key_events, read_mouse_motion, release_on_focus_loss).chain(),
        );
        app.add_systems(Last, clear_frame_edges);

        app.add_systems(OnEnter(GameState::Playing), engage_pointer_lock);
        app.add_systems(OnExit(GameState::Playing), release_pointer_lock);
        app.add_systems(
            Update,
            manage_pointer_lock
                .in_set(FrameSet::Input)
                .run_if(in_state(GameState::Playing)),
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// INPUT STATE
// ═══════════════════════════════════════════════════════════════════════

/// Held keys as reported by raw key-down / key-up events.
///
/// A key stays held until its key-up arrives; there is no timeout. The
/// press-edge set and the mouse delta only live for the frame they were
/// recorded in.
#[derive(Resource, Debug, Default)]
pub struct InputState {
    held: HashMap<KeyCode, bool>,
    pressed_this_frame: HashSet<KeyCode>,
    mouse_delta: Vec2,
}

impl InputState {
    /// Record a physical key transition. OS auto-repeat presses of a key
    /// that is already held do not count as new edges.
    pub fn apply_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            if !self.is_held(key) {
                self.pressed_this_frame.insert(key);
            }
            self.held.insert(key, true);
        } else {
            self.held.insert(key, false);
        }
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.get(&key).copied().unwrap_or(false)
    }

    pub fn just_pressed(&self, key: KeyCode) -> bool {
        self.pressed_this_frame.contains(&key)
    }

    /// Mouse movement only maps to look rotation while the pointer is captured.
    pub fn add_mouse_delta(&mut self, delta: Vec2, pointer_locked: bool) {
        if pointer_locked {
            self.mouse_delta += delta;
        }
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    pub fn release_all(&mut self) {
        for held in self.held.values_mut() {
            *held = false;
        }
    }

    pub fn end_frame(&mut self) {
        self.pressed_this_frame.clear();
        self.mouse_delta = Vec2::ZERO;
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

fn read_key_events(mut events: EventReader<KeyboardInput>, mut input: ResMut<InputState>) {
    for event in events.read() {
        input.apply_key(event.key_code, event.state == ButtonState::Pressed);
    }
}

fn read_mouse_motion(
    mut events: EventReader<MouseMotion>,
    lock: Res<PointerLock>,
    mut input: ResMut<InputState>,
) {
    for event in events.read() {
        input.add_mouse_delta(event.delta, lock.locked);
    }
}

/// Browsers and compositors drop key-up events while unfocused, so every
/// key is released when the window loses focus.
fn release_on_focus_loss(
    mut events: EventReader<WindowFocused>,
    mut input: ResMut<InputState>,
    mut lock: ResMut<PointerLock>,
) {
    for event in events.read() {
        if !event.focused {
            input.release_all();
            lock.locked = false;
        }
    }
}

fn clear_frame_edges(mut input: ResMut<InputState>) {
    input.end_frame();
}

fn set_cursor_grab(window: &mut Window, locked: bool) {
    if locked {
        window.cursor_options.grab_mode = CursorGrabMode::Locked;
        window.cursor_options.visible = false;
    } else {
        window.cursor_options.grab_mode = CursorGrabMode::None;
        window.cursor_options.visible = true;
    }
}

fn engage_pointer_lock(
    mut lock: ResMut<PointerLock>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    lock.locked = true;
    if let Ok(mut window) = windows.get_single_mut() {
        set_cursor_grab(&mut window, true);
    }
}

fn release_pointer_lock(
    mut lock: ResMut<PointerLock>,
    mut input: ResMut<InputState>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    lock.locked = false;
    input.release_all();
    if let Ok(mut window) = windows.get_single_mut() {
        set_cursor_grab(&mut window, false);
    }
}

/// Escape releases the pointer and pauses; clicking the window recaptures it.
fn manage_pointer_lock(
    input: Res<InputState>,
    bindings: Res<KeyBindings>,
    mouse: Option<Res<ButtonInput<MouseButton>>>,
    mut lock: ResMut<PointerLock>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if input.just_pressed(bindings.pause) {
        next_state.set(GameState::Paused);
        return;
    }

    let clicked = mouse.is_some_and(|m| m.just_pressed(MouseButton::Left));
    if !lock.locked && clicked {
        lock.locked = true;
        if let Ok(mut window) = windows.get_single_mut() {
            set_cursor_grab(&mut window, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_held_until_release() {
        let mut input = InputState::default();
        input.apply_key(KeyCode::KeyW, true);
        input.end_frame();
        assert!(input.is_held(KeyCode::KeyW));
        input.end_frame();
        assert!(input.is_held(KeyCode::KeyW), "no timeout on held keys");
        input.apply_key(KeyCode::KeyW, false);
        assert!(!input.is_held(KeyCode::KeyW));
    }

    #[test]
    fn test_auto_repeat_is_not_a_new_edge() {
        let mut input = InputState::default();
        input.apply_key(KeyCode::KeyE, true);
        assert!(input.just_pressed(KeyCode::KeyE));
        input.end_frame();
        input.apply_key(KeyCode::KeyE, true);
        assert!(!input.just_pressed(KeyCode::KeyE));
    }

    #[test]
    fn test_mouse_delta_ignored_without_pointer_lock() {
        let mut input = InputState::default();
        input.add_mouse_delta(Vec2::new(10.0, 5.0), false);
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        input.add_mouse_delta(Vec2::new(10.0, 5.0), true);
        input.add_mouse_delta(Vec2::new(1.0, 1.0), true);
        assert_eq!(input.mouse_delta(), Vec2::new(11.0, 6.0));
        input.end_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }

    #[test]
    fn test_release_all_clears_held_keys() {
        let mut input = InputState::default();
        input.apply_key(KeyCode::KeyA, true);
        input.apply_key(KeyCode::Space, true);
        input.release_all();
        assert!(!input.is_held(KeyCode::KeyA));
        assert!(!input.is_held(KeyCode::Space));
    }
}
