//! Interaction Dispatcher (E key / click)
//!
//! One system reads the press edge, looks up the focused descriptor and
//! matches its kind. The match is pure (`dispatch_interaction`) and returns
//! an `InteractionEffect`; the system then turns the effect into events and
//! resource writes.

use bevy::prelude::*;

use super::focus::FocusState;
use super::registry::InteractableRegistry;
use crate::input::InputState;
use crate::progress::PersistentProgress;
use crate::shared::*;

/// What happened as a result of activating an interactable.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEffect {
    OpenModal(ActiveModal),
    /// Progress may have changed; tell the player.
    Notify {
        message: String,
        sfx: &'static str,
        save: bool,
    },
    Teleport {
        position: Vec3,
        floor_y: f32,
        yaw: Option<f32>,
    },
    ToggleLight(Entity),
}

/// Map an interactable kind to its effect, mutating progress where the
/// interaction has no confirmation step.
pub fn dispatch_interaction(
    kind: &InteractableKind,
    progress: &mut PersistentProgress,
    now: u64,
) -> InteractionEffect {
    match kind {
        InteractableKind::Plant => {
            progress.water_plant(now);
            InteractionEffect::Notify {
                message: "Plant watered! It looks happier now.".into(),
                sfx: "water",
                save: true,
            }
        }
        InteractableKind::DisplayScreen => InteractionEffect::OpenModal(ActiveModal::Gallery),
        InteractableKind::Mailbox => InteractionEffect::OpenModal(ActiveModal::Letters),
        InteractableKind::WishSpot => InteractionEffect::OpenModal(ActiveModal::Wish),
        InteractableKind::TeaSet => {
            progress.tea_cups += 1;
            InteractionEffect::Notify {
                message: format!("You pour a warm cup of tea. ({} so far)", progress.tea_cups),
                sfx: "click",
                save: false,
            }
        }
        InteractableKind::MeditationSpot => {
            progress.meditations += 1;
            InteractionEffect::Notify {
                message: "You sit quietly and listen to the raked sand.".into(),
                sfx: "success",
                save: false,
            }
        }
        InteractableKind::ElevatorButton {
            destination_floor,
            arrival,
        } => InteractionEffect::Teleport {
            position: *arrival,
            floor_y: *destination_floor,
            yaw: None,
        },
        InteractableKind::SitPoint { seat, facing_yaw } => InteractionEffect::Teleport {
            position: *seat,
            floor_y: seat.y - EYE_HEIGHT,
            yaw: Some(*facing_yaw),
        },
        InteractableKind::Lamp { light } => InteractionEffect::ToggleLight(*light),
    }
}

/// Fires once per interact press edge (or primary click) while movement is
/// live and something is focused.
#[allow(clippy::too_many_arguments)]
pub fn dispatch_on_press(
    input: Res<InputState>,
    bindings: Res<KeyBindings>,
    mouse: Option<Res<ButtonInput<MouseButton>>>,
    focus: Res<FocusState>,
    registry: Res<InteractableRegistry>,
    mut progress: ResMut<PersistentProgress>,
    mut player: ResMut<PlayerState>,
    mut lights: Query<&mut Visibility>,
    mut modal_events: EventWriter<OpenModalEvent>,
    mut save_events: EventWriter<SaveRequestEvent>,
    mut sfx_events: EventWriter<PlaySfxEvent>,
    mut toasts: EventWriter<ToastEvent>,
) {
    // movement_enabled was synced before the pointer-lock click handler ran,
    // so the click that captures the pointer never also activates a prop.
    if !player.movement_enabled {
        return;
    }
    let clicked = mouse.is_some_and(|m| m.just_pressed(MouseButton::Left));
    if !input.just_pressed(bindings.interact) && !clicked {
        return;
    }
    let Some(target) = focus.current else {
        return;
    };
    let Some(descriptor) = registry.get(target) else {
        return;
    };

    sfx_events.send(PlaySfxEvent {
        sfx_id: "click".into(),
    });

    match dispatch_interaction(&descriptor.kind, &mut progress, unix_timestamp()) {
        InteractionEffect::OpenModal(modal) => {
            modal_events.send(OpenModalEvent { modal });
        }
        InteractionEffect::Notify { message, sfx, save } => {
            if sfx != "click" {
                sfx_events.send(PlaySfxEvent { sfx_id: sfx.into() });
            }
            toasts.send(ToastEvent::new(message));
            if save {
                save_events.send(SaveRequestEvent);
            }
        }
        InteractionEffect::Teleport {
            position,
            floor_y,
            yaw,
        } => {
            player.position = position;
            player.floor_y = floor_y;
            player.vertical_velocity = 0.0;
            player.grounded = true;
            player.can_jump = true;
            if let Some(yaw) = yaw {
                player.yaw = yaw;
                player.pitch = 0.0;
            }
        }
        InteractionEffect::ToggleLight(light) => {
            if let Ok(mut visibility) = lights.get_mut(light) {
                *visibility = match *visibility {
                    Visibility::Hidden => Visibility::Inherited,
                    _ => Visibility::Hidden,
                };
            }
        }
    }
}

/// Hotkeys that open a panel directly, bypassing focus.
pub fn modal_hotkeys(
    input: Res<InputState>,
    bindings: Res<KeyBindings>,
    player: Res<PlayerState>,
    mut modal_events: EventWriter<OpenModalEvent>,
) {
    if !player.movement_enabled {
        return;
    }
    if input.just_pressed(bindings.open_diary) {
        modal_events.send(OpenModalEvent {
            modal: ActiveModal::Diary,
        });
    } else if input.just_pressed(bindings.open_plant) {
        modal_events.send(OpenModalEvent {
            modal: ActiveModal::PlantCare,
        });
    }
}

/// Switch into the modal state for the most recent open request.
pub fn open_requested_modal(
    mut events: EventReader<OpenModalEvent>,
    mut active: ResMut<ActiveModal>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let Some(last) = events.read().last() else {
        return;
    };
    *active = last.modal;
    next_state.set(GameState::Modal);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plant_waters_without_modal() {
        let mut progress = PersistentProgress::default();
        let effect = dispatch_interaction(&InteractableKind::Plant, &mut progress, 42);
        assert!(matches!(effect, InteractionEffect::Notify { save: true, .. }));
        assert_eq!(progress.plant.water_count, 1);
        assert_eq!(progress.plant.last_watered, Some(42));
    }

    #[test]
    fn test_modal_kinds_leave_progress_untouched() {
        let mut progress = PersistentProgress::default();
        let before = progress.fingerprint();
        for (kind, modal) in [
            (InteractableKind::DisplayScreen, ActiveModal::Gallery),
            (InteractableKind::Mailbox, ActiveModal::Letters),
            (InteractableKind::WishSpot, ActiveModal::Wish),
        ] {
            assert_eq!(
                dispatch_interaction(&kind, &mut progress, 0),
                InteractionEffect::OpenModal(modal)
            );
        }
        assert_eq!(progress.fingerprint(), before);
    }

    #[test]
    fn test_counters_increment() {
        let mut progress = PersistentProgress::default();
        dispatch_interaction(&InteractableKind::TeaSet, &mut progress, 0);
        dispatch_interaction(&InteractableKind::TeaSet, &mut progress, 0);
        dispatch_interaction(&InteractableKind::MeditationSpot, &mut progress, 0);
        assert_eq!(progress.tea_cups, 2);
        assert_eq!(progress.meditations, 1);
    }

    #[test]
    fn test_elevator_targets_floor() {
        let mut progress = PersistentProgress::default();
        let arrival = Vec3::new(16.0, SKY_DECK_FLOOR + EYE_HEIGHT, 0.0);
        let effect = dispatch_interaction(
            &InteractableKind::ElevatorButton {
                destination_floor: SKY_DECK_FLOOR,
                arrival,
            },
            &mut progress,
            0,
        );
        assert_eq!(
            effect,
            InteractionEffect::Teleport {
                position: arrival,
                floor_y: SKY_DECK_FLOOR,
                yaw: None,
            }
        );
    }
}
