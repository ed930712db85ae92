use bevy::prelude::*;

use crate::interaction::InteractableRegistry;
use crate::progress::PersistentProgress;
use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// MARKER COMPONENTS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Component)]
pub struct HudRoot;

#[derive(Component)]
pub struct Crosshair;

/// Name and description of the focused prop. Empty when nothing is focused.
#[derive(Component)]
pub struct FocusHintText;

#[derive(Component)]
pub struct CounterText;

const CROSSHAIR_IDLE: Color = Color::srgba(1.0, 1.0, 1.0, 0.5);
const CROSSHAIR_FOCUSED: Color = Color::srgb(1.0, 0.75, 0.85);

// ═══════════════════════════════════════════════════════════════════════
// SPAWN / DESPAWN
// ═══════════════════════════════════════════════════════════════════════

pub fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            HudRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                ..default()
            },
        ))
        .with_children(|parent| {
            // Counters, top-left
            parent.spawn((
                CounterText,
                Text::new(""),
                TextFont {
                    font_size: 15.0,
                    ..default()
                },
                TextColor(Color::srgb(0.95, 0.9, 1.0)),
                Node {
                    position_type: PositionType::Absolute,
                    left: Val::Px(16.0),
                    top: Val::Px(12.0),
                    ..default()
                },
            ));

            // Crosshair, dead center
            parent.spawn((
                Crosshair,
                Node {
                    position_type: PositionType::Absolute,
                    left: Val::Percent(50.0),
                    top: Val::Percent(50.0),
                    width: Val::Px(6.0),
                    height: Val::Px(6.0),
                    margin: UiRect::all(Val::Px(-3.0)),
                    ..default()
                },
                BackgroundColor(CROSSHAIR_IDLE),
                BorderRadius::MAX,
            ));

            // Focus hint, just below center
            parent
                .spawn(Node {
                    position_type: PositionType::Absolute,
                    top: Val::Percent(56.0),
                    width: Val::Percent(100.0),
                    justify_content: JustifyContent::Center,
                    ..default()
                })
                .with_children(|row| {
                    row.spawn((
                        FocusHintText,
                        Text::new(""),
                        TextFont {
                            font_size: 18.0,
                            ..default()
                        },
                        TextColor(Color::WHITE),
                    ));
                });
        });
}

pub fn despawn_hud(mut commands: Commands, query: Query<Entity, With<HudRoot>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

// ═══════════════════════════════════════════════════════════════════════
// UPDATE SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

pub fn hint_for(registry: &InteractableRegistry, focus: Option<InteractableId>) -> String {
    focus
        .and_then(|id| registry.get(id))
        .map(|descriptor| format!("[E] {}", descriptor.hint()))
        .unwrap_or_default()
}

pub fn update_focus_hint(
    mut events: EventReader<FocusChangedEvent>,
    registry: Res<InteractableRegistry>,
    mut hint: Query<&mut Text, With<FocusHintText>>,
    mut crosshair: Query<&mut BackgroundColor, With<Crosshair>>,
) {
    let Some(event) = events.read().last() else {
        return;
    };
    if let Ok(mut text) = hint.get_single_mut() {
        text.0 = hint_for(&registry, event.focus);
    }
    if let Ok(mut bg) = crosshair.get_single_mut() {
        bg.0 = if event.focus.is_some() {
            CROSSHAIR_FOCUSED
        } else {
            CROSSHAIR_IDLE
        };
    }
}

pub fn format_play_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

pub fn update_counters(
    progress: Res<PersistentProgress>,
    mut query: Query<&mut Text, With<CounterText>>,
) {
    let Ok(mut text) = query.get_single_mut() else {
        return;
    };
    text.0 = format!(
        "Plant day {}  |  Letters {}  |  Photos {}  |  {}",
        progress.plant.day,
        progress.letters_received.len() + progress.letters_sent.len(),
        progress.photos.len(),
        format_play_time(progress.play_time_seconds),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::ColliderShape;

    #[test]
    fn test_format_play_time() {
        assert_eq!(format_play_time(0.0), "0:00:00");
        assert_eq!(format_play_time(3725.9), "1:02:05");
    }

    #[test]
    fn test_hint_empty_without_focus() {
        let mut registry = InteractableRegistry::default();
        let id = registry.register(
            InteractableKind::TeaSet,
            "Tea Set",
            "Brew a cup",
            None,
            [ColliderShape::sphere(Vec3::ZERO, 0.5)],
        );
        assert_eq!(hint_for(&registry, None), "");
        assert_eq!(hint_for(&registry, Some(id)), "[E] Tea Set - Brew a cup");
    }
}
