//! Warm interior lighting: paper lanterns that flicker, one stone lantern
//! on the terrace the player can switch, and a dim moonlight fill.

use bevy::prelude::*;

use crate::ambient::effects;
use crate::ambient::AnimationTicker;
use crate::progress::PersistentProgress;

/// Marker for lights driven by the flicker effect.
#[derive(Component, Debug)]
pub struct PaperLantern;

/// The one shadow-casting light.
#[derive(Component, Debug)]
pub struct Moonlight;

const LANTERN_INTENSITY: f32 = 60_000.0;
const PAPER_LANTERN_INTENSITY: f32 = 40_000.0;

const PAPER_LANTERNS: [Vec3; 4] = [
    Vec3::new(-6.0, 3.8, -7.0),
    Vec3::new(6.0, 3.8, -7.0),
    Vec3::new(-6.0, 3.8, 3.0),
    Vec3::new(6.0, 3.8, 3.0),
];

/// The switchable terrace lantern. Returned so the lamp interactable can
/// reference it.
pub fn spawn_lantern(commands: &mut Commands, position: Vec3) -> Entity {
    commands
        .spawn((
            PointLight {
                color: Color::srgb(1.0, 0.75, 0.45),
                intensity: LANTERN_INTENSITY,
                range: 12.0,
                shadows_enabled: false,
                ..default()
            },
            Transform::from_translation(position),
            Visibility::default(),
        ))
        .id()
}

pub fn spawn_lights(mut commands: Commands, mut ticker: ResMut<AnimationTicker>) {
    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.55, 0.6, 0.9),
        brightness: 120.0,
    });

    commands.spawn((
        Moonlight,
        DirectionalLight {
            color: Color::srgb(0.7, 0.75, 1.0),
            illuminance: 2_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(10.0, 20.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let mut flickering = Vec::with_capacity(PAPER_LANTERNS.len());
    for position in PAPER_LANTERNS {
        let light = commands
            .spawn((
                PaperLantern,
                PointLight {
                    color: Color::srgb(1.0, 0.7, 0.4),
                    intensity: PAPER_LANTERN_INTENSITY,
                    range: 10.0,
                    ..default()
                },
                Transform::from_translation(position),
            ))
            .id();
        flickering.push((light, PAPER_LANTERN_INTENSITY));
    }
    ticker.spawn(effects::light_flicker(flickering));
}

pub fn apply_shadow_setting(
    progress: Res<PersistentProgress>,
    mut lights: Query<&mut DirectionalLight, With<Moonlight>>,
) {
    let shadows = progress.settings.shadows;
    for mut light in &mut lights {
        if light.shadows_enabled != shadows {
            light.shadows_enabled = shadows;
        }
    }
}
