//! Ambient particles: blossom petals over the terrace, fireflies in the
//! garden, and steam over the tea cup. Entities are spawned once; the
//! ticker moves them forever.

use bevy::prelude::*;
use rand::Rng;

use super::layout;
use crate::ambient::effects;
use crate::ambient::AnimationTicker;

const BLOSSOM_COUNT: usize = 300;
const FIREFLY_COUNT: usize = 60;
const STEAM_COUNT: usize = 30;

/// Blossom fall volume: the terrace, up to the respawn height.
const BLOSSOM_AREA: (Vec3, Vec3) = (Vec3::new(10.0, 0.0, -9.0), Vec3::new(20.0, 12.0, 6.0));

#[derive(Component, Debug)]
pub struct Blossom;

#[derive(Component, Debug)]
pub struct Firefly;

#[derive(Component, Debug)]
pub struct SteamWisp;

fn spawn_dot(
    commands: &mut Commands,
    visual: &Option<(Handle<Mesh>, Handle<StandardMaterial>)>,
    position: Vec3,
    marker: impl Component,
) -> Entity {
    let mut entity = commands.spawn((marker, Transform::from_translation(position), Visibility::default()));
    if let Some((mesh, material)) = visual {
        entity.insert((Mesh3d(mesh.clone()), MeshMaterial3d(material.clone())));
    }
    entity.id()
}

pub fn spawn_particles(
    mut commands: Commands,
    mut ticker: ResMut<AnimationTicker>,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
) {
    let (petal, glow, steam) = match (meshes, materials) {
        (Some(mut meshes), Some(mut materials)) => {
            let mut dot = |radius: f32, mat: StandardMaterial| {
                Some((meshes.add(Sphere::new(radius)), materials.add(mat)))
            };
            (
                dot(
                    0.04,
                    StandardMaterial {
                        base_color: Color::srgb(1.0, 0.75, 0.82),
                        ..default()
                    },
                ),
                dot(
                    0.03,
                    StandardMaterial {
                        base_color: Color::srgb(0.9, 1.0, 0.5),
                        emissive: LinearRgba::rgb(3.0, 4.0, 1.0),
                        ..default()
                    },
                ),
                dot(
                    0.05,
                    StandardMaterial {
                        base_color: Color::srgba(1.0, 1.0, 1.0, 0.25),
                        alpha_mode: AlphaMode::Blend,
                        ..default()
                    },
                ),
            )
        }
        _ => (None, None, None),
    };

    let mut rng = rand::thread_rng();
    let (min, max) = BLOSSOM_AREA;

    let petals: Vec<Entity> = (0..BLOSSOM_COUNT)
        .map(|_| {
            let position = Vec3::new(
                rng.gen_range(min.x..max.x),
                rng.gen_range(min.y..max.y),
                rng.gen_range(min.z..max.z),
            );
            spawn_dot(&mut commands, &petal, position, Blossom)
        })
        .collect();
    ticker.spawn(effects::blossom_drift(petals, BLOSSOM_AREA, rng.gen()));

    let flies: Vec<(Entity, Vec3)> = (0..FIREFLY_COUNT)
        .map(|_| {
            let home = layout::ZEN_GARDEN_POS
                + Vec3::new(
                    rng.gen_range(-3.0..3.0),
                    rng.gen_range(0.5..2.5),
                    rng.gen_range(-3.0..3.0),
                );
            (spawn_dot(&mut commands, &glow, home, Firefly), home)
        })
        .collect();
    ticker.spawn(effects::firefly_wander(flies));

    let cup_rim = layout::TEA_SET_POS + Vec3::Y * 0.2;
    let wisps: Vec<Entity> = (0..STEAM_COUNT)
        .map(|i| {
            let position = cup_rim + Vec3::Y * (i as f32 / STEAM_COUNT as f32) * 0.8;
            spawn_dot(&mut commands, &steam, position, SteamWisp)
        })
        .collect();
    ticker.spawn(effects::steam_rise(wisps, cup_rim, 0.8));
}
