//! Stock ambient effects. Each constructor returns a closure ready for
//! `AnimationTicker::spawn`. Entities that disappear are skipped silently.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::FrameTime;

/// Candle-style intensity wobble. `lights` holds each light and its base
/// intensity; neighbours are phase-shifted so they never pulse in step.
pub fn light_flicker(lights: Vec<(Entity, f32)>) -> impl FnMut(&mut World, FrameTime) + Send + Sync {
    move |world, time| {
        for (i, (entity, base)) in lights.iter().enumerate() {
            if let Some(mut light) = world.get_mut::<PointLight>(*entity) {
                let wobble = (time.now * 2.0 + i as f32 * 1.5).sin() * 0.15;
                light.intensity = base * (1.0 + wobble);
            }
        }
    }
}

/// Rock around the z axis, like a bonsai in a breeze.
pub fn gentle_sway(
    entity: Entity,
    base: Quat,
    amplitude: f32,
    speed: f32,
) -> impl FnMut(&mut World, FrameTime) + Send + Sync {
    move |world, time| {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.rotation = base * Quat::from_rotation_z((time.now * speed).sin() * amplitude);
        }
    }
}

/// Continuous yaw rotation at `speed` radians per second.
pub fn slow_spin(entity: Entity, speed: f32) -> impl FnMut(&mut World, FrameTime) + Send + Sync {
    move |world, time| {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.rotation = Quat::from_rotation_y(time.now * speed);
        }
    }
}

/// Falling petals inside `area` (min, max). Petals below the floor respawn
/// at the top.
pub fn blossom_drift(
    petals: Vec<Entity>,
    area: (Vec3, Vec3),
    seed: u64,
) -> impl FnMut(&mut World, FrameTime) + Send + Sync {
    const FALL_SPEED: f32 = 0.3;
    const RESPAWN_BELOW: f32 = -1.0;
    let mut rng = StdRng::seed_from_u64(seed);
    let (min, max) = area;
    move |world, time| {
        for (i, entity) in petals.iter().enumerate() {
            let Some(mut transform) = world.get_mut::<Transform>(*entity) else {
                continue;
            };
            let p = &mut transform.translation;
            p.y -= FALL_SPEED * time.delta;
            p.x += (time.now + i as f32).sin() * 0.1 * time.delta;
            if p.y < RESPAWN_BELOW {
                p.y = max.y;
                p.x = rng.gen_range(min.x..=max.x);
                p.z = rng.gen_range(min.z..=max.z);
            }
            transform.rotate_z(time.delta * 0.5);
        }
    }
}

/// Lazy figure-eight drift around each firefly's home position.
pub fn firefly_wander(flies: Vec<(Entity, Vec3)>) -> impl FnMut(&mut World, FrameTime) + Send + Sync {
    move |world, time| {
        for (i, (entity, home)) in flies.iter().enumerate() {
            let phase = i as f32;
            if let Some(mut transform) = world.get_mut::<Transform>(*entity) {
                transform.translation = *home
                    + Vec3::new(
                        (time.now * 0.5 + phase).sin() * 0.5,
                        (time.now * 0.7 + phase * 2.0).sin() * 0.3,
                        (time.now * 0.5 + phase).cos() * 0.5,
                    );
            }
        }
    }
}

/// Wisps rising from a cup; each loops back to the rim after `height`.
pub fn steam_rise(
    wisps: Vec<Entity>,
    origin: Vec3,
    height: f32,
) -> impl FnMut(&mut World, FrameTime) + Send + Sync {
    move |world, time| {
        for (i, entity) in wisps.iter().enumerate() {
            let Some(mut transform) = world.get_mut::<Transform>(*entity) else {
                continue;
            };
            let p = &mut transform.translation;
            p.y += 0.4 * time.delta;
            p.x = origin.x + (time.now * 1.3 + i as f32).sin() * 0.05;
            if p.y > origin.y + height {
                p.y = origin.y;
            }
        }
    }
}

pub const FIREWORK_DURATION: f32 = 2.5;
const FIREWORK_GRAVITY: f32 = -3.0;

/// Ballistic sparks flying out of `origin`, shrinking as they age. Spawn
/// with `spawn_timed(FIREWORK_DURATION, ..)` and `despawn_all` as the
/// completion.
pub fn firework_burst(
    sparks: Vec<(Entity, Vec3)>,
    origin: Vec3,
) -> impl FnMut(&mut World, FrameTime) + Send + Sync {
    move |world, time| {
        let t = time.age;
        let scale = (1.0 - t / FIREWORK_DURATION).max(0.05);
        for (entity, velocity) in &sparks {
            if let Some(mut transform) = world.get_mut::<Transform>(*entity) {
                transform.translation =
                    origin + *velocity * t + Vec3::Y * (0.5 * FIREWORK_GRAVITY * t * t);
                transform.scale = Vec3::splat(scale);
            }
        }
    }
}

/// Completion that removes the effect's entities.
pub fn despawn_all(entities: Vec<Entity>) -> impl FnOnce(&mut World) + Send + Sync {
    move |world| {
        for entity in entities {
            if let Ok(e) = world.get_entity_mut(entity) {
                e.despawn_recursive();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ambient::AnimationTicker;

    #[test]
    fn test_flicker_stays_within_band() {
        let mut world = World::new();
        let light = world
            .spawn(PointLight {
                intensity: 1000.0,
                ..default()
            })
            .id();
        let mut effect = light_flicker(vec![(light, 1000.0)]);
        for step in 0..200 {
            let now = step as f32 * 0.05;
            effect(&mut world, FrameTime { now, delta: 0.05, age: now });
            let intensity = world.get::<PointLight>(light).unwrap().intensity;
            assert!((849.0..=1151.0).contains(&intensity), "intensity {}", intensity);
        }
    }

    #[test]
    fn test_petals_respawn_above_floor() {
        let mut world = World::new();
        let petal = world.spawn(Transform::from_xyz(0.0, -0.99, 0.0)).id();
        let area = (Vec3::new(-5.0, 0.0, -5.0), Vec3::new(5.0, 12.0, 5.0));
        let mut effect = blossom_drift(vec![petal], area, 7);
        effect(&mut world, FrameTime { now: 0.0, delta: 0.1, age: 0.0 });
        let p = world.get::<Transform>(petal).unwrap().translation;
        assert_eq!(p.y, 12.0);
        assert!((-5.0..=5.0).contains(&p.x) && (-5.0..=5.0).contains(&p.z));
    }

    #[test]
    fn test_effect_skips_despawned_entity() {
        let mut world = World::new();
        let gone = world.spawn(Transform::default()).id();
        world.despawn(gone);
        let mut effect = slow_spin(gone, 1.0);
        effect(&mut world, FrameTime::default());
    }

    #[test]
    fn test_firework_despawns_sparks_on_completion() {
        let mut world = World::new();
        let sparks: Vec<Entity> = (0..4).map(|_| world.spawn(Transform::default()).id()).collect();
        let with_velocity = sparks.iter().map(|e| (*e, Vec3::Y * 2.0)).collect();

        let mut ticker = AnimationTicker::default();
        let handle = ticker.spawn_timed(
            FIREWORK_DURATION,
            firework_burst(with_velocity, Vec3::ZERO),
            despawn_all(sparks.clone()),
        );
        ticker.tick(&mut world, 1.0, 0.1);
        assert!(world.get::<Transform>(sparks[0]).unwrap().translation.y > 0.0);

        ticker.tick(&mut world, FIREWORK_DURATION, 0.1);
        assert!(!ticker.is_active(handle));
        assert!(sparks.iter().all(|e| world.get_entity(*e).is_err()));
    }
}
