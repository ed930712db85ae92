use bevy::prelude::*;

use super::registry::InteractableRegistry;
use crate::config::SanctuaryConfig;
use crate::shared::*;

/// The interactable under the crosshair, if any. Recomputed every frame
/// while playing.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusState {
    pub current: Option<InteractableId>,
}

/// Screen-center ray: in pointer-lock mode the look direction is the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl LookRay {
    pub fn from_player(player: &PlayerState) -> Self {
        Self {
            origin: player.position,
            direction: player.forward().normalize_or_zero(),
        }
    }
}

/// Nearest interactable whose hit distance is strictly below `max_distance`.
pub fn resolve_focus(
    ray: &LookRay,
    registry: &InteractableRegistry,
    max_distance: f32,
) -> Option<InteractableId> {
    let mut best: Option<(f32, InteractableId)> = None;
    for collider in registry.colliders() {
        let Some(distance) = collider.shape.ray_distance(ray.origin, ray.direction) else {
            continue;
        };
        if distance >= max_distance {
            continue;
        }
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, collider.owner));
        }
    }
    best.map(|(_, id)| id)
}

pub fn update_focus(
    player: Res<PlayerState>,
    registry: Res<InteractableRegistry>,
    config: Res<SanctuaryConfig>,
    mut focus: ResMut<FocusState>,
    mut changed: EventWriter<FocusChangedEvent>,
) {
    if !player.movement_enabled {
        return;
    }
    let ray = LookRay::from_player(&player);
    let resolved = resolve_focus(&ray, &registry, config.max_interaction_distance);
    if resolved != focus.current {
        focus.current = resolved;
        changed.send(FocusChangedEvent { focus: resolved });
    }
}

/// Leaving play mode drops the hint so it is not stale when play resumes.
pub fn clear_focus(mut focus: ResMut<FocusState>, mut changed: EventWriter<FocusChangedEvent>) {
    if focus.current.is_some() {
        focus.current = None;
        changed.send(FocusChangedEvent { focus: None });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::registry::ColliderShape;

    fn ray_forward() -> LookRay {
        LookRay {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        }
    }

    #[test]
    fn test_empty_registry_has_no_focus() {
        let registry = InteractableRegistry::default();
        assert_eq!(resolve_focus(&ray_forward(), &registry, 5.0), None);
    }

    #[test]
    fn test_nearest_hit_wins() {
        let mut registry = InteractableRegistry::default();
        let far = registry.register(
            InteractableKind::TeaSet,
            "Far",
            "",
            None,
            [ColliderShape::cuboid(Vec3::new(0.0, 0.0, -4.0), Vec3::splat(0.5))],
        );
        let near = registry.register(
            InteractableKind::Plant,
            "Near",
            "",
            None,
            [ColliderShape::cuboid(Vec3::new(0.0, 0.0, -2.0), Vec3::splat(0.5))],
        );
        assert_eq!(resolve_focus(&ray_forward(), &registry, 5.0), Some(near));
        assert_ne!(Some(far), Some(near));
    }

    #[test]
    fn test_compound_prop_resolves_to_owner() {
        let mut registry = InteractableRegistry::default();
        let id = registry.register(
            InteractableKind::Mailbox,
            "Letterbox",
            "",
            None,
            [
                ColliderShape::cuboid(Vec3::new(2.0, 0.0, -3.0), Vec3::splat(0.5)),
                ColliderShape::sphere(Vec3::new(0.0, 0.0, -3.0), 0.3),
            ],
        );
        assert_eq!(resolve_focus(&ray_forward(), &registry, 5.0), Some(id));
    }

    #[test]
    fn test_max_distance_is_exclusive() {
        let eps = 1e-3;
        let face_at = |d: f32| {
            let mut registry = InteractableRegistry::default();
            // Box front face sits exactly `d` in front of the camera.
            registry.register(
                InteractableKind::TeaSet,
                "Tea",
                "",
                None,
                [ColliderShape::Aabb {
                    min: Vec3::new(-0.5, -0.5, -d - 1.0),
                    max: Vec3::new(0.5, 0.5, -d),
                }],
            );
            registry
        };
        assert!(resolve_focus(&ray_forward(), &face_at(5.0 - eps), 5.0).is_some());
        assert!(resolve_focus(&ray_forward(), &face_at(5.0), 5.0).is_none());
        assert!(resolve_focus(&ray_forward(), &face_at(5.0 + eps), 5.0).is_none());
    }

    #[test]
    fn test_focus_is_idempotent() {
        let mut registry = InteractableRegistry::default();
        registry.register(
            InteractableKind::WishSpot,
            "Star",
            "",
            None,
            [ColliderShape::sphere(Vec3::new(0.0, 0.0, -3.0), 0.5)],
        );
        let first = resolve_focus(&ray_forward(), &registry, 5.0);
        let second = resolve_focus(&ray_forward(), &registry, 5.0);
        assert!(first.is_some());
        assert_eq!(first, second);
    }
}
