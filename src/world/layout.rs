//! Where everything stands, and what the player can activate.
//!
//! The room spans x ∈ [-10, 10], z ∈ [-10, 7]; the terrace continues east
//! to x = 20. The sky deck sits above the east end of the terrace at
//! `SKY_DECK_FLOOR`.

use bevy::prelude::*;

use crate::interaction::{ColliderShape, InteractableRegistry};
use crate::shared::*;

pub const PLANT_POS: Vec3 = Vec3::new(4.0, 0.0, -8.0);
pub const TV_POS: Vec3 = Vec3::new(-5.0, 2.2, -9.5);
pub const POSTBOX_POS: Vec3 = Vec3::new(7.0, 1.0, -7.0);
pub const TEA_SET_POS: Vec3 = Vec3::new(0.0, 0.6, -5.0);
pub const ZEN_GARDEN_POS: Vec3 = Vec3::new(-7.0, 0.0, -3.0);
pub const WISHING_STAR_POS: Vec3 = Vec3::new(15.0, 3.5, -6.0);
pub const LANTERN_POS: Vec3 = Vec3::new(18.0, 1.5, 2.0);
pub const CUSHION_POS: Vec3 = Vec3::new(0.0, 0.0, -3.2);
pub const ELEVATOR_POS: Vec3 = Vec3::new(18.6, 0.0, -8.0);

/// Where the elevator drops the player on each floor.
pub const DECK_ARRIVAL: Vec3 = Vec3::new(16.0, SKY_DECK_FLOOR + EYE_HEIGHT, -6.5);
pub const GROUND_ARRIVAL: Vec3 = Vec3::new(16.0, EYE_HEIGHT, -6.5);

/// Ids of the registered props, for systems that need a specific one.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanctuaryProps {
    pub plant: InteractableId,
    pub tv: InteractableId,
    pub postbox: InteractableId,
    pub tea_set: InteractableId,
    pub zen_garden: InteractableId,
    pub wishing_star: InteractableId,
    pub cushion: InteractableId,
    pub elevator_up: InteractableId,
    pub elevator_down: InteractableId,
    pub lantern: InteractableId,
}

/// Visual roots of registered props. `None` when built without visuals.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropEntities {
    pub plant: Option<Entity>,
    pub tv: Option<Entity>,
    pub postbox: Option<Entity>,
    pub tea_set: Option<Entity>,
    pub zen_garden: Option<Entity>,
    pub wishing_star: Option<Entity>,
    pub elevator: Option<Entity>,
}

/// Register every interactable prop. The lamp needs its light entity up
/// front so the toggle can find it.
pub fn register_props(
    registry: &mut InteractableRegistry,
    entities: PropEntities,
    lantern_light: Entity,
) -> SanctuaryProps {
    let plant = registry.register(
        InteractableKind::Plant,
        "Bonsai",
        "Press E to water",
        entities.plant,
        [
            ColliderShape::cuboid(PLANT_POS + Vec3::Y * 0.35, Vec3::new(0.8, 0.7, 0.8)),
            ColliderShape::sphere(PLANT_POS + Vec3::Y * 1.0, 0.6),
        ],
    );
    let tv = registry.register(
        InteractableKind::DisplayScreen,
        "Memory Screen",
        "Press E to view photos",
        entities.tv,
        [ColliderShape::cuboid(TV_POS, Vec3::new(3.2, 1.9, 0.3))],
    );
    let postbox = registry.register(
        InteractableKind::Mailbox,
        "Letterbox",
        "Press E to read letters",
        entities.postbox,
        [
            ColliderShape::cuboid(POSTBOX_POS, Vec3::new(0.6, 2.0, 0.6)),
            ColliderShape::sphere(POSTBOX_POS + Vec3::Y * 1.05, 0.35),
        ],
    );
    let tea_set = registry.register(
        InteractableKind::TeaSet,
        "Tea Set",
        "Press E to pour tea",
        entities.tea_set,
        [ColliderShape::cuboid(TEA_SET_POS, Vec3::new(1.6, 0.4, 1.0))],
    );
    let zen_garden = registry.register(
        InteractableKind::MeditationSpot,
        "Zen Garden",
        "Press E to meditate",
        entities.zen_garden,
        [ColliderShape::cuboid(ZEN_GARDEN_POS + Vec3::Y * 0.1, Vec3::new(3.0, 0.3, 3.0))],
    );
    let wishing_star = registry.register(
        InteractableKind::WishSpot,
        "Wishing Star",
        "Press E to make a wish",
        entities.wishing_star,
        [ColliderShape::sphere(WISHING_STAR_POS, 0.6)],
    );
    let cushion = registry.register(
        InteractableKind::SitPoint {
            seat: CUSHION_POS + Vec3::Y * EYE_HEIGHT,
            facing_yaw: 0.0,
        },
        "Cushion",
        "Press E to sit by the tea",
        None,
        [ColliderShape::cuboid(CUSHION_POS + Vec3::Y * 0.1, Vec3::new(0.8, 0.2, 0.8))],
    );
    let elevator_up = registry.register(
        InteractableKind::ElevatorButton {
            destination_floor: SKY_DECK_FLOOR,
            arrival: DECK_ARRIVAL,
        },
        "Elevator",
        "Press E to ride up to the sky deck",
        entities.elevator,
        [ColliderShape::cuboid(ELEVATOR_POS + Vec3::Y * 1.2, Vec3::new(0.3, 0.4, 0.4))],
    );
    let elevator_down = registry.register(
        InteractableKind::ElevatorButton {
            destination_floor: 0.0,
            arrival: GROUND_ARRIVAL,
        },
        "Elevator",
        "Press E to ride down to the terrace",
        entities.elevator,
        [ColliderShape::cuboid(
            ELEVATOR_POS + Vec3::Y * (SKY_DECK_FLOOR + 1.2),
            Vec3::new(0.3, 0.4, 0.4),
        )],
    );
    let lantern = registry.register(
        InteractableKind::Lamp {
            light: lantern_light,
        },
        "Stone Lantern",
        "Press E to toggle the light",
        None,
        [ColliderShape::cuboid(LANTERN_POS - Vec3::Y * 0.5, Vec3::new(0.6, 1.6, 0.6))],
    );

    SanctuaryProps {
        plant,
        tv,
        postbox,
        tea_set,
        zen_garden,
        wishing_star,
        cushion,
        elevator_up,
        elevator_down,
        lantern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{resolve_focus, LookRay};

    fn registry() -> (InteractableRegistry, SanctuaryProps) {
        let mut registry = InteractableRegistry::default();
        let props = register_props(&mut registry, PropEntities::default(), Entity::PLACEHOLDER);
        (registry, props)
    }

    fn look_from(position: Vec3, yaw: f32, pitch: f32) -> LookRay {
        LookRay::from_player(&PlayerState {
            position,
            yaw,
            pitch,
            ..PlayerState::default()
        })
    }

    #[test]
    fn test_every_prop_inside_play_area() {
        let (registry, _) = registry();
        let (x_min, x_max, z_min, z_max) = ROOM_BOUNDS;
        for collider in registry.colliders() {
            let center = match collider.shape {
                ColliderShape::Aabb { min, max } => (min + max) * 0.5,
                ColliderShape::Sphere { center, .. } => center,
            };
            // Wall-mounted props may sit just past the walkable edge.
            assert!(center.x >= x_min - 1.0 && center.x <= x_max + 1.0);
            assert!(center.z >= z_min - 1.0 && center.z <= z_max + 1.0);
        }
    }

    #[test]
    fn test_plant_focused_from_front() {
        let (registry, props) = registry();
        let ray = look_from(Vec3::new(4.0, EYE_HEIGHT, -5.0), 0.0, -0.228);
        assert_eq!(resolve_focus(&ray, &registry, MAX_INTERACTION_DISTANCE), Some(props.plant));
    }

    #[test]
    fn test_spawn_view_has_no_focus() {
        let (registry, _) = registry();
        let ray = look_from(DEFAULT_SPAWN, 0.0, 0.0);
        assert_eq!(resolve_focus(&ray, &registry, MAX_INTERACTION_DISTANCE), None);
    }

    #[test]
    fn test_elevator_buttons_reachable_on_each_floor() {
        let (registry, props) = registry();
        // Facing +X (yaw -90°) from just west of the shaft.
        let yaw = -std::f32::consts::FRAC_PI_2;
        let ground = look_from(Vec3::new(16.5, 1.2, -8.0), yaw, 0.0);
        let deck = look_from(Vec3::new(16.5, SKY_DECK_FLOOR + 1.2, -8.0), yaw, 0.0);
        assert_eq!(resolve_focus(&ground, &registry, 5.0), Some(props.elevator_up));
        assert_eq!(resolve_focus(&deck, &registry, 5.0), Some(props.elevator_down));
    }
}
