//! Flat list of everything the player can focus and activate.
//!
//! Populated once while the world is built. Each prop registers one
//! descriptor plus one or more collider primitives; every primitive carries
//! its owner's id so a hit resolves in constant time.

use bevy::prelude::*;

use crate::shared::*;

#[derive(Debug, Clone, PartialEq)]
pub struct InteractableDescriptor {
    pub id: InteractableId,
    pub kind: InteractableKind,
    pub name: String,
    pub description: String,
    /// Root entity of the prop, if it has a visual.
    pub entity: Option<Entity>,
}

impl InteractableDescriptor {
    /// Text for the on-screen hint.
    pub fn hint(&self) -> String {
        format!("{} - {}", self.name, self.description)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Aabb { min: Vec3, max: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

impl ColliderShape {
    /// Axis-aligned box from a center and full size.
    pub fn cuboid(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        ColliderShape::Aabb {
            min: center - half,
            max: center + half,
        }
    }

    pub fn sphere(center: Vec3, radius: f32) -> Self {
        ColliderShape::Sphere { center, radius }
    }

    /// Distance along the ray to the first contact. A ray that starts inside
    /// the shape hits at distance zero. `direction` must be normalized.
    pub fn ray_distance(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        match *self {
            ColliderShape::Aabb { min, max } => ray_aabb(origin, direction, min, max),
            ColliderShape::Sphere { center, radius } => ray_sphere(origin, direction, center, radius),
        }
    }
}

fn ray_aabb(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < f32::EPSILON {
            // Parallel to this slab: must already be between its planes.
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_exit < 0.0 {
        return None;
    }
    Some(t_enter.max(0.0))
}

fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_origin = origin - center;
    let b = to_origin.dot(direction);
    let c = to_origin.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    if b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some(-b - discriminant.sqrt())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderPrimitive {
    pub shape: ColliderShape,
    pub owner: InteractableId,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct InteractableRegistry {
    descriptors: Vec<InteractableDescriptor>,
    colliders: Vec<ColliderPrimitive>,
}

impl InteractableRegistry {
    /// Adds a prop and its collision proxies. Returns the new id.
    pub fn register(
        &mut self,
        kind: InteractableKind,
        name: impl Into<String>,
        description: impl Into<String>,
        entity: Option<Entity>,
        shapes: impl IntoIterator<Item = ColliderShape>,
    ) -> InteractableId {
        let id = InteractableId(self.descriptors.len());
        self.descriptors.push(InteractableDescriptor {
            id,
            kind,
            name: name.into(),
            description: description.into(),
            entity,
        });
        self.colliders.extend(
            shapes
                .into_iter()
                .map(|shape| ColliderPrimitive { shape, owner: id }),
        );
        id
    }

    pub fn get(&self, id: InteractableId) -> Option<&InteractableDescriptor> {
        self.descriptors.get(id.0)
    }

    pub fn colliders(&self) -> &[ColliderPrimitive] {
        &self.colliders
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_hits_box_front_face() {
        let shape = ColliderShape::cuboid(Vec3::new(0.0, 0.0, -5.0), Vec3::splat(2.0));
        let d = shape.ray_distance(Vec3::ZERO, Vec3::NEG_Z).unwrap();
        assert!((d - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_misses_box_behind() {
        let shape = ColliderShape::cuboid(Vec3::new(0.0, 0.0, 5.0), Vec3::splat(2.0));
        assert!(shape.ray_distance(Vec3::ZERO, Vec3::NEG_Z).is_none());
    }

    #[test]
    fn test_ray_parallel_outside_slab_misses() {
        let shape = ColliderShape::cuboid(Vec3::new(3.0, 0.0, -5.0), Vec3::splat(2.0));
        assert!(shape.ray_distance(Vec3::ZERO, Vec3::NEG_Z).is_none());
    }

    #[test]
    fn test_ray_inside_box_hits_at_zero() {
        let shape = ColliderShape::cuboid(Vec3::ZERO, Vec3::splat(2.0));
        assert_eq!(shape.ray_distance(Vec3::ZERO, Vec3::X), Some(0.0));
    }

    #[test]
    fn test_ray_sphere_distance() {
        let shape = ColliderShape::sphere(Vec3::new(0.0, 0.0, -10.0), 1.0);
        let d = shape.ray_distance(Vec3::ZERO, Vec3::NEG_Z).unwrap();
        assert!((d - 9.0).abs() < 1e-4);
        assert!(shape.ray_distance(Vec3::ZERO, Vec3::Z).is_none());
    }

    #[test]
    fn test_register_assigns_owner_to_every_primitive() {
        let mut registry = InteractableRegistry::default();
        registry.register(InteractableKind::TeaSet, "Tea", "warm", None, []);
        let id = registry.register(
            InteractableKind::Plant,
            "Bonsai",
            "water it",
            None,
            [
                ColliderShape::cuboid(Vec3::ZERO, Vec3::ONE),
                ColliderShape::sphere(Vec3::Y, 0.5),
            ],
        );
        assert_eq!(id, InteractableId(1));
        assert_eq!(registry.colliders().len(), 2);
        assert!(registry.colliders().iter().all(|c| c.owner == id));
        assert_eq!(registry.get(id).unwrap().hint(), "Bonsai - water it");
    }
}
