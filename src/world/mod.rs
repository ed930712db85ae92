//! World domain: builds the room, terrace and sky deck, registers every
//! interactable, and hands ambient effects to the ticker.

pub mod layout;
pub mod lighting;
pub mod particles;

use bevy::prelude::*;
use rand::Rng;

use crate::ambient::effects::{self, FIREWORK_DURATION};
use crate::ambient::AnimationTicker;
use crate::interaction::InteractableRegistry;
use crate::progress::PersistentProgress;
use crate::shared::*;

pub use layout::{register_props, PropEntities, SanctuaryProps};

pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<WishMadeEvent>();
        app.add_systems(
            Startup,
            (build_sanctuary, lighting::spawn_lights, particles::spawn_particles).chain(),
        );
        app.add_systems(Update, launch_firework.in_set(FrameSet::Dispatch));
        app.add_systems(
            Update,
            lighting::apply_shadow_setting.run_if(resource_changed::<PersistentProgress>),
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// MESH KIT
// ═══════════════════════════════════════════════════════════════════════

/// Mesh and material stores, when the render plugins are present.
pub struct MeshKit<'a> {
    meshes: &'a mut Assets<Mesh>,
    materials: &'a mut Assets<StandardMaterial>,
}

impl MeshKit<'_> {
    fn material(&mut self, color: Color) -> MeshMaterial3d<StandardMaterial> {
        MeshMaterial3d(self.materials.add(StandardMaterial {
            base_color: color,
            perceptual_roughness: 0.8,
            ..default()
        }))
    }

    fn glowing(&mut self, color: Color, glow: LinearRgba) -> MeshMaterial3d<StandardMaterial> {
        MeshMaterial3d(self.materials.add(StandardMaterial {
            base_color: color,
            emissive: glow,
            ..default()
        }))
    }

    fn cuboid(&mut self, size: Vec3) -> Mesh3d {
        Mesh3d(self.meshes.add(Cuboid::from_size(size)))
    }

    fn sphere(&mut self, radius: f32) -> Mesh3d {
        Mesh3d(self.meshes.add(Sphere::new(radius)))
    }

    fn cylinder(&mut self, radius: f32, height: f32) -> Mesh3d {
        Mesh3d(self.meshes.add(Cylinder::new(radius, height)))
    }
}

/// Spawn a box, with a visual only when a kit is available.
fn spawn_block(
    commands: &mut Commands,
    kit: &mut Option<MeshKit>,
    center: Vec3,
    size: Vec3,
    color: Color,
) -> Entity {
    let mut entity = commands.spawn((Transform::from_translation(center), Visibility::default()));
    if let Some(kit) = kit.as_mut() {
        entity.insert((kit.cuboid(size), kit.material(color)));
    }
    entity.id()
}

// ═══════════════════════════════════════════════════════════════════════
// BUILD
// ═══════════════════════════════════════════════════════════════════════

#[derive(Component, Debug)]
pub struct RoomPart;

/// Room shell, props, registry and the prop-bound ambient effects.
#[allow(clippy::too_many_arguments)]
pub fn build_sanctuary(
    mut commands: Commands,
    mut registry: ResMut<InteractableRegistry>,
    mut ticker: ResMut<AnimationTicker>,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
) {
    let mut meshes = meshes;
    let mut materials = materials;
    let mut kit = match (meshes.as_deref_mut(), materials.as_deref_mut()) {
        (Some(meshes), Some(materials)) => Some(MeshKit { meshes, materials }),
        _ => None,
    };

    let wood = Color::srgb(0.55, 0.38, 0.24);
    let tatami = Color::srgb(0.76, 0.72, 0.5);
    let paper = Color::srgb(0.95, 0.92, 0.85);
    let stone = Color::srgb(0.55, 0.55, 0.52);

    // -- Shell --
    for (center, size, color) in [
        (Vec3::new(0.0, -0.05, -1.5), Vec3::new(20.0, 0.1, 17.0), tatami),
        (Vec3::new(15.0, -0.05, -1.5), Vec3::new(10.0, 0.1, 17.0), stone),
        (Vec3::new(0.0, 2.5, -10.0), Vec3::new(20.0, 5.0, 0.2), paper),
        (Vec3::new(-10.0, 2.5, -1.5), Vec3::new(0.2, 5.0, 17.0), paper),
        (Vec3::new(0.0, 5.0, -1.5), Vec3::new(20.0, 0.1, 17.0), wood),
        // Sky deck, above the east end of the terrace.
        (Vec3::new(15.0, SKY_DECK_FLOOR - 0.05, -5.0), Vec3::new(8.0, 0.1, 8.0), wood),
    ] {
        let id = spawn_block(&mut commands, &mut kit, center, size, color);
        commands.entity(id).insert(RoomPart);
    }

    // -- Props --
    let pot = spawn_block(
        &mut commands,
        &mut kit,
        layout::PLANT_POS + Vec3::Y * 0.35,
        Vec3::new(0.8, 0.7, 0.8),
        Color::srgb(0.35, 0.2, 0.15),
    );
    let mut foliage = commands.spawn((
        Transform::from_translation(layout::PLANT_POS + Vec3::Y * 1.0),
        Visibility::default(),
    ));
    if let Some(kit) = kit.as_mut() {
        foliage.insert((kit.sphere(0.6), kit.material(Color::srgb(0.2, 0.5, 0.25))));
    }
    let foliage = foliage.id();

    let tv = spawn_block(
        &mut commands,
        &mut kit,
        layout::TV_POS,
        Vec3::new(3.2, 1.9, 0.15),
        Color::srgb(0.05, 0.05, 0.08),
    );
    let postbox = spawn_block(
        &mut commands,
        &mut kit,
        layout::POSTBOX_POS,
        Vec3::new(0.6, 2.0, 0.6),
        Color::srgb(0.7, 0.15, 0.15),
    );
    let tea_set = spawn_block(
        &mut commands,
        &mut kit,
        layout::TEA_SET_POS - Vec3::Y * 0.1,
        Vec3::new(1.6, 0.2, 1.0),
        wood,
    );
    let zen_garden = spawn_block(
        &mut commands,
        &mut kit,
        layout::ZEN_GARDEN_POS + Vec3::Y * 0.05,
        Vec3::new(3.0, 0.1, 3.0),
        Color::srgb(0.88, 0.85, 0.78),
    );
    spawn_block(
        &mut commands,
        &mut kit,
        layout::CUSHION_POS + Vec3::Y * 0.1,
        Vec3::new(0.8, 0.2, 0.8),
        Color::srgb(0.6, 0.2, 0.3),
    );
    let elevator = spawn_block(
        &mut commands,
        &mut kit,
        layout::ELEVATOR_POS + Vec3::Y * (SKY_DECK_FLOOR * 0.5 + 1.0),
        Vec3::new(0.2, SKY_DECK_FLOOR + 2.0, 1.2),
        Color::srgb(0.3, 0.3, 0.35),
    );

    let mut star = commands.spawn((
        Transform::from_translation(layout::WISHING_STAR_POS),
        Visibility::default(),
    ));
    if let Some(kit) = kit.as_mut() {
        star.insert((
            kit.sphere(0.4),
            kit.glowing(Color::srgb(1.0, 0.95, 0.6), LinearRgba::rgb(4.0, 3.5, 1.5)),
        ));
    }
    let star = star.id();

    let mut cup = commands.spawn((
        Transform::from_translation(layout::TEA_SET_POS + Vec3::Y * 0.1),
        Visibility::default(),
    ));
    if let Some(kit) = kit.as_mut() {
        cup.insert((kit.cylinder(0.12, 0.15), kit.material(paper)));
    }

    // The lantern light exists before registration so the lamp can own it.
    let lantern_light = lighting::spawn_lantern(&mut commands, layout::LANTERN_POS);
    spawn_block(
        &mut commands,
        &mut kit,
        layout::LANTERN_POS - Vec3::Y * 0.5,
        Vec3::new(0.6, 1.6, 0.6),
        stone,
    );

    let props = register_props(
        &mut registry,
        PropEntities {
            plant: Some(pot),
            tv: Some(tv),
            postbox: Some(postbox),
            tea_set: Some(tea_set),
            zen_garden: Some(zen_garden),
            wishing_star: Some(star),
            elevator: Some(elevator),
        },
        lantern_light,
    );
    info!("Registered {} interactables.", registry.len());
    commands.insert_resource(props);

    // -- Prop animation --
    ticker.spawn(effects::gentle_sway(foliage, Quat::IDENTITY, 0.05, 0.3));
    ticker.spawn(effects::slow_spin(star, 0.6));
}

// ═══════════════════════════════════════════════════════════════════════
// FIREWORK
// ═══════════════════════════════════════════════════════════════════════

const FIREWORK_SPARKS: usize = 40;

/// A firework over the wishing star for every wish made.
pub fn launch_firework(
    mut commands: Commands,
    mut events: EventReader<WishMadeEvent>,
    mut ticker: ResMut<AnimationTicker>,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
) {
    if events.read().count() == 0 {
        return;
    }

    let visuals = match (meshes, materials) {
        (Some(mut meshes), Some(mut materials)) => Some((
            meshes.add(Sphere::new(0.06)),
            materials.add(StandardMaterial {
                base_color: Color::srgb(1.0, 0.8, 0.9),
                emissive: LinearRgba::rgb(6.0, 3.0, 4.0),
                ..default()
            }),
        )),
        _ => None,
    };

    let origin = layout::WISHING_STAR_POS + Vec3::Y * 1.5;
    let mut rng = rand::thread_rng();
    let mut sparks = Vec::with_capacity(FIREWORK_SPARKS);
    for _ in 0..FIREWORK_SPARKS {
        let dir = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-0.3..1.0),
            rng.gen_range(-1.0..1.0),
        )
        .normalize_or_zero();
        let mut spark = commands.spawn((Transform::from_translation(origin), Visibility::default()));
        if let Some((mesh, material)) = &visuals {
            spark.insert((Mesh3d(mesh.clone()), MeshMaterial3d(material.clone())));
        }
        sparks.push((spark.id(), dir * rng.gen_range(2.0..3.5)));
    }

    let entities = sparks.iter().map(|(e, _)| *e).collect();
    ticker.spawn_timed(
        FIREWORK_DURATION,
        effects::firework_burst(sparks, origin),
        effects::despawn_all(entities),
    );
}
