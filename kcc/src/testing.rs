//! Scene helpers shared by unit tests.

use crate::collision::{
    CollisionFilter, ConvexShape, ConvexShapeDef, Vec3, settings::DEFAULT_STEP_HEIGHT,
};
use crate::controller::KinematicCharacterController;
use crate::rapier::WorldStaticDef;
use crate::rapier_world::KinematicWorld;

/// A 100x1x100 slab whose top face is at y = 0.
pub(crate) fn flat_ground() -> KinematicWorld {
    KinematicWorld::build(vec![WorldStaticDef::cuboid(
        0,
        Vec3::new(50.0, 0.5, 50.0),
        Vec3::new(0.0, -0.5, 0.0),
    )])
}

pub(crate) fn ball_shape(radius: f32) -> ConvexShape {
    ConvexShape::new(ConvexShapeDef::Ball { radius }).unwrap()
}

/// Register a character ghost for `shape` at `origin` and wrap it in a
/// controller with default tunables.
pub(crate) fn spawn(
    world: &mut KinematicWorld,
    shape: ConvexShape,
    origin: Vec3,
) -> KinematicCharacterController {
    let ghost = world.insert_ghost(&shape, origin, CollisionFilter::character());
    KinematicCharacterController::new(ghost, shape, DEFAULT_STEP_HEIGHT).unwrap()
}
