pub mod collision;
pub mod controller;
pub mod error;
pub mod rapier;
pub mod rapier_world;

#[cfg(test)]
mod testing;

pub use collision::{
    CollisionFilter, CollisionGroup, CollisionWorld, ConvexShape, ConvexShapeDef, GhostObject,
    SweepFilter, SweepMode,
};
pub use controller::{
    AlwaysGrounded, ControllerConfig, GroundDetector, GroundQuery, KinematicCharacterController,
    RayGroundProbe, compute_reflection_direction, parallel_component, perpendicular_component,
};
pub use error::{ConfigError, ConfigResult};
pub use rapier::{ColliderShapeDef, WorldStaticDef, collider_from_def};
pub use rapier_world::KinematicWorld;
