use std::fmt;

use crate::collision::{
    CollisionWorld, Point3, SweepFilter, Vec3, settings::DEFAULT_GROUND_PROBE_DISTANCE,
};

/// What a ground detector knows about the controller when asked.
#[derive(Clone, Copy)]
pub struct GroundQuery<'a> {
    /// Current position of the shape origin.
    pub origin: Vec3,
    /// Distance from the origin down to the lowest point of the shape.
    pub extent_below: f32,
    /// Filter excluding the controller's own ghost.
    pub filter: SweepFilter<'a>,
}

/// Decides whether the controller stands on something.
pub trait GroundDetector: fmt::Debug + Send + Sync {
    fn on_ground(&self, world: &dyn CollisionWorld, query: &GroundQuery<'_>) -> bool;
}

/// Always reports ground contact.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysGrounded;

impl GroundDetector for AlwaysGrounded {
    fn on_ground(&self, _world: &dyn CollisionWorld, _query: &GroundQuery<'_>) -> bool {
        true
    }
}

/// Grounded when a ray from the origin finds something within `distance`
/// below the lowest point of the shape.
#[derive(Clone, Copy, Debug)]
pub struct RayGroundProbe {
    pub distance: f32,
}

impl Default for RayGroundProbe {
    fn default() -> Self {
        Self {
            distance: DEFAULT_GROUND_PROBE_DISTANCE,
        }
    }
}

impl GroundDetector for RayGroundProbe {
    fn on_ground(&self, world: &dyn CollisionWorld, query: &GroundQuery<'_>) -> bool {
        let from = Point3::from(query.origin);
        let to = from - Vec3::y() * (query.extent_below + self.distance.max(0.0));
        world.ray_test(from, to, &query.filter).is_some()
    }
}
