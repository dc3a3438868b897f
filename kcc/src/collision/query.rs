/*!
The collision-world interface the controller drives.

The controller never touches colliders directly. Everything it needs from the
world goes through [`CollisionWorld`]: reading and writing the ghost pose,
refreshing the ghost's contact manifolds, closest-hit convex sweeps and ray
tests. [`KinematicWorld`](crate::KinematicWorld) implements it over rapier's
broad-phase BVH and query pipeline.
*/

use rapier3d::prelude::{ColliderHandle, InteractionGroups};

use super::{
    filter::CollisionFilter,
    ghost::GhostObject,
    shape::ConvexShape,
    types::{Iso, Point3, RayHit, SweepResult},
};

/// Decides which objects a sweep or ray test may report.
///
/// Self-exclusion is explicit: the ghost passes its own handle to
/// [`SweepFilter::exclude_object`] instead of relying on a result callback.
#[derive(Clone, Copy)]
pub struct SweepFilter<'a> {
    /// Object never reported (usually the ghost itself).
    pub exclude: Option<ColliderHandle>,
    /// Group/mask of the querying object.
    pub collision_filter: CollisionFilter,
    /// When set, only objects in this ghost's pair cache are considered.
    pub overlaps_of: Option<&'a GhostObject>,
    /// Extra caller-supplied acceptance test.
    pub predicate: Option<&'a dyn Fn(ColliderHandle) -> bool>,
}

impl<'a> SweepFilter<'a> {
    pub fn new(collision_filter: CollisionFilter) -> Self {
        Self {
            exclude: None,
            collision_filter,
            overlaps_of: None,
            predicate: None,
        }
    }

    pub fn exclude_object(mut self, object: ColliderHandle) -> Self {
        self.exclude = Some(object);
        self
    }

    pub fn restrict_to_overlaps(mut self, ghost: &'a GhostObject) -> Self {
        self.overlaps_of = Some(ghost);
        self
    }

    pub fn predicate(mut self, predicate: &'a dyn Fn(ColliderHandle) -> bool) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Collision groups of the querying object.
    #[inline]
    pub fn groups(&self) -> InteractionGroups {
        self.collision_filter.interaction_groups()
    }

    /// Whether `object` passes the per-object tests: exclusion, the pair
    /// cache restriction and the caller predicate. Groups are tested by the
    /// world's query pipeline.
    pub fn admits(&self, object: ColliderHandle) -> bool {
        if self.exclude == Some(object) {
            return false;
        }
        if let Some(ghost) = self.overlaps_of {
            if !ghost.is_overlapping(object) {
                return false;
            }
        }
        self.predicate.is_none_or(|accept| accept(object))
    }
}

/// Queries the kinematic controller needs from a collision world.
pub trait CollisionWorld {
    /// World pose of `object`, if the world knows it.
    fn world_transform(&self, object: ColliderHandle) -> Option<Iso>;

    /// Overwrite the world pose of `object`. Returns false for unknown objects.
    fn set_world_transform(&mut self, object: ColliderHandle, transform: Iso) -> bool;

    /// Rebuild the ghost's overlap pair cache and compute contact manifolds
    /// for every pair, using `shape` (with its margin) at the ghost's pose.
    fn dispatch_all_collision_pairs(&self, ghost: &mut GhostObject, shape: &ConvexShape);

    /// Closest-hit sweep of `shape` from `from` to the origin of `to`.
    fn convex_sweep_test(
        &self,
        shape: &ConvexShape,
        from: &Iso,
        to: &Iso,
        allowed_penetration: f32,
        filter: &SweepFilter<'_>,
    ) -> SweepResult;

    /// Closest-hit ray test along the segment `from -> to`.
    fn ray_test(&self, from: Point3, to: Point3, filter: &SweepFilter<'_>) -> Option<RayHit>;

    /// Initial penetration sweeps tolerate when moving out of an obstacle.
    fn allowed_ccd_penetration(&self) -> f32;
}
