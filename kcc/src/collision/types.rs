/*!
Core collision types and math aliases shared by the collision submodules.

This module intentionally contains no algorithms. It defines the data exchanged
between:
- the collision world (pair generation, sweeps, rays)
- the ghost object's overlap pair cache
- the kinematic controller phases (recovery, step-up, strafe, step-down)

Sign conventions
- `ManifoldPoint::normal_world_on_b` lives on `body1` and points toward `body0`.
- `ManifoldPoint::distance` is signed: negative means the shapes overlap.
- `SweepHit::normal` is the outward normal of the object that was hit, so it
  points back toward the swept shape.
*/

use nalgebra as na;
use rapier3d::prelude::ColliderHandle;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Point3 = na::Point3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// Build an isometry with identity rotation at `origin`.
#[inline]
pub fn iso_at(origin: Vec3) -> Iso {
    Iso::from_parts(
        na::Translation3::new(origin.x, origin.y, origin.z),
        Quat::identity(),
    )
}

/// Build an isometry at `origin` keeping the rotation of `pose`.
#[inline]
pub fn with_origin(pose: &Iso, origin: Vec3) -> Iso {
    Iso::from_parts(
        na::Translation3::new(origin.x, origin.y, origin.z),
        pose.rotation,
    )
}

/// A single contact point between the two bodies of a manifold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ManifoldPoint {
    /// World-space contact position on `body1`.
    pub position_world_on_b: Point3,
    /// World-space unit normal on `body1`, pointing toward `body0`.
    pub normal_world_on_b: Vec3,
    /// Signed separation (meters). Negative values are penetration depths.
    pub distance: f32,
}

/// Contact points generated between two overlapping objects.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactManifold {
    pub body0: ColliderHandle,
    pub body1: ColliderHandle,
    pub points: Vec<ManifoldPoint>,
}

impl ContactManifold {
    #[inline]
    pub fn num_contacts(&self) -> usize {
        self.points.len()
    }

    /// `-1.0` when `object` is `body0`, `1.0` otherwise.
    ///
    /// Multiplying `normal_world_on_b` by this sign yields a normal that points
    /// from `object` into the other body.
    #[inline]
    pub fn direction_sign(&self, object: ColliderHandle) -> f32 {
        if self.body0 == object { -1.0 } else { 1.0 }
    }
}

/// One broad-phase pair involving the ghost, with the manifolds the narrow
/// phase produced for it on the last dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlappingPair {
    pub body0: ColliderHandle,
    pub body1: ColliderHandle,
    pub manifolds: Vec<ContactManifold>,
}

impl OverlappingPair {
    /// The member of the pair that is not `object`.
    #[inline]
    pub fn other(&self, object: ColliderHandle) -> ColliderHandle {
        if self.body0 == object { self.body1 } else { self.body0 }
    }
}

/// Closest obstruction reported by a convex sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepHit {
    /// Object that was hit.
    pub object: ColliderHandle,
    /// World-space point on the hit object.
    pub point: Point3,
    /// World-space outward normal of the hit object at `point`.
    pub normal: Vec3,
}

/// Result of a convex sweep, rebuilt for every query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepResult {
    /// Fraction (0..=1) of the sweep travelled before the closest hit.
    /// `1.0` when nothing was hit.
    pub closest_hit_fraction: f32,
    pub hit: Option<SweepHit>,
}

impl SweepResult {
    #[inline]
    pub fn miss() -> Self {
        Self {
            closest_hit_fraction: 1.0,
            hit: None,
        }
    }

    #[inline]
    pub fn has_hit(&self) -> bool {
        self.hit.is_some()
    }
}

impl Default for SweepResult {
    fn default() -> Self {
        Self::miss()
    }
}

/// Closest hit reported by a ray test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub object: ColliderHandle,
    /// Fraction (0..=1) along the ray segment.
    pub fraction: f32,
    pub point: Point3,
    pub normal: Vec3,
}
