/*!
Collision root module.

This module holds everything the kinematic character controller (KCC) needs
from collision detection, built on rapier's broad-phase BVH, query pipeline
and contact dispatcher:

- types:        shared data types (manifolds, pair cache entries, sweep/ray hits)
- settings:     controller and tolerance constants
- filter:       group/mask bitmasks mapped onto rapier collision groups
- shape:        the proxy's convex shape, its margin and the margin guard
- ghost:        the proxy object and its overlap pair cache
- query:        the `CollisionWorld` trait and sweep filters
- broad:        AABB helpers for pair candidates and shape bounds
- narrow_phase: sweep options, time-of-impact refinement, contact manifolds
*/

pub mod broad;
pub mod filter;
pub mod ghost;
pub mod narrow_phase;
pub mod query;
pub mod settings;
pub mod shape;
pub mod types;

// Re-export commonly used types.
pub use filter::{CollisionFilter, CollisionGroup};
pub use ghost::{GhostObject, SweepMode};
pub use query::{CollisionWorld, SweepFilter};
pub use shape::{ConvexShape, ConvexShapeDef, MarginGuard};
pub use types::{
    ContactManifold, Iso, ManifoldPoint, OverlappingPair, Point3, Quat, RayHit, SweepHit,
    SweepResult, Vec3,
};
