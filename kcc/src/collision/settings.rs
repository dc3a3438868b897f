/*!
Kinematic character controller (KCC) settings and tolerances.

These constants centralize the parameters used by penetration recovery, the
step-up / strafe / step-down sweeps and the collision world. `ControllerConfig`
and `KinematicWorld` start from these values; override them per actor from game
data when needed.

Notes
- Distances are in meters.
- The iteration caps are liveness bounds for non-convergent geometry, not
  physical constants. Worlds at a different scale may need different bounds.
*/

/// Guard for normalizing vectors and comparing squared lengths.
pub const EPSILON: f32 = f32::EPSILON;

/// Default maximum rise the controller climbs in one tick (meters).
pub const DEFAULT_STEP_HEIGHT: f32 = 0.35;

/// Extra shape margin applied only while sweeping horizontally (meters).
/// Gives earlier, softer contact at corners.
pub const DEFAULT_ADDED_MARGIN: f32 = 0.02;

/// Upward offset of the step-up sweep start, so the floor right below the
/// proxy is not reported again (meters).
pub const DEFAULT_STEP_UP_BIAS: f32 = 0.1;

/// Number of recovery passes `pre_step` runs before accepting residual
/// penetration.
pub const DEFAULT_MAX_PENETRATION_LOOPS: u32 = 5;

/// Share of each penetration depth corrected per recovery pass.
/// Full correction in one pass overshoots when several contacts push together.
pub const DEFAULT_PENETRATION_RECOVERY_FACTOR: f32 = 0.2;

/// Penetration depth below which a contact is treated as resting (meters).
pub const DEFAULT_PENETRATION_SLOP: f32 = 0.005;

/// Maximum number of sweeps per strafe phase.
pub const DEFAULT_MAX_STRAFE_ITERATIONS: u32 = 10;

/// Strafing stops once the remaining sweep budget falls to this fraction.
pub const DEFAULT_MIN_STRAFE_FRACTION: f32 = 0.01;

/// Scale of the sliding (perpendicular) component when retargeting.
pub const DEFAULT_NORMAL_MAGNITUDE: f32 = 1.0;

/// Scale of the bounce-back (parallel) component when retargeting.
/// Zero keeps no momentum along the contact normal.
pub const DEFAULT_TANGENT_MAGNITUDE: f32 = 0.0;

/// Stored for callers; the locomotion phases do not integrate it.
pub const DEFAULT_FALL_SPEED: f32 = 55.0;

/// Stored for callers; the locomotion phases do not integrate it.
pub const DEFAULT_JUMP_SPEED: f32 = 10.0;

/// Stored for callers; the locomotion phases do not integrate it.
pub const DEFAULT_MAX_JUMP_HEIGHT: f32 = 1.5;

/// Initial penetration a sweep may start with and still ignore the obstacle
/// when moving away from it (meters).
pub const DEFAULT_ALLOWED_CCD_PENETRATION: f32 = 0.04;

/// Distance at which non-penetrating contacts are still collected into the
/// ghost's manifolds, and by which its broad-phase box is inflated (meters).
pub const DEFAULT_CONTACT_BREAKING_THRESHOLD: f32 = 0.02;

/// Default distance a ray ground probe searches below the shape (meters).
pub const DEFAULT_GROUND_PROBE_DISTANCE: f32 = 0.1;

/// Conservative-advancement passes used to tighten a sweep's time of impact.
pub const SWEEP_REFINE_ITERATIONS: u32 = 8;

/// Remaining gap (meters) at which a refined sweep counts as touching.
pub const SWEEP_DISTANCE_TOLERANCE: f32 = 1.0e-5;
