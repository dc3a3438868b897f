use crate::collision::{
    SweepMode,
    settings::{
        DEFAULT_ADDED_MARGIN, DEFAULT_FALL_SPEED, DEFAULT_JUMP_SPEED, DEFAULT_MAX_JUMP_HEIGHT,
        DEFAULT_MAX_PENETRATION_LOOPS, DEFAULT_MAX_STRAFE_ITERATIONS,
        DEFAULT_MIN_STRAFE_FRACTION, DEFAULT_NORMAL_MAGNITUDE,
        DEFAULT_PENETRATION_RECOVERY_FACTOR, DEFAULT_PENETRATION_SLOP, DEFAULT_STEP_HEIGHT,
        DEFAULT_STEP_UP_BIAS, DEFAULT_TANGENT_MAGNITUDE,
    },
};
use crate::error::{ConfigError, ConfigResult, ensure_finite, ensure_non_negative};

/// Tunables of a [`KinematicCharacterController`](super::KinematicCharacterController).
///
/// - Distances are in meters, speeds in meters per second.
/// - `fall_speed`, `jump_speed`, `max_jump_height` and `turn_angle` are stored
///   for gameplay code; locomotion does not read them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerConfig {
    /// Maximum rise climbed per tick, also the fixed drop of step-down.
    pub step_height: f32,
    /// Extra skin added to the shape margin while strafing.
    pub added_margin: f32,
    pub fall_speed: f32,
    pub jump_speed: f32,
    pub max_jump_height: f32,
    /// Reserved (radians).
    pub turn_angle: f32,
    /// Cap on recovery passes per `pre_step`.
    pub max_penetration_loops: u32,
    /// Cap on sweeps per strafe.
    pub max_strafe_iterations: u32,
    /// Strafing stops once the unswept fraction drops to this value.
    pub min_strafe_fraction: f32,
    /// Share of each penetration depth corrected per recovery pass, in (0, 1].
    pub penetration_recovery_factor: f32,
    /// Penetration tolerated by recovery.
    pub penetration_slop: f32,
    /// Height above the current position where the step-up sweep starts.
    pub step_up_bias: f32,
    /// Weight of the reflected motion along the hit normal when retargeting.
    pub tangent_magnitude: f32,
    /// Weight of the reflected motion across the hit normal when retargeting.
    pub normal_magnitude: f32,
    pub sweep_mode: SweepMode,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            step_height: DEFAULT_STEP_HEIGHT,
            added_margin: DEFAULT_ADDED_MARGIN,
            fall_speed: DEFAULT_FALL_SPEED,
            jump_speed: DEFAULT_JUMP_SPEED,
            max_jump_height: DEFAULT_MAX_JUMP_HEIGHT,
            turn_angle: 0.0,
            max_penetration_loops: DEFAULT_MAX_PENETRATION_LOOPS,
            max_strafe_iterations: DEFAULT_MAX_STRAFE_ITERATIONS,
            min_strafe_fraction: DEFAULT_MIN_STRAFE_FRACTION,
            penetration_recovery_factor: DEFAULT_PENETRATION_RECOVERY_FACTOR,
            penetration_slop: DEFAULT_PENETRATION_SLOP,
            step_up_bias: DEFAULT_STEP_UP_BIAS,
            tangent_magnitude: DEFAULT_TANGENT_MAGNITUDE,
            normal_magnitude: DEFAULT_NORMAL_MAGNITUDE,
            sweep_mode: SweepMode::World,
        }
    }
}

impl ControllerConfig {
    /// Defaults with a custom step height.
    #[inline]
    pub fn with_step_height(step_height: f32) -> Self {
        Self {
            step_height,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        ensure_non_negative("step_height", self.step_height)?;
        ensure_non_negative("added_margin", self.added_margin)?;
        ensure_non_negative("fall_speed", self.fall_speed)?;
        ensure_non_negative("jump_speed", self.jump_speed)?;
        ensure_non_negative("max_jump_height", self.max_jump_height)?;
        ensure_finite("turn_angle", self.turn_angle)?;
        ensure_non_negative("penetration_slop", self.penetration_slop)?;
        ensure_non_negative("step_up_bias", self.step_up_bias)?;
        ensure_finite("tangent_magnitude", self.tangent_magnitude)?;
        ensure_finite("normal_magnitude", self.normal_magnitude)?;

        if self.max_penetration_loops == 0 {
            return Err(ConfigError::ZeroIterations {
                field: "max_penetration_loops",
            });
        }
        if self.max_strafe_iterations == 0 {
            return Err(ConfigError::ZeroIterations {
                field: "max_strafe_iterations",
            });
        }

        let factor = ensure_finite(
            "penetration_recovery_factor",
            self.penetration_recovery_factor,
        )?;
        if factor <= 0.0 || factor > 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "penetration_recovery_factor",
                range: "(0, 1]",
                value: factor,
            });
        }

        let min_fraction = ensure_finite("min_strafe_fraction", self.min_strafe_fraction)?;
        if !(0.0..1.0).contains(&min_fraction) {
            return Err(ConfigError::OutOfRange {
                field: "min_strafe_fraction",
                range: "[0, 1)",
                value: min_fraction,
            });
        }

        Ok(())
    }
}
