/*!
Kinematic character controller.

Each tick runs four position-only phases against a [`CollisionWorld`]:

1. penetration recovery (`pre_step`): push the ghost out of existing overlaps
2. step-up: raise the shape by the step height, stopping under obstructions
3. step-forward-and-strafe: sweep along the walk direction, sliding on hits
4. step-down: undo the step-up plus a fixed drop, landing on the first obstruction

`player_step` runs 2-4 and writes the final position into the ghost transform.
There is no velocity or mass anywhere: the walk direction is a displacement
per tick, and gravity is the constant step-down drop.
*/

mod config;
mod ground;
mod recovery;
mod response;
mod step;

pub use config::ControllerConfig;
pub use ground::{AlwaysGrounded, GroundDetector, GroundQuery, RayGroundProbe};
pub use response::{
    compute_reflection_direction, parallel_component, perpendicular_component,
    retarget_after_collision,
};

use crate::collision::{
    CollisionWorld, ConvexShape, GhostObject, SweepMode, Vec3, settings::EPSILON,
    types::{iso_at, with_origin},
};
use crate::error::{ConfigResult, ensure_non_negative};

/// Moves a ghost object through a collision world without dynamics.
#[derive(Debug)]
pub struct KinematicCharacterController {
    ghost: GhostObject,
    convex_shape: ConvexShape,
    config: ControllerConfig,
    ground: Box<dyn GroundDetector>,

    walk_direction: Vec3,
    current_position: Vec3,
    target_position: Vec3,
    current_step_offset: f32,
    touching_contact: bool,
    touching_normal: Vec3,
}

impl KinematicCharacterController {
    /// Controller with default tunables and the given step height.
    pub fn new(
        ghost: GhostObject,
        convex_shape: ConvexShape,
        step_height: f32,
    ) -> ConfigResult<Self> {
        Self::with_config(
            ghost,
            convex_shape,
            ControllerConfig::with_step_height(step_height),
        )
    }

    pub fn with_config(
        ghost: GhostObject,
        convex_shape: ConvexShape,
        config: ControllerConfig,
    ) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            ghost,
            convex_shape,
            config,
            ground: Box::new(AlwaysGrounded),
            walk_direction: Vec3::zeros(),
            current_position: Vec3::zeros(),
            target_position: Vec3::zeros(),
            current_step_offset: 0.0,
            touching_contact: false,
            touching_normal: Vec3::zeros(),
        })
    }

    /// Replace the ground detector used by [`Self::on_ground`].
    pub fn with_ground_detector(mut self, ground: Box<dyn GroundDetector>) -> Self {
        self.ground = ground;
        self
    }

    /// Resolve existing overlaps, then load the ghost's position as both the
    /// current and the target position for this tick.
    pub fn pre_step(&mut self, world: &mut dyn CollisionWorld) {
        let max_loops = self.config.max_penetration_loops;
        let mut loops = 0;

        self.touching_contact = false;
        while self.recover_from_penetration(world) {
            loops += 1;
            self.touching_contact = true;
            if loops >= max_loops {
                log::warn!(
                    "ghost {:?} still penetrating after {} recovery passes",
                    self.ghost.handle(),
                    loops
                );
                break;
            }
        }

        match world.world_transform(self.ghost.handle()) {
            Some(pose) => {
                self.current_position = pose.translation.vector;
                self.target_position = self.current_position;
            }
            None => log::error!("Failed to find ghost collider {:?}", self.ghost.handle()),
        }
    }

    /// Step up, strafe along the walk direction, step down and commit the
    /// result to the ghost transform (rotation is preserved).
    pub fn player_step(&mut self, world: &mut dyn CollisionWorld, dt: f32) {
        let handle = self.ghost.handle();
        let Some(pose) = world.world_transform(handle) else {
            log::error!("Failed to find ghost collider {:?}", handle);
            return;
        };

        self.step_up(world);
        self.step_forward_and_strafe(world, self.walk_direction);
        self.step_down(world, dt);

        let pose = with_origin(&pose, self.current_position);
        world.set_world_transform(handle, pose);
        log::trace!("ghost {:?} stepped to {:?}", handle, self.current_position);
    }

    /// Retarget the pending motion after hitting a surface with `hit_normal`.
    pub fn update_target_position_based_on_collision(
        &mut self,
        hit_normal: &Vec3,
        tangent_magnitude: f32,
        normal_magnitude: f32,
    ) {
        self.target_position = retarget_after_collision(
            &self.current_position,
            &self.target_position,
            hit_normal,
            tangent_magnitude,
            normal_magnitude,
        );
    }

    /// Teleport the ghost to `origin` with identity rotation, ignoring geometry.
    pub fn warp(&mut self, world: &mut dyn CollisionWorld, origin: Vec3) {
        if !world.set_world_transform(self.ghost.handle(), iso_at(origin)) {
            log::error!("Failed to find ghost collider {:?}", self.ghost.handle());
        }
    }

    /// Forget transient contact state: touching flag and normal, step offset,
    /// walk direction and the ghost's pair cache.
    pub fn reset(&mut self) {
        self.walk_direction = Vec3::zeros();
        self.current_step_offset = 0.0;
        self.touching_contact = false;
        self.touching_normal = Vec3::zeros();
        self.ghost.set_overlapping_pairs(Vec::new());
    }

    /// Displacement applied on every `player_step` (not a velocity).
    pub fn set_walk_direction(&mut self, walk_direction: Vec3) {
        self.walk_direction = walk_direction;
    }

    pub fn set_fall_speed(&mut self, fall_speed: f32) -> ConfigResult<()> {
        self.config.fall_speed = ensure_non_negative("fall_speed", fall_speed)?;
        Ok(())
    }

    pub fn set_jump_speed(&mut self, jump_speed: f32) -> ConfigResult<()> {
        self.config.jump_speed = ensure_non_negative("jump_speed", jump_speed)?;
        Ok(())
    }

    pub fn set_max_jump_height(&mut self, max_jump_height: f32) -> ConfigResult<()> {
        self.config.max_jump_height = ensure_non_negative("max_jump_height", max_jump_height)?;
        Ok(())
    }

    /// Request a jump. Nothing happens unless [`Self::can_jump`] holds, and no
    /// vertical motion is integrated either way.
    pub fn jump(&mut self, world: &dyn CollisionWorld) {
        if !self.can_jump(world) {
            return;
        }
        log::debug!(
            "ghost {:?} jump requested (speed {}, max height {})",
            self.ghost.handle(),
            self.config.jump_speed,
            self.config.max_jump_height
        );
    }

    pub fn can_jump(&self, world: &dyn CollisionWorld) -> bool {
        self.on_ground(world)
    }

    pub fn on_ground(&self, world: &dyn CollisionWorld) -> bool {
        let query = GroundQuery {
            origin: self.current_position,
            extent_below: self.convex_shape.extent_below_origin(),
            filter: self.ghost.sweep_filter(SweepMode::World),
        };
        self.ground.on_ground(world, &query)
    }

    #[inline]
    pub fn ghost_object(&self) -> &GhostObject {
        &self.ghost
    }

    #[inline]
    pub fn ghost_object_mut(&mut self) -> &mut GhostObject {
        &mut self.ghost
    }

    #[inline]
    pub fn convex_shape(&self) -> &ConvexShape {
        &self.convex_shape
    }

    #[inline]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    #[inline]
    pub fn walk_direction(&self) -> Vec3 {
        self.walk_direction
    }

    #[inline]
    pub fn current_position(&self) -> Vec3 {
        self.current_position
    }

    #[inline]
    pub fn target_position(&self) -> Vec3 {
        self.target_position
    }

    #[inline]
    pub fn current_step_offset(&self) -> f32 {
        self.current_step_offset
    }

    #[inline]
    pub fn touching_contact(&self) -> bool {
        self.touching_contact
    }

    /// Normal of the deepest penetration found by recovery, pointing from the
    /// ghost into the obstacle.
    #[inline]
    pub fn touching_normal(&self) -> Vec3 {
        self.touching_normal
    }

    pub fn step_height(&self) -> f32 {
        self.config.step_height
    }

    pub fn fall_speed(&self) -> f32 {
        self.config.fall_speed
    }

    pub fn jump_speed(&self) -> f32 {
        self.config.jump_speed
    }

    pub fn max_jump_height(&self) -> f32 {
        self.config.max_jump_height
    }
}

/// `v` normalized, or zero when it is too short to have a direction.
#[inline]
fn normalized_or_zero(v: &Vec3) -> Vec3 {
    v.try_normalize(EPSILON).unwrap_or_else(Vec3::zeros)
}
