use super::{KinematicCharacterController, normalized_or_zero};
use crate::collision::{CollisionWorld, Vec3, settings::EPSILON, types::iso_at};

impl KinematicCharacterController {
    /// Raise the shape by the step height, stopping early under an obstruction.
    pub fn step_up(&mut self, world: &mut dyn CollisionWorld) {
        let up = Vec3::y();
        let step_height = self.config.step_height;

        self.target_position = self.current_position + up * step_height;
        let from = iso_at(self.current_position + up * self.config.step_up_bias);
        let to = iso_at(self.target_position);

        let filter = self.ghost.sweep_filter(self.config.sweep_mode);
        let result = world.convex_sweep_test(
            &self.convex_shape,
            &from,
            &to,
            world.allowed_ccd_penetration(),
            &filter,
        );

        if result.has_hit() {
            let fraction = result.closest_hit_fraction;
            self.current_step_offset = step_height * fraction;
            self.current_position = self.current_position.lerp(&self.target_position, fraction);
        } else {
            self.current_step_offset = step_height;
            self.current_position = self.target_position;
        }
        log::trace!("step up offset {}", self.current_step_offset);
    }

    /// Sweep along `walk_move`, sliding along whatever is hit.
    ///
    /// Each sweep runs with the shape margin widened by the added margin; the
    /// margin is restored before the sweep result is used.
    pub fn step_forward_and_strafe(&mut self, world: &mut dyn CollisionWorld, walk_move: Vec3) {
        let original_dir = normalized_or_zero(&walk_move);
        let tangent_magnitude = self.config.tangent_magnitude;
        let normal_magnitude = self.config.normal_magnitude;
        let added_margin = self.config.added_margin;

        self.target_position = self.current_position + walk_move;
        if self.touching_contact && original_dir.dot(&self.touching_normal) > 0.0 {
            let touching_normal = self.touching_normal;
            self.update_target_position_based_on_collision(
                &touching_normal,
                tangent_magnitude,
                normal_magnitude,
            );
        }

        let mut fraction = 1.0;
        let mut iterations = self.config.max_strafe_iterations;
        while fraction > self.config.min_strafe_fraction && iterations > 0 {
            iterations -= 1;

            let from = iso_at(self.current_position);
            let to = iso_at(self.target_position);
            let result = {
                let filter = self.ghost.sweep_filter(self.config.sweep_mode);
                let widened = self.convex_shape.widen_margin(added_margin);
                world.convex_sweep_test(
                    &widened,
                    &from,
                    &to,
                    world.allowed_ccd_penetration(),
                    &filter,
                )
            };

            fraction -= result.closest_hit_fraction;

            let Some(hit) = result.hit else {
                self.current_position = self.target_position;
                continue;
            };

            let hit_distance = (hit.point.coords - self.current_position).norm();
            if hit_distance > added_margin {
                self.current_position = self
                    .current_position
                    .lerp(&self.target_position, result.closest_hit_fraction);
            }

            self.update_target_position_based_on_collision(
                &hit.normal,
                tangent_magnitude,
                normal_magnitude,
            );

            let current_dir = self.target_position - self.current_position;
            let distance2 = current_dir.norm_squared();
            if distance2 <= EPSILON {
                break;
            }
            // Stop once sliding would turn us against the requested direction.
            if (current_dir / distance2.sqrt()).dot(&original_dir) <= 0.0 {
                break;
            }
        }
        log::trace!(
            "strafe ended at {:?} after {} sweeps",
            self.current_position,
            self.config.max_strafe_iterations - iterations
        );
    }

    /// Undo the step-up and drop by the step height, landing on the first
    /// obstruction.
    pub fn step_down(&mut self, world: &mut dyn CollisionWorld, _dt: f32) {
        let step_drop = Vec3::y() * (self.current_step_offset + self.config.step_height);
        self.target_position -= step_drop;

        let from = iso_at(self.current_position);
        let to = iso_at(self.target_position);
        let filter = self.ghost.sweep_filter(self.config.sweep_mode);
        let result = world.convex_sweep_test(
            &self.convex_shape,
            &from,
            &to,
            world.allowed_ccd_penetration(),
            &filter,
        );

        if result.has_hit() {
            self.current_position = self
                .current_position
                .lerp(&self.target_position, result.closest_hit_fraction);
        } else {
            self.current_position = self.target_position;
        }
    }
}
