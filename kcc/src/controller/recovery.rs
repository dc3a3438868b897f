use super::KinematicCharacterController;
use crate::collision::{CollisionWorld, Vec3, types::with_origin};

impl KinematicCharacterController {
    /// One penetration recovery pass.
    ///
    /// Refreshes the ghost's contact manifolds, sums a damped correction over
    /// every point deeper than the slop and applies it to the ghost transform.
    /// Records the normal of the deepest point as the touching normal.
    /// Returns true if anything penetrated.
    pub fn recover_from_penetration(&mut self, world: &mut dyn CollisionWorld) -> bool {
        let me = self.ghost.handle();
        world.dispatch_all_collision_pairs(&mut self.ghost, &self.convex_shape);

        let Some(pose) = world.world_transform(me) else {
            log::error!("Failed to find ghost collider {:?}", me);
            return false;
        };
        self.current_position = pose.translation.vector;

        let slop = self.config.penetration_slop;
        let factor = self.config.penetration_recovery_factor;

        let mut penetration = false;
        let mut max_pen = 0.0;
        let mut correction = Vec3::zeros();

        for manifold in self.ghost.manifolds() {
            let sign = manifold.direction_sign(me);
            for point in &manifold.points {
                let dist = point.distance;
                if dist >= -slop {
                    continue;
                }
                if dist < max_pen {
                    max_pen = dist;
                    self.touching_normal = point.normal_world_on_b * sign;
                }
                correction += point.normal_world_on_b * (sign * dist * factor);
                penetration = true;
            }
        }

        if penetration {
            self.current_position += correction;
            world.set_world_transform(me, with_origin(&pose, self.current_position));
            log::trace!(
                "ghost {:?} recovered by {:?} (deepest {})",
                me,
                correction,
                max_pen
            );
        }
        penetration
    }
}
