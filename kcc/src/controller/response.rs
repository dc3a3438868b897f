//! Collision response: reflect the remaining motion off a hit surface and
//! split it into the parts along and across the surface normal.

use crate::collision::{Vec3, settings::EPSILON};

/// Reflect `direction` about the plane with unit `normal`: `d - 2(d·n)n`.
#[inline]
pub fn compute_reflection_direction(direction: &Vec3, normal: &Vec3) -> Vec3 {
    direction - normal * (2.0 * direction.dot(normal))
}

/// Component of `direction` along unit `normal`.
#[inline]
pub fn parallel_component(direction: &Vec3, normal: &Vec3) -> Vec3 {
    normal * direction.dot(normal)
}

/// Component of `direction` orthogonal to unit `normal`.
#[inline]
pub fn perpendicular_component(direction: &Vec3, normal: &Vec3) -> Vec3 {
    direction - parallel_component(direction, normal)
}

/// New target for the motion `current -> target` after hitting a surface with
/// `hit_normal`.
///
/// The motion direction is reflected off the surface, then its part across the
/// normal is scaled by `normal_magnitude` and its part along the normal by
/// `tangent_magnitude`, both times the remaining motion length. A zero weight
/// drops that part. Degenerate motion returns `target` unchanged.
pub fn retarget_after_collision(
    current: &Vec3,
    target: &Vec3,
    hit_normal: &Vec3,
    tangent_magnitude: f32,
    normal_magnitude: f32,
) -> Vec3 {
    let movement = target - current;
    let movement_length = movement.norm();
    if movement_length <= EPSILON {
        return *target;
    }

    let direction = movement / movement_length;
    let reflect = compute_reflection_direction(&direction, hit_normal);
    let reflect = reflect.try_normalize(EPSILON).unwrap_or(reflect);

    let mut new_target = *current;
    if normal_magnitude != 0.0 {
        let perpendicular = perpendicular_component(&reflect, hit_normal);
        new_target += perpendicular * (normal_magnitude * movement_length);
    }
    if tangent_magnitude != 0.0 {
        let parallel = parallel_component(&reflect, hit_normal);
        new_target += parallel * (tangent_magnitude * movement_length);
    }
    new_target
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reflection_flips_normal_part() {
        let d = Vec3::new(1.0, -1.0, 0.0);
        let n = Vec3::y();
        assert_relative_eq!(compute_reflection_direction(&d, &n), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn components_split_direction() {
        let d = Vec3::new(3.0, 4.0, -2.0);
        let n = Vec3::x();
        assert_eq!(parallel_component(&d, &n), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(perpendicular_component(&d, &n), Vec3::new(0.0, 4.0, -2.0));
    }

    #[test]
    fn head_on_hit_cancels_motion() {
        let current = Vec3::new(0.5, 0.0, 0.0);
        let target = Vec3::new(2.0, 0.0, 0.0);
        let new_target = retarget_after_collision(&current, &target, &-Vec3::x(), 0.0, 1.0);
        assert_relative_eq!(new_target, current, epsilon = 1.0e-6);
    }

    #[test]
    fn oblique_hit_slides_along_surface() {
        let current = Vec3::zeros();
        let target = Vec3::new(1.0, 0.0, 1.0);
        let new_target = retarget_after_collision(&current, &target, &-Vec3::x(), 0.0, 1.0);

        // Only the part across the wall normal survives, scaled by the full length.
        assert_relative_eq!(new_target.x, 0.0, epsilon = 1.0e-6);
        assert_relative_eq!(new_target.z, 1.0, epsilon = 1.0e-5);
    }

    #[test]
    fn tangent_weight_adds_bounce() {
        let current = Vec3::zeros();
        let target = Vec3::new(1.0, 0.0, 0.0);
        let new_target = retarget_after_collision(&current, &target, &-Vec3::x(), 0.5, 1.0);
        assert_relative_eq!(new_target, Vec3::new(-0.5, 0.0, 0.0), epsilon = 1.0e-6);
    }

    #[test]
    fn degenerate_motion_is_a_no_op() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(retarget_after_collision(&p, &p, &Vec3::y(), 1.0, 1.0), p);
    }
}
