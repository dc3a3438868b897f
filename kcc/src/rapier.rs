use rapier3d::prelude::*;

use crate::collision::{CollisionFilter, Iso, Quat, Vec3, types::iso_at};

/// Canonical definition of an immutable world collider.
///
/// Conventions
/// - Units are meters.
/// - Rotation is a unit quaternion.
/// - For planes, the normal is derived from the pose as `rotation * +Y` and the
///   plane satisfies `dot(normal, x) = dot(normal, translation) + offset_along_normal`.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    /// World-space translation.
    pub translation: Vec3,
    /// World-space rotation (unit quaternion).
    pub rotation: Quat,
    /// Collider shape parameters.
    pub shape: ColliderShapeDef,
    /// Broad-phase group/mask.
    pub filter: CollisionFilter,
}

impl WorldStaticDef {
    pub fn new(id: u32, translation: Vec3, rotation: Quat, shape: ColliderShapeDef) -> Self {
        Self {
            id,
            translation,
            rotation,
            shape,
            filter: CollisionFilter::static_geometry(),
        }
    }

    /// Horizontal ground plane at `height`.
    pub fn ground_plane(id: u32, height: f32) -> Self {
        Self::new(
            id,
            Vec3::new(0.0, height, 0.0),
            Quat::identity(),
            ColliderShapeDef::Plane {
                offset_along_normal: 0.0,
            },
        )
    }

    /// Axis-aligned box centered at `center`.
    pub fn cuboid(id: u32, half_extents: Vec3, center: Vec3) -> Self {
        Self::new(
            id,
            center,
            Quat::identity(),
            ColliderShapeDef::Cuboid { half_extents },
        )
    }

    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    /// World pose of the collider built from this definition.
    pub fn pose(&self) -> Iso {
        match self.shape {
            ColliderShapeDef::Plane {
                offset_along_normal,
            } => {
                let (unit_n, dist) = plane_normal_and_dist(self, offset_along_normal);
                iso_at(unit_n.into_inner() * dist)
            }
            _ => Iso::from_parts(self.translation.into(), self.rotation),
        }
    }
}

/// Supported static collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space).
    ///
    /// Represented by an offset along the plane normal. The normal is derived
    /// from the pose as `rotation * +Y`; rotation is fully supported.
    Plane {
        /// Offset along the plane normal (meters).
        offset_along_normal: f32,
    },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vec3 },

    /// Sphere/ball (meters).
    Sphere { radius: f32 },

    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },

    /// Y-aligned cylinder (meters).
    CylinderY { radius: f32, half_height: f32 },

    /// Y-aligned cone (meters).
    ConeY { radius: f32, half_height: f32 },

    /// Rounded cuboid (meters).
    ///
    /// `border_radius` rounds all edges/corners.
    RoundCuboid {
        half_extents: Vec3,
        border_radius: f32,
    },
}

fn plane_normal_and_dist(def: &WorldStaticDef, offset_along_normal: f32) -> (UnitVector<f32>, f32) {
    // n = R * +Y, and dist such that n ⋅ x = dist for any x on the plane.
    let unit_n = UnitVector::new_normalize(def.rotation * Vec3::y());
    let dist = unit_n.dot(&def.translation) + offset_along_normal;
    (unit_n, dist)
}

/// Build a rapier collider from a `WorldStaticDef`.
///
/// The collider has an identity local pose: the world attaches it to a fixed
/// rigid body placed at [`WorldStaticDef::pose`]. The filter becomes the
/// collider's collision groups.
pub fn collider_from_def(def: &WorldStaticDef) -> Collider {
    let builder = match &def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => {
            let (unit_n, _) = plane_normal_and_dist(def, *offset_along_normal);
            ColliderBuilder::new(SharedShape::new(HalfSpace::new(unit_n)))
        }

        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }

        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),

        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius),

        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius),

        ColliderShapeDef::ConeY {
            radius,
            half_height,
        } => ColliderBuilder::cone(*half_height, *radius),

        ColliderShapeDef::RoundCuboid {
            half_extents,
            border_radius,
        } => ColliderBuilder::round_cuboid(
            half_extents.x,
            half_extents.y,
            half_extents.z,
            *border_radius,
        ),
    };

    builder
        .collision_groups(def.filter.interaction_groups())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn ground_plane_sits_at_height() {
        let def = WorldStaticDef::ground_plane(0, 2.0);
        let pose = def.pose();
        assert_relative_eq!(pose.translation.vector.y, 2.0, epsilon = 1.0e-6);
        assert_eq!(pose.rotation, Quat::identity());
    }

    #[test]
    fn rotated_plane_uses_pose_normal() {
        // Rotate +Y onto +X: a wall at x = 3 facing +X.
        let rotation = Quat::from_axis_angle(&Vec3::z_axis(), -FRAC_PI_2);
        let def = WorldStaticDef::new(
            1,
            Vec3::new(3.0, 7.0, -2.0),
            rotation,
            ColliderShapeDef::Plane {
                offset_along_normal: 0.5,
            },
        );

        let pose = def.pose();
        assert_relative_eq!(pose.translation.vector.x, 3.5, epsilon = 1.0e-5);
        assert_relative_eq!(pose.translation.vector.y, 0.0, epsilon = 1.0e-5);
    }

    #[test]
    fn collider_carries_filter_as_collision_groups() {
        let def = WorldStaticDef::cuboid(7, Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0));
        let collider = collider_from_def(&def);

        assert_eq!(
            CollisionFilter::from(collider.collision_groups()),
            CollisionFilter::static_geometry()
        );
        assert_eq!(def.pose().translation.vector, Vec3::new(4.0, 5.0, 6.0));
    }
}
