use std::fmt;
use std::ops::Deref;

use rapier3d::parry::{bounding_volume::Aabb, shape::Shape};
use rapier3d::prelude::SharedShape;

use super::{
    broad,
    types::{Iso, Vec3},
};
use crate::error::{ConfigResult, ensure_non_negative, ensure_positive};

/// Convex shapes a character proxy can carry.
///
/// Y-aligned variants use the controller's up axis (+Y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConvexShapeDef {
    /// Sphere/ball (meters).
    Ball { radius: f32 },

    /// Y-aligned capsule. `half_height` is half the cylinder section.
    CapsuleY { radius: f32, half_height: f32 },

    /// Box with given half-extents (meters).
    Cuboid { half_extents: Vec3 },

    /// Y-aligned cylinder (meters).
    CylinderY { radius: f32, half_height: f32 },

    /// Y-aligned cone (meters).
    ConeY { radius: f32, half_height: f32 },

    /// Box with rounded edges and corners.
    RoundCuboid {
        half_extents: Vec3,
        border_radius: f32,
    },
}

impl ConvexShapeDef {
    /// Check every dimension is finite and positive.
    pub fn validate(&self) -> ConfigResult<()> {
        match *self {
            ConvexShapeDef::Ball { radius } => {
                ensure_positive("radius", radius)?;
            }
            ConvexShapeDef::CapsuleY {
                radius,
                half_height,
            }
            | ConvexShapeDef::CylinderY {
                radius,
                half_height,
            }
            | ConvexShapeDef::ConeY {
                radius,
                half_height,
            } => {
                ensure_positive("radius", radius)?;
                ensure_positive("half_height", half_height)?;
            }
            ConvexShapeDef::Cuboid { half_extents } => {
                validate_half_extents(half_extents)?;
            }
            ConvexShapeDef::RoundCuboid {
                half_extents,
                border_radius,
            } => {
                validate_half_extents(half_extents)?;
                ensure_non_negative("border_radius", border_radius)?;
            }
        }
        Ok(())
    }

    /// Build the parry shape for this definition.
    pub fn build(&self) -> SharedShape {
        match *self {
            ConvexShapeDef::Ball { radius } => SharedShape::ball(radius),
            ConvexShapeDef::CapsuleY {
                radius,
                half_height,
            } => SharedShape::capsule_y(half_height, radius),
            ConvexShapeDef::Cuboid { half_extents } => {
                SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            ConvexShapeDef::CylinderY {
                radius,
                half_height,
            } => SharedShape::cylinder(half_height, radius),
            ConvexShapeDef::ConeY {
                radius,
                half_height,
            } => SharedShape::cone(half_height, radius),
            ConvexShapeDef::RoundCuboid {
                half_extents,
                border_radius,
            } => SharedShape::round_cuboid(
                half_extents.x,
                half_extents.y,
                half_extents.z,
                border_radius,
            ),
        }
    }
}

fn validate_half_extents(half_extents: Vec3) -> ConfigResult<()> {
    ensure_positive("half_extents.x", half_extents.x)?;
    ensure_positive("half_extents.y", half_extents.y)?;
    ensure_positive("half_extents.z", half_extents.z)?;
    Ok(())
}

/// The proxy's convex collision shape plus its collision margin.
///
/// The margin is an outer skin: queries treat the shape as dilated by
/// `margin`. Sweeps use it as the cast's target distance and contact
/// generation subtracts it from the measured separation.
#[derive(Clone)]
pub struct ConvexShape {
    def: ConvexShapeDef,
    shape: SharedShape,
    margin: f32,
}

impl ConvexShape {
    pub fn new(def: ConvexShapeDef) -> ConfigResult<Self> {
        def.validate()?;
        Ok(Self {
            def,
            shape: def.build(),
            margin: 0.0,
        })
    }

    pub fn with_margin(mut self, margin: f32) -> ConfigResult<Self> {
        self.margin = ensure_non_negative("margin", margin)?;
        Ok(self)
    }

    #[inline]
    pub fn def(&self) -> &ConvexShapeDef {
        &self.def
    }

    #[inline]
    pub fn shape(&self) -> &dyn Shape {
        &*self.shape
    }

    #[inline]
    pub fn shared_shape(&self) -> &SharedShape {
        &self.shape
    }

    #[inline]
    pub fn margin(&self) -> f32 {
        self.margin
    }

    pub fn set_margin(&mut self, margin: f32) -> ConfigResult<()> {
        self.margin = ensure_non_negative("margin", margin)?;
        Ok(())
    }

    /// World-space bounds of the shape at `pose`, including the margin.
    pub fn compute_aabb(&self, pose: &Iso) -> Aabb {
        broad::aabb_inflate(&self.shape.compute_aabb(pose), self.margin)
    }

    /// Distance from the shape origin down to its lowest point along -Y,
    /// including the margin.
    pub fn extent_below_origin(&self) -> f32 {
        -self.shape.compute_local_aabb().mins.y + self.margin
    }

    /// Temporarily grow the margin by `extra`.
    ///
    /// The previous margin is restored when the guard is dropped, on every
    /// exit path of the borrowing scope.
    pub fn widen_margin(&mut self, extra: f32) -> MarginGuard<'_> {
        let restore = self.margin;
        self.margin = restore + extra.max(0.0);
        MarginGuard {
            shape: self,
            restore,
        }
    }
}

impl fmt::Debug for ConvexShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvexShape")
            .field("def", &self.def)
            .field("margin", &self.margin)
            .finish()
    }
}

/// Scoped margin widening returned by [`ConvexShape::widen_margin`].
pub struct MarginGuard<'a> {
    shape: &'a mut ConvexShape,
    restore: f32,
}

impl Deref for MarginGuard<'_> {
    type Target = ConvexShape;

    fn deref(&self) -> &ConvexShape {
        &*self.shape
    }
}

impl Drop for MarginGuard<'_> {
    fn drop(&mut self) {
        self.shape.margin = self.restore;
    }
}
