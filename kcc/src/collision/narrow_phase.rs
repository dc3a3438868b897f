use rapier3d::geometry::{ContactData, ContactManifold as ShapeManifold, ContactManifoldData};
use rapier3d::parry::{
    query::{self, PersistentQueryDispatcher, ShapeCastOptions},
    shape::Shape,
};
use rapier3d::prelude::Collider;

use super::{
    settings::{EPSILON, SWEEP_DISTANCE_TOLERANCE, SWEEP_REFINE_ITERATIONS},
    shape::ConvexShape,
    types::{Iso, ManifoldPoint, Vec3},
};

/// Cast options for sweeping `shape` over one unit of its motion.
///
/// The shape margin is the cast's target distance, so contact is reported
/// when the dilated shape touches an obstacle.
pub fn sweep_options(shape: &ConvexShape) -> ShapeCastOptions {
    let mut opts = ShapeCastOptions::with_max_time_of_impact(1.0);
    opts.target_distance = shape.margin();
    opts.stop_at_penetration = true;
    opts.compute_impact_geometry_on_penetration = true;
    opts
}

/// Tighten a shape-cast time of impact against one collider.
///
/// Measures the gap left between the dilated shape and the collider at the
/// reported pose and moves along `motion` until the gap closes, dividing the
/// gap by the approach speed along the contact normal. For convex shapes a
/// pass never overshoots a separated contact.
pub fn refine_time_of_impact(
    collider: &Collider,
    shape: &ConvexShape,
    from: &Iso,
    motion: &Vec3,
    time_of_impact: f32,
) -> f32 {
    let length = motion.norm();
    if time_of_impact <= 0.0 || length <= EPSILON {
        return time_of_impact;
    }

    let margin = shape.margin();
    let mut toi = time_of_impact;
    for _ in 0..SWEEP_REFINE_ITERATIONS {
        let pose = Iso::from_parts(
            (from.translation.vector + motion * toi).into(),
            from.rotation,
        );
        let (gap, approach) = match query::contact(
            &pose,
            shape.shape(),
            collider.position(),
            collider.shape(),
            margin + length,
        ) {
            Ok(Some(contact)) => (contact.dist - margin, motion.dot(&contact.normal1)),
            _ => break,
        };
        if gap.abs() <= SWEEP_DISTANCE_TOLERANCE || approach <= EPSILON {
            break;
        }
        toi = (toi + gap / approach).clamp(0.0, 1.0);
    }
    toi
}

/// True when the shape starts within `allowed_penetration` of the collider's
/// surface and `motion` does not point into it.
pub fn leaves_allowed_penetration(
    collider: &Collider,
    shape: &ConvexShape,
    from: &Iso,
    motion: &Vec3,
    normal: &Vec3,
    allowed_penetration: f32,
) -> bool {
    if allowed_penetration <= 0.0 || motion.dot(normal) < -EPSILON * motion.norm() {
        return false;
    }
    match query::contact(
        from,
        shape.shape(),
        collider.position(),
        collider.shape(),
        shape.margin() + allowed_penetration,
    ) {
        Ok(Some(contact)) => contact.dist - shape.margin() >= -allowed_penetration,
        // Farther apart than the skin: the initial hit was only grazing.
        Ok(None) => true,
        Err(_) => false,
    }
}

/// Contact manifolds between two posed shapes, each dilated by its margin.
///
/// Every manifold keeps all the points the dispatcher generated within
/// `prediction` of the dilated surfaces. Points and normals live on shape
/// `b`; normals point toward shape `a`.
#[allow(clippy::too_many_arguments)]
pub fn contact_manifolds(
    dispatcher: &dyn PersistentQueryDispatcher<ContactManifoldData, ContactData>,
    pose_a: &Iso,
    shape_a: &dyn Shape,
    margin_a: f32,
    pose_b: &Iso,
    shape_b: &dyn Shape,
    margin_b: f32,
    prediction: f32,
) -> Vec<Vec<ManifoldPoint>> {
    let margins = margin_a + margin_b;
    let pos12 = pose_a.inv_mul(pose_b);

    let mut manifolds: Vec<ShapeManifold> = Vec::new();
    if dispatcher
        .contact_manifolds(
            &pos12,
            shape_a,
            shape_b,
            prediction + margins,
            &mut manifolds,
            &mut None,
        )
        .is_err()
    {
        log::trace!("contact manifolds unsupported for this shape pair");
        return Vec::new();
    }

    manifolds
        .iter()
        .filter_map(|manifold| {
            let frame_b = manifold.subshape_pos2.map_or(*pose_b, |local| pose_b * local);
            let normal = frame_b.rotation * manifold.local_n2;
            let points: Vec<ManifoldPoint> = manifold
                .points
                .iter()
                .filter(|contact| contact.dist - margins <= prediction)
                .map(|contact| ManifoldPoint {
                    position_world_on_b: frame_b * contact.local_p2 + normal * margin_b,
                    normal_world_on_b: normal,
                    distance: contact.dist - margins,
                })
                .collect();
            (!points.is_empty()).then_some(points)
        })
        .collect()
}
