//! Rapier-based collision world for kinematic characters.
//!
//! Static geometry sits on fixed rigid bodies; ghost proxies are standalone
//! sensor colliders. A `CollisionPipeline` keeps the broad-phase BVH current,
//! and every [`CollisionWorld`] query runs through a borrowed `QueryPipeline`.
//!
//! Design goals
//! - Deterministic: statics are inserted sorted by `id`, and pair generation
//!   orders candidates by collider index.
//! - No dynamics: the pipeline only runs collision detection. Writing a ghost
//!   transform refreshes the BVH before the next query.

use rapier3d::parry::query::Ray;
use rapier3d::prelude::*;

use crate::collision::{
    CollisionFilter, CollisionWorld, ContactManifold, ConvexShape, GhostObject, Iso,
    OverlappingPair, Point3, RayHit, SweepFilter, SweepHit, SweepResult, Vec3,
    broad::{aabb_inflate, aabb_intersects},
    narrow_phase,
    settings::{DEFAULT_ALLOWED_CCD_PENETRATION, DEFAULT_CONTACT_BREAKING_THRESHOLD},
    types::iso_at,
};
use crate::error::{ConfigResult, ensure_non_negative};
use crate::rapier::{WorldStaticDef, collider_from_def};

/// Static geometry plus ghost proxies, queried by kinematic controllers.
///
/// This stores:
/// - `RigidBodySet`/`ColliderSet` with the statics (on fixed bodies) and ghosts.
/// - `NarrowPhase` and `BroadPhaseBvh` used to create a borrowed `QueryPipeline`.
///
/// Colliders edited through the public sets are only seen by queries after
/// the next insertion or transform write.
pub struct KinematicWorld {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
    collision_pipeline: CollisionPipeline,
    allowed_ccd_penetration: f32,
    contact_breaking_threshold: f32,
}

impl KinematicWorld {
    pub fn new() -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            collision_pipeline: CollisionPipeline::new(),
            allowed_ccd_penetration: DEFAULT_ALLOWED_CCD_PENETRATION,
            contact_breaking_threshold: DEFAULT_CONTACT_BREAKING_THRESHOLD,
        }
    }

    /// Build a world from a list of static collider definitions.
    ///
    /// Determinism
    /// - The input is sorted by `id` before insertion.
    /// - Any NaN/invalid values should be filtered/validated by the caller.
    pub fn build(mut defs: Vec<WorldStaticDef>) -> Self {
        defs.sort_by_key(|d| d.id);

        let mut world = Self::new();
        for def in &defs {
            world.attach_static(def);
        }
        world.update_broad_phase();
        log::debug!("built kinematic world with {} statics", defs.len());
        world
    }

    /// Insert one static as a fixed rigid body with its collider attached.
    pub fn insert_static(&mut self, def: &WorldStaticDef) -> ColliderHandle {
        let handle = self.attach_static(def);
        self.update_broad_phase();
        handle
    }

    fn attach_static(&mut self, def: &WorldStaticDef) -> ColliderHandle {
        let body = self.bodies.insert(RigidBodyBuilder::fixed().pose(def.pose()).build());
        self.colliders
            .insert_with_parent(collider_from_def(def), body, &mut self.bodies)
    }

    /// Register a ghost proxy for `shape` at `origin` (identity rotation).
    pub fn insert_ghost(
        &mut self,
        shape: &ConvexShape,
        origin: Vec3,
        filter: CollisionFilter,
    ) -> GhostObject {
        let mut collider = ColliderBuilder::new(shape.shared_shape().clone())
            .sensor(true)
            .collision_groups(filter.interaction_groups())
            .build();
        collider.set_position(iso_at(origin));

        let handle = self.colliders.insert(collider);
        self.update_broad_phase();
        GhostObject::new(handle, filter)
    }

    /// Create a borrowed `QueryPipeline` view for scene queries.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    /// Push pending collider and body changes into the broad-phase BVH.
    fn update_broad_phase(&mut self) {
        self.collision_pipeline.step(
            self.contact_breaking_threshold,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &(),
            &(),
        );
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn contact_breaking_threshold(&self) -> f32 {
        self.contact_breaking_threshold
    }

    pub fn set_contact_breaking_threshold(&mut self, threshold: f32) -> ConfigResult<()> {
        self.contact_breaking_threshold =
            ensure_non_negative("contact_breaking_threshold", threshold)?;
        Ok(())
    }

    pub fn set_allowed_ccd_penetration(&mut self, allowed: f32) -> ConfigResult<()> {
        self.allowed_ccd_penetration = ensure_non_negative("allowed_ccd_penetration", allowed)?;
        Ok(())
    }
}

impl Default for KinematicWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Pair order: the collider inserted first is `body0`.
#[inline]
fn arena_index(handle: ColliderHandle) -> u32 {
    handle.into_raw_parts().0
}

/// Query filter applying `filter`'s groups and exclusion, with `admits` as
/// the per-collider predicate.
fn query_filter<'a>(
    filter: &SweepFilter<'_>,
    admits: &'a impl Fn(ColliderHandle, &Collider) -> bool,
) -> QueryFilter<'a> {
    let query = QueryFilter::new().groups(filter.groups()).predicate(admits);
    match filter.exclude {
        Some(object) => query.exclude_collider(object),
        None => query,
    }
}

impl CollisionWorld for KinematicWorld {
    fn world_transform(&self, object: ColliderHandle) -> Option<Iso> {
        self.colliders.get(object).map(|c| *c.position())
    }

    fn set_world_transform(&mut self, object: ColliderHandle, transform: Iso) -> bool {
        let Some(collider) = self.colliders.get_mut(object) else {
            return false;
        };
        match collider.parent() {
            Some(parent) => {
                if let Some(body) = self.bodies.get_mut(parent) {
                    body.set_position(transform, false);
                }
            }
            None => collider.set_position(transform),
        }
        self.update_broad_phase();
        true
    }

    fn dispatch_all_collision_pairs(&self, ghost: &mut GhostObject, shape: &ConvexShape) {
        let me = ghost.handle();
        let Some(pose) = self.world_transform(me) else {
            log::error!("Failed to find ghost collider {:?}", me);
            ghost.set_overlapping_pairs(Vec::new());
            return;
        };

        let threshold = self.contact_breaking_threshold;
        let bounds = aabb_inflate(&shape.compute_aabb(&pose), threshold);
        let filter = QueryFilter::new()
            .groups(ghost.collision_filter().interaction_groups())
            .exclude_collider(me);

        let mut candidates: Vec<ColliderHandle> = self
            .query_pipeline(filter)
            .intersect_aabb_conservative(bounds)
            .filter(|(_, collider)| aabb_intersects(&bounds, &collider.compute_aabb()))
            .map(|(handle, _)| handle)
            .collect();
        candidates.sort_by_key(|handle| arena_index(*handle));

        let dispatcher = self.narrow_phase.query_dispatcher();
        let mut pairs = Vec::with_capacity(candidates.len());
        for handle in candidates {
            let collider = &self.colliders[handle];
            let ghost_is_body0 = arena_index(me) < arena_index(handle);
            let (body0, body1, manifolds) = if ghost_is_body0 {
                let manifolds = narrow_phase::contact_manifolds(
                    dispatcher,
                    &pose,
                    shape.shape(),
                    shape.margin(),
                    collider.position(),
                    collider.shape(),
                    0.0,
                    threshold,
                );
                (me, handle, manifolds)
            } else {
                let manifolds = narrow_phase::contact_manifolds(
                    dispatcher,
                    collider.position(),
                    collider.shape(),
                    0.0,
                    &pose,
                    shape.shape(),
                    shape.margin(),
                    threshold,
                );
                (handle, me, manifolds)
            };

            pairs.push(OverlappingPair {
                body0,
                body1,
                manifolds: manifolds
                    .into_iter()
                    .map(|points| ContactManifold {
                        body0,
                        body1,
                        points,
                    })
                    .collect(),
            });
        }

        log::trace!("ghost {:?} overlaps {} objects", me, pairs.len());
        ghost.set_overlapping_pairs(pairs);
    }

    fn convex_sweep_test(
        &self,
        shape: &ConvexShape,
        from: &Iso,
        to: &Iso,
        allowed_penetration: f32,
        filter: &SweepFilter<'_>,
    ) -> SweepResult {
        let motion = to.translation.vector - from.translation.vector;
        let options = narrow_phase::sweep_options(shape);

        // Obstacles the sweep starts in but is allowed to leave.
        let mut skipped: Vec<ColliderHandle> = Vec::new();
        loop {
            let cast = {
                let admits = |handle: ColliderHandle, _: &Collider| {
                    !skipped.contains(&handle) && filter.admits(handle)
                };
                self.query_pipeline(query_filter(filter, &admits))
                    .cast_shape(from, &motion, shape.shape(), options)
            };
            let Some((handle, hit)) = cast else {
                return SweepResult::miss();
            };

            let collider = &self.colliders[handle];
            let normal = hit.normal1.into_inner();
            if hit.time_of_impact <= 0.0
                && narrow_phase::leaves_allowed_penetration(
                    collider,
                    shape,
                    from,
                    &motion,
                    &normal,
                    allowed_penetration,
                )
            {
                skipped.push(handle);
                continue;
            }

            let fraction = narrow_phase::refine_time_of_impact(
                collider,
                shape,
                from,
                &motion,
                hit.time_of_impact,
            );
            return SweepResult {
                closest_hit_fraction: fraction,
                hit: Some(SweepHit {
                    object: handle,
                    point: hit.witness1,
                    normal,
                }),
            };
        }
    }

    fn ray_test(&self, from: Point3, to: Point3, filter: &SweepFilter<'_>) -> Option<RayHit> {
        let ray = Ray::new(from, to - from);
        let admits = |handle: ColliderHandle, _: &Collider| filter.admits(handle);
        let (handle, hit) = self
            .query_pipeline(query_filter(filter, &admits))
            .cast_ray_and_get_normal(&ray, 1.0, true)?;

        Some(RayHit {
            object: handle,
            fraction: hit.time_of_impact,
            point: ray.point_at(hit.time_of_impact),
            normal: hit.normal,
        })
    }

    fn allowed_ccd_penetration(&self) -> f32 {
        self.allowed_ccd_penetration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionGroup, ConvexShapeDef, SweepMode};
    use crate::testing::{ball_shape, flat_ground};
    use approx::assert_relative_eq;

    fn debris_only() -> CollisionFilter {
        CollisionFilter::from_groups(&[CollisionGroup::Debris], &[CollisionGroup::Debris])
    }

    fn sweep(
        world: &KinematicWorld,
        shape: &ConvexShape,
        from: Vec3,
        to: Vec3,
        filter: &SweepFilter<'_>,
    ) -> SweepResult {
        world.convex_sweep_test(
            shape,
            &iso_at(from),
            &iso_at(to),
            world.allowed_ccd_penetration(),
            filter,
        )
    }

    #[test]
    fn build_inserts_sorted_by_id() {
        let defs = vec![
            WorldStaticDef::cuboid(2, Vec3::repeat(0.5), Vec3::new(2.0, 0.0, 0.0)),
            WorldStaticDef::cuboid(1, Vec3::repeat(0.5), Vec3::new(1.0, 0.0, 0.0)),
        ];
        let world = KinematicWorld::build(defs);

        let xs: Vec<f32> = world
            .colliders
            .iter()
            .map(|(_, c)| c.position().translation.vector.x)
            .collect();
        assert_eq!(xs, vec![1.0, 2.0]);
    }

    #[test]
    fn statics_hang_off_fixed_bodies() {
        let world = flat_ground();
        let (_, collider) = world.colliders.iter().next().unwrap();

        let body = &world.bodies[collider.parent().expect("static parent")];
        assert!(body.is_fixed());
        assert_relative_eq!(body.position().translation.vector.y, -0.5);
        assert_eq!(
            CollisionFilter::from(collider.collision_groups()),
            CollisionFilter::static_geometry()
        );
    }

    #[test]
    fn ghost_transform_round_trips_through_world() {
        let mut world = flat_ground();
        let shape = ball_shape(0.5);
        let ghost =
            world.insert_ghost(&shape, Vec3::new(0.0, 1.0, 0.0), CollisionFilter::character());

        let moved = iso_at(Vec3::new(4.0, 2.0, -1.0));
        assert!(world.set_world_transform(ghost.handle(), moved));
        assert_eq!(world.world_transform(ghost.handle()), Some(moved));
    }

    #[test]
    fn moved_ghost_is_found_by_later_queries() {
        let mut world = KinematicWorld::new();
        let shape = ball_shape(0.5);
        let ghost = world.insert_ghost(&shape, Vec3::zeros(), CollisionFilter::character());
        let crate_box =
            world.insert_ghost(&shape, Vec3::new(0.0, 0.0, 40.0), CollisionFilter::default());

        let filter = ghost.sweep_filter(SweepMode::World);
        let path = (Vec3::zeros(), Vec3::new(4.0, 0.0, 0.0));
        assert!(!sweep(&world, &shape, path.0, path.1, &filter).has_hit());

        // Moved into the path: the BVH leaf follows the new pose.
        world.set_world_transform(crate_box.handle(), iso_at(Vec3::new(3.0, 0.0, 0.0)));
        let result = sweep(&world, &shape, path.0, path.1, &filter);
        assert_eq!(result.hit.map(|h| h.object), Some(crate_box.handle()));
        assert_relative_eq!(result.closest_hit_fraction, 0.5, epsilon = 1.0e-4);
    }

    #[test]
    fn dispatch_collects_touching_and_penetrating_pairs() {
        let mut world = flat_ground();
        let shape = ball_shape(0.5);
        let mut ghost =
            world.insert_ghost(&shape, Vec3::new(0.0, 0.45, 0.0), CollisionFilter::character());

        world.dispatch_all_collision_pairs(&mut ghost, &shape);

        assert_eq!(ghost.num_overlapping_pairs(), 1);
        let manifold = ghost.manifolds().next().expect("floor manifold");
        assert_eq!(manifold.num_contacts(), 1);
        assert_relative_eq!(manifold.points[0].distance, -0.05, epsilon = 1.0e-4);

        // Ground was inserted first, so the ghost is body1 and its normal points down.
        assert_eq!(manifold.body1, ghost.handle());
        assert_eq!(manifold.direction_sign(ghost.handle()), 1.0);
        assert_relative_eq!(manifold.points[0].normal_world_on_b.y, -1.0, epsilon = 1.0e-4);
    }

    #[test]
    fn dispatch_keeps_every_manifold_point() {
        let mut world = flat_ground();
        let shape = ConvexShape::new(ConvexShapeDef::Cuboid {
            half_extents: Vec3::repeat(0.5),
        })
        .unwrap();
        let mut ghost =
            world.insert_ghost(&shape, Vec3::new(0.0, 0.45, 0.0), CollisionFilter::character());

        world.dispatch_all_collision_pairs(&mut ghost, &shape);

        let points: Vec<_> = ghost.manifolds().flat_map(|m| m.points.iter()).collect();
        assert_eq!(points.len(), 4);
        assert!(points.iter().all(|p| (p.distance + 0.05).abs() < 1.0e-4));
    }

    #[test]
    fn dispatch_skips_distant_and_filtered_objects() {
        let mut world = flat_ground();
        world.insert_static(&WorldStaticDef::cuboid(
            9,
            Vec3::repeat(0.5),
            Vec3::new(10.0, 0.5, 0.0),
        ));
        world.insert_static(
            &WorldStaticDef::cuboid(10, Vec3::repeat(0.5), Vec3::new(0.0, 1.0, 0.9))
                .with_filter(debris_only()),
        );

        let shape = ball_shape(0.5);
        let mut ghost =
            world.insert_ghost(&shape, Vec3::new(0.0, 1.0, 0.0), CollisionFilter::character());
        world.dispatch_all_collision_pairs(&mut ghost, &shape);

        // Hovering 0.5 above the ground, the far box out of reach, debris masked out.
        assert_eq!(ghost.num_overlapping_pairs(), 0);

        let touching = iso_at(Vec3::new(0.0, 0.51, 0.0));
        world.set_world_transform(ghost.handle(), touching);
        world.dispatch_all_collision_pairs(&mut ghost, &shape);
        assert_eq!(ghost.num_overlapping_pairs(), 1);
    }

    #[test]
    fn sweep_never_reports_the_ghost_itself() {
        let mut world = KinematicWorld::new();
        let shape = ball_shape(0.5);
        let ghost = world.insert_ghost(&shape, Vec3::zeros(), CollisionFilter::character());

        // A second, default-group object in the path.
        let other = world.insert_static(
            &WorldStaticDef::cuboid(0, Vec3::repeat(0.5), Vec3::new(3.0, 0.0, 0.0))
                .with_filter(CollisionFilter::default()),
        );

        let filter = ghost.sweep_filter(SweepMode::World);
        let result = world.convex_sweep_test(
            &shape,
            &iso_at(Vec3::zeros()),
            &iso_at(Vec3::new(4.0, 0.0, 0.0)),
            0.0,
            &filter,
        );

        let hit = result.hit.expect("box in the path");
        assert_eq!(hit.object, other);
        // Contact when the ball's front reaches x = 2.5.
        assert_relative_eq!(result.closest_hit_fraction, 0.5, epsilon = 1.0e-4);
    }

    #[test]
    fn sweep_honors_group_mask() {
        let mut world = KinematicWorld::new();
        let shape = ball_shape(0.5);
        let ghost = world.insert_ghost(&shape, Vec3::zeros(), CollisionFilter::character());
        world.insert_static(
            &WorldStaticDef::cuboid(0, Vec3::repeat(0.5), Vec3::new(3.0, 0.0, 0.0))
                .with_filter(debris_only()),
        );

        let filter = ghost.sweep_filter(SweepMode::World);
        let result = world.convex_sweep_test(
            &shape,
            &iso_at(Vec3::zeros()),
            &iso_at(Vec3::new(4.0, 0.0, 0.0)),
            0.0,
            &filter,
        );
        assert!(!result.has_hit());
        assert_eq!(result.closest_hit_fraction, 1.0);
    }

    #[test]
    fn sweep_predicate_rejects_objects() {
        let mut world = KinematicWorld::new();
        let shape = ball_shape(0.5);
        let ghost = world.insert_ghost(&shape, Vec3::zeros(), CollisionFilter::character());
        let near = world.insert_static(&WorldStaticDef::cuboid(
            0,
            Vec3::repeat(0.5),
            Vec3::new(2.0, 0.0, 0.0),
        ));
        let far = world.insert_static(&WorldStaticDef::cuboid(
            1,
            Vec3::repeat(0.5),
            Vec3::new(4.0, 0.0, 0.0),
        ));

        let (from, to) = (Vec3::zeros(), Vec3::new(5.0, 0.0, 0.0));
        let unfiltered = ghost.sweep_filter(SweepMode::World);
        let result = sweep(&world, &shape, from, to, &unfiltered);
        assert_eq!(result.hit.map(|h| h.object), Some(near));

        let not_near = |object: ColliderHandle| object != near;
        let filter = ghost.sweep_filter(SweepMode::World).predicate(&not_near);
        let result = sweep(&world, &shape, from, to, &filter);
        assert_eq!(result.hit.map(|h| h.object), Some(far));
        // Contact when the ball's front reaches x = 3.5.
        assert_relative_eq!(result.closest_hit_fraction, 0.6, epsilon = 1.0e-4);

        let reject_all = |_: ColliderHandle| false;
        let filter = ghost.sweep_filter(SweepMode::World).predicate(&reject_all);
        assert!(!sweep(&world, &shape, from, to, &filter).has_hit());
    }

    #[test]
    fn resting_contact_does_not_hide_obstacles_behind_it() {
        let mut world = flat_ground();
        let wall = world.insert_static(&WorldStaticDef::cuboid(
            1,
            Vec3::new(0.5, 2.0, 5.0),
            Vec3::new(3.0, 2.0, 0.0),
        ));
        let shape = ball_shape(0.5);
        let ghost =
            world.insert_ghost(&shape, Vec3::new(0.0, 0.49, 0.0), CollisionFilter::character());

        // Starts 0.01 into the floor; the sweep along it stops at the wall.
        let filter = ghost.sweep_filter(SweepMode::World);
        let result = sweep(
            &world,
            &shape,
            Vec3::new(0.0, 0.49, 0.0),
            Vec3::new(4.0, 0.49, 0.0),
            &filter,
        );
        assert_eq!(result.hit.map(|h| h.object), Some(wall));
        assert_relative_eq!(result.closest_hit_fraction, 0.5, epsilon = 1.0e-4);
    }

    #[test]
    fn sweep_onto_large_slab_reports_exact_contact() {
        let mut world = KinematicWorld::build(vec![WorldStaticDef::cuboid(
            0,
            Vec3::new(200.0, 0.5, 200.0),
            Vec3::new(0.0, -0.5, 0.0),
        )]);
        let shape = ball_shape(0.5);
        let ghost =
            world.insert_ghost(&shape, Vec3::new(0.0, 1.5, 0.0), CollisionFilter::character());

        let filter = ghost.sweep_filter(SweepMode::World);
        let result = sweep(
            &world,
            &shape,
            Vec3::new(7.0, 1.5, -3.0),
            Vec3::new(7.0, -0.5, -3.0),
            &filter,
        );
        assert!(result.has_hit());
        assert_relative_eq!(result.closest_hit_fraction, 0.5, epsilon = 1.0e-4);
    }

    #[test]
    fn ghost_pair_sweep_only_sees_cached_overlaps() {
        let mut world = flat_ground();
        let wall = world.insert_static(&WorldStaticDef::cuboid(
            5,
            Vec3::new(0.5, 2.0, 5.0),
            Vec3::new(3.0, 2.0, 0.0),
        ));
        let shape = ball_shape(0.5);
        let mut ghost =
            world.insert_ghost(&shape, Vec3::new(0.0, 1.0, 0.0), CollisionFilter::character());
        world.dispatch_all_collision_pairs(&mut ghost, &shape);
        assert!(!ghost.is_overlapping(wall));

        let from = iso_at(Vec3::new(0.0, 1.0, 0.0));
        let to = iso_at(Vec3::new(4.0, 1.0, 0.0));

        let world_filter = ghost.sweep_filter(SweepMode::World);
        assert!(world.convex_sweep_test(&shape, &from, &to, 0.0, &world_filter).has_hit());

        let pair_filter = ghost.sweep_filter(SweepMode::GhostPairs);
        assert!(!world.convex_sweep_test(&shape, &from, &to, 0.0, &pair_filter).has_hit());
    }

    #[test]
    fn ray_test_skips_excluded_object() {
        let mut world = flat_ground();
        let shape = ConvexShape::new(ConvexShapeDef::CapsuleY {
            radius: 0.3,
            half_height: 0.6,
        })
        .unwrap();
        let ghost =
            world.insert_ghost(&shape, Vec3::new(0.0, 0.9, 0.0), CollisionFilter::character());

        let filter = ghost.sweep_filter(SweepMode::World);
        let hit = world
            .ray_test(Point3::new(0.0, 0.9, 0.0), Point3::new(0.0, -1.1, 0.0), &filter)
            .expect("ground below");

        assert_ne!(hit.object, ghost.handle());
        assert_relative_eq!(hit.fraction, 0.45, epsilon = 1.0e-4);
        assert_relative_eq!(hit.normal.y, 1.0, epsilon = 1.0e-4);
    }
}
