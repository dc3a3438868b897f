use rapier3d::prelude::ColliderHandle;

use super::{
    filter::CollisionFilter,
    query::SweepFilter,
    types::{ContactManifold, OverlappingPair},
};

/// Which objects the controller's sweeps test against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SweepMode {
    /// Every collider in the world that passes the filter.
    #[default]
    World,
    /// Only the objects in the ghost's overlap pair cache from the last dispatch.
    /// Cheaper, but misses anything the pair cache did not pick up.
    GhostPairs,
}

/// The controller's proxy in the collision world.
///
/// A ghost is a collider that reports overlaps but is never moved by a
/// simulation pipeline. Its pose lives in the world; this handle carries the
/// broad-phase filter and the overlap pair cache filled by
/// [`dispatch_all_collision_pairs`].
///
/// [`dispatch_all_collision_pairs`]: super::query::CollisionWorld::dispatch_all_collision_pairs
#[derive(Clone, Debug)]
pub struct GhostObject {
    handle: ColliderHandle,
    filter: CollisionFilter,
    pairs: Vec<OverlappingPair>,
}

impl GhostObject {
    pub fn new(handle: ColliderHandle, filter: CollisionFilter) -> Self {
        Self {
            handle,
            filter,
            pairs: Vec::new(),
        }
    }

    #[inline]
    pub fn handle(&self) -> ColliderHandle {
        self.handle
    }

    #[inline]
    pub fn collision_filter(&self) -> CollisionFilter {
        self.filter
    }

    pub fn set_collision_filter(&mut self, filter: CollisionFilter) {
        self.filter = filter;
    }

    #[inline]
    pub fn overlapping_pairs(&self) -> &[OverlappingPair] {
        &self.pairs
    }

    #[inline]
    pub fn num_overlapping_pairs(&self) -> usize {
        self.pairs.len()
    }

    /// Replace the pair cache. Called by the world when dispatching.
    pub fn set_overlapping_pairs(&mut self, pairs: Vec<OverlappingPair>) {
        self.pairs = pairs;
    }

    /// True if `object` was in the pair cache on the last dispatch.
    pub fn is_overlapping(&self, object: ColliderHandle) -> bool {
        self.pairs.iter().any(|pair| pair.other(self.handle) == object)
    }

    /// All manifolds of all cached pairs.
    pub fn manifolds(&self) -> impl Iterator<Item = &ContactManifold> {
        self.pairs.iter().flat_map(|pair| pair.manifolds.iter())
    }

    /// Filter for queries issued on behalf of this ghost: never reports the
    /// ghost itself and uses its group/mask.
    pub fn sweep_filter(&self, mode: SweepMode) -> SweepFilter<'_> {
        let filter = SweepFilter::new(self.filter).exclude_object(self.handle);
        match mode {
            SweepMode::World => filter,
            SweepMode::GhostPairs => filter.restrict_to_overlaps(self),
        }
    }
}
