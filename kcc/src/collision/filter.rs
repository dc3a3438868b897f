use num_traits::{One, PrimInt, Zero};
use rapier3d::prelude::{Group, InteractionGroups, InteractionTestMode};

/// Trait implemented by collision group enums.
///
/// The enum's discriminant (via `#[repr(u8)]`) determines the bit index.
/// The backing integer type is chosen via the associated `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// Combine a set of flags into their backing bits.
pub fn combine_bits<U: FlagBitmask + Copy>(flags: &[U]) -> U::Storage {
    flags
        .iter()
        .fold(U::Storage::zero(), |acc, flag| acc | flag.mask())
}

/// Broad-phase collision groups.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollisionGroup {
    Default = 0,
    Static = 1,
    Kinematic = 2,
    Debris = 3,
    Sensor = 4,
    Character = 5,
}

impl FlagBitmask for CollisionGroup {
    type Storage = u32;

    fn bit_index(&self) -> u8 {
        *self as u8
    }
}

/// Group/mask pair deciding which objects a query or pair generation sees.
///
/// Two filters interact when each one's group is accepted by the other's mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionFilter {
    /// Groups this object belongs to.
    pub group: u32,
    /// Groups this object collides with.
    pub mask: u32,
}

impl CollisionFilter {
    pub const ALL: u32 = u32::MAX;

    #[inline]
    pub const fn new(group: u32, mask: u32) -> Self {
        Self { group, mask }
    }

    pub fn from_groups(groups: &[CollisionGroup], mask: &[CollisionGroup]) -> Self {
        Self::new(combine_bits(groups), combine_bits(mask))
    }

    /// Immovable world geometry: collides with everything except other statics.
    pub fn static_geometry() -> Self {
        let group = CollisionGroup::Static.mask();
        Self::new(group, Self::ALL ^ group)
    }

    /// A character proxy: collides with static and default objects.
    pub fn character() -> Self {
        Self::from_groups(
            &[CollisionGroup::Character],
            &[CollisionGroup::Static, CollisionGroup::Default],
        )
    }

    #[inline]
    pub fn interacts_with(&self, other: &CollisionFilter) -> bool {
        (self.group & other.mask) != 0 && (other.group & self.mask) != 0
    }

    /// The rapier collision groups carrying this filter: `group` becomes the
    /// memberships and `mask` the filter, tested in both directions.
    #[inline]
    pub fn interaction_groups(&self) -> InteractionGroups {
        InteractionGroups::new(
            Group::from(self.group),
            Group::from(self.mask),
            InteractionTestMode::And,
        )
    }
}

impl From<InteractionGroups> for CollisionFilter {
    fn from(groups: InteractionGroups) -> Self {
        Self::new(groups.memberships.bits(), groups.filter.bits())
    }
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self::new(CollisionGroup::Default.mask(), Self::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_bits_follow_discriminants() {
        assert_eq!(CollisionGroup::Default.mask(), 1);
        assert_eq!(CollisionGroup::Static.mask(), 1 << 1);
        assert_eq!(CollisionGroup::Character.mask(), 1 << 5);
        assert_eq!(
            combine_bits(&[CollisionGroup::Static, CollisionGroup::Character]),
            (1 << 1) | (1 << 5)
        );
    }

    #[test]
    fn character_interacts_with_static_geometry() {
        let character = CollisionFilter::character();
        let statics = CollisionFilter::static_geometry();

        assert!(character.interacts_with(&statics));
        assert!(statics.interacts_with(&character));
    }

    #[test]
    fn statics_ignore_each_other() {
        let a = CollisionFilter::static_geometry();
        assert!(!a.interacts_with(&a));
    }

    #[test]
    fn characters_ignore_each_other_by_default() {
        // The character mask only lists Static and Default.
        let a = CollisionFilter::character();
        assert!(!a.interacts_with(&a));
    }

    #[test]
    fn default_filter_interacts_with_everything_that_accepts_default() {
        let d = CollisionFilter::default();
        assert!(d.interacts_with(&CollisionFilter::character()));
        assert!(d.interacts_with(&CollisionFilter::static_geometry()));
    }

    #[test]
    fn interaction_groups_agree_with_filters() {
        let character = CollisionFilter::character();
        let statics = CollisionFilter::static_geometry();
        let debris =
            CollisionFilter::from_groups(&[CollisionGroup::Debris], &[CollisionGroup::Debris]);

        let groups = character.interaction_groups();
        assert_eq!(groups.memberships, Group::GROUP_6);
        assert!(groups.test(statics.interaction_groups()));
        assert!(!groups.test(debris.interaction_groups()));
        assert!(!groups.test(groups));
    }

    #[test]
    fn filter_round_trips_through_collider_groups() {
        let filter = CollisionFilter::new(0x0000_00F0, 0xDEAD_BEEF);
        assert_eq!(CollisionFilter::from(filter.interaction_groups()), filter);
    }
}
