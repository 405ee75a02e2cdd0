use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::constants::teams::NEUTRAL_TEAM;

/// Category tag of every indexable object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    // Resource nodes
    Tree,
    Wheat,
    Stone,
    Gold,
    Fish,
    Relic,
    // Buildings
    Altar,
    TownCenter,
    House,
    Mill,
    Barracks,
    ArcheryRange,
    Stable,
    Tower,
    Wall,
    // Agents
    Agent,
    // Leftovers
    Corpse,
}

impl ObjectKind {
    pub const COUNT: usize = 17;

    pub const ALL: [ObjectKind; Self::COUNT] = [
        ObjectKind::Tree,
        ObjectKind::Wheat,
        ObjectKind::Stone,
        ObjectKind::Gold,
        ObjectKind::Fish,
        ObjectKind::Relic,
        ObjectKind::Altar,
        ObjectKind::TownCenter,
        ObjectKind::House,
        ObjectKind::Mill,
        ObjectKind::Barracks,
        ObjectKind::ArcheryRange,
        ObjectKind::Stable,
        ObjectKind::Tower,
        ObjectKind::Wall,
        ObjectKind::Agent,
        ObjectKind::Corpse,
    ];

    /// Dense index used to address per-kind buckets
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_resource(self) -> bool {
        matches!(
            self,
            ObjectKind::Tree
                | ObjectKind::Wheat
                | ObjectKind::Stone
                | ObjectKind::Gold
                | ObjectKind::Fish
                | ObjectKind::Relic
        )
    }

    pub fn is_building(self) -> bool {
        matches!(
            self,
            ObjectKind::Altar
                | ObjectKind::TownCenter
                | ObjectKind::House
                | ObjectKind::Mill
                | ObjectKind::Barracks
                | ObjectKind::ArcheryRange
                | ObjectKind::Stable
                | ObjectKind::Tower
                | ObjectKind::Wall
        )
    }

    pub fn is_agent(self) -> bool {
        self == ObjectKind::Agent
    }
}

/// A set of object kinds packed into a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KindSet(u32);

impl KindSet {
    pub const EMPTY: KindSet = KindSet(0);
    pub const ALL: KindSet = KindSet((1 << ObjectKind::COUNT) - 1);
    pub const AGENTS: KindSet = KindSet(1 << ObjectKind::Agent as u32);
    pub const RESOURCES: KindSet = KindSet(
        1 << ObjectKind::Tree as u32
            | 1 << ObjectKind::Wheat as u32
            | 1 << ObjectKind::Stone as u32
            | 1 << ObjectKind::Gold as u32
            | 1 << ObjectKind::Fish as u32
            | 1 << ObjectKind::Relic as u32,
    );
    pub const BUILDINGS: KindSet = KindSet(
        1 << ObjectKind::Altar as u32
            | 1 << ObjectKind::TownCenter as u32
            | 1 << ObjectKind::House as u32
            | 1 << ObjectKind::Mill as u32
            | 1 << ObjectKind::Barracks as u32
            | 1 << ObjectKind::ArcheryRange as u32
            | 1 << ObjectKind::Stable as u32
            | 1 << ObjectKind::Tower as u32
            | 1 << ObjectKind::Wall as u32,
    );

    pub const fn single(kind: ObjectKind) -> Self {
        KindSet(1 << kind as u32)
    }

    pub fn with(self, kind: ObjectKind) -> Self {
        KindSet(self.0 | 1 << kind.index())
    }

    pub fn union(self, other: KindSet) -> Self {
        KindSet(self.0 | other.0)
    }

    #[inline]
    pub fn contains(self, kind: ObjectKind) -> bool {
        self.0 & (1 << kind.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Kinds in the set, in declaration order
    pub fn iter(self) -> impl Iterator<Item = ObjectKind> {
        ObjectKind::ALL.into_iter().filter(move |&kind| self.contains(kind))
    }
}

impl From<ObjectKind> for KindSet {
    fn from(kind: ObjectKind) -> Self {
        KindSet::single(kind)
    }
}

impl FromIterator<ObjectKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = ObjectKind>>(iter: I) -> Self {
        iter.into_iter().fold(KindSet::EMPTY, KindSet::with)
    }
}

/// Agent subclass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitClass {
    Villager,
    ManAtArms,
    Archer,
    Scout,
    Knight,
    Monk,
    BatteringRam,
    Mangonel,
    King,
}

impl UnitClass {
    /// Whether the class fights back when attacked
    pub fn is_combat(self) -> bool {
        !matches!(self, UnitClass::Villager | UnitClass::Monk)
    }
}

/// Team affiliation. Negative ids are never a valid team; `NEUTRAL` is the
/// reserved "owned by nobody" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub i32);

impl TeamId {
    pub const NEUTRAL: TeamId = TeamId(NEUTRAL_TEAM);

    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }

    #[inline]
    pub fn is_neutral(self) -> bool {
        self == Self::NEUTRAL
    }
}

impl Default for TeamId {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Team parameter that may be a wildcard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamFilter {
    Any,
    Team(TeamId),
}

impl TeamFilter {
    pub fn accepts(self, team: TeamId) -> bool {
        match self {
            TeamFilter::Any => true,
            TeamFilter::Team(wanted) => wanted.is_valid() && wanted == team,
        }
    }
}

impl From<TeamId> for TeamFilter {
    fn from(team: TeamId) -> Self {
        TeamFilter::Team(team)
    }
}

/// Anything the spatial index can locate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialObject {
    pub pos: IVec2,
    pub kind: ObjectKind,
    pub team: TeamId,
    pub alive: bool,
    /// Set on resource nodes that a gatherer has reserved
    pub claimed: bool,
    pub unit_class: Option<UnitClass>,
}

impl SpatialObject {
    pub fn new(kind: ObjectKind, pos: IVec2, team: TeamId) -> Self {
        Self {
            pos,
            kind,
            team,
            alive: true,
            claimed: false,
            unit_class: None,
        }
    }

    /// Neutral resource node
    pub fn resource(kind: ObjectKind, pos: IVec2) -> Self {
        Self::new(kind, pos, TeamId::NEUTRAL)
    }

    pub fn building(kind: ObjectKind, pos: IVec2, team: TeamId) -> Self {
        Self::new(kind, pos, team)
    }

    pub fn agent(class: UnitClass, pos: IVec2, team: TeamId) -> Self {
        Self {
            unit_class: Some(class),
            ..Self::new(ObjectKind::Agent, pos, team)
        }
    }

    pub fn with_claimed(mut self, claimed: bool) -> Self {
        self.claimed = claimed;
        self
    }

    pub fn is_combat_agent(&self) -> bool {
        self.kind.is_agent() && self.unit_class.is_some_and(UnitClass::is_combat)
    }
}

/// Chebyshev ("king move") distance, saturating at `i32::MAX`
#[inline]
pub fn chebyshev(a: IVec2, b: IVec2) -> i32 {
    let d = a.x.abs_diff(b.x).max(a.y.abs_diff(b.y));
    d.min(i32::MAX as u32) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_count_matches_all() {
        assert_eq!(ObjectKind::ALL.len(), ObjectKind::COUNT);
        for (i, kind) in ObjectKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_kind_categories_are_disjoint() {
        for kind in ObjectKind::ALL {
            let categories = [kind.is_resource(), kind.is_building(), kind.is_agent()];
            assert!(categories.iter().filter(|&&c| c).count() <= 1, "{:?}", kind);
            assert_eq!(KindSet::BUILDINGS.contains(kind), kind.is_building());
            assert_eq!(KindSet::RESOURCES.contains(kind), kind.is_resource());
            assert_eq!(KindSet::AGENTS.contains(kind), kind.is_agent());
        }
        assert!(!KindSet::ALL.union(KindSet::EMPTY).is_empty());
        assert_eq!(KindSet::ALL.iter().count(), ObjectKind::COUNT);
    }

    #[test]
    fn test_kind_set_collect() {
        let set: KindSet = [ObjectKind::Gold, ObjectKind::Stone].into_iter().collect();
        assert!(set.contains(ObjectKind::Gold));
        assert!(set.contains(ObjectKind::Stone));
        assert!(!set.contains(ObjectKind::Tree));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![ObjectKind::Stone, ObjectKind::Gold]);
    }

    #[test]
    fn test_team_filter() {
        assert!(TeamFilter::Any.accepts(TeamId::NEUTRAL));
        assert!(TeamFilter::Team(TeamId(2)).accepts(TeamId(2)));
        assert!(!TeamFilter::Team(TeamId(2)).accepts(TeamId(3)));
        // An invalid team never matches, even itself
        assert!(!TeamFilter::Team(TeamId(-5)).accepts(TeamId(-5)));
    }

    #[test]
    fn test_chebyshev() {
        assert_eq!(chebyshev(IVec2::new(0, 0), IVec2::new(3, -7)), 7);
        assert_eq!(chebyshev(IVec2::new(5, 5), IVec2::new(5, 5)), 0);
    }

    #[test]
    fn test_chebyshev_saturates_at_extremes() {
        let far_left = IVec2::new(i32::MIN, 0);
        assert_eq!(chebyshev(far_left, IVec2::new(10, 0)), i32::MAX);
        assert_eq!(chebyshev(IVec2::new(0, i32::MAX), IVec2::new(0, i32::MIN)), i32::MAX);
        assert_eq!(chebyshev(far_left, IVec2::new(-1, 0)), i32::MAX);
        assert_eq!(chebyshev(far_left, IVec2::new(i32::MIN + 3, 2)), 3);
    }
}
