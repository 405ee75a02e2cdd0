//! Domain queries layered on the ring search core
//!
//! Each query is a predicate over the generic nearest/collect/count walk.
//! None of them fail: no match is `None`, an empty collection or zero, and
//! invalid team ids never satisfy a team predicate.

use glam::IVec2;

use super::hostility::Hostility;
use super::ring_search::Nearest;
use super::SpatialIndex;
use crate::world::{
    chebyshev, KindSet, ObjectArena, ObjectId, ObjectKind, SpatialObject, TeamFilter, TeamId,
    UnitClass,
};

/// Both teams are real teams and the relation calls them hostile
#[inline]
pub(crate) fn is_enemy<H>(team: TeamId, other: TeamId, hostility: &H) -> bool
where
    H: Hostility + ?Sized,
{
    team.is_valid() && other.is_valid() && team != other && hostility.is_hostile(team, other)
}

/// Same team, or a real team the relation does not call hostile
#[inline]
pub(crate) fn is_ally<H>(team: TeamId, other: TeamId, hostility: &H) -> bool
where
    H: Hostility + ?Sized,
{
    team.is_valid() && other.is_valid() && (team == other || !hostility.is_hostile(team, other))
}

impl SpatialIndex {
    pub fn find_nearest_of_kind(
        &self,
        objects: &ObjectArena,
        point: IVec2,
        kind: ObjectKind,
        max_dist: i32,
    ) -> Option<Nearest> {
        self.find_nearest_matching(objects, point, max_dist, kind.into(), |_, _| true)
    }

    pub fn find_nearest_of_kind_set(
        &self,
        objects: &ObjectArena,
        point: IVec2,
        kinds: KindSet,
        max_dist: i32,
    ) -> Option<Nearest> {
        self.find_nearest_matching(objects, point, max_dist, kinds, |_, _| true)
    }

    /// Nearest agent on `team`. The querying agent itself qualifies; exclude
    /// it with `find_nearest_matching` when that matters.
    pub fn find_nearest_friendly_agent(
        &self,
        objects: &ObjectArena,
        point: IVec2,
        team: TeamId,
        max_dist: i32,
    ) -> Option<Nearest> {
        if !team.is_valid() {
            return None;
        }
        self.find_nearest_matching(objects, point, max_dist, KindSet::AGENTS, |_, object| {
            object.team == team
        })
    }

    pub fn find_nearest_enemy_agent<H: Hostility + ?Sized>(
        &self,
        objects: &ObjectArena,
        point: IVec2,
        team: TeamId,
        max_dist: i32,
        hostility: &H,
    ) -> Option<Nearest> {
        self.find_nearest_matching(objects, point, max_dist, KindSet::AGENTS, |_, object| {
            is_enemy(team, object.team, hostility)
        })
    }

    /// Nearest enemy agent no closer than `min_range` and no farther than
    /// `max_range`. Enemies inside `min_range` are ignored even when they are
    /// the closest overall.
    pub fn find_nearest_enemy_in_range_band<H: Hostility + ?Sized>(
        &self,
        objects: &ObjectArena,
        point: IVec2,
        team: TeamId,
        min_range: i32,
        max_range: i32,
        hostility: &H,
    ) -> Option<Nearest> {
        if min_range > max_range {
            return None;
        }
        self.find_nearest_matching(objects, point, max_range, KindSet::AGENTS, |_, object| {
            chebyshev(point, object.pos) >= min_range && is_enemy(team, object.team, hostility)
        })
    }

    /// Nearest hostile building; neutral structures never count
    pub fn find_nearest_enemy_building<H: Hostility + ?Sized>(
        &self,
        objects: &ObjectArena,
        point: IVec2,
        team: TeamId,
        max_dist: i32,
        hostility: &H,
    ) -> Option<Nearest> {
        self.find_nearest_matching(objects, point, max_dist, KindSet::BUILDINGS, |_, object| {
            !object.team.is_neutral() && is_enemy(team, object.team, hostility)
        })
    }

    /// Closer of the nearest enemy agent and nearest enemy building.
    /// An agent wins a tie.
    ///
    /// Pass `i32::MAX` as `max_dist` for an unbounded search: a validated
    /// config guarantees the walk then reaches every cell of the grid.
    pub fn find_nearest_enemy_presence<H: Hostility + ?Sized>(
        &self,
        objects: &ObjectArena,
        point: IVec2,
        team: TeamId,
        max_dist: i32,
        hostility: &H,
    ) -> Option<Nearest> {
        let agent = self.find_nearest_enemy_agent(objects, point, team, max_dist, hostility);
        let building = self.find_nearest_enemy_building(objects, point, team, max_dist, hostility);
        match (agent, building) {
            (Some(a), Some(b)) if b.distance < a.distance => Some(b),
            (Some(a), _) => Some(a),
            (None, b) => b,
        }
    }

    /// Append every `kind` object within `max_range` to `out`
    pub fn collect_in_range(
        &self,
        objects: &ObjectArena,
        point: IVec2,
        kind: ObjectKind,
        max_range: i32,
        out: &mut Vec<ObjectId>,
    ) -> usize {
        self.collect_matching(objects, point, max_range, kind.into(), out, |_, _| true)
    }

    /// Append agents of any class in `classes` within `max_range`.
    /// `TeamFilter::Any` ignores team membership.
    pub fn collect_agents_by_class_in_range(
        &self,
        objects: &ObjectArena,
        point: IVec2,
        team: TeamFilter,
        classes: &[UnitClass],
        max_range: i32,
        out: &mut Vec<ObjectId>,
    ) -> usize {
        if classes.is_empty() {
            return 0;
        }
        self.collect_matching(objects, point, max_range, KindSet::AGENTS, out, |_, object| {
            team.accepts(object.team)
                && object
                    .unit_class
                    .is_some_and(|class| classes.contains(&class))
        })
    }

    pub fn collect_enemies_in_range<H: Hostility + ?Sized>(
        &self,
        objects: &ObjectArena,
        point: IVec2,
        team: TeamId,
        max_range: i32,
        hostility: &H,
        out: &mut Vec<ObjectId>,
    ) -> usize {
        self.collect_matching(objects, point, max_range, KindSet::AGENTS, out, |_, object| {
            is_enemy(team, object.team, hostility)
        })
    }

    /// Agents on `team` or on teams the relation does not call hostile
    pub fn collect_allies_in_range<H: Hostility + ?Sized>(
        &self,
        objects: &ObjectArena,
        point: IVec2,
        team: TeamId,
        max_range: i32,
        hostility: &H,
        out: &mut Vec<ObjectId>,
    ) -> usize {
        self.collect_matching(objects, point, max_range, KindSet::AGENTS, out, |_, object| {
            is_ally(team, object.team, hostility)
        })
    }

    /// Count `kind` objects within `max_range` that also satisfy `extra`,
    /// e.g. `|o| !o.claimed`
    pub fn count_matching_in_range<P>(
        &self,
        objects: &ObjectArena,
        point: IVec2,
        kind: ObjectKind,
        max_range: i32,
        extra: P,
    ) -> usize
    where
        P: Fn(&SpatialObject) -> bool,
    {
        self.count_matching(objects, point, max_range, kind.into(), |_, object| extra(object))
    }
}
