//! Ordered priority search
//!
//! A `PriorityTargets` list is walked in order; the first rule with any match
//! inside the range wins, even if a later rule has a closer one.

use std::fmt;

use glam::IVec2;

use super::hostility::Hostility;
use super::queries::is_enemy;
use super::ring_search::Nearest;
use super::SpatialIndex;
use crate::world::{KindSet, ObjectArena, SpatialObject, TeamId, UnitClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetCategory {
    /// Scarce targets worth chasing first
    HighValue,
    /// Targets that fight back
    Combat,
    Fallback,
}

type RulePredicate = Box<dyn Fn(&SpatialObject) -> bool + Send + Sync>;

/// One entry of a priority list
pub struct PriorityRule {
    pub category: TargetCategory,
    pub kinds: KindSet,
    predicate: RulePredicate,
}

impl PriorityRule {
    pub fn new<P>(category: TargetCategory, kinds: KindSet, predicate: P) -> Self
    where
        P: Fn(&SpatialObject) -> bool + Send + Sync + 'static,
    {
        Self {
            category,
            kinds,
            predicate: Box::new(predicate),
        }
    }

    pub fn matches(&self, object: &SpatialObject) -> bool {
        self.kinds.contains(object.kind) && (self.predicate)(object)
    }
}

impl fmt::Debug for PriorityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityRule")
            .field("category", &self.category)
            .field("kinds", &self.kinds)
            .finish_non_exhaustive()
    }
}

/// Rules evaluated in insertion order
#[derive(Debug, Default)]
pub struct PriorityTargets {
    rules: Vec<PriorityRule>,
}

impl PriorityTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule<P>(mut self, category: TargetCategory, kinds: KindSet, predicate: P) -> Self
    where
        P: Fn(&SpatialObject) -> bool + Send + Sync + 'static,
    {
        self.rules.push(PriorityRule::new(category, kinds, predicate));
        self
    }

    /// Enemy agents of `team`: kings, then combat units, then anything else
    pub fn enemy_agents<H>(team: TeamId, hostility: H) -> Self
    where
        H: Hostility + Clone + Send + Sync + 'static,
    {
        let king_hostility = hostility.clone();
        let combat_hostility = hostility.clone();
        Self::new()
            .with_rule(TargetCategory::HighValue, KindSet::AGENTS, move |o| {
                o.unit_class == Some(UnitClass::King) && is_enemy(team, o.team, &king_hostility)
            })
            .with_rule(TargetCategory::Combat, KindSet::AGENTS, move |o| {
                o.is_combat_agent() && is_enemy(team, o.team, &combat_hostility)
            })
            .with_rule(TargetCategory::Fallback, KindSet::AGENTS, move |o| {
                is_enemy(team, o.team, &hostility)
            })
    }

    pub fn rules(&self) -> &[PriorityRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityMatch {
    pub category: TargetCategory,
    pub nearest: Nearest,
}

impl SpatialIndex {
    /// Nearest match of the first rule in `targets` that has one within `max_range`
    pub fn find_nearest_priority_target(
        &self,
        objects: &ObjectArena,
        point: IVec2,
        max_range: i32,
        targets: &PriorityTargets,
    ) -> Option<PriorityMatch> {
        targets.rules().iter().find_map(|rule| {
            self.find_nearest_matching(objects, point, max_range, rule.kinds, |_, object| {
                rule.matches(object)
            })
            .map(|nearest| PriorityMatch {
                category: rule.category,
                nearest,
            })
        })
    }
}
