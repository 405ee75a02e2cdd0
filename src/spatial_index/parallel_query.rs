use glam::IVec2;
use rayon::prelude::*;

use super::hostility::Hostility;
use super::ring_search::Nearest;
use super::SpatialIndex;
use crate::error::SpatialResult;
use crate::world::{KindSet, ObjectArena, TeamId};

/// Predicate carried by a batched nearest query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFilter {
    Kinds(KindSet),
    FriendlyAgent(TeamId),
    EnemyAgent(TeamId),
    EnemyBuilding(TeamId),
    EnemyPresence(TeamId),
    EnemyInRangeBand { team: TeamId, min_range: i32 },
}

/// One nearest-style query of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearestRequest {
    pub origin: IVec2,
    pub max_dist: i32,
    pub filter: QueryFilter,
}

impl NearestRequest {
    pub fn new(origin: IVec2, max_dist: i32, filter: QueryFilter) -> Self {
        Self { origin, max_dist, filter }
    }
}

/// Executes read-only spatial queries in parallel
///
/// Every batch borrows the index and arena immutably, so all maintenance for
/// the step has to finish before a batch starts.
pub struct ParallelQueryExecutor {
    thread_pool: rayon::ThreadPool,
}

impl ParallelQueryExecutor {
    /// Create a pool with `num_threads` workers; 0 lets rayon choose
    pub fn new(num_threads: usize) -> SpatialResult<Self> {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("spatial-query-{}", i))
            .build()?;

        log::debug!(
            "Spatial query pool started with {} threads",
            thread_pool.current_num_threads()
        );
        Ok(Self { thread_pool })
    }

    pub fn thread_count(&self) -> usize {
        self.thread_pool.current_num_threads()
    }

    /// Run every request, returning results in request order
    pub fn execute_batch<H>(
        &self,
        index: &SpatialIndex,
        objects: &ObjectArena,
        requests: &[NearestRequest],
        hostility: &H,
    ) -> Vec<Option<Nearest>>
    where
        H: Hostility + Sync + ?Sized,
    {
        self.thread_pool.install(|| {
            requests
                .par_iter()
                .map(|request| execute_single(index, objects, request, hostility))
                .collect()
        })
    }

    /// Count `kinds` objects within `max_dist` of each origin
    pub fn count_batch(
        &self,
        index: &SpatialIndex,
        objects: &ObjectArena,
        origins: &[IVec2],
        max_dist: i32,
        kinds: KindSet,
    ) -> Vec<usize> {
        self.thread_pool.install(|| {
            origins
                .par_iter()
                .map(|&origin| index.count_matching(objects, origin, max_dist, kinds, |_, _| true))
                .collect()
        })
    }
}

/// Run one request on the calling thread
pub(crate) fn execute_single<H>(
    index: &SpatialIndex,
    objects: &ObjectArena,
    request: &NearestRequest,
    hostility: &H,
) -> Option<Nearest>
where
    H: Hostility + ?Sized,
{
    let NearestRequest { origin, max_dist, filter } = *request;
    match filter {
        QueryFilter::Kinds(kinds) => {
            index.find_nearest_of_kind_set(objects, origin, kinds, max_dist)
        }
        QueryFilter::FriendlyAgent(team) => {
            index.find_nearest_friendly_agent(objects, origin, team, max_dist)
        }
        QueryFilter::EnemyAgent(team) => {
            index.find_nearest_enemy_agent(objects, origin, team, max_dist, hostility)
        }
        QueryFilter::EnemyBuilding(team) => {
            index.find_nearest_enemy_building(objects, origin, team, max_dist, hostility)
        }
        QueryFilter::EnemyPresence(team) => {
            index.find_nearest_enemy_presence(objects, origin, team, max_dist, hostility)
        }
        QueryFilter::EnemyInRangeBand { team, min_range } => {
            index.find_nearest_enemy_in_range_band(
                objects, origin, team, min_range, max_dist, hostility,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial_index::{DistinctTeams, SpatialIndexConfig};
    use crate::world::{ObjectKind, SpatialObject, UnitClass};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn populated() -> (ObjectArena, SpatialIndex) {
        let mut rng = StdRng::seed_from_u64(7);
        let mut arena = ObjectArena::new();
        for _ in 0..300 {
            let pos = IVec2::new(rng.gen_range(0..256), rng.gen_range(0..256));
            let object = match rng.gen_range(0..3) {
                0 => SpatialObject::resource(ObjectKind::Tree, pos),
                1 => SpatialObject::building(ObjectKind::House, pos, TeamId(rng.gen_range(-1..3))),
                _ => SpatialObject::agent(UnitClass::Archer, pos, TeamId(rng.gen_range(0..3))),
            };
            arena.spawn(object);
        }
        let index =
            SpatialIndex::build(SpatialIndexConfig::default(), &arena).expect("valid config");
        (arena, index)
    }

    #[test]
    fn test_batch_matches_sequential() {
        let (arena, index) = populated();
        let mut rng = StdRng::seed_from_u64(11);
        let requests: Vec<_> = (0..64)
            .map(|i| {
                let origin = IVec2::new(rng.gen_range(0..256), rng.gen_range(0..256));
                let team = TeamId(i % 3);
                let filter = match i % 6 {
                    0 => QueryFilter::Kinds(KindSet::RESOURCES),
                    1 => QueryFilter::FriendlyAgent(team),
                    2 => QueryFilter::EnemyAgent(team),
                    3 => QueryFilter::EnemyBuilding(team),
                    4 => QueryFilter::EnemyPresence(team),
                    _ => QueryFilter::EnemyInRangeBand { team, min_range: 4 },
                };
                NearestRequest::new(origin, rng.gen_range(0..120), filter)
            })
            .collect();

        let executor = ParallelQueryExecutor::new(4).expect("pool");
        assert_eq!(executor.thread_count(), 4);
        let parallel = executor.execute_batch(&index, &arena, &requests, &DistinctTeams);
        let sequential: Vec<_> = requests
            .iter()
            .map(|r| execute_single(&index, &arena, r, &DistinctTeams))
            .collect();
        assert_eq!(parallel, sequential);
        assert!(parallel.iter().any(Option::is_some));
    }

    #[test]
    fn test_count_batch_matches_sequential() {
        let (arena, index) = populated();
        let origins: Vec<_> = (0..16).map(|i| IVec2::new(i * 16, 255 - i * 16)).collect();

        let executor = ParallelQueryExecutor::new(2).expect("pool");
        let counts = executor.count_batch(&index, &arena, &origins, 40, KindSet::ALL);
        for (origin, count) in origins.iter().zip(counts) {
            assert_eq!(count, index.count_matching(&arena, *origin, 40, KindSet::ALL, |_, _| true));
        }
    }
}
