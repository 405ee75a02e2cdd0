//! Uniform-grid spatial index for large agent simulations
//!
//! Objects live in an [`ObjectArena`]; the [`SpatialIndex`] is a rebuildable
//! view over it that answers nearest, in-range and counting queries under the
//! Chebyshev metric.

pub mod constants;
pub mod error;
pub mod spatial_index;
pub mod world;

pub use error::{SpatialError, SpatialResult};
pub use spatial_index::{
    AllianceTable, DistinctTeams, Drift, Hostility, Nearest, NearestRequest,
    ParallelQueryExecutor, PriorityTargets, QueryFilter, SpatialIndex, SpatialIndexConfig,
    SpatialIndexStats, TargetCategory,
};
pub use world::{
    chebyshev, KindSet, ObjectArena, ObjectId, ObjectKind, SpatialObject, TeamFilter, TeamId,
    UnitClass,
};
