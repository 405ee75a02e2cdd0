/// Uniform-grid spatial index for nearest and in-range queries
///
/// This module provides the index the simulation queries every step:
/// - A fixed grid of square cells with per-kind buckets of object handles
/// - Precomputed distance and neighbor-offset tables
/// - An expanding-ring search core (nearest, collect, count)
/// - Domain queries layered on the core (kinds, teams, range bands, priorities)
/// - Batch execution of read-only queries on a worker pool
///
/// The index is a derived view of an `ObjectArena`. It owns no object state,
/// and `rebuild` recomputes it purely from the live objects' positions.

mod grid;
mod hostility;
mod lookup_tables;
mod parallel_query;
mod priority;
mod queries;
mod ring_search;

pub use grid::{CellCoord, GridStats};
pub use hostility::{AllianceTable, DistinctTeams, Hostility};
pub use lookup_tables::LookupTables;
pub use parallel_query::{NearestRequest, ParallelQueryExecutor, QueryFilter};
pub use priority::{PriorityMatch, PriorityRule, PriorityTargets, TargetCategory};
pub use ring_search::Nearest;

use std::path::Path;
use std::time::Instant;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{invalid_config, SpatialError, SpatialResult};
use crate::world::{ObjectArena, ObjectId, ObjectKind};
use grid::CellGrid;
use lookup_tables::ceil_div;

/// Largest distance the lookup table may be asked to cover
const MAX_DISTANCE_TABLE_CAP: i32 = 1 << 20;

/// Configuration for the spatial index, fixed at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialIndexConfig {
    /// World bounds in tiles; valid positions are `0..width` x `0..height`
    pub world_width: i32,
    pub world_height: i32,

    /// Side length of a grid cell in tiles
    pub cell_size: i32,

    /// Rings up to this radius use precomputed offset tables
    pub max_precomputed_radius: u32,

    /// Largest distance with its own distance-to-radius entry. Must cover
    /// the largest world dimension; defaults to exactly that.
    pub distance_table_cap: Option<i32>,
}

impl Default for SpatialIndexConfig {
    fn default() -> Self {
        Self::for_world(constants::world::WORLD_WIDTH, constants::world::WORLD_HEIGHT)
    }
}

impl SpatialIndexConfig {
    /// Default grid settings for a world of the given size
    pub fn for_world(world_width: i32, world_height: i32) -> Self {
        Self {
            world_width,
            world_height,
            cell_size: constants::grid::CELL_SIZE,
            max_precomputed_radius: constants::grid::MAX_PRECOMPUTED_RADIUS,
            distance_table_cap: None,
        }
    }

    pub fn from_toml_str(source: &str) -> SpatialResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> SpatialResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| SpatialError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> SpatialResult<()> {
        if self.world_width <= 0 {
            return Err(invalid_config(
                "world_width",
                format!("must be positive, got {}", self.world_width),
            ));
        }
        if self.world_height <= 0 {
            return Err(invalid_config(
                "world_height",
                format!("must be positive, got {}", self.world_height),
            ));
        }
        let largest = self.world_width.max(self.world_height);
        if self.cell_size <= 0 {
            return Err(invalid_config(
                "cell_size",
                format!("must be positive, got {}", self.cell_size),
            ));
        }
        if self.cell_size > largest {
            return Err(invalid_config(
                "cell_size",
                format!(
                    "must not exceed the largest world dimension {}, got {}",
                    largest, self.cell_size
                ),
            ));
        }
        if self.max_precomputed_radius > constants::grid::PRECOMPUTED_RADIUS_LIMIT {
            return Err(invalid_config(
                "max_precomputed_radius",
                format!(
                    "must not exceed {}, got {}",
                    constants::grid::PRECOMPUTED_RADIUS_LIMIT,
                    self.max_precomputed_radius
                ),
            ));
        }
        let cap = self.distance_cap();
        if cap < largest {
            return Err(invalid_config(
                "distance_table_cap",
                format!("must cover the largest world dimension {}, got {}", largest, cap),
            ));
        }
        if cap > MAX_DISTANCE_TABLE_CAP {
            return Err(invalid_config(
                "distance_table_cap",
                format!("must not exceed {}, got {}", MAX_DISTANCE_TABLE_CAP, cap),
            ));
        }
        let cells = self.cells_x() as u64 * self.cells_y() as u64;
        if cells > constants::grid::MAX_CELLS as u64 {
            return Err(invalid_config(
                "cell_size",
                format!(
                    "gives {} cells, more than the limit of {}",
                    cells,
                    constants::grid::MAX_CELLS
                ),
            ));
        }
        Ok(())
    }

    /// Effective distance table cap
    pub fn distance_cap(&self) -> i32 {
        self.distance_table_cap
            .unwrap_or_else(|| self.world_width.max(self.world_height))
    }

    pub fn cells_x(&self) -> i32 {
        ceil_div(self.world_width, self.cell_size.max(1))
    }

    pub fn cells_y(&self) -> i32 {
        ceil_div(self.world_height, self.cell_size.max(1))
    }
}

/// Main spatial index structure
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    config: SpatialIndexConfig,
    tables: LookupTables,
    grid: CellGrid,
}

impl SpatialIndex {
    /// Create an empty index after validating `config`
    pub fn new(config: SpatialIndexConfig) -> SpatialResult<Self> {
        config.validate()?;

        let grid = CellGrid::new(config.world_width, config.world_height, config.cell_size);
        // Rings past the grid are never visited
        let radius = config.max_precomputed_radius.min(grid.max_ring());
        let tables = LookupTables::new(config.cell_size, radius, config.distance_cap());

        log::info!(
            "Spatial index: {}x{} world, {}x{} cells of {} tiles, offset tables up to radius {}",
            config.world_width,
            config.world_height,
            grid.cells_x(),
            grid.cells_y(),
            config.cell_size,
            radius,
        );

        Ok(Self { config, tables, grid })
    }

    /// Create an index and fill it from every live object in `objects`
    pub fn build(config: SpatialIndexConfig, objects: &ObjectArena) -> SpatialResult<Self> {
        let mut index = Self::new(config)?;
        index.rebuild(objects);
        Ok(index)
    }

    pub fn config(&self) -> &SpatialIndexConfig {
        &self.config
    }

    pub fn tables(&self) -> &LookupTables {
        &self.tables
    }

    /// Cell holding `pos`, clamped into the grid
    pub fn cell_coords(&self, pos: IVec2) -> CellCoord {
        self.grid.cell_coords(pos)
    }

    /// Index a live object. Unknown handles, dead objects and positions
    /// outside the world are skipped.
    pub fn insert(&mut self, objects: &ObjectArena, id: ObjectId) {
        let Some(object) = objects.get(id) else {
            return;
        };
        if !object.alive {
            return;
        }
        if !self.grid.in_world(object.pos) {
            log::trace!("Skipping out-of-bounds insert of {:?} at {}", id, object.pos);
            return;
        }
        let coord = self.grid.cell_coords(object.pos);
        self.grid.push(coord, object.kind, id);
    }

    /// Drop an object from the cell its current position maps to.
    /// Call before despawning it from the arena; absent entries are a no-op.
    pub fn remove(&mut self, objects: &ObjectArena, id: ObjectId) {
        let Some(object) = objects.get(id) else {
            return;
        };
        let coord = self.grid.cell_coords(object.pos);
        if !self.grid.take(coord, object.kind, id) {
            log::trace!("Remove of {:?} found no entry in cell {:?}", id, coord);
        }
    }

    /// Move an object's entry after its position changed from `old_pos`
    pub fn update(&mut self, objects: &ObjectArena, id: ObjectId, old_pos: IVec2) {
        let Some(object) = objects.get(id) else {
            return;
        };
        let was_indexed = self.grid.in_world(old_pos);
        let old_cell = self.grid.cell_coords(old_pos);
        let new_cell = self.grid.cell_coords(object.pos);

        if was_indexed && old_cell == new_cell && self.grid.in_world(object.pos) {
            return;
        }

        self.grid.take(old_cell, object.kind, id);
        self.insert(objects, id);
    }

    /// Clear every bucket and re-insert each live object
    pub fn rebuild(&mut self, objects: &ObjectArena) {
        let start = Instant::now();
        self.grid.clear();
        for (id, _) in objects.iter_live() {
            self.insert(objects, id);
        }
        log::debug!(
            "Rebuilt spatial index with {} entries in {:?}",
            self.grid.stats().total_entries,
            start.elapsed()
        );
    }

    /// Get statistics about the spatial index
    pub fn stats(&self) -> SpatialIndexStats {
        let grid = self.grid.stats();
        SpatialIndexStats {
            indexed_objects: grid.total_entries,
            grid,
        }
    }

    /// Compare the index against `objects` and report every inconsistency.
    ///
    /// An empty report means each live, in-bounds object is indexed exactly
    /// once in the cell its position maps to and nothing else is indexed.
    pub fn audit(&self, objects: &ObjectArena) -> Vec<Drift> {
        let mut seen = rustc_hash::FxHashMap::default();
        let mut drift = Vec::new();

        for (cell, kind, id) in self.grid.entries() {
            let Some(object) = objects.get(id).filter(|o| o.alive && o.kind == kind) else {
                drift.push(Drift::Stale { id, cell });
                continue;
            };
            *seen.entry(id).or_insert(0usize) += 1;
            let expected = self.grid.cell_coords(object.pos);
            if !self.grid.in_world(object.pos) || expected != cell {
                drift.push(Drift::Misplaced { id, indexed: cell, expected });
            }
        }

        for (id, object) in objects.iter_live() {
            match seen.get(&id).copied().unwrap_or(0) {
                0 if self.grid.in_world(object.pos) => drift.push(Drift::Missing { id }),
                0 | 1 => {}
                count => drift.push(Drift::Duplicate { id, count }),
            }
        }

        if !drift.is_empty() {
            log::warn!("Spatial index drifted: {} inconsistent entries", drift.len());
        }
        drift
    }
}

/// One disagreement between the index and the live objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drift {
    /// Indexed in a cell its position does not map to
    Misplaced { id: ObjectId, indexed: CellCoord, expected: CellCoord },
    /// Live and in bounds but not indexed
    Missing { id: ObjectId },
    /// Indexed but despawned, dead or re-kinded
    Stale { id: ObjectId, cell: CellCoord },
    /// Indexed more than once
    Duplicate { id: ObjectId, count: usize },
}

#[derive(Debug, Clone)]
pub struct SpatialIndexStats {
    pub indexed_objects: usize,
    pub grid: GridStats,
}

impl SpatialIndexStats {
    pub fn objects_of(&self, kind: ObjectKind) -> usize {
        self.grid.entries_of(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{SpatialObject, TeamId, UnitClass};

    fn config_200() -> SpatialIndexConfig {
        SpatialIndexConfig {
            cell_size: 16,
            ..SpatialIndexConfig::for_world(200, 200)
        }
    }

    fn tree(x: i32, y: i32) -> SpatialObject {
        SpatialObject::resource(ObjectKind::Tree, IVec2::new(x, y))
    }

    #[test]
    fn test_config_validation() {
        assert!(SpatialIndexConfig::default().validate().is_ok());

        let bad_cell = SpatialIndexConfig {
            cell_size: 0,
            ..config_200()
        };
        assert!(matches!(
            bad_cell.validate(),
            Err(SpatialError::InvalidConfig { field: "cell_size", .. })
        ));

        let bad_width = SpatialIndexConfig {
            world_width: -4,
            ..config_200()
        };
        assert!(SpatialIndex::new(bad_width).is_err());

        let short_cap = SpatialIndexConfig {
            distance_table_cap: Some(100),
            ..config_200()
        };
        assert!(matches!(
            short_cap.validate(),
            Err(SpatialError::InvalidConfig { field: "distance_table_cap", .. })
        ));
    }

    #[test]
    fn test_config_rejects_oversized_cells() {
        let huge = SpatialIndexConfig {
            cell_size: i32::MAX,
            ..config_200()
        };
        assert!(matches!(
            huge.validate(),
            Err(SpatialError::InvalidConfig { field: "cell_size", .. })
        ));
        assert!(SpatialIndex::new(huge).is_err());

        // One cell covering the whole world is fine
        let single = SpatialIndexConfig {
            cell_size: 200,
            ..config_200()
        };
        let index = SpatialIndex::new(single).expect("valid config");
        assert_eq!(index.stats().grid.total_cells, 1);
        assert_eq!(index.cell_coords(IVec2::new(199, 0)), CellCoord::new(0, 0));
    }

    #[test]
    fn test_config_rejects_too_many_cells() {
        let config = SpatialIndexConfig {
            cell_size: 1,
            ..SpatialIndexConfig::for_world(1 << 20, 1 << 20)
        };
        assert!(matches!(
            config.validate(),
            Err(SpatialError::InvalidConfig { field: "cell_size", .. })
        ));
    }

    #[test]
    fn test_config_bounds_precomputed_radius() {
        for radius in [u32::MAX / 2, constants::grid::PRECOMPUTED_RADIUS_LIMIT + 1] {
            let config = SpatialIndexConfig {
                max_precomputed_radius: radius,
                ..config_200()
            };
            assert!(matches!(
                config.validate(),
                Err(SpatialError::InvalidConfig { field: "max_precomputed_radius", .. })
            ));
        }

        let at_limit = SpatialIndexConfig {
            max_precomputed_radius: constants::grid::PRECOMPUTED_RADIUS_LIMIT,
            ..config_200()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_precomputed_radius_stops_at_grid_edge() {
        // 4x4 cells: ring 3 already reaches every cell
        let index = SpatialIndex::new(SpatialIndexConfig::for_world(64, 64)).expect("valid config");
        assert_eq!(index.config().max_precomputed_radius, constants::grid::MAX_PRECOMPUTED_RADIUS);
        assert_eq!(index.tables().max_precomputed_radius(), 3);
    }

    #[test]
    fn test_config_from_toml() {
        let config = SpatialIndexConfig::from_toml_str(
            r#"
            world_width = 320
            world_height = 160
            cell_size = 8
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.world_width, 320);
        assert_eq!(config.cell_size, 8);
        assert_eq!(config.cells_x(), 40);
        assert_eq!(config.cells_y(), 20);
        assert_eq!(config.max_precomputed_radius, constants::grid::MAX_PRECOMPUTED_RADIUS);
        assert_eq!(config.distance_table_cap, None);
        assert_eq!(config.distance_cap(), 320);

        assert!(matches!(
            SpatialIndexConfig::from_toml_str("cell_size = \"big\""),
            Err(SpatialError::ConfigParse(_))
        ));
        assert!(matches!(
            SpatialIndexConfig::load("/definitely/not/here.toml"),
            Err(SpatialError::ConfigIo { .. })
        ));
    }

    #[test]
    fn test_cell_coords_via_index() {
        let index = SpatialIndex::new(config_200()).unwrap();
        assert_eq!(index.cell_coords(IVec2::new(0, 0)), CellCoord::new(0, 0));
        assert_eq!(index.cell_coords(IVec2::new(500, 500)), CellCoord::new(12, 12));
        assert_eq!(index.cell_coords(IVec2::new(-1, 40)), CellCoord::new(0, 2));
    }

    #[test]
    fn test_insert_skips_out_of_bounds_and_unknown() {
        let mut arena = ObjectArena::new();
        let mut index = SpatialIndex::new(config_200()).unwrap();
        let outside = arena.spawn(tree(200, 10));
        let negative = arena.spawn(tree(-1, 10));
        let inside = arena.spawn(tree(199, 199));

        index.insert(&arena, outside);
        index.insert(&arena, negative);
        index.insert(&arena, inside);
        index.insert(&arena, ObjectId::INVALID);

        assert_eq!(index.stats().indexed_objects, 1);
        assert!(index.audit(&arena).is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut arena = ObjectArena::new();
        let mut index = SpatialIndex::new(config_200()).unwrap();
        let id = arena.spawn(tree(10, 10));
        index.insert(&arena, id);

        index.remove(&arena, id);
        index.remove(&arena, id);
        index.remove(&arena, ObjectId::INVALID);
        assert_eq!(index.stats().indexed_objects, 0);

        arena.despawn(id);
        index.remove(&arena, id);
        assert_eq!(index.stats().indexed_objects, 0);
    }

    #[test]
    fn test_update_moves_between_cells() {
        let mut arena = ObjectArena::new();
        let mut index = SpatialIndex::new(config_200()).unwrap();
        let id = arena.spawn(tree(10, 10));
        index.insert(&arena, id);

        // Same cell: nothing to do
        let old = arena.set_position(id, IVec2::new(12, 3)).unwrap();
        index.update(&arena, id, old);
        assert!(index.audit(&arena).is_empty());

        let old = arena.set_position(id, IVec2::new(150, 90)).unwrap();
        index.update(&arena, id, old);
        assert!(index.audit(&arena).is_empty());
        assert_eq!(index.stats().indexed_objects, 1);
    }

    #[test]
    fn test_update_across_world_boundary() {
        let mut arena = ObjectArena::new();
        let mut index = SpatialIndex::new(config_200()).unwrap();
        let id = arena.spawn(tree(195, 195));
        index.insert(&arena, id);

        // Leaving the world drops the entry even though the clamped cell is unchanged
        let old = arena.set_position(id, IVec2::new(205, 195)).unwrap();
        index.update(&arena, id, old);
        assert_eq!(index.stats().indexed_objects, 0);

        // Coming back re-inserts it
        let old = arena.set_position(id, IVec2::new(198, 195)).unwrap();
        index.update(&arena, id, old);
        assert_eq!(index.stats().indexed_objects, 1);
        assert!(index.audit(&arena).is_empty());
    }

    #[test]
    fn test_audit_reports_drift_and_rebuild_recovers() {
        let mut arena = ObjectArena::new();
        let mut index = SpatialIndex::new(config_200()).unwrap();
        let moved = arena.spawn(tree(10, 10));
        let scout = SpatialObject::agent(UnitClass::Scout, IVec2::new(50, 50), TeamId(1));
        let unindexed = arena.spawn(scout);
        let doomed = arena.spawn(tree(100, 100));
        index.insert(&arena, moved);
        index.insert(&arena, doomed);

        // Missed update, missed insert, missed remove
        arena.set_position(moved, IVec2::new(120, 120));
        arena.despawn(doomed);

        let drift = index.audit(&arena);
        assert_eq!(drift.len(), 3);
        assert!(drift.contains(&Drift::Missing { id: unindexed }));
        assert!(drift.iter().any(|d| matches!(d, Drift::Misplaced { id, .. } if *id == moved)));
        assert!(drift.iter().any(|d| matches!(d, Drift::Stale { id, .. } if *id == doomed)));

        index.rebuild(&arena);
        assert!(index.audit(&arena).is_empty());
        assert_eq!(index.stats().indexed_objects, 2);
        assert_eq!(index.stats().objects_of(ObjectKind::Agent), 1);
    }

    #[test]
    fn test_audit_reports_duplicates() {
        let mut arena = ObjectArena::new();
        let mut index = SpatialIndex::new(config_200()).unwrap();
        let id = arena.spawn(tree(10, 10));
        index.insert(&arena, id);
        index.insert(&arena, id);

        assert_eq!(index.audit(&arena), vec![Drift::Duplicate { id, count: 2 }]);
        index.rebuild(&arena);
        assert!(index.audit(&arena).is_empty());
    }

    #[test]
    fn test_rebuild_skips_dead_objects() {
        let mut arena = ObjectArena::new();
        let live = arena.spawn(tree(1, 1));
        let dead = arena.spawn(tree(2, 2));
        if let Some(object) = arena.get_mut(dead) {
            object.alive = false;
        }

        let index = SpatialIndex::build(config_200(), &arena).unwrap();
        assert_eq!(index.stats().indexed_objects, 1);
        assert!(index.audit(&arena).is_empty());
        assert!(arena.contains(live));
    }
}
