// Village Spatial Constants - SINGLE SOURCE OF TRUTH
//
// Default world and grid dimensions used by `SpatialIndexConfig::default()`.
// Everything here can be overridden through configuration at startup; nothing
// is mutable once an index has been built.

/// World dimensions in tiles
pub mod world {
    pub const WORLD_WIDTH: i32 = 256;
    pub const WORLD_HEIGHT: i32 = 256;
}

/// Uniform grid partitioning
pub mod grid {
    /// Side length of one grid cell in tiles
    pub const CELL_SIZE: i32 = 16;

    /// Largest ring radius with a precomputed neighbor offset table.
    /// Rings past this are generated on the fly.
    pub const MAX_PRECOMPUTED_RADIUS: u32 = 8;

    /// Upper bound accepted for the precomputed radius. Tables grow with
    /// the cube of the radius.
    pub const PRECOMPUTED_RADIUS_LIMIT: u32 = 64;

    /// Upper bound on the number of cells in one grid
    pub const MAX_CELLS: usize = 1 << 24;

    /// Sentinel position returned when a search finds nothing
    pub const NO_POSITION: (i32, i32) = (-1, -1);
}

/// Team identifiers
pub mod teams {
    /// Team id meaning "owned by nobody"
    pub const NEUTRAL_TEAM: i32 = -1;

    /// Number of competing teams an alliance table can describe
    pub const MAX_TEAMS: usize = 32;
}
