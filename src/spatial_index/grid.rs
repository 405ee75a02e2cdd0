use glam::IVec2;

use super::lookup_tables::ceil_div;
use crate::world::{ObjectId, ObjectKind};

/// Cell coordinate in the uniform grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One square of the world holding per-kind buckets of object handles
#[derive(Debug, Clone, Default)]
struct Cell {
    buckets: [Vec<ObjectId>; ObjectKind::COUNT],
}

impl Cell {
    fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

/// Fixed-size grid covering the bounded world
#[derive(Debug, Clone)]
pub struct CellGrid {
    cell_size: i32,
    world_size: IVec2,
    cells_x: i32,
    cells_y: i32,
    cells: Vec<Cell>,
}

impl CellGrid {
    pub fn new(world_width: i32, world_height: i32, cell_size: i32) -> Self {
        let cells_x = ceil_div(world_width, cell_size);
        let cells_y = ceil_div(world_height, cell_size);
        let total = cells_x as usize * cells_y as usize;

        Self {
            cell_size,
            world_size: IVec2::new(world_width, world_height),
            cells_x,
            cells_y,
            cells: vec![Cell::default(); total],
        }
    }

    pub fn cells_x(&self) -> i32 {
        self.cells_x
    }

    pub fn cells_y(&self) -> i32 {
        self.cells_y
    }

    /// Largest ring radius that can still reach a cell inside the grid
    pub fn max_ring(&self) -> u32 {
        (self.cells_x.max(self.cells_y) - 1) as u32
    }

    pub fn in_world(&self, pos: IVec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.world_size.x && pos.y < self.world_size.y
    }

    /// Cell containing `pos`, clamped to the nearest edge cell when outside
    #[inline]
    pub fn cell_coords(&self, pos: IVec2) -> CellCoord {
        CellCoord {
            x: pos.x.div_euclid(self.cell_size).clamp(0, self.cells_x - 1),
            y: pos.y.div_euclid(self.cell_size).clamp(0, self.cells_y - 1),
        }
    }

    #[inline]
    fn cell_index(&self, coord: CellCoord) -> Option<usize> {
        if coord.x < 0 || coord.y < 0 || coord.x >= self.cells_x || coord.y >= self.cells_y {
            return None;
        }
        Some((coord.y * self.cells_x + coord.x) as usize)
    }

    pub fn push(&mut self, coord: CellCoord, kind: ObjectKind, id: ObjectId) {
        if let Some(index) = self.cell_index(coord) {
            self.cells[index].buckets[kind.index()].push(id);
        }
    }

    /// Remove one reference to `id`; returns whether it was present
    pub fn take(&mut self, coord: CellCoord, kind: ObjectKind, id: ObjectId) -> bool {
        let Some(index) = self.cell_index(coord) else {
            return false;
        };
        let bucket = &mut self.cells[index].buckets[kind.index()];
        match bucket.iter().position(|&other| other == id) {
            Some(pos) => {
                bucket.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Bucket for one kind; empty for coordinates outside the grid
    #[inline]
    pub fn bucket(&self, coord: CellCoord, kind: ObjectKind) -> &[ObjectId] {
        match self.cell_index(coord) {
            Some(index) => &self.cells[index].buckets[kind.index()],
            None => &[],
        }
    }

    /// Every indexed handle with the cell and kind bucket holding it
    pub fn entries(&self) -> impl Iterator<Item = (CellCoord, ObjectKind, ObjectId)> + '_ {
        self.cells.iter().enumerate().flat_map(move |(index, cell)| {
            let coord = CellCoord::new(index as i32 % self.cells_x, index as i32 / self.cells_x);
            ObjectKind::ALL.into_iter().flat_map(move |kind| {
                cell.buckets[kind.index()].iter().map(move |&id| (coord, kind, id))
            })
        })
    }

    pub fn stats(&self) -> GridStats {
        let mut stats = GridStats {
            total_cells: self.cells.len(),
            ..GridStats::default()
        };

        for cell in &self.cells {
            let count = cell.len();
            if count > 0 {
                stats.occupied_cells += 1;
                stats.total_entries += count;
                stats.max_entries_per_cell = stats.max_entries_per_cell.max(count);
            }
            for kind in ObjectKind::ALL {
                stats.entries_by_kind[kind.index()] += cell.buckets[kind.index()].len();
            }
        }

        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridStats {
    pub total_cells: usize,
    pub occupied_cells: usize,
    pub total_entries: usize,
    pub max_entries_per_cell: usize,
    pub entries_by_kind: [usize; ObjectKind::COUNT],
}

impl GridStats {
    pub fn entries_of(&self, kind: ObjectKind) -> usize {
        self.entries_by_kind[kind.index()]
    }
}
