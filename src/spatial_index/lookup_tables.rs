use std::borrow::Cow;

use glam::IVec2;

/// Precomputed tables driving the ring search
///
/// Both tables are pure functions of the cell size and the configured limits,
/// built once when the index is created.
#[derive(Debug, Clone)]
pub struct LookupTables {
    cell_size: i32,
    /// `dist_to_radius[d] == ceil(d / cell_size)` for `d` in `0..=cap`
    dist_to_radius: Vec<u32>,
    /// `neighbor_offsets[r]` holds every offset with Chebyshev length <= r,
    /// sorted by length, then by (dy, dx)
    neighbor_offsets: Vec<Vec<IVec2>>,
}

impl LookupTables {
    pub fn new(cell_size: i32, max_precomputed_radius: u32, distance_cap: i32) -> Self {
        debug_assert!(cell_size > 0);
        let cap = distance_cap.max(0);

        let dist_to_radius = (0..=cap)
            .map(|d| ceil_div(d, cell_size) as u32)
            .collect();

        let neighbor_offsets = (0..=max_precomputed_radius)
            .map(|r| square_offsets(r as i32))
            .collect();

        Self {
            cell_size,
            dist_to_radius,
            neighbor_offsets,
        }
    }

    pub fn cell_size(&self) -> i32 {
        self.cell_size
    }

    /// Largest distance with its own table entry
    pub fn distance_cap(&self) -> i32 {
        self.dist_to_radius.len() as i32 - 1
    }

    pub fn max_precomputed_radius(&self) -> u32 {
        self.neighbor_offsets.len() as u32 - 1
    }

    /// Cell radius that must be scanned to cover world distance `d`.
    /// Negative distances map to 0; distances past the cap use the last entry.
    #[inline]
    pub fn dist_to_cell_radius(&self, d: i32) -> u32 {
        let last = self.dist_to_radius.len() - 1;
        let idx = (d.max(0) as usize).min(last);
        self.dist_to_radius[idx]
    }

    /// Full square of offsets for radius `r`, or `None` past the precomputed maximum
    pub fn neighbor_offsets(&self, r: u32) -> Option<&[IVec2]> {
        self.neighbor_offsets.get(r as usize).map(Vec::as_slice)
    }

    /// Offsets of the cells exactly `r` rings away, in table order.
    ///
    /// Borrowed from the precomputed square when available; generated on the
    /// fly otherwise.
    pub fn ring_offsets(&self, r: u32) -> Cow<'_, [IVec2]> {
        match self.neighbor_offsets(r) {
            Some(square) => {
                let inner = if r == 0 { 0 } else { ((2 * r - 1) * (2 * r - 1)) as usize };
                Cow::Borrowed(&square[inner..])
            }
            None => Cow::Owned(ring(r as i32)),
        }
    }
}

/// `ceil(a / b)` for `b > 0`, without the `a + b - 1` overflow
#[inline]
pub(crate) fn ceil_div(a: i32, b: i32) -> i32 {
    if a <= 0 {
        0
    } else {
        (a - 1) / b + 1
    }
}

/// All offsets with Chebyshev length exactly `r`, ordered by (dy, dx)
fn ring(r: i32) -> Vec<IVec2> {
    if r == 0 {
        return vec![IVec2::ZERO];
    }
    let mut offsets = Vec::with_capacity((8 * r) as usize);
    for dy in -r..=r {
        if dy == -r || dy == r {
            offsets.extend((-r..=r).map(|dx| IVec2::new(dx, dy)));
        } else {
            offsets.push(IVec2::new(-r, dy));
            offsets.push(IVec2::new(r, dy));
        }
    }
    offsets
}

/// The (2r+1)^2 square as concatenated rings 0..=r
fn square_offsets(r: i32) -> Vec<IVec2> {
    let side = (2 * r + 1) as usize;
    let mut offsets = Vec::with_capacity(side * side);
    for ring_radius in 0..=r {
        offsets.extend(ring(ring_radius));
    }
    offsets
}
