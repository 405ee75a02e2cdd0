//! Expanding-ring search over the cell grid
//!
//! Cells are visited ring by ring around the origin's cell, in the order of
//! the precomputed neighbor offset tables. A nearest search stops as soon as
//! the rings already scanned cover the distance of the best match, since no
//! unvisited cell can hold anything closer.

use glam::IVec2;

use super::grid::CellCoord;
use super::SpatialIndex;
use crate::constants::grid::NO_POSITION;
use crate::world::{chebyshev, KindSet, ObjectArena, ObjectId, SpatialObject};

/// Best match of a nearest-style query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nearest {
    pub id: ObjectId,
    pub pos: IVec2,
    /// Chebyshev distance from the query point
    pub distance: i32,
}

impl Nearest {
    /// Position of the match, or the `(-1, -1)` sentinel when there is none
    pub fn position_or_sentinel(found: Option<Nearest>) -> IVec2 {
        found.map_or(IVec2::new(NO_POSITION.0, NO_POSITION.1), |n| n.pos)
    }
}

#[inline]
fn live(objects: &ObjectArena, id: ObjectId) -> Option<&SpatialObject> {
    objects.get(id).filter(|object| object.alive)
}

impl SpatialIndex {
    /// Outermost ring a search bounded by `max_dist` has to visit
    fn ring_limit(&self, max_dist: i32) -> u32 {
        self.tables
            .dist_to_cell_radius(max_dist)
            .min(self.grid.max_ring())
    }

    fn scan_ring(
        &self,
        center: CellCoord,
        ring: u32,
        kinds: KindSet,
        mut visit: impl FnMut(ObjectId),
    ) {
        for offset in self.tables.ring_offsets(ring).iter() {
            let coord = CellCoord::new(center.x + offset.x, center.y + offset.y);
            for kind in kinds.iter() {
                for &id in self.grid.bucket(coord, kind) {
                    visit(id);
                }
            }
        }
    }

    /// Closest live object of `kinds` within `max_dist` accepted by `matches`.
    ///
    /// Ties keep whichever object the ring walk reached first.
    pub fn find_nearest_matching<F>(
        &self,
        objects: &ObjectArena,
        origin: IVec2,
        max_dist: i32,
        kinds: KindSet,
        mut matches: F,
    ) -> Option<Nearest>
    where
        F: FnMut(ObjectId, &SpatialObject) -> bool,
    {
        if max_dist < 0 || kinds.is_empty() {
            return None;
        }

        let center = self.grid.cell_coords(origin);
        let limit = self.ring_limit(max_dist);
        let mut best: Option<Nearest> = None;

        for ring in 0..=limit {
            self.scan_ring(center, ring, kinds, |id| {
                let Some(object) = live(objects, id) else {
                    return;
                };
                let distance = chebyshev(origin, object.pos);
                if distance > max_dist || best.is_some_and(|b| distance >= b.distance) {
                    return;
                }
                if matches(id, object) {
                    best = Some(Nearest {
                        id,
                        pos: object.pos,
                        distance,
                    });
                }
            });

            if let Some(found) = best {
                if ring >= self.tables.dist_to_cell_radius(found.distance) {
                    break;
                }
            }
        }

        best
    }

    /// Append every live object of `kinds` within `max_dist` accepted by
    /// `matches` to `out`. Returns how many were appended.
    pub fn collect_matching<F>(
        &self,
        objects: &ObjectArena,
        origin: IVec2,
        max_dist: i32,
        kinds: KindSet,
        out: &mut Vec<ObjectId>,
        mut matches: F,
    ) -> usize
    where
        F: FnMut(ObjectId, &SpatialObject) -> bool,
    {
        let before = out.len();
        self.for_each_in_range(objects, origin, max_dist, kinds, |id, object| {
            if matches(id, object) {
                out.push(id);
            }
        });
        out.len() - before
    }

    /// Number of live objects of `kinds` within `max_dist` accepted by `matches`
    pub fn count_matching<F>(
        &self,
        objects: &ObjectArena,
        origin: IVec2,
        max_dist: i32,
        kinds: KindSet,
        mut matches: F,
    ) -> usize
    where
        F: FnMut(ObjectId, &SpatialObject) -> bool,
    {
        let mut count = 0;
        self.for_each_in_range(objects, origin, max_dist, kinds, |id, object| {
            if matches(id, object) {
                count += 1;
            }
        });
        count
    }

    fn for_each_in_range(
        &self,
        objects: &ObjectArena,
        origin: IVec2,
        max_dist: i32,
        kinds: KindSet,
        mut visit: impl FnMut(ObjectId, &SpatialObject),
    ) {
        if max_dist < 0 || kinds.is_empty() {
            return;
        }

        let center = self.grid.cell_coords(origin);
        for ring in 0..=self.ring_limit(max_dist) {
            self.scan_ring(center, ring, kinds, |id| {
                if let Some(object) = live(objects, id) {
                    if chebyshev(origin, object.pos) <= max_dist {
                        visit(id, object);
                    }
                }
            });
        }
    }
}
