//! Objects placed in the simulated world and the arena that owns them
//!
//! The spatial index never owns objects. It keeps `ObjectId`s into an
//! `ObjectArena` and reads positions, teams and predicate fields back through
//! it on every query.

mod arena;
mod object;

pub use arena::{ObjectArena, ObjectId};
pub use object::{
    chebyshev, KindSet, ObjectKind, SpatialObject, TeamFilter, TeamId, UnitClass,
};
