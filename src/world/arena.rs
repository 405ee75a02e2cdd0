use std::collections::VecDeque;

use glam::IVec2;

use super::SpatialObject;

/// Stable handle to an object in an [`ObjectArena`]
///
/// The generation distinguishes a recycled slot from the object that used to
/// live there, so stale handles resolve to nothing instead of aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    pub const INVALID: ObjectId = ObjectId {
        index: u32::MAX,
        generation: 0,
    };

    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

struct Slot {
    generation: u32,
    object: Option<SpatialObject>,
}

/// Owns every object the spatial index refers to
///
/// The index stores only [`ObjectId`]s; positions, teams and predicate fields
/// are always read back through the arena.
#[derive(Default)]
pub struct ObjectArena {
    slots: Vec<Slot>,
    recycled: VecDeque<u32>,
    live: usize,
}

impl ObjectArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object and return its handle
    pub fn spawn(&mut self, object: SpatialObject) -> ObjectId {
        self.live += 1;
        if let Some(index) = self.recycled.pop_front() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            return ObjectId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
        });
        ObjectId {
            index,
            generation: 0,
        }
    }

    /// Remove an object; stale or unknown handles return `None`
    pub fn despawn(&mut self, id: ObjectId) -> Option<SpatialObject> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        let object = slot.object.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.recycled.push_back(id.index);
        self.live -= 1;
        Some(object)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SpatialObject> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_ref())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SpatialObject> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_mut())
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Move an object and return its previous position, as required by
    /// `SpatialIndex::update`
    pub fn set_position(&mut self, id: ObjectId, pos: IVec2) -> Option<IVec2> {
        let object = self.get_mut(id)?;
        Some(std::mem::replace(&mut object.pos, pos))
    }

    /// Every stored object, live or not
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SpatialObject)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.object.as_ref().map(|object| {
                (
                    ObjectId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    object,
                )
            })
        })
    }

    /// Objects with their liveness flag set
    pub fn iter_live(&self) -> impl Iterator<Item = (ObjectId, &SpatialObject)> + '_ {
        self.iter().filter(|(_, object)| object.alive)
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}
