//! Per-component-type sparse-set storage.
//!
//! A [`Column`] stores one component type for any number of entities. The
//! sparse vector maps entity *index* to a slot in the dense arrays; the dense
//! arrays keep entities and values packed for cache-friendly iteration.
//! Because the dense side stores the full [`Entity`] (index + generation),
//! lookups through a stale handle miss instead of aliasing a recycled slot.
//!
//! Queries over a component set are expressed by iterating the smallest
//! column and probing the others with [`Column::get`] -- there is no run-time
//! type discovery anywhere in this design.

use crate::entity::Entity;

/// Sentinel for "entity index has no slot in this column".
const ABSENT: u32 = u32::MAX;

/// Sparse-set storage for a single component type.
#[derive(Debug, Clone)]
pub struct Column<T> {
    /// Entity index -> dense slot, `ABSENT` when the entity has no `T`.
    sparse: Vec<u32>,
    /// Dense entity handles, parallel to `data`.
    entities: Vec<Entity>,
    /// Dense component values.
    data: Vec<T>,
}

impl<T> Default for Column<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Column<T> {
    /// Create an empty column.
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            entities: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Attach a component to `entity`, overwriting in place if the entity
    /// already has one. Returns the previous value if it was overwritten.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        let idx = entity.index() as usize;
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, ABSENT);
        }
        let slot = self.sparse[idx];
        if slot != ABSENT && self.entities[slot as usize] == entity {
            return Some(std::mem::replace(&mut self.data[slot as usize], value));
        }
        // A slot held by a stale generation is reclaimed by the new handle.
        self.sparse[idx] = self.entities.len() as u32;
        self.entities.push(entity);
        self.data.push(value);
        None
    }

    /// Detach the component from `entity`, returning it if present.
    ///
    /// Uses swap-remove: the last dense element moves into the vacated slot
    /// and its sparse entry is patched.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let idx = entity.index() as usize;
        let slot = *self.sparse.get(idx)?;
        if slot == ABSENT || self.entities[slot as usize] != entity {
            return None;
        }
        self.sparse[idx] = ABSENT;
        self.entities.swap_remove(slot as usize);
        let value = self.data.swap_remove(slot as usize);
        if (slot as usize) < self.entities.len() {
            let moved = self.entities[slot as usize];
            self.sparse[moved.index() as usize] = slot;
        }
        Some(value)
    }

    /// Shared access to `entity`'s component. `None` for absent or stale handles.
    pub fn get(&self, entity: Entity) -> Option<&T> {
        let slot = *self.sparse.get(entity.index() as usize)?;
        if slot == ABSENT || self.entities[slot as usize] != entity {
            return None;
        }
        Some(&self.data[slot as usize])
    }

    /// Mutable access to `entity`'s component.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let slot = *self.sparse.get(entity.index() as usize)?;
        if slot == ABSENT || self.entities[slot as usize] != entity {
            return None;
        }
        Some(&mut self.data[slot as usize])
    }

    /// Whether `entity` has a component in this column.
    pub fn contains(&self, entity: Entity) -> bool {
        self.get(entity).is_some()
    }

    /// Iterate `(Entity, &T)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.data.iter())
    }

    /// Iterate `(Entity, &mut T)` pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.data.iter_mut())
    }

    /// The entities currently stored, in dense order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of components stored.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the column is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Remove every component.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.entities.clear();
        self.data.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
