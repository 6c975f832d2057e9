//! Entity handles and the slot allocator behind them.
//!
//! Everything in the simulation -- a crew member, a battery, a pocket of gas
//! -- is addressed by an [`Entity`]: a slot index plus the generation that
//! slot had when the handle was issued. A slot's generation moves forward
//! each time the slot is vacated, so a handle held across a despawn simply
//! stops resolving. Nothing a stale handle touches can land on whatever
//! entity occupies the slot today.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::EcsError;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// Handle to one entity: slot index in the low half, issue generation in the
/// high half of a `u64`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(u64);

impl Entity {
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// Slot index this handle points at.
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// Generation the slot had when this handle was issued.
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// The packed form, for hashing or storage.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Rebuild a handle from [`Entity::to_raw`] output.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// One slot of the allocator's slab. `occupant` is the generation of the
/// handle currently living here, or `None` while the slot is vacant. The
/// next occupant's generation is always `next_generation`.
#[derive(Debug, Clone, Copy)]
struct Slot {
    occupant: Option<u32>,
    next_generation: u32,
}

/// Issues [`Entity`] handles out of a slab of generation-tracked slots.
///
/// Vacated slots go on a stack and are refilled before the slab grows, so
/// long-running worlds with churn stay compact. A handle is live exactly
/// while its slot's occupant generation matches the handle's own; any churn
/// in between makes the handle permanently stale.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    slots: Vec<Slot>,
    vacant: Vec<u32>,
    live: usize,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a handle, refilling a vacant slot if one exists.
    pub fn allocate(&mut self) -> Entity {
        self.live += 1;
        match self.vacant.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                let generation = slot.next_generation;
                slot.occupant = Some(generation);
                Entity::new(index, generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    occupant: Some(0),
                    next_generation: 0,
                });
                Entity::new(index, 0)
            }
        }
    }

    /// Vacate the handle's slot, advancing its generation so the handle (and
    /// any copies of it) go stale at once.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] when the handle is already stale,
    /// was freed before, or never came from this allocator. The slab is
    /// untouched in that case.
    pub fn free(&mut self, entity: Entity) -> Result<(), EcsError> {
        let slot = self
            .slots
            .get_mut(entity.index() as usize)
            .filter(|slot| slot.occupant == Some(entity.generation()))
            .ok_or(EcsError::StaleEntity { entity })?;
        slot.occupant = None;
        slot.next_generation = slot.next_generation.wrapping_add(1);
        self.vacant.push(entity.index());
        self.live -= 1;
        Ok(())
    }

    /// Whether the handle still resolves to a live entity.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index() as usize)
            .is_some_and(|slot| slot.occupant == Some(entity.generation()))
    }

    /// Number of live entities.
    pub fn alive_count(&self) -> usize {
        self.live
    }

    /// Handles of every live entity, in slot order.
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.occupant
                .map(|generation| Entity::new(index as u32, generation))
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crew_roster_handles_are_distinct() {
        let mut alloc = EntityAllocator::new();
        let crew: Vec<Entity> = (0..16).map(|_| alloc.allocate()).collect();
        for (i, a) in crew.iter().enumerate() {
            for b in &crew[i + 1..] {
                assert_ne!(a.to_raw(), b.to_raw());
            }
        }
        assert_eq!(alloc.alive_count(), 16);
    }

    #[test]
    fn despawned_handle_never_resolves_to_the_replacement() {
        let mut alloc = EntityAllocator::new();
        let old_crew = alloc.allocate();
        alloc.free(old_crew).unwrap();

        // The replacement takes the vacant slot but a later generation.
        let new_crew = alloc.allocate();
        assert_eq!(new_crew.index(), old_crew.index());
        assert_ne!(new_crew.generation(), old_crew.generation());
        assert!(alloc.is_alive(new_crew));
        assert!(!alloc.is_alive(old_crew));
    }

    #[test]
    fn freeing_a_stale_handle_is_an_error() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate();
        alloc.free(e).unwrap();

        assert!(matches!(
            alloc.free(e),
            Err(EcsError::StaleEntity { entity }) if entity == e
        ));
        // A handle this allocator never issued fails the same way.
        let foreign = Entity::new(900, 3);
        assert!(alloc.free(foreign).is_err());
        assert_eq!(alloc.alive_count(), 0);
    }

    #[test]
    fn failed_free_leaves_the_slab_usable() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        alloc.free(a).unwrap();
        let _ = alloc.free(a); // stale, rejected

        assert!(alloc.is_alive(b));
        assert_eq!(alloc.alive_count(), 1);
        let c = alloc.allocate();
        assert!(alloc.is_alive(c));
        assert_eq!(alloc.alive_count(), 2);
    }

    #[test]
    fn count_and_iteration_agree_under_churn() {
        let mut alloc = EntityAllocator::new();
        let mut live: Vec<Entity> = (0..10).map(|_| alloc.allocate()).collect();
        for _ in 0..4 {
            let victim = live.swap_remove(0);
            alloc.free(victim).unwrap();
            live.push(alloc.allocate());
        }

        let iterated: Vec<Entity> = alloc.iter_alive().collect();
        assert_eq!(iterated.len(), alloc.alive_count());
        live.sort();
        let mut sorted = iterated.clone();
        sorted.sort();
        assert_eq!(sorted, live);
    }

    #[test]
    fn packed_form_survives_a_round_trip() {
        let e = Entity::new(3_000_000, 41);
        let back = Entity::from_raw(e.to_raw());
        assert_eq!(back, e);
        assert_eq!(back.index(), 3_000_000);
        assert_eq!(back.generation(), 41);
    }
}
