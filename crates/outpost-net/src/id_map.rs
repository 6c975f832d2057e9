//! Two-way mapping between local [`Entity`] handles and wire network ids.
//!
//! Entity handles are process-local: the server's `Entity` for a crate means
//! nothing to a client. The wire speaks in `u32` network ids instead. The
//! server assigns them monotonically and never reuses one, so a stale id in a
//! late packet can never alias a newer entity. Clients register the pairing
//! the other way around, from the ids snapshots hand them.

use std::collections::HashMap;

use outpost_ecs::entity::Entity;

/// Bidirectional entity <-> network id index.
#[derive(Debug)]
pub struct NetworkIdMap {
    next_net_id: u32,
    by_entity: HashMap<Entity, u32>,
    by_net_id: HashMap<u32, Entity>,
}

impl Default for NetworkIdMap {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkIdMap {
    pub fn new() -> Self {
        Self {
            // 0 is reserved as "no entity" on the wire.
            next_net_id: 1,
            by_entity: HashMap::new(),
            by_net_id: HashMap::new(),
        }
    }

    /// Server side: return the entity's network id, assigning a fresh one on
    /// first sight. Assigned ids are monotonic and never reused.
    pub fn assign(&mut self, entity: Entity) -> u32 {
        if let Some(&net_id) = self.by_entity.get(&entity) {
            return net_id;
        }
        let net_id = self.next_net_id;
        self.next_net_id += 1;
        self.by_entity.insert(entity, net_id);
        self.by_net_id.insert(net_id, entity);
        net_id
    }

    /// Client side: record a pairing dictated by the server. Overwrites any
    /// previous pairing of either half.
    pub fn register(&mut self, net_id: u32, entity: Entity) {
        if let Some(old_entity) = self.by_net_id.insert(net_id, entity) {
            self.by_entity.remove(&old_entity);
        }
        if let Some(old_net_id) = self.by_entity.insert(entity, net_id) {
            if old_net_id != net_id {
                self.by_net_id.remove(&old_net_id);
            }
        }
    }

    /// Look up the local entity for a wire id.
    pub fn entity(&self, net_id: u32) -> Option<Entity> {
        self.by_net_id.get(&net_id).copied()
    }

    /// Look up the wire id for a local entity.
    pub fn net_id(&self, entity: Entity) -> Option<u32> {
        self.by_entity.get(&entity).copied()
    }

    /// Drop a pairing by entity. Returns the freed network id, which will
    /// not be handed out again.
    pub fn remove_entity(&mut self, entity: Entity) -> Option<u32> {
        let net_id = self.by_entity.remove(&entity)?;
        self.by_net_id.remove(&net_id);
        Some(net_id)
    }

    /// Drop a pairing by network id. Returns the unmapped entity.
    pub fn remove_net_id(&mut self, net_id: u32) -> Option<Entity> {
        let entity = self.by_net_id.remove(&net_id)?;
        self.by_entity.remove(&entity);
        Some(entity)
    }

    /// Number of live pairings.
    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }

    /// All live pairings, unordered.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, u32)> + '_ {
        self.by_entity.iter().map(|(&entity, &net_id)| (entity, net_id))
    }

    /// All tracked network ids, unordered.
    pub fn net_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.by_net_id.keys().copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
