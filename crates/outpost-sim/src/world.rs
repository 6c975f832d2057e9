//! The [`World`] -- top-level container owning all entities and their
//! component columns.
//!
//! Storage is one [`Column`] per component type, a closed set known at compile
//! time. Despawning dispatches exhaustively over every column, so no storage
//! leaks a dead entity; stale handles miss on every access path.

use outpost_ecs::column::Column;
use outpost_ecs::entity::{Entity, EntityAllocator};

use crate::components::{
    Battery, GasMixture, Health, InputState, MoveTarget, Physics, PowerConsumer, PowerProducer,
    Sprite, Transform,
};
use crate::SimError;

/// The heterogeneous per-entity component store.
///
/// Columns are public: systems iterate one column and look up the others, the
/// sparse-set query idiom. All mutation happens on the simulation thread that
/// owns the world; there is no interior locking.
#[derive(Debug, Default)]
pub struct World {
    allocator: EntityAllocator,
    /// Position / rotation / z-level.
    pub transforms: Column<Transform>,
    /// Velocity, speed, mass, dense/anchored flags.
    pub physics: Column<Physics>,
    /// Transient mid-transition markers.
    pub move_targets: Column<MoveTarget>,
    /// Per-tick desired movement axes.
    pub inputs: Column<InputState>,
    /// Power generators.
    pub producers: Column<PowerProducer>,
    /// Power sinks.
    pub consumers: Column<PowerConsumer>,
    /// Energy stores.
    pub batteries: Column<Battery>,
    /// Per-entity gas mixtures.
    pub gas_mixtures: Column<GasMixture>,
    /// Display identifiers.
    pub sprites: Column<Sprite>,
    /// Hit points.
    pub healths: Column<Health>,
}

impl World {
    /// Create a new, empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new entity with no components attached.
    pub fn spawn(&mut self) -> Entity {
        self.allocator.allocate()
    }

    /// Destroy an entity, detaching it from every column.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::StaleEntity`] if the handle is stale or was never
    /// allocated; nothing is touched in that case.
    pub fn despawn(&mut self, entity: Entity) -> Result<(), SimError> {
        self.allocator
            .free(entity)
            .map_err(|_| SimError::StaleEntity { entity })?;
        // Exhaustive over the closed component set.
        self.transforms.remove(entity);
        self.physics.remove(entity);
        self.move_targets.remove(entity);
        self.inputs.remove(entity);
        self.producers.remove(entity);
        self.consumers.remove(entity);
        self.batteries.remove(entity);
        self.gas_mixtures.remove(entity);
        self.sprites.remove(entity);
        self.healths.remove(entity);
        Ok(())
    }

    /// Whether `entity` is currently alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Number of alive entities.
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Iterate all alive entities.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.allocator.iter_alive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
