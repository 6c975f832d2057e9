//! Outpost Sim -- the authoritative world and its gameplay systems.
//!
//! This crate defines the closed component set of the tile-grid world, the
//! [`World`](world::World) that stores it (one sparse-set column per type,
//! exhaustive dispatch -- no run-time type discovery), and the three
//! simulation systems run each tick in priority order:
//!
//! 1. [`MovementSystem`](movement::MovementSystem) (priority 10) -- grid-locked
//!    movement state machine.
//! 2. [`PowerSystem`](power::PowerSystem) (priority 20) -- aggregate
//!    supply/demand/battery bookkeeping.
//! 3. [`AtmosphereSystem`](atmos::AtmosphereSystem) (priority 30) -- per-entity
//!    gas-mixture bookkeeping. Inter-tile gas flow is deliberately absent.
//!
//! # Quick Start
//!
//! ```
//! use outpost_sim::prelude::*;
//!
//! let mut world = World::new();
//! let e = world.spawn();
//! world.transforms.insert(e, Transform::at_tile(5, 5));
//! world.physics.insert(e, Physics::walker(4.0));
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.register(Box::new(MovementSystem::new()));
//! scheduler.register(Box::new(PowerSystem::new()));
//! scheduler.register(Box::new(AtmosphereSystem::new()));
//! scheduler.initialize_all(&mut world);
//! scheduler.run_tick(&mut world, 1.0 / 30.0).unwrap();
//! ```

#![deny(unsafe_code)]

pub mod atmos;
pub mod components;
pub mod constants;
pub mod movement;
pub mod power;
pub mod world;

pub use outpost_ecs;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by world operations.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The entity does not exist (stale generation or already despawned).
    #[error("entity {entity} does not exist (stale or already despawned)")]
    StaleEntity {
        entity: outpost_ecs::entity::Entity,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::atmos::{is_breathable, AtmosphereSystem};
    pub use crate::components::{
        Battery, Gas, GasMixture, Health, InputState, MoveTarget, Physics, PowerChannel,
        PowerConsumer, PowerProducer, Sprite, Transform, Vec2,
    };
    pub use crate::constants::*;
    pub use crate::movement::MovementSystem;
    pub use crate::power::PowerSystem;
    pub use crate::world::World;
    pub use crate::SimError;
    pub use outpost_ecs::prelude::*;
}
