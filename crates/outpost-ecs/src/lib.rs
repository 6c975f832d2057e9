//! Outpost ECS -- sparse-set Entity Component System with a priority scheduler.
//!
//! This crate provides the entity/component store underneath the Outpost
//! simulation. Component types form a closed, compile-time-known set: each
//! type lives in its own [`Column`] (a sparse set keyed by entity index), and
//! the domain `World` owns one column per type with exhaustive dispatch.
//! Generational entity IDs give immediate stale-reference detection.
//!
//! # Quick Start
//!
//! ```
//! use outpost_ecs::prelude::*;
//!
//! let mut alloc = EntityAllocator::new();
//! let mut positions: Column<(f32, f32)> = Column::new();
//!
//! let e = alloc.allocate();
//! positions.insert(e, (1.0, 2.0));
//! assert_eq!(positions.get(e), Some(&(1.0, 2.0)));
//!
//! // Freeing bumps the generation; the stale handle stops resolving.
//! alloc.free(e).unwrap();
//! positions.remove(e);
//! assert_eq!(positions.get(e), None);
//! ```

#![deny(unsafe_code)]

pub mod column;
pub mod entity;
pub mod schedule;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {entity} does not exist (stale or never allocated)")]
    StaleEntity { entity: entity::Entity },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::column::Column;
    pub use crate::entity::{Entity, EntityAllocator};
    pub use crate::schedule::{Scheduler, SchedulerError, System, SystemError};
    pub use crate::EcsError;
}
