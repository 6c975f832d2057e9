//! Priority-ordered system scheduler.
//!
//! A [`System`] is an independently registered unit of per-tick simulation
//! logic. The [`Scheduler`] keeps systems sorted by integer priority (lower
//! runs first; equal priorities keep registration order, which is stable
//! within a run) and drives them through a three-phase lifecycle:
//!
//! 1. [`Scheduler::initialize_all`] -- called once before the first tick.
//! 2. [`Scheduler::run_tick`] -- invokes every enabled system in order.
//! 3. [`Scheduler::shutdown_all`] -- tears systems down in order.
//!
//! A system that fails during `update` is fatal for that tick: `run_tick`
//! stops at the first error and returns it. Later systems depend on earlier
//! ones having completed, so a partial tick is never silently continued.

use std::fmt;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// An error produced by a system's per-tick update.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SystemError {
    message: String,
}

impl SystemError {
    /// Construct a system error from any displayable message.
    pub fn new(message: impl fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Errors produced by the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A system faulted mid-tick. The tick is abandoned, not retried.
    #[error("system '{system}' failed during update: {source}")]
    SystemFailed {
        /// Name of the failed system.
        system: String,
        /// The underlying failure.
        source: SystemError,
    },
}

// ---------------------------------------------------------------------------
// System trait
// ---------------------------------------------------------------------------

/// One unit of per-tick simulation logic over a shared store `W`.
///
/// Systems must not assume any ordering beyond their declared [`priority`]
/// relative to other systems.
///
/// [`priority`]: System::priority
pub trait System<W> {
    /// Human-readable name, used for logging and fault reporting.
    fn name(&self) -> &str;

    /// Execution priority. Lower values run first.
    fn priority(&self) -> i32;

    /// Whether this system participates in ticks. Disabled systems are
    /// skipped by [`Scheduler::run_tick`] but still initialized and shut down.
    fn is_enabled(&self) -> bool {
        true
    }

    /// One-time setup, called before the first tick.
    fn initialize(&mut self, _world: &mut W) {}

    /// Per-tick logic. `dt` is the fixed tick duration in seconds.
    fn update(&mut self, world: &mut W, dt: f32) -> Result<(), SystemError>;

    /// Teardown, called once when the scheduler shuts down.
    fn shutdown(&mut self, _world: &mut W) {}
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Ordered registry of systems, invoked once per tick.
pub struct Scheduler<W> {
    systems: Vec<Box<dyn System<W>>>,
    initialized: bool,
}

impl<W> fmt::Debug for Scheduler<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("systems", &self.system_names())
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl<W> Default for Scheduler<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> Scheduler<W> {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            initialized: false,
        }
    }

    /// Register a system. Systems are kept sorted by priority; equal
    /// priorities preserve registration order.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered.
    pub fn register(&mut self, system: Box<dyn System<W>>) {
        assert!(
            !self.systems.iter().any(|s| s.name() == system.name()),
            "duplicate system name: {:?}",
            system.name()
        );
        self.systems.push(system);
        // Stable sort keeps registration order for equal priorities.
        self.systems.sort_by_key(|s| s.priority());
    }

    /// Call `initialize` on every system, once. Subsequent calls are no-ops.
    pub fn initialize_all(&mut self, world: &mut W) {
        if self.initialized {
            return;
        }
        for system in &mut self.systems {
            tracing::debug!(system = system.name(), "initializing system");
            system.initialize(world);
        }
        self.initialized = true;
    }

    /// Run one tick: every enabled system's `update`, in priority order.
    ///
    /// Stops at the first failing system and returns
    /// [`SchedulerError::SystemFailed`]; the remainder of the tick is not run.
    pub fn run_tick(&mut self, world: &mut W, dt: f32) -> Result<(), SchedulerError> {
        for system in &mut self.systems {
            if !system.is_enabled() {
                continue;
            }
            if let Err(source) = system.update(world, dt) {
                tracing::error!(system = system.name(), %source, "system faulted mid-tick");
                return Err(SchedulerError::SystemFailed {
                    system: system.name().to_owned(),
                    source,
                });
            }
        }
        Ok(())
    }

    /// Call `shutdown` on every system, in priority order.
    pub fn shutdown_all(&mut self, world: &mut W) {
        for system in &mut self.systems {
            system.shutdown(world);
        }
        self.initialized = false;
    }

    /// Number of registered systems.
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Names of registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name()).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
