//! Fixed simulation constants surfaced to configuration.
//!
//! All thresholds are named values, not derived at run time.

/// World-space size of one grid tile. Positions are in tile units, so the
/// rounded position of an entity *is* its tile coordinate.
pub const TILE_SIZE: f32 = 1.0;

/// Ideal gas constant, J/(mol.K).
pub const GAS_CONSTANT_R: f32 = 8.314;

/// Minimum oxygen share of a mixture (percent of total moles) that still
/// supports breathing.
pub const MIN_BREATHABLE_OXYGEN_PERCENT: f32 = 16.0;

/// Oxygen share (percent) above which the mixture is treated as toxic.
pub const TOXIC_OXYGEN_THRESHOLD_PERCENT: f32 = 30.0;

/// Pressure (kPa) below which the environment is a low-pressure hazard.
pub const HAZARD_LOW_PRESSURE_KPA: f32 = 20.0;

/// Pressure (kPa) above which the environment is a high-pressure hazard.
pub const HAZARD_HIGH_PRESSURE_KPA: f32 = 550.0;

/// Seconds between atmosphere processing passes. The atmosphere system runs
/// below the main tick rate; it accumulates tick time and processes only when
/// this interval has elapsed.
pub const ATMOS_PROCESS_INTERVAL: f32 = 0.5;

/// Input axis magnitude below which no step is produced.
pub const INPUT_STEP_THRESHOLD: f32 = 0.5;
