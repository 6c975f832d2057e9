//! Per-entity atmosphere bookkeeping and the breathability predicate.
//!
//! The gas model tracks one [`GasMixture`] per entity/tile and derives total
//! moles, pressure (ideal-gas law) and a breathability predicate from it.
//! Equalization between adjacent tiles is intentionally not implemented:
//! the per-tick update only advances a sub-tick accumulator at
//! [`ATMOS_PROCESS_INTERVAL`] and performs no gas transfer. That boundary is
//! inherited from upstream and preserved here -- do not fill it in.

use outpost_ecs::schedule::{System, SystemError};

use crate::components::{Gas, GasMixture};
use crate::constants::{
    ATMOS_PROCESS_INTERVAL, GAS_CONSTANT_R, HAZARD_HIGH_PRESSURE_KPA, HAZARD_LOW_PRESSURE_KPA,
    MIN_BREATHABLE_OXYGEN_PERCENT, TOXIC_OXYGEN_THRESHOLD_PERCENT,
};
use crate::world::World;

/// Priority of the atmosphere system in the tick order.
pub const ATMOS_PRIORITY: i32 = 30;

impl GasMixture {
    /// Total moles across all species.
    pub fn total_moles(&self) -> f32 {
        self.moles.iter().sum()
    }

    /// Pressure in kPa via `P = n * R * T / V`, zero when volume is
    /// non-positive.
    pub fn pressure(&self) -> f32 {
        if self.volume <= 0.0 {
            return 0.0;
        }
        self.total_moles() * GAS_CONSTANT_R * self.temperature / self.volume
    }
}

/// Whether a mixture supports breathing.
///
/// True iff the mixture holds any gas at all, its oxygen share lies inside
/// the breathable band, and its pressure lies inside the hazard band (all
/// bounds inclusive). Pure; no side effects.
pub fn is_breathable(mixture: &GasMixture) -> bool {
    let total = mixture.total_moles();
    if total <= 0.0 {
        return false;
    }
    let oxygen_percent = mixture.get(Gas::Oxygen) / total * 100.0;
    if !(MIN_BREATHABLE_OXYGEN_PERCENT..=TOXIC_OXYGEN_THRESHOLD_PERCENT).contains(&oxygen_percent) {
        return false;
    }
    let pressure = mixture.pressure();
    (HAZARD_LOW_PRESSURE_KPA..=HAZARD_HIGH_PRESSURE_KPA).contains(&pressure)
}

/// The atmosphere system.
///
/// Throttles itself to [`ATMOS_PROCESS_INTERVAL`] with a time accumulator.
/// Each elapsed interval is a processing pass, and a pass currently does
/// nothing: mixtures are isolated and inter-tile flow does not exist in this
/// core.
#[derive(Debug, Default)]
pub struct AtmosphereSystem {
    accumulator: f32,
    passes: u64,
}

impl AtmosphereSystem {
    /// Create the atmosphere system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of processing passes performed so far.
    pub fn pass_count(&self) -> u64 {
        self.passes
    }
}

impl System<World> for AtmosphereSystem {
    fn name(&self) -> &str {
        "atmosphere"
    }

    fn priority(&self) -> i32 {
        ATMOS_PRIORITY
    }

    fn update(&mut self, _world: &mut World, dt: f32) -> Result<(), SystemError> {
        self.accumulator += dt;
        while self.accumulator >= ATMOS_PROCESS_INTERVAL {
            self.accumulator -= ATMOS_PROCESS_INTERVAL;
            self.passes += 1;
            // Per-tile mixtures are isolated; a pass moves no gas.
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Gas;

    /// O2 21 mol, N2 79 mol at 293.15 K in 2500 L -- station-standard air.
    fn standard_mixture() -> GasMixture {
        let mut mix = GasMixture::empty(293.15, 2500.0);
        mix.set(Gas::Oxygen, 21.0);
        mix.set(Gas::Nitrogen, 79.0);
        mix
    }

    #[test]
    fn total_moles_sums_species() {
        let mix = standard_mixture();
        assert!((mix.total_moles() - 100.0).abs() < 1e-4);
    }

    #[test]
    fn pressure_ideal_gas() {
        let mix = standard_mixture();
        // P = 100 * 8.314 * 293.15 / 2500 ~= 97.5 kPa
        let expected = 100.0 * 8.314 * 293.15 / 2500.0;
        assert!((mix.pressure() - expected).abs() < 1e-2);
    }

    #[test]
    fn zero_volume_is_zero_pressure() {
        let mut mix = standard_mixture();
        mix.volume = 0.0;
        assert_eq!(mix.pressure(), 0.0);
        mix.volume = -5.0;
        assert_eq!(mix.pressure(), 0.0);
    }

    #[test]
    fn standard_mixture_is_breathable() {
        assert!(is_breathable(&standard_mixture()));
    }

    #[test]
    fn vacuum_is_not_breathable() {
        let mix = GasMixture::empty(293.15, 2500.0);
        assert!(!is_breathable(&mix));
    }

    #[test]
    fn pure_nitrogen_is_not_breathable() {
        let mut mix = GasMixture::empty(293.15, 2500.0);
        mix.set(Gas::Nitrogen, 100.0);
        assert!(!is_breathable(&mix));
    }

    #[test]
    fn oxygen_rich_mixture_is_toxic() {
        let mut mix = GasMixture::empty(293.15, 2500.0);
        mix.set(Gas::Oxygen, 50.0);
        mix.set(Gas::Nitrogen, 50.0);
        assert!(!is_breathable(&mix), "50% O2 is over the toxic threshold");
    }

    #[test]
    fn low_pressure_is_hazardous() {
        let mut mix = standard_mixture();
        // Same composition, a fraction of the moles: pressure collapses.
        for m in mix.moles.iter_mut() {
            *m *= 0.05;
        }
        assert!(!is_breathable(&mix));
    }

    #[test]
    fn update_performs_no_transfer() {
        let mut world = World::new();
        let mut atmos = AtmosphereSystem::new();
        let a = world.spawn();
        let b = world.spawn();
        world.gas_mixtures.insert(a, standard_mixture());
        world.gas_mixtures.insert(b, GasMixture::empty(293.15, 2500.0));

        // Run far past many processing intervals.
        for _ in 0..10_000 {
            atmos.update(&mut world, 1.0 / 30.0).unwrap();
        }
        assert!(atmos.pass_count() > 0, "accumulator must have fired");

        // Isolated mixtures are invariant: no equalization exists.
        let full = world.gas_mixtures.get(a).unwrap();
        let empty = world.gas_mixtures.get(b).unwrap();
        assert!((full.total_moles() - 100.0).abs() < 1e-4);
        assert_eq!(empty.total_moles(), 0.0);
    }

    #[test]
    fn accumulator_fires_at_configured_interval() {
        let mut world = World::new();
        let mut atmos = AtmosphereSystem::new();
        let dt = 0.1;
        // 0.5s interval: 10 ticks of 0.1s = 2 passes.
        for _ in 0..10 {
            atmos.update(&mut world, dt).unwrap();
        }
        assert_eq!(atmos.pass_count(), 2);
    }
}
