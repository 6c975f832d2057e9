//! Aggregate power-grid bookkeeping.
//!
//! Pure aggregation each tick, with no persistent routing graph:
//!
//! - supply = sum of `current_output` over active producers
//! - demand = sum of `draw` over enabled consumers
//! - every enabled consumer's `powered` flag becomes `supply >= demand`
//!   (binary allocation: the whole grid is powered or none of it is)
//! - surplus charges batteries, deficit discharges them, each battery at its
//!   own rate clamped to `[0, capacity]`
//!
//! Batteries do not feed back into the same tick's supply. The pass is single
//! sweep, not iterated to a fixed point; that behavior is load-bearing and
//! must be preserved.

use outpost_ecs::schedule::{System, SystemError};

use crate::world::World;

/// Priority of the power system in the tick order.
pub const POWER_PRIORITY: i32 = 20;

/// The power system. State lives entirely in components; the system itself
/// only carries its last-computed totals for observability.
#[derive(Debug, Default)]
pub struct PowerSystem {
    last_supply: f32,
    last_demand: f32,
}

impl PowerSystem {
    /// Create the power system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total supply computed on the most recent tick.
    pub fn last_supply(&self) -> f32 {
        self.last_supply
    }

    /// Total demand computed on the most recent tick.
    pub fn last_demand(&self) -> f32 {
        self.last_demand
    }
}

impl System<World> for PowerSystem {
    fn name(&self) -> &str {
        "power"
    }

    fn priority(&self) -> i32 {
        POWER_PRIORITY
    }

    fn update(&mut self, world: &mut World, dt: f32) -> Result<(), SystemError> {
        let supply: f32 = world
            .producers
            .iter()
            .filter(|(_, p)| p.active)
            .map(|(_, p)| p.current_output)
            .sum();
        let demand: f32 = world
            .consumers
            .iter()
            .filter(|(_, c)| c.enabled)
            .map(|(_, c)| c.draw)
            .sum();

        let grid_powered = supply >= demand;
        for (_, consumer) in world.consumers.iter_mut() {
            consumer.powered = consumer.enabled && grid_powered;
        }

        let surplus = supply - demand;
        for (_, battery) in world.batteries.iter_mut() {
            if surplus > 0.0 {
                let delta = surplus.min(battery.max_charge_rate * dt);
                battery.charge = (battery.charge + delta).min(battery.capacity);
            } else if surplus < 0.0 {
                let delta = (-surplus).min(battery.max_discharge_rate * dt);
                battery.charge = (battery.charge - delta).max(0.0);
            }
        }

        self.last_supply = supply;
        self.last_demand = demand;
        tracing::trace!(supply, demand, grid_powered, "power pass");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Battery, PowerChannel, PowerConsumer, PowerProducer};

    const DT: f32 = 1.0 / 30.0;

    fn add_producer(world: &mut World, output: f32, active: bool) {
        let e = world.spawn();
        world.producers.insert(
            e,
            PowerProducer {
                max_output: output,
                current_output: output,
                active,
            },
        );
    }

    fn add_consumer(world: &mut World, draw: f32, enabled: bool) -> outpost_ecs::entity::Entity {
        let e = world.spawn();
        world.consumers.insert(
            e,
            PowerConsumer {
                draw,
                channel: PowerChannel::Equipment,
                enabled,
                powered: false,
            },
        );
        e
    }

    #[test]
    fn undersupply_unpowers_everything() {
        let mut world = World::new();
        let mut power = PowerSystem::new();
        add_producer(&mut world, 900.0, true);
        let a = add_consumer(&mut world, 600.0, true);
        let b = add_consumer(&mut world, 400.0, true);

        power.update(&mut world, DT).unwrap();

        // 900 supply vs 1000 demand: binary allocation, nothing is powered.
        assert!(!world.consumers.get(a).unwrap().powered);
        assert!(!world.consumers.get(b).unwrap().powered);
        assert_eq!(power.last_supply(), 900.0);
        assert_eq!(power.last_demand(), 1000.0);
    }

    #[test]
    fn oversupply_powers_everything() {
        let mut world = World::new();
        let mut power = PowerSystem::new();
        add_producer(&mut world, 1100.0, true);
        let a = add_consumer(&mut world, 600.0, true);
        let b = add_consumer(&mut world, 400.0, true);

        power.update(&mut world, DT).unwrap();

        assert!(world.consumers.get(a).unwrap().powered);
        assert!(world.consumers.get(b).unwrap().powered);
    }

    #[test]
    fn disabled_consumer_excluded_and_unpowered() {
        let mut world = World::new();
        let mut power = PowerSystem::new();
        add_producer(&mut world, 500.0, true);
        let on = add_consumer(&mut world, 400.0, true);
        let off = add_consumer(&mut world, 9000.0, false);

        power.update(&mut world, DT).unwrap();

        // The disabled consumer contributes no demand and never reads powered.
        assert!(world.consumers.get(on).unwrap().powered);
        assert!(!world.consumers.get(off).unwrap().powered);
        assert_eq!(power.last_demand(), 400.0);
    }

    #[test]
    fn inactive_producer_contributes_nothing() {
        let mut world = World::new();
        let mut power = PowerSystem::new();
        add_producer(&mut world, 1000.0, false);
        let c = add_consumer(&mut world, 10.0, true);

        power.update(&mut world, DT).unwrap();
        assert!(!world.consumers.get(c).unwrap().powered);
        assert_eq!(power.last_supply(), 0.0);
    }

    #[test]
    fn surplus_charges_battery_at_rate() {
        let mut world = World::new();
        let mut power = PowerSystem::new();
        add_producer(&mut world, 1000.0, true);
        add_consumer(&mut world, 400.0, true);
        let b = world.spawn();
        world.batteries.insert(
            b,
            Battery {
                capacity: 10_000.0,
                charge: 0.0,
                max_charge_rate: 300.0,
                max_discharge_rate: 300.0,
            },
        );

        power.update(&mut world, DT).unwrap();

        // Surplus 600 exceeds the rate; charge rises by rate * dt only.
        let expected = 300.0 * DT;
        let charge = world.batteries.get(b).unwrap().charge;
        assert!((charge - expected).abs() < 1e-4, "charge {charge}");
    }

    #[test]
    fn deficit_discharges_battery_floored_at_zero() {
        let mut world = World::new();
        let mut power = PowerSystem::new();
        add_consumer(&mut world, 50.0, true);
        let b = world.spawn();
        world.batteries.insert(
            b,
            Battery {
                capacity: 1000.0,
                charge: 0.5,
                max_charge_rate: 100.0,
                max_discharge_rate: 100.0,
            },
        );

        // Deficit 50 each tick; battery bottoms out at zero, never negative.
        for _ in 0..10 {
            power.update(&mut world, DT).unwrap();
        }
        assert_eq!(world.batteries.get(b).unwrap().charge, 0.0);
    }

    #[test]
    fn charge_capped_at_capacity() {
        let mut world = World::new();
        let mut power = PowerSystem::new();
        add_producer(&mut world, 10_000.0, true);
        let b = world.spawn();
        world.batteries.insert(
            b,
            Battery {
                capacity: 100.0,
                charge: 99.9,
                max_charge_rate: 10_000.0,
                max_discharge_rate: 100.0,
            },
        );

        power.update(&mut world, DT).unwrap();
        assert_eq!(world.batteries.get(b).unwrap().charge, 100.0);
    }

    #[test]
    fn battery_does_not_feed_same_tick_supply() {
        let mut world = World::new();
        let mut power = PowerSystem::new();
        // Demand 100, no producers, a fully charged battery.
        let c = add_consumer(&mut world, 100.0, true);
        let b = world.spawn();
        world.batteries.insert(
            b,
            Battery {
                capacity: 1000.0,
                charge: 1000.0,
                max_charge_rate: 100.0,
                max_discharge_rate: 1000.0,
            },
        );

        power.update(&mut world, DT).unwrap();

        // Single pass: the battery discharged toward the deficit, but supply
        // was computed before it did, so the consumer stays unpowered.
        assert!(!world.consumers.get(c).unwrap().powered);
        assert!(world.batteries.get(b).unwrap().charge < 1000.0);
    }
}
