//! Property tests for the power grid's binary allocation.
//!
//! Random grids of producers, consumers, and batteries, ticked a few times;
//! after every tick the powered flags must all agree with the supply/demand
//! comparison and battery charge must stay inside `[0, capacity]`.

use outpost_sim::prelude::*;
use proptest::prelude::*;

const DT: f32 = 1.0 / 30.0;

#[derive(Debug, Clone)]
struct ProducerSpec {
    output: f32,
    active: bool,
}

#[derive(Debug, Clone)]
struct ConsumerSpec {
    draw: f32,
    enabled: bool,
}

#[derive(Debug, Clone)]
struct BatterySpec {
    capacity: f32,
    charge_fraction: f32,
    rate: f32,
}

/// Watt-scale values from an integer range, keeping sums exact enough that
/// no float-rounding ambiguity creeps into the supply/demand comparison.
fn watts() -> impl Strategy<Value = f32> {
    (0..2_000u32).prop_map(|v| v as f32)
}

fn producer_spec() -> impl Strategy<Value = ProducerSpec> {
    (watts(), any::<bool>()).prop_map(|(output, active)| ProducerSpec { output, active })
}

fn consumer_spec() -> impl Strategy<Value = ConsumerSpec> {
    (watts(), any::<bool>()).prop_map(|(draw, enabled)| ConsumerSpec { draw, enabled })
}

fn battery_spec() -> impl Strategy<Value = BatterySpec> {
    (1..10_000u32, 0..=100u32, 1..500u32).prop_map(|(capacity, fraction, rate)| BatterySpec {
        capacity: capacity as f32,
        charge_fraction: fraction as f32 / 100.0,
        rate: rate as f32,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn binary_allocation_holds_for_any_grid(
        producers in prop::collection::vec(producer_spec(), 0..8),
        consumers in prop::collection::vec(consumer_spec(), 0..8),
        batteries in prop::collection::vec(battery_spec(), 0..4),
        ticks in 1..6u32,
    ) {
        let mut world = World::new();
        let mut power = PowerSystem::new();

        for spec in &producers {
            let e = world.spawn();
            world.producers.insert(e, PowerProducer {
                max_output: spec.output,
                current_output: spec.output,
                active: spec.active,
            });
        }
        let mut consumer_entities = Vec::new();
        for spec in &consumers {
            let e = world.spawn();
            world.consumers.insert(e, PowerConsumer {
                draw: spec.draw,
                channel: PowerChannel::Equipment,
                enabled: spec.enabled,
                powered: false,
            });
            consumer_entities.push(e);
        }
        let mut battery_entities = Vec::new();
        for spec in &batteries {
            let e = world.spawn();
            world.batteries.insert(e, Battery {
                capacity: spec.capacity,
                charge: spec.capacity * spec.charge_fraction,
                max_charge_rate: spec.rate,
                max_discharge_rate: spec.rate,
            });
            battery_entities.push(e);
        }

        let supply: f32 = producers.iter().filter(|p| p.active).map(|p| p.output).sum();
        let demand: f32 = consumers.iter().filter(|c| c.enabled).map(|c| c.draw).sum();
        let grid_powered = supply >= demand;

        for _ in 0..ticks {
            power.update(&mut world, DT).unwrap();

            prop_assert_eq!(power.last_supply(), supply);
            prop_assert_eq!(power.last_demand(), demand);
            for (spec, &e) in consumers.iter().zip(&consumer_entities) {
                let consumer = world.consumers.get(e).unwrap();
                prop_assert_eq!(
                    consumer.powered,
                    spec.enabled && grid_powered,
                    "consumer draw={} enabled={}", spec.draw, spec.enabled
                );
            }
            for (spec, &e) in batteries.iter().zip(&battery_entities) {
                let battery = world.batteries.get(e).unwrap();
                prop_assert!(
                    battery.charge >= 0.0 && battery.charge <= battery.capacity,
                    "battery charge {} outside [0, {}]", battery.charge, spec.capacity
                );
            }
        }
    }

    #[test]
    fn battery_charge_moves_with_the_sign_of_the_surplus(
        supply in 0..2_000u32,
        demand in 0..2_000u32,
        spec in battery_spec(),
    ) {
        let mut world = World::new();
        let mut power = PowerSystem::new();

        let p = world.spawn();
        world.producers.insert(p, PowerProducer {
            max_output: supply as f32,
            current_output: supply as f32,
            active: true,
        });
        let c = world.spawn();
        world.consumers.insert(c, PowerConsumer {
            draw: demand as f32,
            channel: PowerChannel::Equipment,
            enabled: true,
            powered: false,
        });
        let b = world.spawn();
        let initial = spec.capacity * spec.charge_fraction;
        world.batteries.insert(b, Battery {
            capacity: spec.capacity,
            charge: initial,
            max_charge_rate: spec.rate,
            max_discharge_rate: spec.rate,
        });

        power.update(&mut world, DT).unwrap();

        let charge = world.batteries.get(b).unwrap().charge;
        if supply > demand {
            prop_assert!(charge >= initial);
        } else if supply < demand {
            prop_assert!(charge <= initial);
        } else {
            prop_assert_eq!(charge, initial);
        }
    }
}
