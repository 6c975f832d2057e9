//! Full-pipeline simulation tests: scheduler + movement + power + atmosphere
//! over one shared world, mirroring how the server drives a tick.

use outpost_sim::prelude::*;

const DT: f32 = 1.0 / 30.0;

fn build_scheduler() -> Scheduler<World> {
    let mut scheduler = Scheduler::new();
    // Registered out of order on purpose; priorities decide execution order.
    scheduler.register(Box::new(AtmosphereSystem::new()));
    scheduler.register(Box::new(MovementSystem::new()));
    scheduler.register(Box::new(PowerSystem::new()));
    scheduler
}

#[test]
fn priorities_order_the_tick() {
    let scheduler = build_scheduler();
    assert_eq!(
        scheduler.system_names(),
        vec!["movement", "power", "atmosphere"]
    );
}

#[test]
fn full_tick_pipeline_runs_all_systems() {
    let mut world = World::new();
    let mut scheduler = build_scheduler();

    // A walking crew member.
    let crew = world.spawn();
    world.transforms.insert(crew, Transform::at_tile(5, 5));
    world.physics.insert(crew, Physics::walker(4.0));
    world.inputs.insert(
        crew,
        InputState {
            move_x: 1.0,
            move_y: 0.0,
        },
    );

    // A powered room.
    let generator = world.spawn();
    world.producers.insert(
        generator,
        PowerProducer {
            max_output: 1000.0,
            current_output: 1000.0,
            active: true,
        },
    );
    let light = world.spawn();
    world.consumers.insert(
        light,
        PowerConsumer {
            draw: 200.0,
            channel: PowerChannel::Lighting,
            enabled: true,
            powered: false,
        },
    );

    // A tile of standard air.
    let tile = world.spawn();
    let mut air = GasMixture::empty(293.15, 2500.0);
    air.set(Gas::Oxygen, 21.0);
    air.set(Gas::Nitrogen, 79.0);
    world.gas_mixtures.insert(tile, air);

    scheduler.initialize_all(&mut world);
    for _ in 0..60 {
        scheduler.run_tick(&mut world, DT).unwrap();
        // Input is sampled externally each tick; keep it held.
    }

    // Movement: crew walked east, always on whole or interpolated tiles.
    let pos = world.transforms.get(crew).unwrap().position;
    assert!(pos.x > 5.0);
    assert_eq!(pos.y, 5.0);

    // Power: the light saw the supply.
    assert!(world.consumers.get(light).unwrap().powered);

    // Atmosphere: untouched mixture conserved exactly.
    let air_after = world.gas_mixtures.get(tile).unwrap();
    assert!((air_after.total_moles() - 100.0).abs() < 1e-4);
    assert!(is_breathable(air_after));
}

#[test]
fn despawn_mid_simulation_is_clean() {
    let mut world = World::new();
    let mut scheduler = build_scheduler();
    scheduler.initialize_all(&mut world);

    let e = world.spawn();
    world.transforms.insert(e, Transform::at_tile(0, 0));
    world.physics.insert(e, Physics::walker(4.0));
    world.inputs.insert(
        e,
        InputState {
            move_x: 1.0,
            move_y: 0.0,
        },
    );

    // Start a transition, then despawn mid-flight.
    scheduler.run_tick(&mut world, DT).unwrap();
    assert!(world.move_targets.contains(e));
    world.despawn(e).unwrap();

    // Further ticks must not resurrect or fault on the stale handle.
    for _ in 0..10 {
        scheduler.run_tick(&mut world, DT).unwrap();
    }
    assert!(!world.is_alive(e));
    assert!(world.move_targets.get(e).is_none());
}

#[test]
fn faulting_system_halts_the_tick() {
    struct Tripwire;

    impl System<World> for Tripwire {
        fn name(&self) -> &str {
            "tripwire"
        }
        fn priority(&self) -> i32 {
            15 // between movement and power
        }
        fn update(&mut self, _world: &mut World, _dt: f32) -> Result<(), SystemError> {
            Err(SystemError::new("wire tripped"))
        }
    }

    let mut world = World::new();
    let mut scheduler = build_scheduler();
    scheduler.register(Box::new(Tripwire));

    let c = world.spawn();
    world.consumers.insert(
        c,
        PowerConsumer {
            draw: 1.0,
            channel: PowerChannel::Equipment,
            enabled: true,
            powered: false,
        },
    );
    let g = world.spawn();
    world.producers.insert(
        g,
        PowerProducer {
            max_output: 10.0,
            current_output: 10.0,
            active: true,
        },
    );

    let err = scheduler.run_tick(&mut world, DT).unwrap_err();
    assert!(err.to_string().contains("tripwire"));

    // The power system (priority 20) never ran: the flag stayed untouched.
    assert!(!world.consumers.get(c).unwrap().powered);
}
