//! Grid-locked movement state machine.
//!
//! Each entity is in one of two movement states: **Idle** (no
//! [`MoveTarget`]) or **Moving** (a [`MoveTarget`] is attached). The system
//! runs two passes per tick:
//!
//! 1. Advance every outstanding transition by `speed * dt`, interpolating the
//!    transform between the captured start position and the target tile.
//!    When progress reaches 1.0 the transform is snapped to the *exact*
//!    integer target and the marker is removed -- positions are never left
//!    fractional.
//! 2. Evaluate input for idle, non-anchored entities. Axes are thresholded at
//!    magnitude 0.5 into a step in {-1, 0, 1}; diagonal input resolves to the
//!    horizontal axis only. The destination tile (rounded current tile plus
//!    step) is checked against the injected passability predicate before a
//!    transition starts.
//!
//! An entity mid-transition ignores new input entirely; there is no
//! redirection.

use outpost_ecs::schedule::{System, SystemError};

use crate::components::{MoveTarget, Vec2};
use crate::constants::INPUT_STEP_THRESHOLD;
use crate::world::World;

/// Tile passability oracle. Injected by the map layer; this core never owns
/// tile data.
pub type PassabilityFn = Box<dyn Fn(i32, i32) -> bool + Send + Sync>;

/// Priority of the movement system in the tick order.
pub const MOVEMENT_PRIORITY: i32 = 10;

/// The movement system. See the module docs for the state machine.
pub struct MovementSystem {
    /// External passability predicate; `None` means every tile is passable.
    passability: Option<PassabilityFn>,
}

impl Default for MovementSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MovementSystem {
    /// A movement system that treats every tile as passable.
    pub fn new() -> Self {
        Self { passability: None }
    }

    /// A movement system with an injected passability predicate.
    pub fn with_passability(predicate: PassabilityFn) -> Self {
        Self {
            passability: Some(predicate),
        }
    }

    /// Replace the passability predicate.
    pub fn set_passability(&mut self, predicate: PassabilityFn) {
        self.passability = Some(predicate);
    }

    fn is_passable(&self, x: i32, y: i32) -> bool {
        match &self.passability {
            Some(p) => p(x, y),
            None => true,
        }
    }

    /// Threshold one input axis into a discrete step.
    fn axis_step(value: f32) -> i32 {
        if value >= INPUT_STEP_THRESHOLD {
            1
        } else if value <= -INPUT_STEP_THRESHOLD {
            -1
        } else {
            0
        }
    }

    /// Pass 1: advance outstanding transitions, snapping completed ones.
    fn advance_transitions(world: &mut World, dt: f32) {
        let mut completed = Vec::new();
        let move_targets = &mut world.move_targets;
        let transforms = &mut world.transforms;

        for (entity, target) in move_targets.iter_mut() {
            let Some(transform) = transforms.get_mut(entity) else {
                // Transform was detached externally; the marker is orphaned.
                completed.push(entity);
                continue;
            };
            target.progress += target.speed * dt;
            if target.progress >= 1.0 {
                // Exact integer destination, no residual interpolation error.
                transform.position = Vec2::new(target.target_x as f32, target.target_y as f32);
                completed.push(entity);
            } else {
                let dest = Vec2::new(target.target_x as f32, target.target_y as f32);
                transform.position = target.start.lerp(dest, target.progress);
            }
        }

        for entity in completed {
            world.move_targets.remove(entity);
        }
    }

    /// Pass 2: start transitions for idle entities with thresholded input.
    fn start_transitions(&self, world: &mut World) {
        let mut started = Vec::new();

        for (entity, input) in world.inputs.iter() {
            if world.move_targets.contains(entity) {
                continue; // mid-transition: input is ignored
            }
            let Some(physics) = world.physics.get(entity) else {
                continue;
            };
            if physics.anchored {
                continue;
            }
            let Some(transform) = world.transforms.get(entity) else {
                continue;
            };

            let dx = Self::axis_step(input.move_x);
            let mut dy = Self::axis_step(input.move_y);
            if dx != 0 && dy != 0 {
                // Horizontal wins; diagonal motion does not exist on the grid.
                dy = 0;
            }
            if dx == 0 && dy == 0 {
                continue;
            }

            let (tile_x, tile_y) = transform.tile();
            let (dest_x, dest_y) = (tile_x + dx, tile_y + dy);
            if !self.is_passable(dest_x, dest_y) {
                tracing::trace!(%entity, dest_x, dest_y, "destination tile impassable");
                continue;
            }

            started.push((
                entity,
                MoveTarget {
                    target_x: dest_x,
                    target_y: dest_y,
                    progress: 0.0,
                    speed: physics.move_speed,
                    start: transform.position,
                },
            ));
        }

        for (entity, target) in started {
            world.move_targets.insert(entity, target);
        }
    }
}

impl System<World> for MovementSystem {
    fn name(&self) -> &str {
        "movement"
    }

    fn priority(&self) -> i32 {
        MOVEMENT_PRIORITY
    }

    fn update(&mut self, world: &mut World, dt: f32) -> Result<(), SystemError> {
        Self::advance_transitions(world, dt);
        self.start_transitions(world);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{InputState, Physics, Transform};

    const DT: f32 = 1.0 / 30.0;

    fn spawn_walker(world: &mut World, x: i32, y: i32, speed: f32) -> outpost_ecs::entity::Entity {
        let e = world.spawn();
        world.transforms.insert(e, Transform::at_tile(x, y));
        world.physics.insert(e, Physics::walker(speed));
        world.inputs.insert(e, InputState::default());
        e
    }

    fn run_ticks(system: &mut MovementSystem, world: &mut World, ticks: usize) {
        for _ in 0..ticks {
            system.update(world, DT).unwrap();
        }
    }

    #[test]
    fn step_right_snaps_to_exact_target() {
        let mut world = World::new();
        let mut movement = MovementSystem::new();
        let e = spawn_walker(&mut world, 5, 5, 4.0);

        // One sampled step of input, then cleared.
        world.inputs.get_mut(e).unwrap().move_x = 1.0;
        movement.update(&mut world, DT).unwrap();
        world.inputs.get_mut(e).unwrap().move_x = 0.0;

        run_ticks(&mut movement, &mut world, 30);

        let pos = world.transforms.get(e).unwrap().position;
        assert!((pos.x - 6.0).abs() <= 0.001, "x not snapped: {}", pos.x);
        assert!((pos.y - 5.0).abs() <= 0.001, "y drifted: {}", pos.y);
        // Transition finished: exact, and the marker is gone.
        assert_eq!(pos, Vec2::new(6.0, 5.0));
        assert!(!world.move_targets.contains(e));
    }

    #[test]
    fn diagonal_input_resolves_horizontal() {
        let mut world = World::new();
        let mut movement = MovementSystem::new();
        let e = spawn_walker(&mut world, 5, 5, 4.0);

        world.inputs.get_mut(e).unwrap().move_x = 1.0;
        world.inputs.get_mut(e).unwrap().move_y = 1.0;
        movement.update(&mut world, DT).unwrap();

        let target = world.move_targets.get(e).expect("transition started");
        assert_eq!((target.target_x, target.target_y), (6, 5));
    }

    #[test]
    fn sub_threshold_input_is_ignored() {
        let mut world = World::new();
        let mut movement = MovementSystem::new();
        let e = spawn_walker(&mut world, 5, 5, 4.0);

        world.inputs.get_mut(e).unwrap().move_x = 0.49;
        movement.update(&mut world, DT).unwrap();
        assert!(!world.move_targets.contains(e));

        world.inputs.get_mut(e).unwrap().move_x = -0.5;
        movement.update(&mut world, DT).unwrap();
        let target = world.move_targets.get(e).unwrap();
        assert_eq!((target.target_x, target.target_y), (4, 5));
    }

    #[test]
    fn anchored_entities_never_move() {
        let mut world = World::new();
        let mut movement = MovementSystem::new();
        let e = world.spawn();
        world.transforms.insert(e, Transform::at_tile(3, 3));
        world.physics.insert(e, Physics::fixture());
        world.inputs.insert(
            e,
            InputState {
                move_x: 1.0,
                move_y: -1.0,
            },
        );

        run_ticks(&mut movement, &mut world, 100);

        assert_eq!(
            world.transforms.get(e).unwrap().position,
            Vec2::new(3.0, 3.0)
        );
        assert!(!world.move_targets.contains(e));
    }

    #[test]
    fn impassable_destination_pins_entity() {
        let mut world = World::new();
        // Nothing east of x = 5 is passable.
        let mut movement = MovementSystem::with_passability(Box::new(|x, _y| x <= 5));
        let e = spawn_walker(&mut world, 5, 5, 4.0);
        world.inputs.get_mut(e).unwrap().move_x = 1.0;

        run_ticks(&mut movement, &mut world, 100);

        assert_eq!(
            world.transforms.get(e).unwrap().position,
            Vec2::new(5.0, 5.0)
        );
        assert!(!world.move_targets.contains(e));
    }

    #[test]
    fn input_ignored_mid_transition() {
        let mut world = World::new();
        let mut movement = MovementSystem::new();
        let e = spawn_walker(&mut world, 5, 5, 4.0);

        world.inputs.get_mut(e).unwrap().move_x = 1.0;
        movement.update(&mut world, DT).unwrap();
        assert_eq!(world.move_targets.get(e).unwrap().target_x, 6);

        // Reverse input mid-transition: target must not change.
        world.inputs.get_mut(e).unwrap().move_x = -1.0;
        movement.update(&mut world, DT).unwrap();
        let target = world.move_targets.get(e).unwrap();
        assert_eq!((target.target_x, target.target_y), (6, 5));
    }

    #[test]
    fn held_input_chains_transitions() {
        let mut world = World::new();
        let mut movement = MovementSystem::new();
        let e = spawn_walker(&mut world, 0, 0, 4.0);
        world.inputs.get_mut(e).unwrap().move_y = 1.0;

        // Plenty of ticks for several chained one-tile transitions.
        run_ticks(&mut movement, &mut world, 90);

        let pos = world.transforms.get(e).unwrap().position;
        assert_eq!(pos.x, 0.0);
        assert!(pos.y >= 3.0, "expected several tiles of travel: {}", pos.y);
    }

    #[test]
    fn interpolation_stays_between_tiles() {
        let mut world = World::new();
        let mut movement = MovementSystem::new();
        let e = spawn_walker(&mut world, 5, 5, 4.0);
        world.inputs.get_mut(e).unwrap().move_x = 1.0;
        movement.update(&mut world, DT).unwrap();
        world.inputs.get_mut(e).unwrap().move_x = 0.0;

        // Mid-transition position stays inside [5, 6].
        movement.update(&mut world, DT).unwrap();
        let pos = world.transforms.get(e).unwrap().position;
        assert!(pos.x > 5.0 && pos.x < 6.0, "mid-lerp x: {}", pos.x);
        assert_eq!(pos.y, 5.0);
    }
}
