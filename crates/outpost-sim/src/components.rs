//! The closed set of component types stored by the [`World`](crate::world::World).
//!
//! Components are plain value types keyed by entity. Each type has its own
//! column in the world; attaching several component types to one entity is
//! just inserting into several columns.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Math
// ---------------------------------------------------------------------------

/// 2D float vector used for positions and velocities.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Vec2 {
    /// Construct a vector from components.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Linear interpolation between `self` and `other` by `t` in [0, 1].
    pub fn lerp(self, other: Vec2, t: f32) -> Vec2 {
        Vec2 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

// ---------------------------------------------------------------------------
// Spatial components
// ---------------------------------------------------------------------------

/// Position, rotation and z-level of an entity.
///
/// Mutated by the movement system while a [`MoveTarget`] is outstanding, or
/// externally on spawn; never left at a fractional tile value once a
/// transition completes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Continuous position in tile units.
    pub position: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    /// Vertical deck/level index.
    pub z_level: i32,
}

impl Transform {
    /// A transform snapped to the center of tile `(x, y)` on z-level 0.
    pub fn at_tile(x: i32, y: i32) -> Self {
        Self {
            position: Vec2::new(x as f32, y as f32),
            rotation: 0.0,
            z_level: 0,
        }
    }

    /// The tile this transform currently occupies (rounded position).
    pub fn tile(&self) -> (i32, i32) {
        (
            self.position.x.round() as i32,
            self.position.y.round() as i32,
        )
    }
}

/// Physical properties of an entity.
///
/// Anchored entities are excluded from all movement transitions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Physics {
    /// Continuous velocity, tile units per second.
    pub velocity: Vec2,
    /// Movement speed in tiles per second for grid transitions.
    pub move_speed: f32,
    /// Mass in kilograms.
    pub mass: f32,
    /// Friction coefficient.
    pub friction: f32,
    /// Whether the entity blocks passage through its tile.
    pub dense: bool,
    /// Whether the entity is bolted down and immovable.
    pub anchored: bool,
}

impl Physics {
    /// A mobile, dense entity that walks at `move_speed` tiles/second.
    pub fn walker(move_speed: f32) -> Self {
        Self {
            velocity: Vec2::default(),
            move_speed,
            mass: 70.0,
            friction: 0.4,
            dense: true,
            anchored: false,
        }
    }

    /// A bolted-down structure (wall, machine).
    pub fn fixture() -> Self {
        Self {
            velocity: Vec2::default(),
            move_speed: 0.0,
            mass: 200.0,
            friction: 1.0,
            dense: true,
            anchored: true,
        }
    }
}

/// Transient marker for an entity mid-transition between two grid tiles.
///
/// Created when input requests a cardinal step onto a passable tile; removed
/// the tick `progress` reaches 1.0, at which point the transform is snapped
/// to the exact integer target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveTarget {
    /// Destination tile x.
    pub target_x: i32,
    /// Destination tile y.
    pub target_y: i32,
    /// Transition progress in [0, 1].
    pub progress: f32,
    /// Transition speed, tiles per second.
    pub speed: f32,
    /// Continuous position captured when the transition started.
    pub start: Vec2,
}

/// Desired movement axes sampled from a player, each in [-1, 1].
///
/// Consumed, not owned, by the movement system; reset to zero externally
/// between samples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputState {
    /// Desired horizontal movement.
    pub move_x: f32,
    /// Desired vertical movement.
    pub move_y: f32,
}

// ---------------------------------------------------------------------------
// Power components
// ---------------------------------------------------------------------------

/// Power distribution channel a consumer draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PowerChannel {
    /// General equipment load.
    #[default]
    Equipment,
    /// Lighting load.
    Lighting,
    /// Life-support load.
    Environment,
}

/// A generator feeding the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerProducer {
    /// Maximum output, watts.
    pub max_output: f32,
    /// Output currently produced, watts.
    pub current_output: f32,
    /// Whether the producer is running.
    pub active: bool,
}

/// A machine drawing from the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerConsumer {
    /// Draw when powered, watts.
    pub draw: f32,
    /// Channel this consumer belongs to.
    pub channel: PowerChannel,
    /// Whether the machine is switched on.
    pub enabled: bool,
    /// Whether the grid is currently meeting this consumer's draw.
    /// Written by the power system each tick; read-only elsewhere.
    pub powered: bool,
}

/// An energy store smoothing over grid surplus and deficit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    /// Maximum stored energy, joules.
    pub capacity: f32,
    /// Currently stored energy, joules.
    pub charge: f32,
    /// Maximum charge rate, watts.
    pub max_charge_rate: f32,
    /// Maximum discharge rate, watts.
    pub max_discharge_rate: f32,
}

// ---------------------------------------------------------------------------
// Atmosphere components
// ---------------------------------------------------------------------------

/// Gas species tracked in a mixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(usize)]
pub enum Gas {
    /// Breathable oxygen.
    Oxygen = 0,
    /// Inert nitrogen filler.
    Nitrogen = 1,
    /// Exhaled carbon dioxide.
    CarbonDioxide = 2,
    /// Flammable plasma.
    Plasma = 3,
}

/// Number of tracked gas species.
pub const GAS_SPECIES: usize = 4;

/// Per-entity gas mixture: moles of each species, temperature and volume.
///
/// There is no cross-entity gas transfer in this core; a mixture only changes
/// when something external mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasMixture {
    /// Moles of each gas species, indexed by [`Gas`].
    pub moles: [f32; GAS_SPECIES],
    /// Temperature in Kelvin.
    pub temperature: f32,
    /// Volume in liters.
    pub volume: f32,
}

impl GasMixture {
    /// An empty mixture at the given temperature and volume.
    pub fn empty(temperature: f32, volume: f32) -> Self {
        Self {
            moles: [0.0; GAS_SPECIES],
            temperature,
            volume,
        }
    }

    /// Moles of one species.
    pub fn get(&self, gas: Gas) -> f32 {
        self.moles[gas as usize]
    }

    /// Set the moles of one species.
    pub fn set(&mut self, gas: Gas, moles: f32) {
        self.moles[gas as usize] = moles;
    }
}

// ---------------------------------------------------------------------------
// Replication payload components
// ---------------------------------------------------------------------------

/// Display identifier handed to the client renderer.
///
/// The atlas that resolves it is an external collaborator; this core only
/// carries the string across the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    /// Resource path of the sprite.
    pub path: String,
}

/// Hit points, replicated when present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// Current hit points.
    pub current: f32,
    /// Maximum hit points.
    pub max: f32,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints_exact() {
        let a = Vec2::new(5.0, 5.0);
        let b = Vec2::new(6.0, 5.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Vec2::new(5.5, 5.0));
    }

    #[test]
    fn transform_tile_rounds() {
        let mut t = Transform::at_tile(5, 5);
        assert_eq!(t.tile(), (5, 5));
        t.position = Vec2::new(5.49, 4.51);
        assert_eq!(t.tile(), (5, 5));
        t.position = Vec2::new(5.51, 4.49);
        assert_eq!(t.tile(), (6, 4));
    }

    #[test]
    fn mixture_species_accessors() {
        let mut mix = GasMixture::empty(293.15, 2500.0);
        mix.set(Gas::Oxygen, 21.0);
        mix.set(Gas::Nitrogen, 79.0);
        assert_eq!(mix.get(Gas::Oxygen), 21.0);
        assert_eq!(mix.get(Gas::CarbonDioxide), 0.0);
    }
}
