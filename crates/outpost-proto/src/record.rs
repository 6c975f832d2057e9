//! Wire-format mirror of one simulated entity.
//!
//! A [`NetEntityRecord`] carries the stable network id, the transform, and
//! *optional* physics / sprite / health payloads. Each optional payload has a
//! bit in a flags byte and is present on the wire iff its bit is set -- the
//! server sets a bit only when the source entity actually carries the
//! corresponding component.

use serde::{Deserialize, Serialize};

use crate::codec::{ByteReader, ByteWriter, DecodeError};

/// Flags-byte bit for the physics payload.
const FLAG_PHYSICS: u8 = 1 << 0;
/// Flags-byte bit for the sprite payload.
const FLAG_SPRITE: u8 = 1 << 1;
/// Flags-byte bit for the health payload.
const FLAG_HEALTH: u8 = 1 << 2;

/// Replicated transform fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NetTransform {
    /// Continuous x in tile units.
    pub x: f32,
    /// Continuous y in tile units.
    pub y: f32,
    /// Rotation in radians.
    pub rotation: f32,
    /// Deck/level index.
    pub z_level: i32,
}

/// Replicated physics fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NetPhysics {
    /// Velocity x, tiles per second.
    pub vel_x: f32,
    /// Velocity y, tiles per second.
    pub vel_y: f32,
    /// Grid movement speed, tiles per second.
    pub move_speed: f32,
    /// Mass in kilograms.
    pub mass: f32,
    /// Friction coefficient.
    pub friction: f32,
    /// Blocks passage.
    pub dense: bool,
    /// Immovable.
    pub anchored: bool,
}

/// Replicated hit points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NetHealth {
    /// Current hit points.
    pub current: f32,
    /// Maximum hit points.
    pub max: f32,
}

/// One entity as it crosses the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetEntityRecord {
    /// Stable network id, assigned by the server and never reused.
    pub net_id: u32,
    /// Transform, always present.
    pub transform: NetTransform,
    /// Physics payload, present iff the entity carries physics.
    pub physics: Option<NetPhysics>,
    /// Sprite path, present iff the entity carries a sprite.
    pub sprite: Option<String>,
    /// Hit points, present iff the entity carries health.
    pub health: Option<NetHealth>,
}

impl NetEntityRecord {
    /// Append this record's wire form to `w`.
    pub fn write(&self, w: &mut ByteWriter) {
        w.put_u32(self.net_id);
        w.put_f32(self.transform.x);
        w.put_f32(self.transform.y);
        w.put_f32(self.transform.rotation);
        w.put_i32(self.transform.z_level);

        let mut flags = 0u8;
        if self.physics.is_some() {
            flags |= FLAG_PHYSICS;
        }
        if self.sprite.is_some() {
            flags |= FLAG_SPRITE;
        }
        if self.health.is_some() {
            flags |= FLAG_HEALTH;
        }
        w.put_u8(flags);

        if let Some(p) = &self.physics {
            w.put_f32(p.vel_x);
            w.put_f32(p.vel_y);
            w.put_f32(p.move_speed);
            w.put_f32(p.mass);
            w.put_f32(p.friction);
            w.put_bool(p.dense);
            w.put_bool(p.anchored);
        }
        if let Some(path) = &self.sprite {
            w.put_string(path);
        }
        if let Some(h) = &self.health {
            w.put_f32(h.current);
            w.put_f32(h.max);
        }
    }

    /// Read one record from `r`.
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let net_id = r.read_u32()?;
        let transform = NetTransform {
            x: r.read_f32()?,
            y: r.read_f32()?,
            rotation: r.read_f32()?,
            z_level: r.read_i32()?,
        };
        let flags = r.read_u8()?;

        let physics = if flags & FLAG_PHYSICS != 0 {
            Some(NetPhysics {
                vel_x: r.read_f32()?,
                vel_y: r.read_f32()?,
                move_speed: r.read_f32()?,
                mass: r.read_f32()?,
                friction: r.read_f32()?,
                dense: r.read_bool()?,
                anchored: r.read_bool()?,
            })
        } else {
            None
        };
        let sprite = if flags & FLAG_SPRITE != 0 {
            Some(r.read_string()?)
        } else {
            None
        };
        let health = if flags & FLAG_HEALTH != 0 {
            Some(NetHealth {
                current: r.read_f32()?,
                max: r.read_f32()?,
            })
        } else {
            None
        };

        Ok(Self {
            net_id,
            transform,
            physics,
            sprite,
            health,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
