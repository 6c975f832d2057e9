//! The fixed set of message kinds and packet framing.
//!
//! A [`Packet`] is `tag (1 byte) | tick (u32 LE) | timestamp (u64 LE)` then
//! the fields of its [`Message`]. The tag set is closed: every kind maps to
//! exactly one byte, and an unrecognized byte is a decode failure, never a
//! panic.

use serde::{Deserialize, Serialize};

use crate::codec::{ByteReader, ByteWriter, DecodeError};
use crate::record::NetEntityRecord;

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

/// One-byte discriminant for each message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageTag {
    ConnectRequest = 0x01,
    ConnectAccept = 0x02,
    ConnectDeny = 0x03,
    Disconnect = 0x04,
    WorldSnapshot = 0x10,
    EntitySpawn = 0x11,
    EntityDespawn = 0x12,
    EntityUpdate = 0x13,
    PlayerInput = 0x20,
    PlayerCommand = 0x21,
    PlayerMove = 0x22,
    PlayerInteract = 0x23,
    PlayerSpawned = 0x24,
    Chat = 0x30,
    AdminCommand = 0x31,
}

impl MessageTag {
    /// Map a wire byte back to a tag.
    pub fn from_byte(byte: u8) -> Result<Self, DecodeError> {
        Ok(match byte {
            0x01 => Self::ConnectRequest,
            0x02 => Self::ConnectAccept,
            0x03 => Self::ConnectDeny,
            0x04 => Self::Disconnect,
            0x10 => Self::WorldSnapshot,
            0x11 => Self::EntitySpawn,
            0x12 => Self::EntityDespawn,
            0x13 => Self::EntityUpdate,
            0x20 => Self::PlayerInput,
            0x21 => Self::PlayerCommand,
            0x22 => Self::PlayerMove,
            0x23 => Self::PlayerInteract,
            0x24 => Self::PlayerSpawned,
            0x30 => Self::Chat,
            0x31 => Self::AdminCommand,
            tag => return Err(DecodeError::UnknownTag { tag }),
        })
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Kind-specific payload of a packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Client asks to join, presenting the shared token.
    ConnectRequest {
        /// Wire protocol version the client speaks.
        version: u8,
        /// Shared connection token.
        token: String,
        /// Display name of the joining player.
        player_name: String,
    },
    /// Server grants admission.
    ConnectAccept {
        /// Client id assigned for the lifetime of the process.
        client_id: u32,
        /// Server's fixed tick rate, Hz.
        tick_rate: u32,
    },
    /// Server rejects admission; no further negotiation follows.
    ConnectDeny {
        /// Human-readable reason.
        reason: String,
    },
    /// Either side announces it is leaving.
    Disconnect {
        /// Human-readable reason.
        reason: String,
    },
    /// Full state of every sync-eligible entity.
    WorldSnapshot {
        /// One record per replicated entity.
        entities: Vec<NetEntityRecord>,
    },
    /// A single entity appeared.
    EntitySpawn {
        /// The new entity's full record.
        record: NetEntityRecord,
    },
    /// A single entity vanished.
    EntityDespawn {
        /// Network id of the destroyed entity.
        net_id: u32,
    },
    /// A single entity changed.
    EntityUpdate {
        /// The entity's full record.
        record: NetEntityRecord,
    },
    /// Client's sampled movement axes for this tick.
    PlayerInput {
        /// Desired horizontal movement in [-1, 1].
        move_x: f32,
        /// Desired vertical movement in [-1, 1].
        move_y: f32,
    },
    /// Free-form gameplay command from the client.
    PlayerCommand {
        /// Command text.
        command: String,
    },
    /// Absolute move request (teleport-style, server-validated).
    PlayerMove {
        /// Requested x in tile units.
        x: f32,
        /// Requested y in tile units.
        y: f32,
    },
    /// Client interacts with a replicated entity.
    PlayerInteract {
        /// Target's network id.
        target_net_id: u32,
    },
    /// Server tells a client which entity it controls.
    PlayerSpawned {
        /// Network id of the player's entity.
        net_id: u32,
    },
    /// Chat relayed through the server.
    Chat {
        /// Sender display name.
        sender: String,
        /// Message body.
        text: String,
    },
    /// Privileged command from an admin client.
    AdminCommand {
        /// Command text.
        command: String,
    },
}

impl Message {
    /// The wire tag for this message kind.
    pub fn tag(&self) -> MessageTag {
        match self {
            Message::ConnectRequest { .. } => MessageTag::ConnectRequest,
            Message::ConnectAccept { .. } => MessageTag::ConnectAccept,
            Message::ConnectDeny { .. } => MessageTag::ConnectDeny,
            Message::Disconnect { .. } => MessageTag::Disconnect,
            Message::WorldSnapshot { .. } => MessageTag::WorldSnapshot,
            Message::EntitySpawn { .. } => MessageTag::EntitySpawn,
            Message::EntityDespawn { .. } => MessageTag::EntityDespawn,
            Message::EntityUpdate { .. } => MessageTag::EntityUpdate,
            Message::PlayerInput { .. } => MessageTag::PlayerInput,
            Message::PlayerCommand { .. } => MessageTag::PlayerCommand,
            Message::PlayerMove { .. } => MessageTag::PlayerMove,
            Message::PlayerInteract { .. } => MessageTag::PlayerInteract,
            Message::PlayerSpawned { .. } => MessageTag::PlayerSpawned,
            Message::Chat { .. } => MessageTag::Chat,
            Message::AdminCommand { .. } => MessageTag::AdminCommand,
        }
    }

    fn write_fields(&self, w: &mut ByteWriter) {
        match self {
            Message::ConnectRequest {
                version,
                token,
                player_name,
            } => {
                w.put_u8(*version);
                w.put_string(token);
                w.put_string(player_name);
            }
            Message::ConnectAccept {
                client_id,
                tick_rate,
            } => {
                w.put_u32(*client_id);
                w.put_u32(*tick_rate);
            }
            Message::ConnectDeny { reason } | Message::Disconnect { reason } => {
                w.put_string(reason);
            }
            Message::WorldSnapshot { entities } => {
                w.put_u32(entities.len() as u32);
                for record in entities {
                    record.write(w);
                }
            }
            Message::EntitySpawn { record } | Message::EntityUpdate { record } => {
                record.write(w);
            }
            Message::EntityDespawn { net_id } | Message::PlayerSpawned { net_id } => {
                w.put_u32(*net_id);
            }
            Message::PlayerInput { move_x, move_y } => {
                w.put_f32(*move_x);
                w.put_f32(*move_y);
            }
            Message::PlayerCommand { command } | Message::AdminCommand { command } => {
                w.put_string(command);
            }
            Message::PlayerMove { x, y } => {
                w.put_f32(*x);
                w.put_f32(*y);
            }
            Message::PlayerInteract { target_net_id } => {
                w.put_u32(*target_net_id);
            }
            Message::Chat { sender, text } => {
                w.put_string(sender);
                w.put_string(text);
            }
        }
    }

    fn read_fields(tag: MessageTag, r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(match tag {
            MessageTag::ConnectRequest => Message::ConnectRequest {
                version: r.read_u8()?,
                token: r.read_string()?,
                player_name: r.read_string()?,
            },
            MessageTag::ConnectAccept => Message::ConnectAccept {
                client_id: r.read_u32()?,
                tick_rate: r.read_u32()?,
            },
            MessageTag::ConnectDeny => Message::ConnectDeny {
                reason: r.read_string()?,
            },
            MessageTag::Disconnect => Message::Disconnect {
                reason: r.read_string()?,
            },
            MessageTag::WorldSnapshot => {
                let count = r.read_u32()? as usize;
                let mut entities = Vec::with_capacity(count.min(4096));
                for _ in 0..count {
                    entities.push(NetEntityRecord::read(r)?);
                }
                Message::WorldSnapshot { entities }
            }
            MessageTag::EntitySpawn => Message::EntitySpawn {
                record: NetEntityRecord::read(r)?,
            },
            MessageTag::EntityDespawn => Message::EntityDespawn {
                net_id: r.read_u32()?,
            },
            MessageTag::EntityUpdate => Message::EntityUpdate {
                record: NetEntityRecord::read(r)?,
            },
            MessageTag::PlayerInput => Message::PlayerInput {
                move_x: r.read_f32()?,
                move_y: r.read_f32()?,
            },
            MessageTag::PlayerCommand => Message::PlayerCommand {
                command: r.read_string()?,
            },
            MessageTag::PlayerMove => Message::PlayerMove {
                x: r.read_f32()?,
                y: r.read_f32()?,
            },
            MessageTag::PlayerInteract => Message::PlayerInteract {
                target_net_id: r.read_u32()?,
            },
            MessageTag::PlayerSpawned => Message::PlayerSpawned {
                net_id: r.read_u32()?,
            },
            MessageTag::Chat => Message::Chat {
                sender: r.read_string()?,
                text: r.read_string()?,
            },
            MessageTag::AdminCommand => Message::AdminCommand {
                command: r.read_string()?,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// A framed message: header plus payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Server tick the packet refers to (0 before the first tick).
    pub tick: u32,
    /// Send timestamp, milliseconds since the UNIX epoch.
    pub timestamp: u64,
    /// The payload.
    pub message: Message,
}

impl Packet {
    /// Assemble a packet.
    pub fn new(tick: u32, timestamp: u64, message: Message) -> Self {
        Self {
            tick,
            timestamp,
            message,
        }
    }

    /// Encode to wire bytes. Encoding cannot fail.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(16);
        w.put_u8(self.message.tag() as u8);
        w.put_u32(self.tick);
        w.put_u64(self.timestamp);
        self.message.write_fields(&mut w);
        w.into_bytes()
    }

    /// Decode from wire bytes.
    ///
    /// Fails with an explicit [`DecodeError`] on unknown tags, truncation,
    /// malformed fields, or trailing garbage. Callers log and drop failures;
    /// they are never propagated into simulation state.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = ByteReader::new(bytes);
        let tag = MessageTag::from_byte(r.read_u8()?)?;
        let tick = r.read_u32()?;
        let timestamp = r.read_u64()?;
        let message = Message::read_fields(tag, &mut r)?;
        r.expect_end()?;
        Ok(Self {
            tick,
            timestamp,
            message,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
