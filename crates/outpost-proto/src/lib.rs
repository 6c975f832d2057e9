//! Outpost Proto -- binary framing for the fixed set of network messages.
//!
//! Every packet is one byte of message tag, a small header (tick number and
//! send timestamp), then kind-specific fields. All numeric fields are
//! little-endian fixed width; strings are `u16`-length-prefixed UTF-8. The
//! codec is round-trip exact for every declared field, and malformed or
//! unknown payloads decode to an explicit [`DecodeError`] for the caller to
//! log and drop -- decoding never panics into caller logic.
//!
//! # Quick Start
//!
//! ```
//! use outpost_proto::prelude::*;
//!
//! let packet = Packet::new(42, 1_700_000_000_000, Message::PlayerInput {
//!     move_x: 1.0,
//!     move_y: 0.0,
//! });
//! let bytes = packet.encode();
//! let decoded = Packet::decode(&bytes).unwrap();
//! assert_eq!(decoded, packet);
//! ```

#![deny(unsafe_code)]

pub mod codec;
pub mod message;
pub mod record;

/// Wire protocol version. Carried in `ConnectRequest`; peers with a different
/// version are denied at admission.
pub const PROTOCOL_VERSION: u8 = 1;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::codec::DecodeError;
    pub use crate::message::{Message, MessageTag, Packet};
    pub use crate::record::{NetEntityRecord, NetHealth, NetPhysics, NetTransform};
    pub use crate::PROTOCOL_VERSION;
}
