//! Outpost Net -- connection admission and full-snapshot state sync.
//!
//! The server owns the authoritative [`outpost_sim::world::World`] and its
//! scheduler. Each tick it drains the transport, applies client input to the
//! entities those clients control, runs one simulation step, and broadcasts a
//! full snapshot of every replicated entity. Clients keep a local replica and
//! reconcile it against the newest snapshot, creating and destroying local
//! entities so the replica's id set always matches the server's.
//!
//! Transports are pluggable behind [`transport::ServerTransport`] and
//! [`transport::ClientTransport`]; the in-memory pair in the same module wires
//! a server and its clients together inside one process for tests and demos.
//!
//! # Quick Start
//!
//! ```
//! use outpost_net::prelude::*;
//!
//! let hub = MemoryHub::new();
//! let mut client = Client::new(hub.connect());
//! let mut server = Server::new(hub, ServerConfig::default());
//!
//! client.connect("", "Ripley").unwrap();
//! server.tick(1.0 / 30.0).unwrap();
//! client.poll().unwrap();
//! assert!(matches!(client.state(), ClientState::Connected { .. }));
//! ```

#![deny(unsafe_code)]

pub mod client;
pub mod id_map;
pub mod server;
pub mod transport;

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::transport::PeerId;

/// Errors from the networking layer.
///
/// Malformed packets from remote peers are not errors at this level; they are
/// logged and dropped where they are decoded. These variants cover local
/// misuse and fatal simulation failures.
#[derive(Debug, Error)]
pub enum NetError {
    /// The transport is closed; no further traffic is possible.
    #[error("transport is closed")]
    TransportClosed,

    /// A send targeted a peer the transport no longer knows.
    #[error("peer {0:?} is not connected")]
    UnknownPeer(PeerId),

    /// A client operation that requires an established connection.
    #[error("not connected to a server")]
    NotConnected,

    /// A simulation system failed; the server tick is aborted.
    #[error("simulation tick failed")]
    Simulation(#[from] outpost_ecs::schedule::SchedulerError),
}

/// Milliseconds since the UNIX epoch, for packet timestamps. Clamps to zero
/// if the system clock reads before the epoch.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::client::{Client, ClientState};
    pub use crate::id_map::NetworkIdMap;
    pub use crate::server::{Server, ServerConfig, ServerEvent};
    pub use crate::transport::{
        ClientTransport, MemoryClient, MemoryHub, PeerId, Reliability, ServerTransport,
        TransportEvent,
    };
    pub use crate::NetError;
}
