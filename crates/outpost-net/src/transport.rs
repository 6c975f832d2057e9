//! Transport abstraction and the in-process memory transport.
//!
//! The sync layer never touches sockets directly. The server drives a
//! [`ServerTransport`] and the client a [`ClientTransport`]; both deal in
//! whole packets of bytes, already framed. [`MemoryHub`] and [`MemoryClient`]
//! implement the pair over shared queues so a server and any number of
//! clients can run in one process with no I/O.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::NetError;

/// Opaque handle for one remote peer, unique for the transport's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u64);

/// Delivery class a real transport maps onto its channels. Control traffic
/// goes reliable; snapshots and per-tick input go unreliable, since the next
/// one supersedes a lost one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reliability {
    Reliable,
    Unreliable,
}

/// What a server transport reports when polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A new peer finished the transport-level handshake.
    Connected(PeerId),
    /// A peer went away; no more data will arrive from it.
    Disconnected(PeerId),
    /// One whole packet from a peer.
    Data(PeerId, Vec<u8>),
}

/// Server side of a transport: many peers, event-driven.
pub trait ServerTransport {
    /// Drain everything that arrived since the last poll, in arrival order.
    fn poll(&mut self) -> Vec<TransportEvent>;

    /// Send one packet to one peer.
    fn send(&mut self, peer: PeerId, bytes: Vec<u8>, reliability: Reliability)
        -> Result<(), NetError>;

    /// Drop a peer. Subsequent sends to it fail with
    /// [`NetError::UnknownPeer`].
    fn disconnect(&mut self, peer: PeerId);
}

/// Client side of a transport: one server, packet in / packet out.
pub trait ClientTransport {
    /// Send one packet to the server.
    fn send(&mut self, bytes: Vec<u8>, reliability: Reliability) -> Result<(), NetError>;

    /// Drain packets from the server, in arrival order.
    fn poll(&mut self) -> Vec<Vec<u8>>;

    /// Whether the server side still considers this peer connected.
    fn is_open(&self) -> bool;

    /// Close from the client side; the server sees a disconnect on its next
    /// poll.
    fn close(&mut self);
}

// ---------------------------------------------------------------------------
// Memory transport
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Outbox {
    /// Server-to-client packets not yet polled. Survives closure so a final
    /// packet (a deny, a disconnect notice) is still deliverable.
    queue: VecDeque<Vec<u8>>,
    open: bool,
}

#[derive(Debug, Default)]
struct HubShared {
    next_peer: u64,
    /// Events waiting for the server's next poll.
    to_server: VecDeque<TransportEvent>,
    /// One outbox per peer that ever connected.
    to_clients: HashMap<PeerId, Outbox>,
}

/// Server end of the in-process transport. Clone it freely; all clones and
/// all [`MemoryClient`]s share one set of queues.
#[derive(Debug, Clone, Default)]
pub struct MemoryHub {
    shared: Arc<Mutex<HubShared>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new client. The server sees `Connected` on its next poll.
    pub fn connect(&self) -> MemoryClient {
        let mut shared = self.lock();
        let peer = PeerId(shared.next_peer);
        shared.next_peer += 1;
        shared.to_clients.insert(
            peer,
            Outbox {
                queue: VecDeque::new(),
                open: true,
            },
        );
        shared.to_server.push_back(TransportEvent::Connected(peer));
        MemoryClient {
            shared: Arc::clone(&self.shared),
            peer,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubShared> {
        // A poisoned lock means a panic mid-queue-update in this process;
        // the queues themselves are still structurally valid.
        match self.shared.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ServerTransport for MemoryHub {
    fn poll(&mut self) -> Vec<TransportEvent> {
        self.lock().to_server.drain(..).collect()
    }

    // In-process queues never drop or reorder, so both reliability classes
    // collapse to the same path.
    fn send(
        &mut self,
        peer: PeerId,
        bytes: Vec<u8>,
        _reliability: Reliability,
    ) -> Result<(), NetError> {
        let mut shared = self.lock();
        match shared.to_clients.get_mut(&peer) {
            Some(outbox) if outbox.open => {
                outbox.queue.push_back(bytes);
                Ok(())
            }
            _ => Err(NetError::UnknownPeer(peer)),
        }
    }

    fn disconnect(&mut self, peer: PeerId) {
        if let Some(outbox) = self.lock().to_clients.get_mut(&peer) {
            outbox.open = false;
        }
    }
}

/// Client end of the in-process transport, tied to one [`PeerId`].
#[derive(Debug)]
pub struct MemoryClient {
    shared: Arc<Mutex<HubShared>>,
    peer: PeerId,
}

impl MemoryClient {
    /// The peer id the server knows this client by.
    pub fn peer(&self) -> PeerId {
        self.peer
    }

    fn lock(&self) -> MutexGuard<'_, HubShared> {
        match self.shared.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ClientTransport for MemoryClient {
    fn send(&mut self, bytes: Vec<u8>, _reliability: Reliability) -> Result<(), NetError> {
        let mut shared = self.lock();
        if !shared.to_clients.get(&self.peer).is_some_and(|o| o.open) {
            return Err(NetError::TransportClosed);
        }
        shared
            .to_server
            .push_back(TransportEvent::Data(self.peer, bytes));
        Ok(())
    }

    fn poll(&mut self) -> Vec<Vec<u8>> {
        // Draining is allowed after closure so final packets still arrive.
        let mut shared = self.lock();
        match shared.to_clients.get_mut(&self.peer) {
            Some(outbox) => outbox.queue.drain(..).collect(),
            None => Vec::new(),
        }
    }

    fn is_open(&self) -> bool {
        self.lock().to_clients.get(&self.peer).is_some_and(|o| o.open)
    }

    fn close(&mut self) {
        let mut shared = self.lock();
        let was_open = shared
            .to_clients
            .get_mut(&self.peer)
            .map(|outbox| std::mem::replace(&mut outbox.open, false))
            .unwrap_or(false);
        if was_open {
            shared
                .to_server
                .push_back(TransportEvent::Disconnected(self.peer));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
