//! Client-side replica: handshake, snapshot intake, reconciliation.
//!
//! The client never simulates; its [`World`] is a mirror rebuilt from server
//! snapshots. Snapshots queue up to a small fixed depth between applications;
//! applying always takes the newest and discards the rest, so a client that
//! stalls catches up in one step instead of replaying a backlog. After every
//! apply, the set of locally tracked network ids equals exactly the id set of
//! the applied snapshot.

use std::collections::{HashSet, VecDeque};

use outpost_ecs::entity::Entity;
use outpost_proto::message::{Message, Packet};
use outpost_proto::record::NetEntityRecord;
use outpost_proto::PROTOCOL_VERSION;
use outpost_sim::components::{Health, Physics, Sprite, Transform, Vec2};
use outpost_sim::world::World;
use tracing::{debug, info, warn};

use crate::id_map::NetworkIdMap;
use crate::transport::{ClientTransport, Reliability};
use crate::{unix_millis, NetError};

/// Snapshots buffered between [`Client::poll`] and [`Client::apply_pending`].
/// When full, the oldest is dropped; only the newest ever gets applied.
pub const SNAPSHOT_QUEUE_DEPTH: usize = 4;

/// Connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientState {
    /// No connection and none in flight.
    Disconnected,
    /// Request sent, no verdict yet.
    Connecting,
    /// Admitted.
    Connected { client_id: u32 },
}

/// A connected (or connecting) game client.
pub struct Client<T: ClientTransport> {
    transport: T,
    state: ClientState,
    world: World,
    id_map: NetworkIdMap,
    snapshots: VecDeque<(u32, Vec<NetEntityRecord>)>,
    player_net_id: Option<u32>,
    tick_rate: u32,
    last_server_tick: u32,
    chat_log: Vec<(String, String)>,
    deny_reason: Option<String>,
}

impl<T: ClientTransport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: ClientState::Disconnected,
            world: World::new(),
            id_map: NetworkIdMap::new(),
            snapshots: VecDeque::new(),
            player_net_id: None,
            tick_rate: 0,
            last_server_tick: 0,
            chat_log: Vec::new(),
            deny_reason: None,
        }
    }

    /// Send the connect request. The verdict arrives via [`Client::poll`].
    pub fn connect(&mut self, token: &str, player_name: &str) -> Result<(), NetError> {
        let packet = Packet::new(
            0,
            unix_millis(),
            Message::ConnectRequest {
                version: PROTOCOL_VERSION,
                token: token.to_owned(),
                player_name: player_name.to_owned(),
            },
        );
        self.transport.send(packet.encode(), Reliability::Reliable)?;
        self.state = ClientState::Connecting;
        self.deny_reason = None;
        Ok(())
    }

    /// Drain the transport and process everything the server sent. Snapshots
    /// are queued, not applied; call [`Client::apply_pending`] afterwards.
    pub fn poll(&mut self) -> Result<(), NetError> {
        for bytes in self.transport.poll() {
            let packet = match Packet::decode(&bytes) {
                Ok(packet) => packet,
                Err(error) => {
                    warn!(%error, "dropping malformed packet from server");
                    continue;
                }
            };
            self.last_server_tick = self.last_server_tick.max(packet.tick);
            self.handle_message(packet.message);
        }
        if !self.transport.is_open() && self.state != ClientState::Disconnected {
            debug!("transport closed under us");
            self.state = ClientState::Disconnected;
        }
        Ok(())
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::ConnectAccept {
                client_id,
                tick_rate,
            } => {
                info!(client_id, tick_rate, "admitted");
                self.state = ClientState::Connected { client_id };
                self.tick_rate = tick_rate;
            }
            Message::ConnectDeny { reason } => {
                info!(%reason, "admission denied");
                self.deny_reason = Some(reason);
                self.state = ClientState::Disconnected;
            }
            Message::Disconnect { reason } => {
                info!(%reason, "server closed the connection");
                self.state = ClientState::Disconnected;
            }
            Message::PlayerSpawned { net_id } => {
                self.player_net_id = Some(net_id);
            }
            Message::WorldSnapshot { entities } => {
                if self.snapshots.len() == SNAPSHOT_QUEUE_DEPTH {
                    self.snapshots.pop_front();
                }
                self.snapshots.push_back((self.last_server_tick, entities));
            }
            Message::EntitySpawn { record } | Message::EntityUpdate { record } => {
                self.apply_record(&record);
            }
            Message::EntityDespawn { net_id } => {
                self.destroy_net_entity(net_id);
            }
            Message::Chat { sender, text } => {
                self.chat_log.push((sender, text));
            }
            other => {
                warn!(tag = ?other.tag(), "unexpected message kind from server");
            }
        }
    }

    /// Apply the newest queued snapshot, discarding older ones. Returns the
    /// server tick of the applied snapshot, or `None` if nothing was queued.
    pub fn apply_pending(&mut self) -> Option<u32> {
        let (tick, records) = self.snapshots.pop_back()?;
        let skipped = self.snapshots.len();
        if skipped > 0 {
            debug!(skipped, "discarding stale snapshots");
        }
        self.snapshots.clear();
        self.reconcile(&records);
        Some(tick)
    }

    fn reconcile(&mut self, records: &[NetEntityRecord]) {
        let mut seen: HashSet<u32> = HashSet::with_capacity(records.len());
        for record in records {
            seen.insert(record.net_id);
            self.apply_record(record);
        }
        let stale: Vec<u32> = self
            .id_map
            .net_ids()
            .filter(|net_id| !seen.contains(net_id))
            .collect();
        for net_id in stale {
            self.destroy_net_entity(net_id);
        }
    }

    /// Create or update the local entity for one wire record.
    fn apply_record(&mut self, record: &NetEntityRecord) {
        let entity = match self.id_map.entity(record.net_id) {
            Some(entity) if self.world.is_alive(entity) => entity,
            _ => {
                let entity = self.world.spawn();
                self.id_map.register(record.net_id, entity);
                entity
            }
        };

        self.world.transforms.insert(
            entity,
            Transform {
                position: Vec2::new(record.transform.x, record.transform.y),
                rotation: record.transform.rotation,
                z_level: record.transform.z_level,
            },
        );
        match &record.physics {
            Some(p) => {
                self.world.physics.insert(
                    entity,
                    Physics {
                        velocity: Vec2::new(p.vel_x, p.vel_y),
                        move_speed: p.move_speed,
                        mass: p.mass,
                        friction: p.friction,
                        dense: p.dense,
                        anchored: p.anchored,
                    },
                );
            }
            None => {
                self.world.physics.remove(entity);
            }
        }
        match &record.sprite {
            Some(path) => {
                self.world
                    .sprites
                    .insert(entity, Sprite { path: path.clone() });
            }
            None => {
                self.world.sprites.remove(entity);
            }
        }
        match &record.health {
            Some(h) => {
                self.world.healths.insert(
                    entity,
                    Health {
                        current: h.current,
                        max: h.max,
                    },
                );
            }
            None => {
                self.world.healths.remove(entity);
            }
        }
    }

    fn destroy_net_entity(&mut self, net_id: u32) {
        let Some(entity) = self.id_map.remove_net_id(net_id) else {
            return;
        };
        if self.world.despawn(entity).is_err() {
            debug!(net_id, "replica entity already gone");
        }
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Send this tick's movement axes. Values are clamped server-side.
    pub fn send_input(&mut self, move_x: f32, move_y: f32) -> Result<(), NetError> {
        self.send(Message::PlayerInput { move_x, move_y }, Reliability::Unreliable)
    }

    pub fn send_chat(&mut self, text: &str) -> Result<(), NetError> {
        self.send(
            Message::Chat {
                sender: String::new(), // the server fills this in
                text: text.to_owned(),
            },
            Reliability::Reliable,
        )
    }

    pub fn send_command(&mut self, command: &str) -> Result<(), NetError> {
        self.send(
            Message::PlayerCommand {
                command: command.to_owned(),
            },
            Reliability::Reliable,
        )
    }

    pub fn send_interact(&mut self, target_net_id: u32) -> Result<(), NetError> {
        self.send(Message::PlayerInteract { target_net_id }, Reliability::Reliable)
    }

    /// Announce departure and close the transport.
    pub fn disconnect(&mut self, reason: &str) {
        if matches!(self.state, ClientState::Connected { .. }) {
            let _ = self.send(
                Message::Disconnect {
                    reason: reason.to_owned(),
                },
                Reliability::Reliable,
            );
        }
        self.transport.close();
        self.state = ClientState::Disconnected;
    }

    fn send(&mut self, message: Message, reliability: Reliability) -> Result<(), NetError> {
        if !matches!(self.state, ClientState::Connected { .. }) {
            return Err(NetError::NotConnected);
        }
        let packet = Packet::new(self.last_server_tick, unix_millis(), message);
        self.transport.send(packet.encode(), reliability)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// The local replica.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Local entity mirroring this player's server entity, once both the
    /// spawn notice and a snapshot carrying it have arrived.
    pub fn player_entity(&self) -> Option<Entity> {
        self.id_map.entity(self.player_net_id?)
    }

    /// Server tick rate reported at admission.
    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Highest server tick seen in any packet.
    pub fn last_server_tick(&self) -> u32 {
        self.last_server_tick
    }

    /// Why the last connect attempt was denied, if it was.
    pub fn deny_reason(&self) -> Option<&str> {
        self.deny_reason.as_deref()
    }

    /// Chat lines received, oldest first.
    pub fn chat_log(&self) -> &[(String, String)] {
        &self.chat_log
    }

    /// Network ids currently mirrored locally.
    pub fn tracked_net_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.id_map.net_ids()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
