//! Authoritative server: admission, per-tick input intake, simulation step,
//! full-snapshot broadcast.
//!
//! The server is strictly tick-driven. Between calls to [`Server::tick`]
//! nothing changes; within one call the order is fixed: drain the transport,
//! apply what arrived, run the simulation schedule once, then broadcast one
//! [`Message::WorldSnapshot`] to every admitted client. Clients that fail
//! admission get a [`Message::ConnectDeny`] and are dropped before they ever
//! touch the world.

use std::collections::HashMap;

use outpost_ecs::entity::Entity;
use outpost_ecs::schedule::Scheduler;
use outpost_proto::message::{Message, Packet};
use outpost_proto::record::{NetEntityRecord, NetHealth, NetPhysics, NetTransform};
use outpost_proto::PROTOCOL_VERSION;
use outpost_sim::atmos::AtmosphereSystem;
use outpost_sim::components::{Health, InputState, Physics, Sprite, Transform};
use outpost_sim::movement::MovementSystem;
use outpost_sim::power::PowerSystem;
use outpost_sim::world::World;
use tracing::{debug, info, warn};

use crate::id_map::NetworkIdMap;
use crate::transport::{PeerId, Reliability, ServerTransport, TransportEvent};
use crate::{unix_millis, NetError};

/// Static server parameters.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Simulation rate in ticks per second, reported to clients on accept.
    pub tick_rate: u32,
    /// Admission cap. Requests beyond this are denied, never queued.
    pub max_players: usize,
    /// Shared connection token a client must present verbatim. The default
    /// empty token still requires clients to present an empty token.
    pub token: String,
    /// Sprite assigned to newly spawned player entities.
    pub player_sprite: String,
    /// Tile walk speed of player entities, tiles per second.
    pub player_move_speed: f32,
    /// Tile players spawn on.
    pub spawn_tile: (i32, i32),
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30,
            max_players: 16,
            token: String::new(),
            player_sprite: "mobs/crew.png".to_owned(),
            player_move_speed: 4.0,
            spawn_tile: (0, 0),
        }
    }
}

/// Gameplay-level happenings the embedding layer drains after each tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A client passed admission and got a player entity.
    PlayerConnected { client_id: u32, entity: Entity },
    /// A client left; its player entity is already despawned.
    PlayerDisconnected { client_id: u32 },
    /// Free-form gameplay command.
    Command { client_id: u32, command: String },
    /// Interaction with a replicated entity.
    Interact { client_id: u32, target: Entity },
    /// Absolute move request, not yet applied; validation is the embedder's.
    MoveRequest { client_id: u32, x: f32, y: f32 },
    /// Privileged command.
    Admin { client_id: u32, command: String },
}

#[derive(Debug)]
struct ClientRecord {
    client_id: u32,
    player_name: String,
    entity: Entity,
}

/// The authoritative game server.
pub struct Server<T: ServerTransport> {
    transport: T,
    config: ServerConfig,
    world: World,
    scheduler: Scheduler<World>,
    id_map: NetworkIdMap,
    clients: HashMap<PeerId, ClientRecord>,
    next_client_id: u32,
    tick: u32,
    events: Vec<ServerEvent>,
}

impl<T: ServerTransport> Server<T> {
    /// Build a server with the standard simulation schedule (movement, power,
    /// atmosphere) already registered and initialized.
    pub fn new(transport: T, config: ServerConfig) -> Self {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        scheduler.register(Box::new(MovementSystem::new()));
        scheduler.register(Box::new(PowerSystem::new()));
        scheduler.register(Box::new(AtmosphereSystem::new()));
        scheduler.initialize_all(&mut world);
        Self {
            transport,
            config,
            world,
            scheduler,
            id_map: NetworkIdMap::new(),
            clients: HashMap::new(),
            // Client ids are monotonic for the server's lifetime, like net
            // ids: a reconnecting player is a new client.
            next_client_id: 1,
            tick: 0,
            events: Vec::new(),
        }
    }

    /// The authoritative world. Entities spawned here with a [`Transform`]
    /// enter the next snapshot automatically.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Ticks completed so far.
    pub fn tick_count(&self) -> u32 {
        self.tick
    }

    /// Number of admitted clients.
    pub fn player_count(&self) -> usize {
        self.clients.len()
    }

    /// Take everything gameplay-level that happened since the last drain.
    pub fn drain_events(&mut self) -> Vec<ServerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run one server tick: intake, simulate, broadcast.
    ///
    /// A failing simulation system aborts the tick with
    /// [`NetError::Simulation`]; no snapshot goes out for an aborted tick.
    pub fn tick(&mut self, dt: f32) -> Result<(), NetError> {
        for event in self.transport.poll() {
            match event {
                TransportEvent::Connected(peer) => {
                    debug!(?peer, "transport-level connect; awaiting request");
                }
                TransportEvent::Disconnected(peer) => self.remove_client(peer),
                TransportEvent::Data(peer, bytes) => match Packet::decode(&bytes) {
                    Ok(packet) => self.handle_packet(peer, packet),
                    Err(error) => {
                        warn!(?peer, %error, "dropping malformed packet");
                    }
                },
            }
        }

        self.scheduler.run_tick(&mut self.world, dt)?;
        self.tick += 1;
        self.broadcast_snapshot();
        Ok(())
    }

    /// Register a freshly spawned world entity for replication and announce
    /// it right away, instead of letting the next snapshot introduce it.
    /// Returns its network id. Idempotent for already-registered entities.
    pub fn notify_spawned(&mut self, entity: Entity) -> u32 {
        let net_id = self.id_map.assign(entity);
        if let Some(record) = build_record(&self.world, entity, net_id) {
            self.broadcast(Message::EntitySpawn { record }, Reliability::Reliable);
        }
        net_id
    }

    /// Despawn a world entity and tell clients immediately, without waiting
    /// for the next snapshot to imply it.
    pub fn despawn(&mut self, entity: Entity) {
        if let Some(net_id) = self.id_map.remove_entity(entity) {
            self.broadcast(Message::EntityDespawn { net_id }, Reliability::Reliable);
        }
        if self.world.despawn(entity).is_err() {
            debug!(?entity, "despawn of stale entity ignored");
        }
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    fn handle_packet(&mut self, peer: PeerId, packet: Packet) {
        match packet.message {
            Message::ConnectRequest {
                version,
                token,
                player_name,
            } => self.handle_connect(peer, version, &token, player_name),
            Message::Disconnect { reason } => {
                debug!(?peer, %reason, "client disconnect");
                self.remove_client(peer);
                self.transport.disconnect(peer);
            }
            Message::PlayerInput { move_x, move_y } => {
                if let Some(record) = self.clients.get(&peer) {
                    if let Some(input) = self.world.inputs.get_mut(record.entity) {
                        input.move_x = move_x.clamp(-1.0, 1.0);
                        input.move_y = move_y.clamp(-1.0, 1.0);
                    }
                }
            }
            Message::Chat { text, .. } => {
                // Sender identity comes from the admitted record, never from
                // the packet.
                if let Some(record) = self.clients.get(&peer) {
                    let chat = Message::Chat {
                        sender: record.player_name.clone(),
                        text,
                    };
                    self.broadcast(chat, Reliability::Reliable);
                }
            }
            Message::PlayerCommand { command } => {
                if let Some(record) = self.clients.get(&peer) {
                    self.events.push(ServerEvent::Command {
                        client_id: record.client_id,
                        command,
                    });
                }
            }
            Message::PlayerMove { x, y } => {
                if let Some(record) = self.clients.get(&peer) {
                    self.events.push(ServerEvent::MoveRequest {
                        client_id: record.client_id,
                        x,
                        y,
                    });
                }
            }
            Message::PlayerInteract { target_net_id } => {
                if let Some(record) = self.clients.get(&peer) {
                    if let Some(target) = self.id_map.entity(target_net_id) {
                        self.events.push(ServerEvent::Interact {
                            client_id: record.client_id,
                            target,
                        });
                    } else {
                        debug!(
                            client_id = record.client_id,
                            target_net_id, "interact with unknown net id ignored"
                        );
                    }
                }
            }
            Message::AdminCommand { command } => {
                if let Some(record) = self.clients.get(&peer) {
                    self.events.push(ServerEvent::Admin {
                        client_id: record.client_id,
                        command,
                    });
                }
            }
            // Server-to-client kinds arriving at the server are protocol
            // misuse; drop them.
            other => {
                warn!(?peer, tag = ?other.tag(), "unexpected message kind from client");
            }
        }
    }

    fn handle_connect(&mut self, peer: PeerId, version: u8, token: &str, player_name: String) {
        if self.clients.contains_key(&peer) {
            warn!(?peer, "duplicate connect request ignored");
            return;
        }
        if version != PROTOCOL_VERSION {
            self.deny(peer, format!("protocol version mismatch (server {PROTOCOL_VERSION})"));
            return;
        }
        if token != self.config.token {
            self.deny(peer, "invalid token".to_owned());
            return;
        }
        if self.clients.len() >= self.config.max_players {
            self.deny(peer, "server is full".to_owned());
            return;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        let entity = self.spawn_player();
        let net_id = self.id_map.assign(entity);
        self.clients.insert(
            peer,
            ClientRecord {
                client_id,
                player_name: player_name.clone(),
                entity,
            },
        );

        info!(client_id, %player_name, ?peer, "player admitted");
        self.send(
            peer,
            Message::ConnectAccept {
                client_id,
                tick_rate: self.config.tick_rate,
            },
            Reliability::Reliable,
        );
        self.send(peer, Message::PlayerSpawned { net_id }, Reliability::Reliable);
        self.events
            .push(ServerEvent::PlayerConnected { client_id, entity });
    }

    fn deny(&mut self, peer: PeerId, reason: String) {
        info!(?peer, %reason, "admission denied");
        self.send(peer, Message::ConnectDeny { reason }, Reliability::Reliable);
        self.transport.disconnect(peer);
    }

    fn spawn_player(&mut self) -> Entity {
        let (x, y) = self.config.spawn_tile;
        let entity = self.world.spawn();
        self.world.transforms.insert(entity, Transform::at_tile(x, y));
        self.world
            .physics
            .insert(entity, Physics::walker(self.config.player_move_speed));
        self.world.inputs.insert(entity, InputState::default());
        self.world.sprites.insert(
            entity,
            Sprite {
                path: self.config.player_sprite.clone(),
            },
        );
        self.world.healths.insert(
            entity,
            Health {
                current: 100.0,
                max: 100.0,
            },
        );
        entity
    }

    fn remove_client(&mut self, peer: PeerId) {
        let Some(record) = self.clients.remove(&peer) else {
            return;
        };
        info!(client_id = record.client_id, "player disconnected");
        if let Some(net_id) = self.id_map.remove_entity(record.entity) {
            self.broadcast(Message::EntityDespawn { net_id }, Reliability::Reliable);
        }
        if self.world.despawn(record.entity).is_err() {
            debug!(client_id = record.client_id, "player entity already gone");
        }
        self.events.push(ServerEvent::PlayerDisconnected {
            client_id: record.client_id,
        });
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    fn broadcast_snapshot(&mut self) {
        let mut entities = Vec::with_capacity(self.world.transforms.len());
        let replicated: Vec<Entity> = self.world.transforms.entities().to_vec();
        for entity in replicated {
            let net_id = self.id_map.assign(entity);
            if let Some(record) = build_record(&self.world, entity, net_id) {
                entities.push(record);
            }
        }
        entities.sort_by_key(|record| record.net_id);
        self.broadcast(Message::WorldSnapshot { entities }, Reliability::Unreliable);
    }

    fn send(&mut self, peer: PeerId, message: Message, reliability: Reliability) {
        let bytes = Packet::new(self.tick, unix_millis(), message).encode();
        if let Err(error) = self.transport.send(peer, bytes, reliability) {
            warn!(?peer, %error, "send failed");
        }
    }

    fn broadcast(&mut self, message: Message, reliability: Reliability) {
        let bytes = Packet::new(self.tick, unix_millis(), message).encode();
        let peers: Vec<PeerId> = self.clients.keys().copied().collect();
        for peer in peers {
            if let Err(error) = self.transport.send(peer, bytes.clone(), reliability) {
                warn!(?peer, %error, "broadcast send failed");
            }
        }
    }
}

/// Project one world entity into its wire record. Entities that lost their
/// transform since collection yield `None` and are skipped.
fn build_record(world: &World, entity: Entity, net_id: u32) -> Option<NetEntityRecord> {
    let transform = world.transforms.get(entity)?;
    Some(NetEntityRecord {
        net_id,
        transform: NetTransform {
            x: transform.position.x,
            y: transform.position.y,
            rotation: transform.rotation,
            z_level: transform.z_level,
        },
        physics: world.physics.get(entity).map(|p| NetPhysics {
            vel_x: p.velocity.x,
            vel_y: p.velocity.y,
            move_speed: p.move_speed,
            mass: p.mass,
            friction: p.friction,
            dense: p.dense,
            anchored: p.anchored,
        }),
        sprite: world.sprites.get(entity).map(|s| s.path.clone()),
        health: world.healths.get(entity).map(|h| NetHealth {
            current: h.current,
            max: h.max,
        }),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
