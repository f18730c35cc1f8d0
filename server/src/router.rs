//! Per-event dispatch for the arena server.
//!
//! The router turns one inbound event from one connection into registry and
//! combat calls, and returns the messages that should go out as a result. It
//! never touches sockets: the network layer feeds it events one at a time and
//! delivers whatever it returns.

use crate::combat::{self, RespawnTicket};
use crate::error::Rejection;
use crate::registry::PlayerRegistry;
use log::debug;
use shared::{ClientId, Packet, Ray, TextureStyle, Vec3};

/// One outgoing packet and who should receive it.
#[derive(Debug, Clone)]
pub enum Outbound {
    Unicast {
        to: ClientId,
        packet: Packet,
    },
    Broadcast {
        packet: Packet,
        exclude: Option<ClientId>,
    },
}

impl Outbound {
    pub fn unicast(to: ClientId, packet: Packet) -> Self {
        Outbound::Unicast { to, packet }
    }

    pub fn broadcast(packet: Packet) -> Self {
        Outbound::Broadcast {
            packet,
            exclude: None,
        }
    }

    pub fn broadcast_except(exclude: ClientId, packet: Packet) -> Self {
        Outbound::Broadcast {
            packet,
            exclude: Some(exclude),
        }
    }

    pub fn packet(&self) -> &Packet {
        match self {
            Outbound::Unicast { packet, .. } | Outbound::Broadcast { packet, .. } => packet,
        }
    }

    /// Whether `client` receives this message.
    pub fn reaches(&self, client: ClientId) -> bool {
        match self {
            Outbound::Unicast { to, .. } => *to == client,
            Outbound::Broadcast { exclude, .. } => *exclude != Some(client),
        }
    }
}

/// Everything a connection can ask of the server.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Connect { name: Option<String> },
    Move { position: Vec3, rotation: Vec3 },
    Shoot { ray: Ray },
    Hit { target: ClientId, damage: i32 },
    RequestScoreboard,
    ChangeName(String),
    ChangeSkin(String),
    ChangeMap(String),
    Disconnect,
}

impl InboundEvent {
    /// Maps a client packet to its event. Server-to-client packets and
    /// keepalives have no event.
    pub fn from_packet(packet: Packet) -> Option<Self> {
        let event = match packet {
            Packet::Connect { name, .. } => InboundEvent::Connect { name },
            Packet::Move { position, rotation } => InboundEvent::Move { position, rotation },
            Packet::Shoot { ray } => InboundEvent::Shoot { ray },
            Packet::Hit { player_id, damage } => InboundEvent::Hit {
                target: player_id,
                damage,
            },
            Packet::RequestScoreboard => InboundEvent::RequestScoreboard,
            Packet::ChangeName(name) => InboundEvent::ChangeName(name),
            Packet::ChangeSkin(skin) => InboundEvent::ChangeSkin(skin),
            Packet::ChangeMap(map) => InboundEvent::ChangeMap(map),
            Packet::Disconnect => InboundEvent::Disconnect,
            _ => return None,
        };
        Some(event)
    }
}

/// Gate between a client's hit claim and the damage being applied.
pub trait HitValidator: Send + Sync {
    fn accept(&self, registry: &PlayerRegistry, attacker: ClientId, target: ClientId, damage: i32) -> bool;
}

/// Accepts every hit exactly as the client reported it.
///
/// Hit detection runs on the shooter's machine and this server does not
/// re-check the geometry, distance or damage value.
pub struct TrustedRelay;

impl HitValidator for TrustedRelay {
    fn accept(&self, _: &PlayerRegistry, _: ClientId, _: ClientId, _: i32) -> bool {
        true
    }
}

/// Result of dispatching one event.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub messages: Vec<Outbound>,
    /// Respawn to schedule after the fixed delay
    pub respawn: Option<RespawnTicket>,
}

impl From<Vec<Outbound>> for Dispatch {
    fn from(messages: Vec<Outbound>) -> Self {
        Self {
            messages,
            respawn: None,
        }
    }
}

pub struct EventRouter {
    registry: PlayerRegistry,
    hit_validator: Box<dyn HitValidator>,
}

impl EventRouter {
    pub fn new(registry: PlayerRegistry) -> Self {
        Self::with_hit_validator(registry, Box::new(TrustedRelay))
    }

    pub fn with_hit_validator(registry: PlayerRegistry, hit_validator: Box<dyn HitValidator>) -> Self {
        Self {
            registry,
            hit_validator,
        }
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    /// Handles one event from connection `from` to completion.
    ///
    /// Events from connections without a player (other than `Connect`) are
    /// dropped silently; they usually trail a disconnect.
    pub fn handle(&mut self, from: ClientId, event: InboundEvent) -> Dispatch {
        if !matches!(event, InboundEvent::Connect { .. }) && !self.registry.contains(from) {
            debug!("Dropping {:?} from unregistered connection {}", event, from);
            return Dispatch::default();
        }

        match event {
            InboundEvent::Connect { name } => self.connect(from, name.as_deref()).into(),
            InboundEvent::Move { position, rotation } => {
                self.registry.update_position(from, position, rotation);
                vec![Outbound::broadcast_except(
                    from,
                    Packet::PlayerMoved {
                        id: from,
                        position,
                        rotation,
                    },
                )]
                .into()
            }
            InboundEvent::Shoot { ray } => vec![Outbound::broadcast_except(
                from,
                Packet::PlayerShot {
                    shooter_id: from,
                    ray,
                },
            )]
            .into(),
            InboundEvent::Hit { target, damage } => self.hit(from, target, damage),
            InboundEvent::RequestScoreboard => {
                vec![Outbound::unicast(from, Packet::ScoreUpdate(self.registry.scoreboard()))].into()
            }
            InboundEvent::ChangeName(name) => self.change_name(from, &name).into(),
            InboundEvent::ChangeSkin(skin) => self.change_skin(from, &skin).into(),
            InboundEvent::ChangeMap(map) => self.change_map(from, &map).into(),
            InboundEvent::Disconnect => self.disconnect(from).into(),
        }
    }

    /// Fires a scheduled respawn; stale tickets produce nothing.
    pub fn respawn(&mut self, ticket: RespawnTicket) -> Vec<Outbound> {
        combat::respawn(&mut self.registry, ticket).into_iter().collect()
    }

    fn connect(&mut self, id: ClientId, name: Option<&str>) -> Vec<Outbound> {
        let player = self.registry.create_player(id, name);

        vec![
            Outbound::unicast(
                id,
                Packet::Init {
                    id,
                    players: self.registry.snapshot(),
                    player_data: player.clone(),
                    current_map: self.registry.current_map().to_string(),
                },
            ),
            Outbound::broadcast_except(id, Packet::PlayerJoined(player)),
        ]
    }

    fn hit(&mut self, attacker: ClientId, target: ClientId, damage: i32) -> Dispatch {
        if !self.hit_validator.accept(&self.registry, attacker, target, damage) {
            debug!("Hit {} -> {} ({}) refused by validator", attacker, target, damage);
            return Dispatch::default();
        }

        let report = combat::apply_hit(&mut self.registry, attacker, target, damage);
        Dispatch {
            messages: report.messages,
            respawn: report.respawn,
        }
    }

    fn change_name(&mut self, id: ClientId, name: &str) -> Vec<Outbound> {
        match self.registry.update_name(id, name) {
            Ok(name) => vec![Outbound::broadcast(Packet::PlayerNameChanged { id, name })],
            Err(reason) => {
                debug!("Rename of {} to {:?} rejected: {}", id, name, reason);
                vec![Outbound::unicast(id, Packet::NameChangeRejected { reason })]
            }
        }
    }

    fn change_skin(&mut self, id: ClientId, skin: &str) -> Vec<Outbound> {
        let Ok(style) = skin.parse::<TextureStyle>() else {
            let rejection = Rejection::UnknownSkin {
                requested: skin.to_string(),
                available: TextureStyle::ALL
                    .iter()
                    .map(TextureStyle::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            };
            debug!("Skin change for {} rejected: {}", id, rejection);
            return vec![Outbound::unicast(id, Packet::ConsoleMessage(rejection.to_string()))];
        };

        if !self.registry.set_texture_style(id, style) {
            return Vec::new();
        }
        vec![Outbound::broadcast(Packet::PlayerSkinChanged {
            player_id: id,
            texture_style: style,
        })]
    }

    fn change_map(&mut self, id: ClientId, map: &str) -> Vec<Outbound> {
        match self.registry.change_map(map.trim()) {
            Ok(placements) => {
                let map_name = self.registry.current_map().to_string();
                placements
                    .into_iter()
                    .map(|(player_id, position)| {
                        Outbound::unicast(
                            player_id,
                            Packet::MapChange {
                                map_name: map_name.clone(),
                                position,
                            },
                        )
                    })
                    .collect()
            }
            Err(rejection) => {
                debug!("Map change by {} rejected: {}", id, rejection);
                vec![Outbound::unicast(id, Packet::ConsoleMessage(rejection.to_string()))]
            }
        }
    }

    fn disconnect(&mut self, id: ClientId) -> Vec<Outbound> {
        match self.registry.remove(id) {
            Some(_) => vec![Outbound::broadcast_except(id, Packet::PlayerLeft { id })],
            None => Vec::new(),
        }
    }
}
