//! Server network layer: UDP transport and the event loop

use crate::client_manager::ClientManager;
use crate::combat::RespawnTicket;
use crate::router::{Dispatch, EventRouter, InboundEvent, Outbound};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{ClientId, Packet, PROTOCOL_VERSION, RESPAWN_DELAY_MS};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};

/// Messages sent from network and timer tasks to the event loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: ClientId },
    RespawnDue(RespawnTicket),
    Shutdown,
}

/// Messages sent from the event loop to the sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        exclude: Option<ClientId>,
    },
}

/// Main server: owns the socket, the connection roster and the router
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    router: EventRouter,
    respawn_delay: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        max_clients: usize,
        client_timeout: Duration,
        router: EventRouter,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients, client_timeout))),
            router,
            respawn_delay: Duration::from_millis(RESPAWN_DELAY_MS),
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Channel into the event loop; post `ServerMessage::Shutdown` to stop `run`
    pub fn control_handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 8192];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes the outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet, exclude } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (client_id, addr) in client_addrs {
                            if Some(client_id) == exclude {
                                continue;
                            }

                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that expires silent clients
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    /// Posts the respawn back into the event loop once the delay elapses
    fn schedule_respawn(&self, ticket: RespawnTicket) {
        let server_tx = self.server_tx.clone();
        let delay = self.respawn_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if server_tx.send(ServerMessage::RespawnDue(ticket)).is_err() {
                debug!("Event loop gone before respawn of {}", ticket.player_id);
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn queue(&self, message: GameMessage) {
        if let Err(e) = self.game_tx.send(message) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Resolves recipients and queues each outbound message
    async fn deliver(&self, messages: Vec<Outbound>) {
        for message in messages {
            match message {
                Outbound::Unicast { to, packet } => {
                    let addr = {
                        let clients = self.clients.read().await;
                        clients.addr_of(to)
                    };
                    match addr {
                        Some(addr) => self.queue(GameMessage::SendPacket { packet, addr }),
                        None => debug!("Dropping packet for departed client {}", to),
                    }
                }
                Outbound::Broadcast { packet, exclude } => {
                    self.queue(GameMessage::BroadcastPacket { packet, exclude })
                }
            }
        }
    }

    async fn dispatch(&mut self, client_id: ClientId, event: InboundEvent) {
        let Dispatch { messages, respawn } = self.router.handle(client_id, event);
        self.deliver(messages).await;
        if let Some(ticket) = respawn {
            self.schedule_respawn(ticket);
        }
    }

    /// Handles a connection request from `addr`
    async fn handle_connect(&mut self, addr: SocketAddr, client_version: u32, name: Option<String>) {
        info!("Client connecting from {} (version: {})", addr, client_version);

        if client_version != PROTOCOL_VERSION {
            self.queue(GameMessage::SendPacket {
                packet: Packet::Disconnected {
                    reason: "Protocol version mismatch".to_string(),
                },
                addr,
            });
            return;
        }

        // Reconnecting from the same address replaces the old session
        let existing_client_id = {
            let clients = self.clients.read().await;
            clients.find_client_by_addr(addr)
        };
        if let Some(existing_id) = existing_client_id {
            info!("Replacing existing client {} from {}", existing_id, addr);
            self.dispatch(existing_id, InboundEvent::Disconnect).await;
            let mut clients = self.clients.write().await;
            clients.remove_client(existing_id);
        }

        let client_id = {
            let mut clients = self.clients.write().await;
            clients.add_client(addr)
        };

        match client_id {
            Some(client_id) => self.dispatch(client_id, InboundEvent::Connect { name }).await,
            None => self.queue(GameMessage::SendPacket {
                packet: Packet::Disconnected {
                    reason: "Server full".to_string(),
                },
                addr,
            }),
        }
    }

    /// Processes one datagram from `addr`
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        let packet = match packet {
            Packet::Connect {
                client_version,
                name,
            } => {
                self.handle_connect(addr, client_version, name).await;
                return;
            }
            other => other,
        };

        let client_id = {
            let mut clients = self.clients.write().await;
            clients.touch(addr)
        };
        let Some(client_id) = client_id else {
            debug!("Ignoring packet from unknown peer {}", addr);
            return;
        };

        let is_disconnect = matches!(packet, Packet::Disconnect);
        if let Some(event) = InboundEvent::from_packet(packet) {
            self.dispatch(client_id, event).await;
        }

        if is_disconnect {
            let mut clients = self.clients.write().await;
            clients.remove_client(client_id);
        }
    }

    /// Main server loop: the only place player state is mutated
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        info!(
            "Server started on map '{}'",
            self.router.registry().current_map()
        );

        while let Some(message) = self.server_rx.recv().await {
            match message {
                ServerMessage::PacketReceived { packet, addr } => {
                    self.handle_packet(packet, addr).await;
                }
                ServerMessage::ClientTimeout { client_id } => {
                    self.dispatch(client_id, InboundEvent::Disconnect).await;
                }
                ServerMessage::RespawnDue(ticket) => {
                    let messages = self.router.respawn(ticket);
                    self.deliver(messages).await;
                }
                ServerMessage::Shutdown => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}
