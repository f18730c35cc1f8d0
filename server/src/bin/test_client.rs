//! Headless probe: joins a running server, prints what it sees, and leaves.

use bincode::{deserialize, serialize};
use clap::Parser;
use log::{info, warn};
use shared::{Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:3000")]
    server: String,

    /// Display name to request
    #[arg(short, long)]
    name: Option<String>,

    /// Seconds to keep listening for broadcasts
    #[arg(short, long, default_value = "3")]
    listen_secs: u64,
}

async fn send(socket: &UdpSocket, packet: &Packet, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let data = serialize(packet)?;
    socket.send_to(&data, addr).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    let server_addr: SocketAddr = args.server.parse()?;
    info!("Probe bound to {}, joining {}", socket.local_addr()?, server_addr);

    send(
        &socket,
        &Packet::Connect {
            client_version: PROTOCOL_VERSION,
            name: args.name.clone(),
        },
        server_addr,
    )
    .await?;

    let mut buffer = [0u8; 8192];
    let listen_for = Duration::from_secs(args.listen_secs);
    let mut asked_for_scores = false;

    while let Ok(received) = timeout(listen_for, socket.recv_from(&mut buffer)).await {
        let (len, _) = received?;
        let Ok(packet) = deserialize::<Packet>(&buffer[..len]) else {
            warn!("Undecodable packet from server");
            continue;
        };

        match packet {
            Packet::Init {
                id,
                players,
                player_data,
                current_map,
            } => {
                println!(
                    "Joined as {} '{}' on '{}' with {} player(s) online",
                    id,
                    player_data.name,
                    current_map,
                    players.len()
                );
                if !asked_for_scores {
                    send(&socket, &Packet::RequestScoreboard, server_addr).await?;
                    asked_for_scores = true;
                }
            }
            Packet::ScoreUpdate(scores) => {
                println!("Scoreboard:");
                for entry in scores {
                    println!("  {:<20} {:>3} / {:<3}", entry.name, entry.kills, entry.deaths);
                }
            }
            Packet::Disconnected { reason } => {
                println!("Refused: {}", reason);
                return Ok(());
            }
            other => println!("{:?}", other),
        }
    }

    send(&socket, &Packet::Disconnect, server_addr).await?;
    info!("Probe disconnected");
    Ok(())
}
