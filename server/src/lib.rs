//! # Arena Server Library
//!
//! This library provides the authoritative server for a multiplayer
//! first-person arena shooter. It owns every connected player's identity,
//! pose, health and score, decides who died and who gets the kill, and
//! places players into the level when they join, respawn or the map changes.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Player State
//! Clients report their own pose and their own hits, but only the server
//! decides health, deaths, kills and names. Clients receive deltas and
//! conform to them.
//!
//! ### Connection Lifecycle
//! - Connection establishment and session bootstrap (`Init`)
//! - Per-connection event dispatch
//! - Disconnection and idle-timeout cleanup
//!
//! ### Spawn Placement
//! Spawn points are drawn at random inside a level's spawn region and
//! rejected when they land inside an obstacle footprint.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! Every inbound packet, idle timeout and respawn timer is funneled into one
//! queue and handled to completion, one at a time, by the event loop. No
//! handler ever waits on another, so the registry needs no locking. Respawn
//! delays run as detached timers that post back into the same queue.
//!
//! ### Trust Boundary
//! Movement, shots and hits are client claims and are applied as reported.
//! The [`router::HitValidator`] seam is where hit verification would go; the
//! default [`router::TrustedRelay`] accepts everything.
//!
//! ### UDP-Based Communication
//! Each datagram carries one bincode-encoded [`shared::Packet`]. A receiver
//! task decodes datagrams, a sender task fans out replies, and a timeout
//! checker expires silent peers.
//!
//! ## Module Organization
//!
//! - `levels`: read-only level geometry and the [`levels::LevelCatalog`] seam
//! - `names`: display name validation and uniqueness
//! - `spawn`: spawn point selection and palette assignment
//! - `registry`: the player registry and match state
//! - `combat`: damage, death, kill credit and respawn
//! - `router`: one inbound event in, outbound messages out
//! - `client_manager`: address-to-connection tracking
//! - `network`: sockets, tasks and the event loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::levels::BuiltinLevels;
//! use server::network::Server;
//! use server::registry::PlayerRegistry;
//! use server::router::EventRouter;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = PlayerRegistry::new(Box::new(BuiltinLevels::new()), "arena")?;
//!     let router = EventRouter::new(registry);
//!
//!     // Bind, allow 32 clients, drop peers silent for 10 seconds
//!     let mut server = Server::new("0.0.0.0:3000", 32, Duration::from_secs(10), router).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod combat;
pub mod error;
pub mod levels;
pub mod names;
pub mod network;
pub mod registry;
pub mod router;
pub mod spawn;
