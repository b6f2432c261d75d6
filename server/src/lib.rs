//! # Capybara Relay Server Library
//!
//! This library provides the relay server for the multiplayer capybara game. The
//! server does not simulate anything: each client runs its own simulation and
//! reports its position, and the relay forwards what it hears to everyone else.
//!
//! ## Core Responsibilities
//!
//! ### Snapshot Broadcasting
//! Every join, position update and disconnect rewrites the player registry and
//! pushes the whole registry to every connected client, the sender included.
//! Clients drop their own entry and replace their cache of remote players
//! wholesale with each snapshot.
//!
//! ### Point-to-Point Events
//! Interactions are forwarded to a single target connection when it is live and
//! silently dropped otherwise. Trades run through a small state machine
//! (pending, accepted, rejected, completed) and only the two parties hear about
//! them.
//!
//! ### Client Authority
//! Positions are taken at face value. There is no validation, reconciliation or
//! anti-cheat; the relay is meant for casual cooperative play.
//!
//! ## Architecture Design
//!
//! ### Single Coordinating Task
//! All mutable game state lives in [`relay::Relay`], owned by the main server
//! loop. Connection tasks decode frames and send them to that loop over a
//! channel, so every event is handled to completion before the next one starts
//! and no state is ever shared between tasks.
//!
//! ### WebSocket Transport
//! Clients connect over WebSocket and exchange JSON text frames of the form
//! `{"event": "...", "data": ...}`. The first frame a client receives is
//! `connected`, carrying its connection identity.
//!
//! ## Module Organization
//!
//! - `client_manager`: live connections, identity assignment and outbound queues
//! - `registry`: last-known [`shared::PlayerState`] per joined player
//! - `trade`: active trades keyed by server-generated tokens
//! - `capybara`: pet capybaras with slow stat decay and timed actions
//! - `relay`: the event handlers tying the above together
//! - `network`: socket handling and the main loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Capybara stats decay once a minute; at most 64 sockets at a time
//!     let mut server = Server::new("127.0.0.1:3002", Duration::from_secs(60), 64).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod capybara;
pub mod client_manager;
pub mod network;
pub mod registry;
pub mod relay;
pub mod trade;
