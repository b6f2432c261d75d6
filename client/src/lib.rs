//! # Capybara Client Library
//!
//! Client side of the multiplayer capybara game. Each client runs the whole
//! meadow locally (fruit, hazards, the anaconda, weather) and only shares its
//! own position with the relay; everyone else is drawn from the relay's
//! snapshots.
//!
//! ## Frame Loop
//!
//! The simulation is frame-driven and not time-corrected: speeds and damage are
//! per frame, so the game runs faster on faster displays. Only the speed boost
//! and the anaconda's retargeting look at wall-clock time. Score and weather
//! advance once per second.
//!
//! ## Module Organization
//!
//! - `world`: static layout (obstacles, food zones, fire plates, walls) and
//!   fruit placement
//! - `anaconda`: the pursuing snake and its trailing body
//! - `weather`: sunny/rainy/foggy cycle and its effect on speed and hunger
//! - `effects`: particle bursts
//! - `game`: the [`game::Simulation`] tying the above together, remote player
//!   cache and trade state
//! - `input`: keyboard sampling with press-edge detection
//! - `network`: WebSocket connection on a background thread
//! - `rendering`: macroquad drawing
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::{Controls, Simulation};
//! use client::network::{NetworkClient, NetworkEvent};
//! use std::time::Instant;
//!
//! let mut network = NetworkClient::connect("ws://127.0.0.1:3002").unwrap();
//! let mut sim = Simulation::new(800.0, 600.0, "Bob", None, Instant::now());
//!
//! loop {
//!     for event in network.poll() {
//!         if let NetworkEvent::Packet(packet) = event {
//!             for reply in sim.handle_packet(packet) {
//!                 network.send(reply);
//!             }
//!         }
//!     }
//!     if let Some(update) = sim.step(&Controls::default(), Instant::now()) {
//!         network.send(update);
//!     }
//! }
//! ```

pub mod anaconda;
pub mod effects;
pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
pub mod weather;
pub mod world;
