//! Connection tracking for the relay server
//!
//! This module handles the transport-level view of connected clients:
//! - Connection lifecycle (accept, disconnect)
//! - Connection identity assignment
//! - Outbound queues used to push packets to each socket
//! - Capacity enforcement
//!
//! It knows nothing about players; a connection exists here from the moment the
//! socket is accepted, whether or not the client has joined the game yet.

use log::{debug, info};
use shared::{ClientId, ServerPacket};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;

/// A live connection and the queue feeding its socket writer task
#[derive(Debug)]
pub struct Client {
    /// Connection identity assigned by the server
    pub id: ClientId,
    /// Remote address, kept for logging
    pub addr: SocketAddr,
    /// When the socket was accepted
    pub connected_at: Instant,
    /// Outbound packets for this connection
    sender: mpsc::UnboundedSender<ServerPacket>,
}

impl Client {
    pub fn new(id: ClientId, addr: SocketAddr, sender: mpsc::UnboundedSender<ServerPacket>) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            sender,
        }
    }

    /// Queues a packet for this connection
    ///
    /// Returns false when the writer task has already gone away, which happens
    /// between a socket closing and the disconnect being processed.
    pub fn send(&self, packet: ServerPacket) -> bool {
        self.sender.send(packet).is_ok()
    }
}

/// Manages all live connections
///
/// Connection ids start from 1 and are never reused for the lifetime of the
/// process, so a stale id from a closed socket cannot alias a new client.
pub struct ClientManager {
    /// Connected clients indexed by their unique ID
    clients: HashMap<ClientId, Client>,
    /// Next available client ID for new connections
    next_client_id: ClientId,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Attempts to register a new connection
    ///
    /// Returns Some(client_id) if successful, None if the server is at capacity.
    pub fn add_client(
        &mut self,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<ServerPacket>,
    ) -> Option<ClientId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr, sender));

        Some(client_id)
    }

    /// Removes a connection. Returns true if it was present.
    pub fn remove_client(&mut self, client_id: &ClientId) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!(
                "Client {} disconnected after {:.1}s",
                client.id,
                client.connected_at.elapsed().as_secs_f32()
            );
            true
        } else {
            false
        }
    }

    /// Queues a packet for one connection. Unknown ids are ignored.
    pub fn send_to(&self, client_id: ClientId, packet: ServerPacket) -> bool {
        match self.clients.get(&client_id) {
            Some(client) => client.send(packet),
            None => {
                debug!("Dropping packet for unknown client {}", client_id);
                false
            }
        }
    }

    /// Queues the same packet for every connection, returning how many accepted it
    pub fn broadcast(&self, packet: &ServerPacket) -> usize {
        self.clients
            .values()
            .filter(|client| client.send(packet.clone()))
            .count()
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
