//! Last-known state of every joined player.

use log::{debug, info};
use shared::{ClientId, Direction, PlayerState};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    players: HashMap<ClientId, PlayerState>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
        }
    }

    /// Records the state a client announced when joining, replacing any earlier entry.
    pub fn join(&mut self, client_id: ClientId, x: f32, y: f32, direction: Direction, pseudo: String) {
        info!("Player {} joined as {:?} at ({}, {})", client_id, pseudo, x, y);
        self.players
            .insert(client_id, PlayerState::new(client_id, x, y, direction, pseudo));
    }

    /// Overwrites position and facing. The pseudo announced at join is kept; a
    /// client that never joined gets an entry with an empty pseudo.
    pub fn update(&mut self, client_id: ClientId, x: f32, y: f32, direction: Direction) {
        match self.players.get_mut(&client_id) {
            Some(player) => {
                player.x = x;
                player.y = y;
                player.direction = direction;
            }
            None => {
                debug!("Position from client {} before join", client_id);
                self.players
                    .insert(client_id, PlayerState::new(client_id, x, y, direction, ""));
            }
        }
    }

    pub fn remove(&mut self, client_id: &ClientId) -> Option<PlayerState> {
        let removed = self.players.remove(client_id);
        if removed.is_some() {
            info!("Removed player {}", client_id);
        }
        removed
    }

    pub fn get(&self, client_id: &ClientId) -> Option<&PlayerState> {
        self.players.get(client_id)
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.players.contains_key(client_id)
    }

    /// Full copy of the registry, as broadcast to every client
    pub fn snapshot(&self) -> HashMap<ClientId, PlayerState> {
        self.players.clone()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
