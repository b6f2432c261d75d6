//! The relay's game-facing state and event handlers
//!
//! `Relay` owns every piece of mutable server state: the player registry, the
//! active trades, the capybara pen and the set of live connections. It is driven
//! by a single task, one event at a time, and never touches a socket. Each
//! handler returns the packets that should go out, which the network layer then
//! delivers.

use crate::capybara::CapybaraPen;
use crate::registry::PlayerRegistry;
use crate::trade::{TradeBook, TradeRefusal};
use log::{debug, info};
use shared::{ClientId, ClientPacket, ServerPacket, Trade};
use std::collections::HashSet;
use std::time::Instant;

/// Packets produced by the relay for the network layer to deliver
#[derive(Debug, Clone, PartialEq)]
pub enum GameMessage {
    SendPacket {
        client_id: ClientId,
        packet: ServerPacket,
    },
    BroadcastPacket {
        packet: ServerPacket,
    },
}

#[derive(Debug, Default)]
pub struct Relay {
    connections: HashSet<ClientId>,
    registry: PlayerRegistry,
    trades: TradeBook,
    capybaras: CapybaraPen,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn trades(&self) -> &TradeBook {
        &self.trades
    }

    pub fn capybaras(&self) -> &CapybaraPen {
        &self.capybaras
    }

    pub fn is_connected(&self, client_id: ClientId) -> bool {
        self.connections.contains(&client_id)
    }

    /// Registers a fresh connection and tells the client its identity
    pub fn on_connect(&mut self, client_id: ClientId) -> Vec<GameMessage> {
        self.connections.insert(client_id);
        vec![GameMessage::SendPacket {
            client_id,
            packet: ServerPacket::Connected { client_id },
        }]
    }

    /// Forgets everything tied to a closed connection
    ///
    /// The registry entry goes first, then open trades are cancelled towards the
    /// other party, and finally every remaining client gets the new snapshot.
    pub fn on_disconnect(&mut self, client_id: ClientId) -> Vec<GameMessage> {
        self.connections.remove(&client_id);
        self.registry.remove(&client_id);
        self.capybaras.release(&client_id);

        let mut out = Vec::new();
        for trade in self.trades.abandon(client_id) {
            let other = if trade.sender_id == client_id {
                trade.receiver_id
            } else {
                trade.sender_id
            };
            debug!("Trade {} cancelled, client {} left", trade.id, client_id);
            out.push(GameMessage::SendPacket {
                client_id: other,
                packet: ServerPacket::TradeRejected { trade_id: trade.id },
            });
        }

        out.push(self.snapshot_broadcast());
        out
    }

    /// Advances the capybara lifecycle by one tick
    pub fn on_tick(&mut self, now: Instant) {
        self.capybaras.tick(now);
    }

    pub fn handle_packet(
        &mut self,
        from: ClientId,
        packet: ClientPacket,
        now: Instant,
    ) -> Vec<GameMessage> {
        match packet {
            ClientPacket::PlayerJoin {
                x,
                y,
                direction,
                pseudo,
            } => {
                self.registry.join(from, x, y, direction, pseudo);
                vec![self.snapshot_broadcast()]
            }

            ClientPacket::UpdatePosition { x, y, direction } => {
                self.registry.update(from, x, y, direction);
                vec![self.snapshot_broadcast()]
            }

            ClientPacket::Interaction { target_id } => {
                if !self.connections.contains(&target_id) {
                    debug!("Interaction from {} to unknown client {}", from, target_id);
                    return Vec::new();
                }
                vec![GameMessage::SendPacket {
                    client_id: target_id,
                    packet: ServerPacket::InteractionReceived { from_id: from },
                }]
            }

            ClientPacket::TradeRequest { receiver_id } => self.open_trade(from, receiver_id),

            ClientPacket::TradeResponse { trade_id, accepted } => {
                match self.trades.respond(&trade_id, from, accepted) {
                    Ok(trade) => {
                        let packet = if accepted {
                            ServerPacket::TradeAccepted { trade_id }
                        } else {
                            ServerPacket::TradeRejected { trade_id }
                        };
                        vec![GameMessage::SendPacket {
                            client_id: trade.sender_id,
                            packet,
                        }]
                    }
                    Err(refusal) => Self::refused(from, &trade_id, refusal),
                }
            }

            ClientPacket::AddTradeItem { trade_id, item } => {
                match self.trades.add_item(&trade_id, from, item) {
                    Ok(trade) => Self::to_both_parties(&trade, ServerPacket::TradeUpdated(trade.clone())),
                    Err(refusal) => Self::refused(from, &trade_id, refusal),
                }
            }

            ClientPacket::TradeComplete { trade_id } => {
                match self.trades.complete(&trade_id, from) {
                    Ok(trade) => {
                        info!("Trade {} completed", trade.id);
                        Self::to_both_parties(&trade, ServerPacket::TradeCompleted { trade_id })
                    }
                    Err(refusal) => Self::refused(from, &trade_id, refusal),
                }
            }

            ClientPacket::Chat { message } => vec![GameMessage::BroadcastPacket {
                packet: ServerPacket::Chat {
                    from_id: from,
                    message,
                },
            }],

            ClientPacket::AdoptCapybara { name } => {
                let capybara = self.capybaras.adopt(from, name, now).report();
                vec![Self::capybara_status(from, true, capybara)]
            }

            ClientPacket::FeedCapybara { nutrition } => {
                let accepted = self.capybaras.feed(from, nutrition, now);
                self.capybara_reply(from, accepted)
            }

            ClientPacket::WalkCapybara => {
                let accepted = self.capybaras.walk(from, now);
                self.capybara_reply(from, accepted)
            }
        }
    }

    fn open_trade(&mut self, sender_id: ClientId, receiver_id: ClientId) -> Vec<GameMessage> {
        let (Some(sender), true) = (
            self.registry.get(&sender_id),
            self.registry.contains(&receiver_id),
        ) else {
            debug!(
                "Trade request {} -> {} ignored, both players must have joined",
                sender_id, receiver_id
            );
            return Vec::new();
        };
        let sender_name = sender.pseudo.clone();

        let trade_id = self.trades.open(sender_id, receiver_id);
        info!("Trade {} opened: {} -> {}", trade_id, sender_id, receiver_id);

        vec![GameMessage::SendPacket {
            client_id: receiver_id,
            packet: ServerPacket::TradeRequest {
                trade_id,
                sender: sender_name,
            },
        }]
    }

    fn snapshot_broadcast(&self) -> GameMessage {
        GameMessage::BroadcastPacket {
            packet: ServerPacket::PlayerUpdate(self.registry.snapshot()),
        }
    }

    fn to_both_parties(trade: &Trade, packet: ServerPacket) -> Vec<GameMessage> {
        vec![
            GameMessage::SendPacket {
                client_id: trade.sender_id,
                packet: packet.clone(),
            },
            GameMessage::SendPacket {
                client_id: trade.receiver_id,
                packet,
            },
        ]
    }

    fn refused(from: ClientId, trade_id: &str, refusal: TradeRefusal) -> Vec<GameMessage> {
        debug!("Trade {} from client {} dropped: {}", trade_id, from, refusal);
        Vec::new()
    }

    fn capybara_reply(&self, owner_id: ClientId, accepted: Option<bool>) -> Vec<GameMessage> {
        match (accepted, self.capybaras.get(&owner_id)) {
            (Some(accepted), Some(capybara)) => {
                vec![Self::capybara_status(owner_id, accepted, capybara.report())]
            }
            _ => {
                debug!("Client {} has no capybara", owner_id);
                Vec::new()
            }
        }
    }

    fn capybara_status(
        client_id: ClientId,
        accepted: bool,
        capybara: shared::CapybaraReport,
    ) -> GameMessage {
        GameMessage::SendPacket {
            client_id,
            packet: ServerPacket::CapybaraStatus { accepted, capybara },
        }
    }
}
