//! Trade records exchanged between two connected players.

use crate::ClientId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Items are opaque to the relay; clients decide what they contain.
pub type TradeItem = serde_json::Value;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

#[derive(Debug, Error, PartialEq)]
pub enum TradeError {
    #[error("trade cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: TradeStatus, to: TradeStatus },
    #[error("items can only be added to an accepted trade (status is {0:?})")]
    NotAccepted(TradeStatus),
    #[error("client {0} is not a party to this trade")]
    NotParty(ClientId),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub sender_id: ClientId,
    pub receiver_id: ClientId,
    pub sender_items: Vec<TradeItem>,
    pub receiver_items: Vec<TradeItem>,
    pub status: TradeStatus,
}

impl Trade {
    pub fn new(id: impl Into<String>, sender_id: ClientId, receiver_id: ClientId) -> Self {
        Self {
            id: id.into(),
            sender_id,
            receiver_id,
            sender_items: Vec::new(),
            receiver_items: Vec::new(),
            status: TradeStatus::Pending,
        }
    }

    pub fn is_party(&self, client_id: ClientId) -> bool {
        client_id == self.sender_id || client_id == self.receiver_id
    }

    pub fn accept(&mut self) -> Result<(), TradeError> {
        self.transition(TradeStatus::Pending, TradeStatus::Accepted)
    }

    pub fn reject(&mut self) -> Result<(), TradeError> {
        self.transition(TradeStatus::Pending, TradeStatus::Rejected)
    }

    pub fn complete(&mut self) -> Result<(), TradeError> {
        self.transition(TradeStatus::Accepted, TradeStatus::Completed)
    }

    /// Appends `item` to the list owned by `client_id`.
    pub fn add_item(&mut self, client_id: ClientId, item: TradeItem) -> Result<(), TradeError> {
        if self.status != TradeStatus::Accepted {
            return Err(TradeError::NotAccepted(self.status));
        }

        if client_id == self.sender_id {
            self.sender_items.push(item);
        } else if client_id == self.receiver_id {
            self.receiver_items.push(item);
        } else {
            return Err(TradeError::NotParty(client_id));
        }
        Ok(())
    }

    fn transition(&mut self, from: TradeStatus, to: TradeStatus) -> Result<(), TradeError> {
        if self.status != from {
            return Err(TradeError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
