//! Active trades, keyed by a server-generated token.

use shared::{ClientId, Trade, TradeError, TradeItem};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct TradeBook {
    trades: HashMap<String, Trade>,
}

/// Why a trade event was not applied
#[derive(Debug, Error, PartialEq)]
pub enum TradeRefusal {
    #[error("no active trade with that id")]
    UnknownTrade,
    #[error(transparent)]
    NotAllowed(#[from] TradeError),
}

impl TradeBook {
    pub fn new() -> Self {
        Self {
            trades: HashMap::new(),
        }
    }

    /// Opens a pending trade and returns its id
    pub fn open(&mut self, sender_id: ClientId, receiver_id: ClientId) -> String {
        let id = Uuid::new_v4().to_string();
        self.trades
            .insert(id.clone(), Trade::new(id.clone(), sender_id, receiver_id));
        id
    }

    pub fn get(&self, trade_id: &str) -> Option<&Trade> {
        self.trades.get(trade_id)
    }

    /// Applies the receiver's answer. Rejected trades leave the active set.
    pub fn respond(
        &mut self,
        trade_id: &str,
        responder: ClientId,
        accepted: bool,
    ) -> Result<Trade, TradeRefusal> {
        let trade = self
            .trades
            .get_mut(trade_id)
            .ok_or(TradeRefusal::UnknownTrade)?;

        if responder != trade.receiver_id {
            return Err(TradeError::NotParty(responder).into());
        }

        if accepted {
            trade.accept()?;
            Ok(trade.clone())
        } else {
            trade.reject()?;
            self.trades.remove(trade_id).ok_or(TradeRefusal::UnknownTrade)
        }
    }

    pub fn add_item(
        &mut self,
        trade_id: &str,
        client_id: ClientId,
        item: TradeItem,
    ) -> Result<Trade, TradeRefusal> {
        let trade = self
            .trades
            .get_mut(trade_id)
            .ok_or(TradeRefusal::UnknownTrade)?;
        trade.add_item(client_id, item)?;
        Ok(trade.clone())
    }

    /// Marks an accepted trade completed and removes it from the active set
    pub fn complete(&mut self, trade_id: &str, client_id: ClientId) -> Result<Trade, TradeRefusal> {
        let trade = self
            .trades
            .get_mut(trade_id)
            .ok_or(TradeRefusal::UnknownTrade)?;

        if !trade.is_party(client_id) {
            return Err(TradeError::NotParty(client_id).into());
        }
        trade.complete()?;
        self.trades.remove(trade_id).ok_or(TradeRefusal::UnknownTrade)
    }

    /// Drops every trade involving a departed client, returning them
    pub fn abandon(&mut self, client_id: ClientId) -> Vec<Trade> {
        let ids: Vec<String> = self
            .trades
            .values()
            .filter(|trade| trade.is_party(client_id))
            .map(|trade| trade.id.clone())
            .collect();

        ids.iter()
            .filter_map(|id| self.trades.remove(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}
