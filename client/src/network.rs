//! WebSocket connection to the relay, run on a background thread
//!
//! The frame loop never blocks on the network: outgoing packets go onto a queue
//! that a writer drains, and everything received is queued up for the next
//! [`NetworkClient::poll`].

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientPacket, ServerPacket};
use std::thread;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    Packet(ServerPacket),
    Closed(String),
}

pub struct NetworkClient {
    outgoing: mpsc::UnboundedSender<ClientPacket>,
    incoming: mpsc::UnboundedReceiver<NetworkEvent>,
    connected: bool,
}

impl NetworkClient {
    /// Starts connecting to `url` in the background
    pub fn connect(url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming) = mpsc::unbounded_channel();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let url = url.to_string();

        thread::Builder::new()
            .name("network".to_string())
            .spawn(move || {
                let reason = match runtime.block_on(run_connection(&url, outgoing_rx, incoming_tx.clone())) {
                    Ok(()) => "Connection closed".to_string(),
                    Err(e) => {
                        error!("Connection to {} failed: {}", url, e);
                        e.to_string()
                    }
                };
                let _ = incoming_tx.send(NetworkEvent::Closed(reason));
            })?;

        Ok(Self {
            outgoing,
            incoming,
            connected: true,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Queues a packet; returns false once the connection is gone
    pub fn send(&self, packet: ClientPacket) -> bool {
        self.outgoing.send(packet).is_ok()
    }

    /// Drains everything received since the last call
    pub fn poll(&mut self) -> Vec<NetworkEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.incoming.try_recv() {
            if matches!(event, NetworkEvent::Closed(_)) {
                self.connected = false;
            }
            events.push(event);
        }
        events
    }
}

/// Pumps one WebSocket connection until either side closes it
pub async fn run_connection(
    url: &str,
    mut outgoing: mpsc::UnboundedReceiver<ClientPacket>,
    incoming: mpsc::UnboundedSender<NetworkEvent>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (ws_stream, _) = connect_async(url).await?;
    info!("Connected to {}", url);
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            packet = outgoing.recv() => {
                let Some(packet) = packet else {
                    // The frame loop is gone
                    write.close().await?;
                    return Ok(());
                };
                write.send(Message::Text(packet.to_json()?)).await?;
            },

            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match ServerPacket::from_json(&text) {
                        Ok(packet) => {
                            if incoming.send(NetworkEvent::Packet(packet)).is_err() {
                                return Ok(());
                            }
                        }
                        Err(e) => warn!("Failed to decode server packet: {}", e),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        debug!("Server closed the connection: {:?}", frame);
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(()),
                }
            },
        }
    }
}
