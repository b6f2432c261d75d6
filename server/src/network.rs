//! Server network layer handling WebSocket connections and event coordination

use crate::client_manager::ClientManager;
use crate::relay::{GameMessage, Relay};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientId, ClientPacket, ServerPacket};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;

/// Messages sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    ClientConnected {
        client_id: ClientId,
    },
    PacketReceived {
        client_id: ClientId,
        packet: ClientPacket,
    },
    ClientDisconnected {
        client_id: ClientId,
    },
}

/// Main server coordinating connections and the relay
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    clients: Arc<RwLock<ClientManager>>,
    relay: Relay,
    tick_duration: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: Option<mpsc::UnboundedReceiver<GameMessage>>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        max_clients: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on ws://{}", local_addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Some(listener),
            local_addr,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients))),
            relay: Relay::new(),
            tick_duration,
            server_tx,
            server_rx,
            game_tx,
            game_rx: Some(game_rx),
        })
    }

    /// Address the listener is bound to, useful when binding to port 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Spawns task that accepts sockets and hands each one to its own task
    fn spawn_acceptor(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let clients = Arc::clone(&clients);
                        let server_tx = server_tx.clone();
                        tokio::spawn(async move {
                            if let Err(e) = Self::handle_connection(stream, addr, clients, server_tx).await {
                                warn!("Connection from {} ended with error: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Performs the WebSocket handshake, then pumps frames in both directions
    ///
    /// Inbound text frames are decoded and forwarded to the main loop; frames that
    /// do not decode are dropped. Outbound packets arrive on a per-connection queue
    /// owned by the client manager, so removing the client ends the writer.
    async fn handle_connection(
        stream: TcpStream,
        addr: SocketAddr,
        clients: Arc<RwLock<ClientManager>>,
        server_tx: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ws_stream = tokio_tungstenite::accept_async(stream).await?;
        let (mut write, mut read) = ws_stream.split();

        let (packet_tx, mut packet_rx) = mpsc::unbounded_channel::<ServerPacket>();
        let client_id = {
            let mut clients = clients.write().await;
            clients.add_client(addr, packet_tx)
        };

        let Some(client_id) = client_id else {
            info!("Refusing {}: server full", addr);
            let response = ServerPacket::Disconnected {
                reason: "Server full".to_string(),
            };
            write.send(Message::Text(response.to_json()?)).await?;
            write.close().await?;
            return Ok(());
        };

        server_tx.send(ServerMessage::ClientConnected { client_id })?;

        tokio::spawn(async move {
            while let Some(packet) = packet_rx.recv().await {
                let json = match packet.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize packet for {}: {}", client_id, e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(json)).await {
                    debug!("Failed to send to client {}: {}", client_id, e);
                    break;
                }
            }
        });

        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => match ClientPacket::from_json(&text) {
                    Ok(packet) => {
                        server_tx.send(ServerMessage::PacketReceived { client_id, packet })?;
                    }
                    Err(e) => warn!("Failed to decode packet from client {}: {}", client_id, e),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Socket error for client {}: {}", client_id, e);
                    break;
                }
            }
        }

        server_tx.send(ServerMessage::ClientDisconnected { client_id })?;
        Ok(())
    }

    /// Spawns task that delivers relay output to the connection queues
    fn spawn_network_sender(&mut self) {
        let Some(mut game_rx) = self.game_rx.take() else {
            return;
        };
        let clients = Arc::clone(&self.clients);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                let clients = clients.read().await;
                match message {
                    GameMessage::SendPacket { client_id, packet } => {
                        clients.send_to(client_id, packet);
                    }
                    GameMessage::BroadcastPacket { packet } => {
                        clients.broadcast(&packet);
                    }
                }
            }
        });
    }

    fn dispatch(&self, messages: Vec<GameMessage>) {
        for message in messages {
            if let Err(e) = self.game_tx.send(message) {
                error!("Failed to queue outgoing packet: {}", e);
            }
        }
    }

    async fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::ClientConnected { client_id } => {
                let out = self.relay.on_connect(client_id);
                self.dispatch(out);
            }
            ServerMessage::PacketReceived { client_id, packet } => {
                let out = self.relay.handle_packet(client_id, packet, Instant::now());
                self.dispatch(out);
            }
            ServerMessage::ClientDisconnected { client_id } => {
                self.clients.write().await.remove_client(&client_id);
                let out = self.relay.on_disconnect(client_id);
                self.dispatch(out);
            }
        }
    }

    /// Main server loop; every event is handled to completion before the next
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_acceptor();
        self.spawn_network_sender();

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick fires immediately
        tick_interval.tick().await;

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(message) => self.handle_message(message).await,
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    self.relay.on_tick(Instant::now());
                    let client_count = self.clients.read().await.len();
                    debug!(
                        "Tick: {} connections, {} players, {} trades",
                        client_count,
                        self.relay.registry().len(),
                        self.relay.trades().len()
                    );
                },
            }
        }

        Ok(())
    }
}
