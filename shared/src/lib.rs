use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

pub mod trade;

pub use trade::{Trade, TradeError, TradeItem, TradeStatus};

pub const WORLD_WIDTH: f32 = 800.0;
pub const WORLD_HEIGHT: f32 = 600.0;
pub const CAPYBARA_WIDTH: f32 = 50.0;
pub const CAPYBARA_HEIGHT: f32 = 40.0;
pub const BASE_SPEED: f32 = 5.0;
pub const MAX_HUNGER: f32 = 100.0;
pub const MAX_HAPPINESS: f32 = 100.0;
pub const INTERACTION_DISTANCE: f32 = 100.0;

/// Connection identity assigned by the server when a socket is accepted.
pub type ClientId = u32;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    #[default]
    Right,
}

/// Last reported state of a player, as held by the relay registry.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerState {
    pub id: ClientId,
    pub x: f32,
    pub y: f32,
    pub direction: Direction,
    #[serde(default)]
    pub pseudo: String,
}

impl PlayerState {
    pub fn new(id: ClientId, x: f32, y: f32, direction: Direction, pseudo: impl Into<String>) -> Self {
        Self {
            id,
            x,
            y,
            direction,
            pseudo: pseudo.into(),
        }
    }

    pub fn get_bounds(&self) -> Rect {
        Rect::new(self.x, self.y, CAPYBARA_WIDTH, CAPYBARA_HEIGHT)
    }

    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }
}

/// Axis-aligned box with its origin at the top-left corner.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box of side `2 * radius` around a circle's center.
    pub fn around(cx: f32, cy: f32, radius: f32) -> Self {
        Self::new(cx - radius, cy - radius, radius * 2.0, radius * 2.0)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Strict overlap test; boxes that only touch along an edge do not collide.
pub fn check_collision(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.width && a.x + a.width > b.x && a.y < b.y + b.height && a.y + a.height > b.y
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CapybaraActivity {
    Idle,
    Walking,
    Eating,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapybaraReport {
    pub id: String,
    pub name: String,
    pub hunger: f32,
    pub happiness: f32,
    pub state: CapybaraActivity,
    pub position: (f32, f32),
}

/// Rejects values that decode to infinity or NaN; serde_json would write them back out as `null`.
fn finite_f32<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f32::deserialize(deserializer)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(serde::de::Error::custom(format!("non-finite number {}", value)))
    }
}

/// Events sent from a client to the relay.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ClientPacket {
    #[serde(rename = "playerJoin")]
    PlayerJoin {
        #[serde(deserialize_with = "finite_f32")]
        x: f32,
        #[serde(deserialize_with = "finite_f32")]
        y: f32,
        direction: Direction,
        #[serde(default)]
        pseudo: String,
    },
    #[serde(rename = "updatePosition")]
    UpdatePosition {
        #[serde(deserialize_with = "finite_f32")]
        x: f32,
        #[serde(deserialize_with = "finite_f32")]
        y: f32,
        direction: Direction,
    },
    #[serde(rename = "interaction")]
    Interaction { target_id: ClientId },
    #[serde(rename = "trade-request")]
    TradeRequest { receiver_id: ClientId },
    #[serde(rename = "trade-response")]
    TradeResponse { trade_id: String, accepted: bool },
    #[serde(rename = "add-trade-item")]
    AddTradeItem { trade_id: String, item: TradeItem },
    #[serde(rename = "trade-complete")]
    TradeComplete { trade_id: String },
    #[serde(rename = "chat")]
    Chat { message: String },
    #[serde(rename = "adopt-capybara")]
    AdoptCapybara { name: String },
    #[serde(rename = "feed-capybara")]
    FeedCapybara {
        #[serde(deserialize_with = "finite_f32")]
        nutrition: f32,
    },
    #[serde(rename = "walk-capybara")]
    WalkCapybara,
}

/// Events sent from the relay to a client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ServerPacket {
    #[serde(rename = "connected")]
    Connected { client_id: ClientId },
    #[serde(rename = "disconnected")]
    Disconnected { reason: String },
    #[serde(rename = "playerUpdate")]
    PlayerUpdate(HashMap<ClientId, PlayerState>),
    #[serde(rename = "interactionReceived")]
    InteractionReceived { from_id: ClientId },
    #[serde(rename = "trade-request")]
    TradeRequest { trade_id: String, sender: String },
    #[serde(rename = "trade-accepted")]
    TradeAccepted { trade_id: String },
    #[serde(rename = "trade-rejected")]
    TradeRejected { trade_id: String },
    #[serde(rename = "trade-updated")]
    TradeUpdated(Trade),
    #[serde(rename = "trade-completed")]
    TradeCompleted { trade_id: String },
    #[serde(rename = "chat")]
    Chat { from_id: ClientId, message: String },
    #[serde(rename = "capybara-status")]
    CapybaraStatus {
        accepted: bool,
        capybara: CapybaraReport,
    },
}

impl ClientPacket {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl ServerPacket {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_player_creation() {
        let player = PlayerState::new(1, 100.0, 200.0, Direction::Left, "Bob");
        assert_eq!(player.id, 1);
        assert_eq!(player.x, 100.0);
        assert_eq!(player.y, 200.0);
        assert_eq!(player.direction, Direction::Left);
        assert_eq!(player.pseudo, "Bob");
    }

    #[test]
    fn test_player_bounds() {
        let player = PlayerState::new(1, 50.0, 75.0, Direction::Right, "");
        let bounds = player.get_bounds();
        assert_eq!(bounds.x, 50.0);
        assert_eq!(bounds.y, 75.0);
        assert_eq!(bounds.width, CAPYBARA_WIDTH);
        assert_eq!(bounds.height, CAPYBARA_HEIGHT);
    }

    #[test]
    fn test_player_distance() {
        let player = PlayerState::new(1, 0.0, 0.0, Direction::Right, "");
        assert_approx_eq!(player.distance_to(3.0, 4.0), 5.0, 0.0001);
    }

    #[test]
    fn test_rect_around_circle() {
        let rect = Rect::around(10.0, 20.0, 5.0);
        assert_eq!(rect, Rect::new(5.0, 15.0, 10.0, 10.0));
        assert_eq!(rect.center(), (10.0, 20.0));
    }

    #[test]
    fn test_collision_detection_no_collision() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(100.0, 100.0, 10.0, 10.0);
        assert!(!check_collision(&a, &b));
    }

    #[test]
    fn test_collision_detection_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(check_collision(&a, &b));
        assert!(check_collision(&b, &a));
    }

    #[test]
    fn test_collision_detection_exact_touch() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!check_collision(&a, &b));
    }

    #[test]
    fn test_direction_wire_names() {
        assert_eq!(serde_json::to_string(&Direction::Left).unwrap(), "\"left\"");
        assert_eq!(serde_json::to_string(&Direction::Right).unwrap(), "\"right\"");
    }

    #[test]
    fn test_player_join_wire_format() {
        let text = r#"{"event":"playerJoin","data":{"x":100,"y":100,"direction":"right","pseudo":"Bob"}}"#;
        let packet = ClientPacket::from_json(text).unwrap();

        assert_eq!(
            packet,
            ClientPacket::PlayerJoin {
                x: 100.0,
                y: 100.0,
                direction: Direction::Right,
                pseudo: "Bob".to_string(),
            }
        );
    }

    #[test]
    fn test_camel_case_fields() {
        let packet = ClientPacket::TradeResponse {
            trade_id: "abc".to_string(),
            accepted: true,
        };
        let json = packet.to_json().unwrap();
        assert!(json.contains("\"event\":\"trade-response\""));
        assert!(json.contains("\"tradeId\":\"abc\""));

        let interaction = ClientPacket::from_json(r#"{"event":"interaction","data":{"targetId":7}}"#);
        assert_eq!(interaction.unwrap(), ClientPacket::Interaction { target_id: 7 });
    }

    #[test]
    fn test_unit_event_without_payload() {
        let packet = ClientPacket::from_json(r#"{"event":"walk-capybara"}"#).unwrap();
        assert_eq!(packet, ClientPacket::WalkCapybara);
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        assert!(ClientPacket::from_json(r#"{"event":"teleport","data":{}}"#).is_err());
        assert!(ClientPacket::from_json("not json").is_err());
    }

    #[test]
    fn test_player_update_snapshot_keys() {
        let mut players = HashMap::new();
        players.insert(3, PlayerState::new(3, 1.0, 2.0, Direction::Left, "Ana"));

        let json = ServerPacket::PlayerUpdate(players.clone()).to_json().unwrap();
        assert!(json.contains("\"3\":{"));

        match ServerPacket::from_json(&json).unwrap() {
            ServerPacket::PlayerUpdate(decoded) => assert_eq!(decoded, players),
            other => panic!("Wrong packet type after deserialization: {:?}", other),
        }
    }

    #[test]
    fn test_server_trade_request_fields() {
        let packet = ServerPacket::TradeRequest {
            trade_id: "t-1".to_string(),
            sender: "Bob".to_string(),
        };
        let value: serde_json::Value = serde_json::from_str(&packet.to_json().unwrap()).unwrap();
        assert_eq!(value["event"], "trade-request");
        assert_eq!(value["data"]["tradeId"], "t-1");
        assert_eq!(value["data"]["sender"], "Bob");
    }

    #[test]
    fn test_non_finite_coordinates_are_rejected() {
        let overflow = r#"{"event":"updatePosition","data":{"x":1e39,"y":10,"direction":"left"}}"#;
        assert!(ClientPacket::from_json(overflow).is_err());

        let join = r#"{"event":"playerJoin","data":{"x":5,"y":-1e40,"direction":"right","pseudo":"Bob"}}"#;
        assert!(ClientPacket::from_json(join).is_err());

        let feed = r#"{"event":"feed-capybara","data":{"nutrition":1e39}}"#;
        assert!(ClientPacket::from_json(feed).is_err());

        // Large but representable values still decode
        let edge = r#"{"event":"updatePosition","data":{"x":3e38,"y":-3e38,"direction":"left"}}"#;
        assert!(ClientPacket::from_json(edge).is_ok());
    }

    #[test]
    fn test_accepted_coordinates_survive_the_snapshot() {
        let text = r#"{"event":"updatePosition","data":{"x":123456.75,"y":12.5,"direction":"left"}}"#;
        let ClientPacket::UpdatePosition { x, y, direction } = ClientPacket::from_json(text).unwrap() else {
            panic!("Expected an updatePosition packet");
        };

        let mut players = HashMap::new();
        players.insert(2, PlayerState::new(2, x, y, direction, ""));
        let json = ServerPacket::PlayerUpdate(players.clone()).to_json().unwrap();
        assert!(!json.contains("null"));
        assert_eq!(ServerPacket::from_json(&json).unwrap(), ServerPacket::PlayerUpdate(players));
    }
}
