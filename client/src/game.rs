//! Local, frame-driven simulation of the player's capybara and the meadow around it

use crate::anaconda::Anaconda;
use crate::effects::Effects;
use crate::weather::Weather;
use crate::world::{generate_fruits, place_fruit, Fruit, FruitKind, World, FRUIT_COUNT};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use shared::{
    check_collision, CapybaraReport, ClientId, ClientPacket, Direction, PlayerState, Rect,
    ServerPacket, Trade, TradeStatus, BASE_SPEED, CAPYBARA_HEIGHT, CAPYBARA_WIDTH,
    INTERACTION_DISTANCE, MAX_HAPPINESS, MAX_HUNGER,
};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

pub const BOOST_DURATION: Duration = Duration::from_secs(10);
pub const BOOST_MULTIPLIER: f32 = 2.0;
pub const HUNGER_DECAY: f32 = 0.02;
pub const FIRE_DAMAGE: f32 = 0.1;
pub const SNAKE_DAMAGE: f32 = FIRE_DAMAGE * 5.0;
pub const FOOD_ZONE_RATE: f32 = 0.5;
pub const FRIENDSHIP_HAPPINESS: f32 = 10.0;
pub const PET_MEAL: f32 = 20.0;
const MAX_NOTICES: usize = 5;

/// Keys held during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub feed: bool,
}

#[derive(Debug, Clone)]
pub struct LocalPlayer {
    pub x: f32,
    pub y: f32,
    pub direction: Direction,
    pub pseudo: String,
    pub hunger: f32,
    pub happiness: f32,
    pub is_eating: bool,
    pub is_on_fire: bool,
    pub boost_until: Option<Instant>,
    /// Last non-boost fruit eaten, offered when trading
    pub last_fruit: Option<FruitKind>,
}

impl LocalPlayer {
    pub fn new(world: &World, pseudo: impl Into<String>) -> Self {
        Self {
            x: world.width / 2.0,
            y: world.height / 2.0,
            direction: Direction::Right,
            pseudo: pseudo.into(),
            hunger: MAX_HUNGER,
            happiness: MAX_HAPPINESS,
            is_eating: false,
            is_on_fire: false,
            boost_until: None,
            last_fruit: None,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, CAPYBARA_WIDTH, CAPYBARA_HEIGHT)
    }

    pub fn center(&self) -> (f32, f32) {
        self.bounds().center()
    }

    pub fn is_boosted(&self, now: Instant) -> bool {
        self.boost_until.is_some_and(|until| now < until)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Score {
    pub food_eaten: f32,
    pub friends_made: u32,
    pub time_alive: u32,
}

impl Score {
    pub fn value(&self) -> u32 {
        (self.food_eaten + self.friends_made as f32 * 10.0).floor() as u32
    }
}

/// Cache of everyone else, replaced wholesale by each snapshot
#[derive(Debug, Default, Clone)]
pub struct RemotePlayers {
    own_id: Option<ClientId>,
    players: HashMap<ClientId, PlayerState>,
}

impl RemotePlayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn own_id(&self) -> Option<ClientId> {
        self.own_id
    }

    pub fn set_own_id(&mut self, id: ClientId) {
        self.own_id = Some(id);
        self.players.remove(&id);
    }

    pub fn apply_snapshot(&mut self, mut snapshot: HashMap<ClientId, PlayerState>) {
        if let Some(id) = self.own_id {
            snapshot.remove(&id);
        }
        self.players = snapshot;
    }

    pub fn get(&self, id: &ClientId) -> Option<&PlayerState> {
        self.players.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Closest player to `(x, y)`, optionally only within `max_distance`
    pub fn nearest(&self, x: f32, y: f32, max_distance: Option<f32>) -> Option<&PlayerState> {
        self.players
            .values()
            .map(|player| (player, player.distance_to(x, y)))
            .filter(|(_, distance)| max_distance.map_or(true, |max| *distance < max))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(player, _)| player)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncomingTrade {
    pub trade_id: String,
    pub sender: String,
}

/// What this client knows about its trades
#[derive(Debug, Default, Clone)]
pub struct TradeDesk {
    pub incoming: Option<IncomingTrade>,
    /// Id of the accepted trade items can be added to
    pub open: Option<String>,
    /// Latest full record the relay sent for the open trade
    pub latest: Option<Trade>,
    pub requested_with: Option<ClientId>,
}

impl TradeDesk {
    fn close(&mut self, trade_id: &str) -> bool {
        let mut closed = false;
        if self.open.as_deref() == Some(trade_id) {
            self.open = None;
            self.latest = None;
            closed = true;
        }
        if self.incoming.as_ref().is_some_and(|incoming| incoming.trade_id == trade_id) {
            self.incoming = None;
            closed = true;
        }
        closed
    }

    pub fn status_line(&self) -> String {
        if let Some(trade) = &self.latest {
            return format!(
                "Trade {:?}: {} offered / {} received",
                trade.status,
                trade.sender_items.len(),
                trade.receiver_items.len()
            );
        }
        if self.open.is_some() {
            return "Trade accepted: G to offer a fruit, C to complete".to_string();
        }
        if let Some(incoming) = &self.incoming {
            return format!("{} wants to trade: Y/N", incoming.sender);
        }
        if self.requested_with.is_some() {
            return "Trade requested, waiting for an answer".to_string();
        }
        "T: request a trade".to_string()
    }
}

pub struct Simulation {
    pub world: World,
    pub fruits: Vec<Fruit>,
    pub player: LocalPlayer,
    pub anaconda: Anaconda,
    pub weather: Weather,
    pub effects: Effects,
    pub score: Score,
    pub remote: RemotePlayers,
    pub trades: TradeDesk,
    pub pet: Option<CapybaraReport>,
    pub notices: VecDeque<String>,
    pub game_over: bool,
    pub frame: u64,
    rng: StdRng,
}

impl Simulation {
    pub fn new(width: f32, height: f32, pseudo: impl Into<String>, seed: Option<u64>, now: Instant) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let world = World::new(width, height);
        let fruits = generate_fruits(&mut rng, &world, FRUIT_COUNT);
        let player = LocalPlayer::new(&world, pseudo);

        Self {
            world,
            fruits,
            player,
            anaconda: Anaconda::new(now),
            weather: Weather::new(),
            effects: Effects::new(),
            score: Score::default(),
            remote: RemotePlayers::new(),
            trades: TradeDesk::default(),
            pet: None,
            notices: VecDeque::new(),
            game_over: false,
            frame: 0,
            rng,
        }
    }

    /// Base speed doubled while boosted, otherwise whatever the weather allows
    pub fn current_speed(&self, now: Instant) -> f32 {
        if self.player.is_boosted(now) {
            BASE_SPEED * BOOST_MULTIPLIER
        } else {
            self.weather.current.speed()
        }
    }

    pub fn position_packet(&self) -> ClientPacket {
        ClientPacket::UpdatePosition {
            x: self.player.x,
            y: self.player.y,
            direction: self.player.direction,
        }
    }

    pub fn join_packet(&self) -> ClientPacket {
        ClientPacket::PlayerJoin {
            x: self.player.x,
            y: self.player.y,
            direction: self.player.direction,
            pseudo: self.player.pseudo.clone(),
        }
    }

    /// Runs one frame and returns the position update to send, if any
    pub fn step(&mut self, controls: &Controls, now: Instant) -> Option<ClientPacket> {
        if self.game_over {
            return None;
        }
        self.frame += 1;

        if !self.player.is_boosted(now) {
            self.player.boost_until = None;
        }
        self.move_player(controls, now);
        self.eat(controls, now);
        self.take_damage(now);

        self.player.hunger -= HUNGER_DECAY + self.weather.current.hunger_drain();
        if self.weather.should_drop(&mut self.rng) {
            let x = self.rng.gen::<f32>() * self.world.width;
            self.effects.rain_drop(x);
        }
        self.effects.update();

        self.player.hunger = self.player.hunger.clamp(0.0, MAX_HUNGER);
        if self.player.hunger <= 0.0 {
            self.game_over = true;
            info!(
                "Game over: score {}, survived {}s",
                self.score.value(),
                self.score.time_alive
            );
        }

        Some(self.position_packet())
    }

    fn move_player(&mut self, controls: &Controls, now: Instant) {
        let speed = self.current_speed(now);
        let mut x = self.player.x;
        let mut y = self.player.y;

        if controls.up {
            y -= speed;
        }
        if controls.down {
            y += speed;
        }
        if controls.left {
            x -= speed;
            self.player.direction = Direction::Left;
        }
        if controls.right {
            x += speed;
            self.player.direction = Direction::Right;
        }

        let candidate = Rect::new(x, y, CAPYBARA_WIDTH, CAPYBARA_HEIGHT);
        if self.world.hits_obstacle(&candidate) {
            return;
        }
        (self.player.x, self.player.y) = self.world.clamp(x, y, CAPYBARA_WIDTH, CAPYBARA_HEIGHT);
    }

    fn eat(&mut self, controls: &Controls, now: Instant) {
        let bounds = self.player.bounds();

        self.player.is_eating = false;
        if controls.feed {
            for zone in &mut self.world.food_zones {
                if zone.food > 0.0 && check_collision(&bounds, &zone.bounds) {
                    self.player.is_eating = true;
                    self.player.hunger = (self.player.hunger + FOOD_ZONE_RATE).min(MAX_HUNGER);
                    zone.food -= FOOD_ZONE_RATE;
                }
            }
        }

        let (cx, cy) = self.player.center();
        let reach = CAPYBARA_WIDTH / 3.0;
        let Some(index) = self
            .fruits
            .iter()
            .position(|fruit| fruit.distance_to(cx, cy) < fruit.radius() + reach)
        else {
            return;
        };

        let fruit = self.fruits[index];
        if fruit.kind.is_boost() {
            self.player.boost_until = Some(now + BOOST_DURATION);
            self.effects.boost(&mut self.rng, cx, cy);
            debug!("Speed boost until {:?}", self.player.boost_until);
        } else {
            let nutrition = fruit.kind.nutrition();
            self.player.hunger = (self.player.hunger + nutrition).min(MAX_HUNGER);
            self.score.food_eaten += nutrition;
            self.player.last_fruit = Some(fruit.kind);
        }
        self.effects.eating(&mut self.rng, fruit.x, fruit.y, fruit.kind.color());

        self.fruits[index] = place_fruit(&mut self.rng, &self.world, &self.fruits, Some(index));
    }

    fn take_damage(&mut self, now: Instant) {
        let bounds = self.player.bounds();
        let (cx, cy) = self.player.center();

        for plate in &self.world.fire_plates {
            self.effects.fire_embers(&mut self.rng, plate);
        }

        self.player.is_on_fire = self
            .world
            .fire_plates
            .iter()
            .any(|plate| check_collision(&bounds, plate));
        if self.player.is_on_fire {
            self.player.hunger -= FIRE_DAMAGE;
            self.effects.fire_damage(&mut self.rng, cx, cy);
        }

        self.anaconda.update(self.player.x, self.player.y, now);
        if self.anaconda.bites(&bounds) {
            self.player.hunger -= SNAKE_DAMAGE;
            self.effects.snake_bite(&mut self.rng, cx, cy);
        }
    }

    /// Once-a-second bookkeeping: score, survival bonus and the weather countdown
    pub fn tick_second(&mut self) {
        if self.game_over {
            return;
        }
        self.score.time_alive += 1;
        if self.player.hunger > MAX_HUNGER / 2.0 {
            self.score.food_eaten += 0.1;
        }
        if let Some(kind) = self.weather.tick_second(&mut self.rng) {
            info!("Weather changed to {}", kind.label());
        }
    }

    /// Befriends the nearest remote player in reach
    pub fn try_interact(&mut self) -> Option<ClientPacket> {
        if self.game_over {
            return None;
        }
        let target_id = self
            .remote
            .nearest(self.player.x, self.player.y, Some(INTERACTION_DISTANCE))?
            .id;

        self.score.friends_made += 1;
        self.player.happiness = (self.player.happiness + FRIENDSHIP_HAPPINESS).min(MAX_HAPPINESS);
        let (cx, _) = self.player.center();
        self.effects.friendship(&mut self.rng, cx, self.player.y);

        Some(ClientPacket::Interaction { target_id })
    }

    /// Starts over after a game over; food zones keep whatever they have left
    pub fn reset(&mut self, now: Instant) {
        let pseudo = std::mem::take(&mut self.player.pseudo);
        self.player = LocalPlayer::new(&self.world, pseudo);
        self.score = Score::default();
        self.fruits = generate_fruits(&mut self.rng, &self.world, FRUIT_COUNT);
        self.weather = Weather::new();
        self.anaconda = Anaconda::new(now);
        self.effects.clear();
        self.game_over = false;
        info!("Game reset");
    }

    pub fn request_trade(&mut self) -> Option<ClientPacket> {
        let receiver_id = self.remote.nearest(self.player.x, self.player.y, None)?.id;
        self.trades.requested_with = Some(receiver_id);
        Some(ClientPacket::TradeRequest { receiver_id })
    }

    /// Answers the latest incoming request
    pub fn answer_trade(&mut self, accepted: bool) -> Option<ClientPacket> {
        let incoming = self.trades.incoming.take()?;
        if accepted {
            self.trades.open = Some(incoming.trade_id.clone());
            self.trades.latest = None;
        }
        Some(ClientPacket::TradeResponse {
            trade_id: incoming.trade_id,
            accepted,
        })
    }

    /// Offers the last fruit eaten into the open trade
    pub fn offer_item(&mut self) -> Option<ClientPacket> {
        let trade_id = self.trades.open.clone()?;
        let kind = self.player.last_fruit?;
        Some(ClientPacket::AddTradeItem {
            trade_id,
            item: json!({ "fruit": kind.name(), "nutrition": kind.nutrition() }),
        })
    }

    pub fn complete_trade(&mut self) -> Option<ClientPacket> {
        let trade_id = self.trades.open.clone()?;
        Some(ClientPacket::TradeComplete { trade_id })
    }

    pub fn feed_pet(&self) -> Option<ClientPacket> {
        self.pet.as_ref()?;
        Some(ClientPacket::FeedCapybara { nutrition: PET_MEAL })
    }

    pub fn walk_pet(&self) -> Option<ClientPacket> {
        self.pet.as_ref()?;
        Some(ClientPacket::WalkCapybara)
    }

    fn notice(&mut self, text: String) {
        info!("{}", text);
        self.notices.push_back(text);
        while self.notices.len() > MAX_NOTICES {
            self.notices.pop_front();
        }
    }

    fn player_name(&self, id: ClientId) -> String {
        match self.remote.get(&id) {
            Some(player) if !player.pseudo.is_empty() => player.pseudo.clone(),
            _ => format!("player {}", id),
        }
    }

    /// Applies one event from the relay and returns any packets to send back
    pub fn handle_packet(&mut self, packet: ServerPacket) -> Vec<ClientPacket> {
        match packet {
            ServerPacket::Connected { client_id } => {
                self.remote.set_own_id(client_id);
                self.notice(format!("Connected as {}", client_id));
                return vec![
                    self.join_packet(),
                    ClientPacket::AdoptCapybara {
                        name: format!("{}'s capybara", self.player.pseudo),
                    },
                ];
            }
            ServerPacket::Disconnected { reason } => {
                self.notice(format!("Disconnected: {}", reason));
            }
            ServerPacket::PlayerUpdate(snapshot) => self.remote.apply_snapshot(snapshot),
            ServerPacket::InteractionReceived { from_id } => {
                let (cx, _) = self.player.center();
                self.effects.friendship(&mut self.rng, cx, self.player.y);
                let name = self.player_name(from_id);
                self.notice(format!("{} says hi", name));
            }
            ServerPacket::TradeRequest { trade_id, sender } => {
                self.notice(format!("{} wants to trade", sender));
                self.trades.incoming = Some(IncomingTrade { trade_id, sender });
            }
            ServerPacket::TradeAccepted { trade_id } => {
                self.trades.requested_with = None;
                self.trades.open = Some(trade_id);
                self.trades.latest = None;
                self.notice("Trade accepted".to_string());
            }
            ServerPacket::TradeRejected { trade_id } => {
                self.trades.requested_with = None;
                self.trades.close(&trade_id);
                self.notice("Trade rejected".to_string());
            }
            ServerPacket::TradeUpdated(trade) => {
                if self.trades.open.as_deref() == Some(trade.id.as_str()) {
                    self.trades.latest = Some(trade);
                }
            }
            ServerPacket::TradeCompleted { trade_id } => {
                if self.trades.close(&trade_id) {
                    self.notice("Trade completed".to_string());
                }
            }
            ServerPacket::Chat { from_id, message } => {
                let name = if Some(from_id) == self.remote.own_id() {
                    self.player.pseudo.clone()
                } else {
                    self.player_name(from_id)
                };
                self.notice(format!("{}: {}", name, message));
            }
            ServerPacket::CapybaraStatus { accepted, capybara } => {
                if !accepted {
                    self.notice(format!("{} is busy", capybara.name));
                }
                self.pet = Some(capybara);
            }
        }
        Vec::new()
    }

    /// Reported state of the local player, as other clients will see it
    pub fn local_state(&self) -> PlayerState {
        PlayerState::new(
            self.remote.own_id().unwrap_or_default(),
            self.player.x,
            self.player.y,
            self.player.direction,
            self.player.pseudo.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::WeatherKind;
    use crate::world::FruitKind;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};

    fn sim() -> (Simulation, Instant) {
        let now = Instant::now();
        let mut sim = Simulation::new(800.0, 600.0, "Bob", Some(42), now);
        // Keep the meadow clear unless a test places fruit itself
        sim.fruits.clear();
        // Park the anaconda far away
        sim.anaconda.x = -1000.0;
        sim.anaconda.y = -1000.0;
        for segment in &mut sim.anaconda.segments {
            segment.x = -1000.0;
            segment.y = -1000.0;
        }
        (sim, now)
    }

    #[test]
    fn test_new_simulation() {
        let now = Instant::now();
        let sim = Simulation::new(800.0, 600.0, "Bob", Some(1), now);
        assert_eq!((sim.player.x, sim.player.y), (400.0, 300.0));
        assert_eq!(sim.player.hunger, 100.0);
        assert_eq!(sim.fruits.len(), FRUIT_COUNT);
        assert!(!sim.game_over);
    }

    #[test]
    fn test_seeded_layouts_are_reproducible() {
        let now = Instant::now();
        let a = Simulation::new(800.0, 600.0, "Bob", Some(9), now);
        let b = Simulation::new(800.0, 600.0, "Bob", Some(9), now);
        assert_eq!(a.fruits, b.fruits);
    }

    #[test]
    fn test_movement_and_direction() {
        let (mut sim, now) = sim();

        let packet = sim.step(&Controls { left: true, ..Default::default() }, now);
        assert_eq!(sim.player.x, 395.0);
        assert_eq!(sim.player.direction, Direction::Left);
        assert_eq!(
            packet,
            Some(ClientPacket::UpdatePosition {
                x: 395.0,
                y: 300.0,
                direction: Direction::Left
            })
        );

        sim.step(&Controls { down: true, right: true, ..Default::default() }, now);
        assert_eq!((sim.player.x, sim.player.y), (400.0, 305.0));
        assert_eq!(sim.player.direction, Direction::Right);
    }

    #[test]
    fn test_obstacle_blocks_movement() {
        let (mut sim, now) = sim();
        // Just right of the rock at (80, 120, 60, 60)
        sim.player.x = 140.0;
        sim.player.y = 130.0;

        sim.step(&Controls { left: true, ..Default::default() }, now);
        assert_eq!((sim.player.x, sim.player.y), (140.0, 130.0));
        // Direction still follows the input even when blocked
        assert_eq!(sim.player.direction, Direction::Left);
    }

    #[test]
    fn test_world_bounds_clamp() {
        let (mut sim, now) = sim();
        sim.player.x = 2.0;
        sim.player.y = 558.0;

        sim.step(&Controls { left: true, down: true, ..Default::default() }, now);
        assert_eq!((sim.player.x, sim.player.y), (0.0, 560.0));
    }

    #[test]
    fn test_food_zone_feeds_only_while_held() {
        let (mut sim, now) = sim();
        sim.player.x = 125.0;
        sim.player.y = 70.0;
        sim.player.hunger = 50.0;

        sim.step(&Controls::default(), now);
        assert_approx_eq!(sim.player.hunger, 49.98, 0.0001);
        assert!(!sim.player.is_eating);

        sim.step(&Controls { feed: true, ..Default::default() }, now);
        assert!(sim.player.is_eating);
        assert_approx_eq!(sim.player.hunger, 49.98 + 0.5 - 0.02, 0.0001);
        assert_approx_eq!(sim.world.food_zones[0].food, 49.5, 0.0001);
    }

    #[test]
    fn test_empty_food_zone() {
        let (mut sim, now) = sim();
        sim.player.x = 125.0;
        sim.player.y = 70.0;
        sim.player.hunger = 50.0;
        sim.world.food_zones[0].food = 0.0;

        sim.step(&Controls { feed: true, ..Default::default() }, now);
        assert!(!sim.player.is_eating);
        assert_eq!(sim.world.food_zones[0].food, 0.0);
    }

    #[test]
    fn test_eating_fruit_replaces_exactly_that_fruit() {
        let (mut sim, now) = sim();
        let (cx, cy) = sim.player.center();
        sim.player.hunger = 50.0;
        sim.fruits = vec![
            Fruit { x: 700.0, y: 50.0, kind: FruitKind::Apple },
            Fruit { x: cx + 5.0, y: cy, kind: FruitKind::Mango },
            Fruit { x: cx - 5.0, y: cy, kind: FruitKind::Salad },
        ];

        sim.step(&Controls::default(), now);

        assert_approx_eq!(sim.player.hunger, 59.98, 0.0001);
        assert_eq!(sim.score.food_eaten, 10.0);
        assert_eq!(sim.player.last_fruit, Some(FruitKind::Mango));
        assert_eq!(sim.fruits.len(), 3);
        assert_eq!(sim.fruits[0], Fruit { x: 700.0, y: 50.0, kind: FruitKind::Apple });
        // Only one fruit per frame; the salad stays put
        assert_eq!(sim.fruits[2], Fruit { x: cx - 5.0, y: cy, kind: FruitKind::Salad });
        assert_ne!(sim.fruits[1], Fruit { x: cx + 5.0, y: cy, kind: FruitKind::Mango });
        assert!(!sim.effects.particles.is_empty());
    }

    #[test]
    fn test_fruit_pickup_range() {
        let (mut sim, now) = sim();
        let (cx, cy) = sim.player.center();
        // Apple radius 5 + 50/3 reach is just under 21.7
        sim.fruits = vec![Fruit { x: cx + 22.0, y: cy, kind: FruitKind::Apple }];
        sim.step(&Controls::default(), now);
        assert_eq!(sim.score.food_eaten, 0.0);

        sim.fruits = vec![Fruit { x: cx + 21.0, y: cy, kind: FruitKind::Apple }];
        sim.step(&Controls::default(), now);
        assert_eq!(sim.score.food_eaten, 2.0);
    }

    #[test]
    fn test_boost_lasts_ten_seconds() {
        let (mut sim, now) = sim();
        let (cx, cy) = sim.player.center();
        sim.fruits = vec![Fruit { x: cx, y: cy, kind: FruitKind::Boost }];

        sim.step(&Controls::default(), now);
        assert_eq!(sim.score.food_eaten, 0.0);
        assert!(sim.player.is_boosted(now));
        assert_eq!(sim.current_speed(now), 10.0);
        assert_eq!(sim.current_speed(now + Duration::from_millis(9_999)), 10.0);
        assert_eq!(sim.current_speed(now + BOOST_DURATION), 5.0);

        // Boosted speed ignores the weather
        sim.weather.current = WeatherKind::Foggy;
        assert_eq!(sim.current_speed(now + Duration::from_secs(5)), 10.0);
        assert_eq!(sim.current_speed(now + Duration::from_secs(11)), 3.0);

        sim.fruits.clear();
        let x = sim.player.x;
        sim.step(&Controls { right: true, ..Default::default() }, now + Duration::from_secs(1));
        assert_eq!(sim.player.x, x + 10.0);

        let later = now + Duration::from_secs(10);
        sim.step(&Controls::default(), later);
        assert_eq!(sim.player.boost_until, None);
        let x = sim.player.x;
        sim.weather.current = WeatherKind::Sunny;
        sim.step(&Controls { right: true, ..Default::default() }, later);
        assert_eq!(sim.player.x, x + 5.0);
    }

    #[test]
    fn test_weather_slows_and_drains() {
        let (mut sim, now) = sim();
        sim.weather.current = WeatherKind::Rainy;
        sim.player.hunger = 50.0;

        sim.step(&Controls { right: true, ..Default::default() }, now);
        assert_eq!(sim.player.x, 404.0);
        assert_approx_eq!(sim.player.hunger, 49.95, 0.0001);
    }

    #[test]
    fn test_fire_damage() {
        let (mut sim, now) = sim();
        // Overlapping the plate at (240, 180, 60, 60)
        sim.player.x = 250.0;
        sim.player.y = 190.0;
        sim.player.hunger = 50.0;

        sim.step(&Controls::default(), now);
        assert!(sim.player.is_on_fire);
        assert_approx_eq!(sim.player.hunger, 49.88, 0.0001);
    }

    #[test]
    fn test_snake_damage() {
        let (mut sim, now) = sim();
        sim.anaconda = Anaconda::new(now);
        // Under the head's box around (100, 100)
        sim.player.x = 110.0;
        sim.player.y = 60.0;
        sim.player.hunger = 50.0;

        sim.step(&Controls::default(), now);
        assert_approx_eq!(sim.player.hunger, 49.48, 0.0001);
    }

    #[test]
    fn test_hunger_clamped_and_game_over_once() {
        let (mut sim, now) = sim();
        sim.player.hunger = 0.01;

        assert!(sim.step(&Controls::default(), now).is_some());
        assert!(sim.game_over);
        assert_eq!(sim.player.hunger, 0.0);

        // Halted: no movement, no packets, no score ticks
        assert_eq!(sim.step(&Controls { left: true, ..Default::default() }, now), None);
        assert_eq!(sim.player.x, 400.0);
        sim.tick_second();
        assert_eq!(sim.score.time_alive, 0);
        assert_eq!(sim.try_interact(), None);

        sim.reset(now);
        assert!(!sim.game_over);
        assert_eq!(sim.player.hunger, 100.0);
        assert_eq!(sim.player.pseudo, "Bob");
        assert_eq!(sim.fruits.len(), FRUIT_COUNT);
    }

    #[test]
    fn test_hunger_never_leaves_bounds() {
        let (mut sim, now) = sim();
        let mut rng = StdRng::seed_from_u64(77);
        sim.reset(now);

        for frame in 0..2_000u64 {
            let controls = Controls {
                up: rng.gen(),
                down: rng.gen(),
                left: rng.gen(),
                right: rng.gen(),
                feed: rng.gen(),
            };
            sim.step(&controls, now + Duration::from_millis(frame * 16));
            assert!((0.0..=100.0).contains(&sim.player.hunger));
            if sim.game_over {
                sim.reset(now);
            }
        }
    }

    #[test]
    fn test_tick_second_scores() {
        let (mut sim, _) = sim();
        sim.tick_second();
        assert_eq!(sim.score.time_alive, 1);
        assert_approx_eq!(sim.score.food_eaten, 0.1, 0.0001);

        sim.player.hunger = 40.0;
        sim.tick_second();
        assert_eq!(sim.score.time_alive, 2);
        assert_approx_eq!(sim.score.food_eaten, 0.1, 0.0001);
        assert_eq!(sim.weather.time_until_change, 998.0);
    }

    #[test]
    fn test_score_value() {
        let score = Score {
            food_eaten: 12.7,
            friends_made: 2,
            time_alive: 30,
        };
        assert_eq!(score.value(), 32);
    }

    #[test]
    fn test_snapshot_filters_own_id() {
        let (mut sim, _) = sim();
        sim.handle_packet(ServerPacket::Connected { client_id: 1 });

        let mut snapshot = HashMap::new();
        snapshot.insert(1, PlayerState::new(1, 400.0, 300.0, Direction::Right, "Bob"));
        snapshot.insert(2, PlayerState::new(2, 110.0, 100.0, Direction::Right, "Alice"));
        sim.handle_packet(ServerPacket::PlayerUpdate(snapshot));

        assert_eq!(sim.remote.len(), 1);
        assert_eq!(sim.remote.get(&2).map(|p| p.x), Some(110.0));

        // Snapshots replace the cache wholesale
        sim.handle_packet(ServerPacket::PlayerUpdate(HashMap::new()));
        assert!(sim.remote.is_empty());
    }

    #[test]
    fn test_connected_triggers_join() {
        let (mut sim, _) = sim();
        let replies = sim.handle_packet(ServerPacket::Connected { client_id: 3 });
        assert_eq!(
            replies[0],
            ClientPacket::PlayerJoin {
                x: 400.0,
                y: 300.0,
                direction: Direction::Right,
                pseudo: "Bob".to_string()
            }
        );
        assert!(matches!(replies[1], ClientPacket::AdoptCapybara { .. }));
        assert_eq!(sim.local_state().id, 3);
    }

    #[test]
    fn test_interact_with_nearest_in_reach() {
        let (mut sim, _) = sim();
        let mut snapshot = HashMap::new();
        snapshot.insert(2, PlayerState::new(2, 460.0, 300.0, Direction::Left, "Alice"));
        snapshot.insert(3, PlayerState::new(3, 430.0, 300.0, Direction::Left, "Carol"));
        snapshot.insert(4, PlayerState::new(4, 700.0, 300.0, Direction::Left, "Dave"));
        sim.remote.apply_snapshot(snapshot);
        sim.player.happiness = 95.0;

        assert_eq!(sim.try_interact(), Some(ClientPacket::Interaction { target_id: 3 }));
        assert_eq!(sim.score.friends_made, 1);
        assert_eq!(sim.player.happiness, 100.0);
        assert_eq!(sim.effects.particles.len(), 10);
    }

    #[test]
    fn test_interact_out_of_reach() {
        let (mut sim, _) = sim();
        let mut snapshot = HashMap::new();
        snapshot.insert(2, PlayerState::new(2, 500.0, 300.0, Direction::Left, "Alice"));
        sim.remote.apply_snapshot(snapshot);

        assert_eq!(sim.try_interact(), None);
        assert_eq!(sim.score.friends_made, 0);
    }

    #[test]
    fn test_trade_flow_as_receiver() {
        let (mut sim, _) = sim();
        assert_eq!(sim.answer_trade(true), None);

        sim.handle_packet(ServerPacket::TradeRequest {
            trade_id: "t1".to_string(),
            sender: "Alice".to_string(),
        });
        assert!(sim.trades.status_line().contains("Alice"));

        assert_eq!(
            sim.answer_trade(true),
            Some(ClientPacket::TradeResponse {
                trade_id: "t1".to_string(),
                accepted: true
            })
        );
        assert_eq!(sim.trades.open.as_deref(), Some("t1"));

        // Nothing eaten yet, nothing to offer
        assert_eq!(sim.offer_item(), None);
        sim.player.last_fruit = Some(FruitKind::Tomato);
        match sim.offer_item() {
            Some(ClientPacket::AddTradeItem { trade_id, item }) => {
                assert_eq!(trade_id, "t1");
                assert_eq!(item["fruit"], "tomato");
            }
            other => panic!("Unexpected packet: {:?}", other),
        }

        let mut trade = Trade::new("t1", 2, 1);
        trade.status = TradeStatus::Accepted;
        trade.receiver_items.push(json!({ "fruit": "tomato" }));
        sim.handle_packet(ServerPacket::TradeUpdated(trade));
        assert!(sim.trades.latest.is_some());

        assert_eq!(
            sim.complete_trade(),
            Some(ClientPacket::TradeComplete {
                trade_id: "t1".to_string()
            })
        );
        sim.handle_packet(ServerPacket::TradeCompleted {
            trade_id: "t1".to_string(),
        });
        assert_eq!(sim.trades.open, None);
        assert_eq!(sim.complete_trade(), None);
    }

    #[test]
    fn test_trade_flow_as_sender() {
        let (mut sim, _) = sim();
        assert_eq!(sim.request_trade(), None);

        let mut snapshot = HashMap::new();
        snapshot.insert(2, PlayerState::new(2, 700.0, 500.0, Direction::Left, "Alice"));
        sim.remote.apply_snapshot(snapshot);

        assert_eq!(sim.request_trade(), Some(ClientPacket::TradeRequest { receiver_id: 2 }));
        sim.handle_packet(ServerPacket::TradeRejected {
            trade_id: "t9".to_string(),
        });
        assert_eq!(sim.trades.requested_with, None);
        assert_eq!(sim.notices.back().map(String::as_str), Some("Trade rejected"));

        sim.request_trade();
        sim.handle_packet(ServerPacket::TradeAccepted {
            trade_id: "t10".to_string(),
        });
        assert_eq!(sim.trades.open.as_deref(), Some("t10"));
    }

    #[test]
    fn test_pet_commands_need_a_pet() {
        let (mut sim, _) = sim();
        assert_eq!(sim.feed_pet(), None);
        assert_eq!(sim.walk_pet(), None);

        sim.handle_packet(ServerPacket::CapybaraStatus {
            accepted: true,
            capybara: CapybaraReport {
                id: "c1".to_string(),
                name: "Bob's capybara".to_string(),
                hunger: 100.0,
                happiness: 100.0,
                state: shared::CapybaraActivity::Idle,
                position: (0.0, 0.0),
            },
        });
        assert_eq!(sim.feed_pet(), Some(ClientPacket::FeedCapybara { nutrition: PET_MEAL }));
        assert_eq!(sim.walk_pet(), Some(ClientPacket::WalkCapybara));
    }

    #[test]
    fn test_notices_are_bounded() {
        let (mut sim, _) = sim();
        for i in 0..8 {
            sim.handle_packet(ServerPacket::Chat {
                from_id: 9,
                message: format!("hello {}", i),
            });
        }
        assert_eq!(sim.notices.len(), MAX_NOTICES);
        assert_eq!(sim.notices.back().map(String::as_str), Some("player 9: hello 7"));
    }
}
