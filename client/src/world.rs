//! Static meadow layout and fruit placement

use rand::Rng;
use shared::{check_collision, Rect};

pub const FRUIT_COUNT: usize = 20;
pub const FRUIT_MARGIN: f32 = 10.0;
pub const MAX_PLACEMENT_ATTEMPTS: usize = 1000;
pub const FOOD_ZONE_CAPACITY: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    Rock,
    Tree,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub bounds: Rect,
    pub kind: ObstacleKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodZone {
    pub bounds: Rect,
    pub food: f32,
}

/// Everything in the meadow that does not move
#[derive(Debug, Clone)]
pub struct World {
    pub width: f32,
    pub height: f32,
    pub obstacles: Vec<Obstacle>,
    pub food_zones: Vec<FoodZone>,
    pub fire_plates: Vec<Rect>,
    /// Drawn only; walls do not block movement
    pub walls: Vec<Rect>,
}

impl World {
    pub fn new(width: f32, height: f32) -> Self {
        let at = |fx: f32, fy: f32, w: f32, h: f32| Rect::new(width * fx, height * fy, w, h);

        Self {
            width,
            height,
            obstacles: vec![
                Obstacle {
                    bounds: at(0.1, 0.2, 60.0, 60.0),
                    kind: ObstacleKind::Rock,
                },
                Obstacle {
                    bounds: at(0.7, 0.6, 80.0, 40.0),
                    kind: ObstacleKind::Tree,
                },
                Obstacle {
                    bounds: at(0.4, 0.3, 70.0, 70.0),
                    kind: ObstacleKind::Rock,
                },
                Obstacle {
                    bounds: at(0.2, 0.7, 60.0, 50.0),
                    kind: ObstacleKind::Tree,
                },
            ],
            food_zones: vec![
                FoodZone {
                    bounds: at(0.15, 0.15, 40.0, 40.0),
                    food: FOOD_ZONE_CAPACITY,
                },
                FoodZone {
                    bounds: at(0.85, 0.85, 40.0, 40.0),
                    food: FOOD_ZONE_CAPACITY,
                },
            ],
            fire_plates: vec![
                at(0.3, 0.3, 60.0, 60.0),
                at(0.6, 0.5, 80.0, 40.0),
                at(0.2, 0.8, 50.0, 50.0),
            ],
            walls: vec![at(0.2, 0.3, 200.0, 20.0), at(0.7, 0.4, 20.0, 180.0)],
        }
    }

    pub fn hits_obstacle(&self, bounds: &Rect) -> bool {
        self.obstacles
            .iter()
            .any(|obstacle| check_collision(bounds, &obstacle.bounds))
    }

    /// Clamps a top-left position so a box of the given size stays inside the world
    pub fn clamp(&self, x: f32, y: f32, width: f32, height: f32) -> (f32, f32) {
        (
            x.clamp(0.0, (self.width - width).max(0.0)),
            y.clamp(0.0, (self.height - height).max(0.0)),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FruitKind {
    Salad,
    Tomato,
    Apple,
    Mango,
    Boost,
}

impl FruitKind {
    pub const ALL: [FruitKind; 5] = [
        FruitKind::Salad,
        FruitKind::Tomato,
        FruitKind::Apple,
        FruitKind::Mango,
        FruitKind::Boost,
    ];

    pub fn nutrition(self) -> f32 {
        match self {
            FruitKind::Salad => 5.0,
            FruitKind::Tomato => 3.0,
            FruitKind::Apple => 2.0,
            FruitKind::Mango => 10.0,
            FruitKind::Boost => 0.0,
        }
    }

    pub fn radius(self) -> f32 {
        match self {
            FruitKind::Salad => 8.0,
            FruitKind::Tomato => 6.0,
            FruitKind::Apple => 5.0,
            FruitKind::Mango => 10.0,
            FruitKind::Boost => 12.0,
        }
    }

    /// Relative odds of being picked when a fruit is placed
    pub fn weight(self) -> u32 {
        match self {
            FruitKind::Salad => 2,
            FruitKind::Tomato => 3,
            FruitKind::Apple => 4,
            FruitKind::Mango => 1,
            FruitKind::Boost => 1,
        }
    }

    /// 0xRRGGBB
    pub fn color(self) -> u32 {
        match self {
            FruitKind::Salad => 0x1B4D21,
            FruitKind::Tomato => 0xFF6347,
            FruitKind::Apple => 0xFF0800,
            FruitKind::Mango => 0xFFD700,
            FruitKind::Boost => 0xFF69B4,
        }
    }

    pub fn is_boost(self) -> bool {
        self == FruitKind::Boost
    }

    pub fn name(self) -> &'static str {
        match self {
            FruitKind::Salad => "salad",
            FruitKind::Tomato => "tomato",
            FruitKind::Apple => "apple",
            FruitKind::Mango => "mango",
            FruitKind::Boost => "boost",
        }
    }

    pub fn pick<R: Rng>(rng: &mut R) -> FruitKind {
        let total: u32 = Self::ALL.iter().map(|kind| kind.weight()).sum();
        let mut roll = rng.gen_range(0..total);
        for kind in Self::ALL {
            if roll < kind.weight() {
                return kind;
            }
            roll -= kind.weight();
        }
        FruitKind::Apple
    }
}

/// A fruit lying in the meadow; `x`/`y` is its center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fruit {
    pub x: f32,
    pub y: f32,
    pub kind: FruitKind,
}

impl Fruit {
    pub fn radius(&self) -> f32 {
        self.kind.radius()
    }

    pub fn bounds(&self) -> Rect {
        Rect::around(self.x, self.y, self.radius())
    }

    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        (self.x - x).hypot(self.y - y)
    }

    /// Whether two fruits sit at least twice their combined radii apart
    pub fn well_separated(&self, other: &Fruit) -> bool {
        other.distance_to(self.x, self.y) >= (self.radius() + other.radius()) * 2.0
    }
}

fn random_fruit<R: Rng>(rng: &mut R, world: &World) -> Fruit {
    let x = rng.gen::<f32>() * (world.width - FRUIT_MARGIN * 2.0) + FRUIT_MARGIN;
    let y = rng.gen::<f32>() * (world.height - FRUIT_MARGIN * 2.0) + FRUIT_MARGIN;
    Fruit {
        x,
        y,
        kind: FruitKind::pick(rng),
    }
}

/// Rejection-samples a fruit that avoids every obstacle and every other fruit.
///
/// `skip` names the slot being replaced, which is ignored in the separation
/// check. After [`MAX_PLACEMENT_ATTEMPTS`] the separation rule is dropped; after
/// as many again the last candidate is taken as-is so crowded layouts still
/// terminate.
pub fn place_fruit<R: Rng>(rng: &mut R, world: &World, fruits: &[Fruit], skip: Option<usize>) -> Fruit {
    let others = || {
        fruits
            .iter()
            .enumerate()
            .filter(move |(index, _)| Some(*index) != skip)
            .map(|(_, fruit)| fruit)
    };

    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let candidate = random_fruit(rng, world);
        if !world.hits_obstacle(&candidate.bounds()) && others().all(|other| candidate.well_separated(other)) {
            return candidate;
        }
    }

    log::debug!("Fruit placement relaxed after {} attempts", MAX_PLACEMENT_ATTEMPTS);
    let mut candidate = random_fruit(rng, world);
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        if !world.hits_obstacle(&candidate.bounds()) {
            break;
        }
        candidate = random_fruit(rng, world);
    }
    candidate
}

pub fn generate_fruits<R: Rng>(rng: &mut R, world: &World, count: usize) -> Vec<Fruit> {
    let mut fruits = Vec::with_capacity(count);
    for _ in 0..count {
        let fruit = place_fruit(rng, world, &fruits, None);
        fruits.push(fruit);
    }
    fruits
}
