//! Weather cycle: sunny, rainy or foggy, changing every few minutes

use rand::Rng;
use shared::BASE_SPEED;

/// Seconds before the first change after a (re)start
pub const INITIAL_COUNTDOWN: f32 = 1000.0;
pub const RAIN_SPEED: f32 = 4.0;
pub const FOG_SPEED: f32 = 3.0;
pub const RAIN_HUNGER: f32 = 0.03;
pub const RAIN_DROP_CHANCE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherKind {
    Sunny,
    Rainy,
    Foggy,
}

impl WeatherKind {
    pub const ALL: [WeatherKind; 3] = [WeatherKind::Sunny, WeatherKind::Rainy, WeatherKind::Foggy];

    /// Player speed under this weather when no boost is running
    pub fn speed(self) -> f32 {
        match self {
            WeatherKind::Sunny => BASE_SPEED,
            WeatherKind::Rainy => RAIN_SPEED,
            WeatherKind::Foggy => FOG_SPEED,
        }
    }

    /// Extra hunger lost per frame
    pub fn hunger_drain(self) -> f32 {
        match self {
            WeatherKind::Rainy => RAIN_HUNGER,
            _ => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WeatherKind::Sunny => "sunny",
            WeatherKind::Rainy => "rainy",
            WeatherKind::Foggy => "foggy",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Weather {
    pub current: WeatherKind,
    /// Seconds until the next change
    pub time_until_change: f32,
}

impl Weather {
    pub fn new() -> Self {
        Self {
            current: WeatherKind::Sunny,
            time_until_change: INITIAL_COUNTDOWN,
        }
    }

    /// Called once per second. Returns the new weather when it changes.
    pub fn tick_second<R: Rng>(&mut self, rng: &mut R) -> Option<WeatherKind> {
        self.time_until_change -= 1.0;
        if self.time_until_change > 0.0 {
            return None;
        }

        let choices: Vec<WeatherKind> = WeatherKind::ALL
            .into_iter()
            .filter(|kind| *kind != self.current)
            .collect();
        self.current = choices[rng.gen_range(0..choices.len())];
        self.time_until_change = rng.gen::<f32>() * 300.0 + 300.0;
        Some(self.current)
    }

    /// Whether a rain drop should be spawned this frame
    pub fn should_drop<R: Rng>(&self, rng: &mut R) -> bool {
        self.current == WeatherKind::Rainy && rng.gen::<f32>() < RAIN_DROP_CHANCE
    }
}

impl Default for Weather {
    fn default() -> Self {
        Self::new()
    }
}
