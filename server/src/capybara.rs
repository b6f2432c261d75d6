//! Server-side pet capybaras: slow stat decay plus timed feed/walk actions.

use log::{debug, info};
use shared::{CapybaraActivity, CapybaraReport, ClientId, MAX_HAPPINESS, MAX_HUNGER};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const EATING_DURATION: Duration = Duration::from_secs(3);
pub const WALKING_DURATION: Duration = Duration::from_secs(5);

const HUNGER_DECAY: f32 = 0.5;
const HAPPINESS_DECAY: f32 = 0.3;
const HUNGRY_THRESHOLD: f32 = 30.0;
const HUNGRY_HAPPINESS_DECAY: f32 = 0.5;
const MEAL_HAPPINESS: f32 = 5.0;
const WALK_HAPPINESS: f32 = 20.0;
const WALK_HUNGER: f32 = 10.0;

#[derive(Debug, Clone)]
pub struct Capybara {
    pub id: String,
    pub name: String,
    pub owner_id: ClientId,
    pub hunger: f32,
    pub happiness: f32,
    pub state: CapybaraActivity,
    pub position: (f32, f32),
    pub last_meal: Instant,
    pub last_walk: Instant,
    busy_until: Option<Instant>,
}

impl Capybara {
    pub fn new(name: impl Into<String>, owner_id: ClientId, now: Instant) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            owner_id,
            hunger: MAX_HUNGER,
            happiness: MAX_HAPPINESS,
            state: CapybaraActivity::Idle,
            position: (0.0, 0.0),
            last_meal: now,
            last_walk: now,
            busy_until: None,
        }
    }

    /// One decay step. Hungry capybaras lose happiness faster.
    pub fn decay(&mut self) {
        self.hunger = (self.hunger - HUNGER_DECAY).max(0.0);
        self.happiness = (self.happiness - HAPPINESS_DECAY).max(0.0);

        if self.hunger < HUNGRY_THRESHOLD {
            self.happiness = (self.happiness - HUNGRY_HAPPINESS_DECAY).max(0.0);
        }
    }

    /// Returns to idle once the running action's duration has elapsed.
    pub fn settle(&mut self, now: Instant) {
        if let Some(until) = self.busy_until {
            if now >= until {
                self.state = CapybaraActivity::Idle;
                self.busy_until = None;
            }
        }
    }

    pub fn feed(&mut self, nutrition: f32, now: Instant) -> bool {
        self.settle(now);
        if self.state != CapybaraActivity::Idle {
            return false;
        }

        self.state = CapybaraActivity::Eating;
        self.hunger = (self.hunger + nutrition).clamp(0.0, MAX_HUNGER);
        self.happiness = (self.happiness + MEAL_HAPPINESS).min(MAX_HAPPINESS);
        self.last_meal = now;
        self.busy_until = Some(now + EATING_DURATION);
        true
    }

    pub fn walk(&mut self, now: Instant) -> bool {
        self.settle(now);
        if self.state != CapybaraActivity::Idle {
            return false;
        }

        self.state = CapybaraActivity::Walking;
        self.happiness = (self.happiness + WALK_HAPPINESS).min(MAX_HAPPINESS);
        self.hunger = (self.hunger - WALK_HUNGER).max(0.0);
        self.last_walk = now;
        self.busy_until = Some(now + WALKING_DURATION);
        true
    }

    pub fn report(&self) -> CapybaraReport {
        CapybaraReport {
            id: self.id.clone(),
            name: self.name.clone(),
            hunger: self.hunger,
            happiness: self.happiness,
            state: self.state,
            position: self.position,
        }
    }
}

/// One capybara per owning connection
#[derive(Debug, Default)]
pub struct CapybaraPen {
    capybaras: HashMap<ClientId, Capybara>,
}

impl CapybaraPen {
    pub fn new() -> Self {
        Self {
            capybaras: HashMap::new(),
        }
    }

    /// Adopts a capybara for `owner_id`. An owner that already has one keeps it.
    pub fn adopt(&mut self, owner_id: ClientId, name: String, now: Instant) -> &Capybara {
        self.capybaras.entry(owner_id).or_insert_with(|| {
            info!("Client {} adopted capybara {:?}", owner_id, name);
            Capybara::new(name, owner_id, now)
        })
    }

    pub fn get(&self, owner_id: &ClientId) -> Option<&Capybara> {
        self.capybaras.get(owner_id)
    }

    /// Returns whether the meal was taken, or None if the owner has no capybara
    pub fn feed(&mut self, owner_id: ClientId, nutrition: f32, now: Instant) -> Option<bool> {
        self.capybaras
            .get_mut(&owner_id)
            .map(|capybara| capybara.feed(nutrition, now))
    }

    pub fn walk(&mut self, owner_id: ClientId, now: Instant) -> Option<bool> {
        self.capybaras
            .get_mut(&owner_id)
            .map(|capybara| capybara.walk(now))
    }

    pub fn release(&mut self, owner_id: &ClientId) -> Option<Capybara> {
        self.capybaras.remove(owner_id)
    }

    /// Applies one decay step to every capybara and ends finished actions
    pub fn tick(&mut self, now: Instant) {
        for capybara in self.capybaras.values_mut() {
            capybara.settle(now);
            capybara.decay();
        }
        if !self.capybaras.is_empty() {
            debug!("Decayed {} capybaras", self.capybaras.len());
        }
    }

    pub fn len(&self) -> usize {
        self.capybaras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capybaras.is_empty()
    }
}
