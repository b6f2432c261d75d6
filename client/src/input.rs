//! Keyboard sampling with press-edge detection for one-shot actions

use crate::game::Controls;
use macroquad::prelude::*;

/// One-shot commands triggered on key press rather than while held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Interact,
    Reset,
    RequestTrade,
    AcceptTrade,
    DeclineTrade,
    OfferItem,
    CompleteTrade,
    FeedPet,
    WalkPet,
}

const ACTION_COUNT: usize = 9;

const ACTION_KEYS: [(KeyCode, Action); ACTION_COUNT] = [
    (KeyCode::E, Action::Interact),
    (KeyCode::Space, Action::Reset),
    (KeyCode::T, Action::RequestTrade),
    (KeyCode::Y, Action::AcceptTrade),
    (KeyCode::N, Action::DeclineTrade),
    (KeyCode::G, Action::OfferItem),
    (KeyCode::C, Action::CompleteTrade),
    (KeyCode::F, Action::FeedPet),
    (KeyCode::K, Action::WalkPet),
];

/// Remembers which keys were down last frame
#[derive(Debug, Default, Clone)]
pub struct EdgeDetector {
    previous: [bool; ACTION_COUNT],
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes this frame's key states and returns the actions whose key just went down
    pub fn update(&mut self, down: [bool; ACTION_COUNT]) -> Vec<Action> {
        let pressed = ACTION_KEYS
            .iter()
            .zip(down.iter().zip(self.previous.iter()))
            .filter(|(_, (now, before))| **now && !**before)
            .map(|((_, action), _)| *action)
            .collect();
        self.previous = down;
        pressed
    }
}

pub struct InputManager {
    edges: EdgeDetector,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            edges: EdgeDetector::new(),
        }
    }

    /// Samples the keyboard: held movement keys plus newly pressed actions
    pub fn update(&mut self) -> (Controls, Vec<Action>) {
        let controls = Controls {
            up: is_key_down(KeyCode::Up),
            down: is_key_down(KeyCode::Down),
            left: is_key_down(KeyCode::Left),
            right: is_key_down(KeyCode::Right),
            feed: is_key_down(KeyCode::Space),
        };
        let down = ACTION_KEYS.map(|(key, _)| is_key_down(key));

        (controls, self.edges.update(down))
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
