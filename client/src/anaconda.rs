//! The anaconda: a head that chases the player and a tail that follows its path

use shared::{check_collision, Direction, Rect};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const ANACONDA_WIDTH: f32 = 60.0;
pub const ANACONDA_HEIGHT: f32 = 30.0;
pub const ANACONDA_SPEED: f32 = 1.5;
pub const TAIL_LENGTH: usize = 25;
pub const MAX_HISTORY: usize = 30;
pub const RETARGET_INTERVAL: Duration = Duration::from_millis(500);
pub const SEGMENT_SPACING: f32 = 20.0;
pub const START_POSITION: (f32, f32) = (100.0, 100.0);

/// Head stops closing in below this distance
const CLOSE_ENOUGH: f32 = 5.0;
/// Fraction of the remaining gap a segment covers each frame
const SEGMENT_EASING: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct Anaconda {
    pub x: f32,
    pub y: f32,
    pub direction: Direction,
    pub segments: Vec<Segment>,
    /// Recent head positions, newest first
    history: VecDeque<(f32, f32)>,
    target: Option<(f32, f32)>,
    last_retarget: Instant,
}

impl Anaconda {
    pub fn new(now: Instant) -> Self {
        let (x, y) = START_POSITION;
        let segments = (0..TAIL_LENGTH)
            .map(|i| {
                let taper = i as f32 / TAIL_LENGTH as f32;
                Segment {
                    x: x - i as f32 * SEGMENT_SPACING,
                    y,
                    width: ANACONDA_WIDTH * (1.0 - taper * 0.7),
                    height: ANACONDA_HEIGHT * (1.0 - taper * 0.5),
                }
            })
            .collect();

        Self {
            x,
            y,
            direction: Direction::Right,
            segments,
            history: VecDeque::with_capacity(MAX_HISTORY + 1),
            target: None,
            last_retarget: now,
        }
    }

    /// Last sampled pursuit target, if any
    pub fn target(&self) -> Option<(f32, f32)> {
        self.target
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Advances one frame toward the player at `(player_x, player_y)`.
    ///
    /// The head only starts moving once a target has been sampled; after that it
    /// heads straight for the player's current position every frame.
    pub fn update(&mut self, player_x: f32, player_y: f32, now: Instant) {
        if now.duration_since(self.last_retarget) > RETARGET_INTERVAL {
            self.target = Some((player_x, player_y));
            self.last_retarget = now;
        }

        if self.target.is_none() {
            return;
        }

        let dx = player_x - self.x;
        let dy = player_y - self.y;
        let distance = dx.hypot(dy);
        if distance <= CLOSE_ENOUGH {
            return;
        }

        self.x += dx / distance * ANACONDA_SPEED;
        self.y += dy / distance * ANACONDA_SPEED;
        self.direction = if dx > 0.0 { Direction::Right } else { Direction::Left };

        self.history.push_front((self.x, self.y));
        self.history.truncate(MAX_HISTORY);

        let last = self.history.len() - 1;
        for (i, segment) in self.segments.iter_mut().enumerate() {
            if let Some(&(tx, ty)) = self.history.get((i * 2).min(last)) {
                segment.x += (tx - segment.x) * SEGMENT_EASING;
                segment.y += (ty - segment.y) * SEGMENT_EASING;
            }
        }
    }

    /// Hit box centered on the head or on one segment, always head-sized
    fn hit_box(x: f32, y: f32) -> Rect {
        Rect::new(
            x - ANACONDA_WIDTH / 2.0,
            y - ANACONDA_HEIGHT / 2.0,
            ANACONDA_WIDTH,
            ANACONDA_HEIGHT,
        )
    }

    pub fn bites(&self, player: &Rect) -> bool {
        std::iter::once((self.x, self.y))
            .chain(self.segments.iter().map(|segment| (segment.x, segment.y)))
            .any(|(x, y)| check_collision(player, &Self::hit_box(x, y)))
    }
}
