//! Short-lived particles for eating, damage, boosts, friendship and fire

use rand::Rng;

pub const FRIENDSHIP_COLOR: u32 = 0xFF69B4;
pub const SNAKE_COLOR: u32 = 0x32CD32;
pub const BOOST_COLOR: u32 = 0xFF69B4;
pub const RAIN_COLOR: u32 = 0xADD8E6;
pub const FIRE_COLOR: u32 = 0xFF4500;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Frames left before the particle disappears
    pub life: u32,
    pub color: u32,
    pub size: f32,
    /// Added to `vy` every frame
    pub lift: f32,
}

impl Particle {
    pub fn new(x: f32, y: f32, vx: f32, vy: f32, life: u32, color: u32) -> Self {
        Self {
            x,
            y,
            vx,
            vy,
            life,
            color,
            size: 2.0,
            lift: 0.0,
        }
    }

    /// Moves one frame; returns false once the particle has expired
    pub fn step(&mut self) -> bool {
        self.x += self.vx;
        self.y += self.vy;
        self.vy += self.lift;
        self.life = self.life.saturating_sub(1);
        self.life > 0
    }
}

/// Particle pools, split so fire can be drawn under the player and the rest over it
#[derive(Debug, Default, Clone)]
pub struct Effects {
    pub particles: Vec<Particle>,
    pub fire: Vec<Particle>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.fire.clear();
    }

    pub fn len(&self) -> usize {
        self.particles.len() + self.fire.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty() && self.fire.is_empty()
    }

    pub fn update(&mut self) {
        self.particles.retain_mut(Particle::step);
        self.fire.retain_mut(Particle::step);
    }

    #[allow(clippy::too_many_arguments)]
    fn burst<R: Rng>(
        &mut self,
        rng: &mut R,
        count: usize,
        (x, y): (f32, f32),
        spread: f32,
        (rise_min, rise_range): (f32, f32),
        life: u32,
        color: impl Fn(&mut R) -> u32,
    ) {
        for _ in 0..count {
            let vx = (rng.gen::<f32>() - 0.5) * spread;
            let vy = -rng.gen::<f32>() * rise_range - rise_min;
            let color = color(rng);
            self.particles.push(Particle::new(x, y, vx, vy, life, color));
        }
    }

    pub fn eating<R: Rng>(&mut self, rng: &mut R, x: f32, y: f32, color: u32) {
        self.burst(rng, 5, (x, y), 3.0, (1.0, 2.0), 30, |_| color);
    }

    /// Flame-coloured sparks with a random hue between red and orange
    pub fn fire_damage<R: Rng>(&mut self, rng: &mut R, x: f32, y: f32) {
        self.burst(rng, 12, (x, y), 6.0, (2.0, 4.0), 30, |rng| {
            let green = rng.gen_range(40u32..170);
            0xFF0000 | (green << 8)
        });
    }

    pub fn snake_bite<R: Rng>(&mut self, rng: &mut R, x: f32, y: f32) {
        self.burst(rng, 15, (x, y), 8.0, (3.0, 5.0), 40, |_| SNAKE_COLOR);
    }

    pub fn boost<R: Rng>(&mut self, rng: &mut R, x: f32, y: f32) {
        self.burst(rng, 20, (x, y), 8.0, (2.0, 5.0), 50, |_| BOOST_COLOR);
    }

    pub fn friendship<R: Rng>(&mut self, rng: &mut R, x: f32, y: f32) {
        self.burst(rng, 10, (x, y), 5.0, (2.0, 5.0), 60, |_| FRIENDSHIP_COLOR);
    }

    pub fn rain_drop(&mut self, x: f32) {
        self.particles.push(Particle::new(x, 0.0, 0.0, 7.0, 100, RAIN_COLOR));
    }

    /// Embers rising off the bottom edge of a fire plate, sometimes
    pub fn fire_embers<R: Rng>(&mut self, rng: &mut R, plate: &shared::Rect) {
        if rng.gen::<f32>() >= 0.3 {
            return;
        }
        let mut ember = Particle::new(
            plate.x + rng.gen::<f32>() * plate.width,
            plate.y + plate.height,
            (rng.gen::<f32>() - 0.5) * 2.0,
            -rng.gen::<f32>() * 3.0 - 2.0,
            30,
            FIRE_COLOR,
        );
        ember.size = rng.gen::<f32>() * 3.0 + 2.0;
        ember.lift = -0.1;
        self.fire.push(ember);
    }
}
