use crate::game::Simulation;
use crate::weather::WeatherKind;
use crate::world::ObstacleKind;
use macroquad::prelude::*;
use shared::{Direction, PlayerState, CAPYBARA_HEIGHT, CAPYBARA_WIDTH};

const GRASS: u32 = 0x7CB342;
const BODY: u32 = 0x8B4513;
const BELLY: u32 = 0xDEB887;
const SNOUT: u32 = 0x6B4423;
const WALL: u32 = 0x808080;
const ROCK: u32 = 0x696969;
const TREE: u32 = 0x228B22;
const FOOD_ZONE: u32 = 0x90EE90;
const PLATE: u32 = 0x8B0000;
const LAVA: u32 = 0xFF4500;
const HEAD: u32 = 0x006400;

/// Green channel of a tail segment, darker toward the tip
pub fn segment_green(index: usize, count: usize) -> u8 {
    let ratio = 1.0 - index as f32 / count.max(1) as f32;
    (139.0 + (34.0 - 139.0) * ratio).floor() as u8
}

/// Text lines of the heads-up display, top to bottom
pub fn hud_lines(sim: &Simulation) -> Vec<String> {
    let mut lines = vec![
        format!("Score: {}", sim.score.value()),
        format!("Friends: {}", sim.score.friends_made),
        format!("Time: {}s", sim.score.time_alive),
        format!("Weather: {}", sim.weather.current.label()),
        format!("Hunger: {:.0}", sim.player.hunger),
        sim.trades.status_line(),
    ];
    if let Some(pet) = &sim.pet {
        lines.push(format!(
            "{}: hunger {:.0}, happiness {:.0}, {:?}",
            pet.name, pet.hunger, pet.happiness, pet.state
        ));
    }
    lines
}

pub struct Renderer {
    width: f32,
    height: f32,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Renderer {
            width: width as f32,
            height: height as f32,
        }
    }

    pub fn render(&mut self, sim: &Simulation) {
        clear_background(Color::from_hex(GRASS));
        let time = get_time() as f32;

        self.draw_world(sim, time);
        self.draw_fruits(sim);

        for player in sim.remote.iter() {
            self.draw_capybara(player, false, time);
        }
        let local = sim.local_state();
        self.draw_capybara(&local, true, time);
        if sim.player.is_on_fire {
            draw_rectangle(
                sim.player.x,
                sim.player.y,
                CAPYBARA_WIDTH,
                CAPYBARA_HEIGHT,
                Color::new(1.0, 0.0, 0.0, 0.2),
            );
        }

        self.draw_anaconda(sim, time);
        self.draw_weather(sim);
        self.draw_hud(sim);

        if sim.game_over {
            self.draw_game_over(sim);
        }
    }

    fn draw_world(&mut self, sim: &Simulation, time: f32) {
        for wall in &sim.world.walls {
            draw_rectangle(wall.x, wall.y, wall.width, wall.height, Color::from_hex(WALL));
        }

        for obstacle in &sim.world.obstacles {
            let b = obstacle.bounds;
            match obstacle.kind {
                ObstacleKind::Rock => draw_rectangle(b.x, b.y, b.width, b.height, Color::from_hex(ROCK)),
                ObstacleKind::Tree => {
                    let (cx, cy) = b.center();
                    draw_ellipse(cx, cy, b.width / 2.0, b.height / 2.0, 0.0, Color::from_hex(TREE));
                }
            }
        }

        for zone in &sim.world.food_zones {
            let b = zone.bounds;
            let fill = (zone.food / crate::world::FOOD_ZONE_CAPACITY).clamp(0.0, 1.0);
            let mut color = Color::from_hex(FOOD_ZONE);
            color.a = 0.3 + 0.7 * fill;
            draw_rectangle(b.x, b.y, b.width, b.height, color);
        }

        for (i, plate) in sim.world.fire_plates.iter().enumerate() {
            draw_rectangle(plate.x, plate.y, plate.width, plate.height, Color::from_hex(PLATE));
            // Flickering lava blobs
            for blob in 0..5 {
                let phase = time * 3.0 + (i * 5 + blob) as f32 * 1.7;
                let x = plate.x + (phase.sin() * 0.5 + 0.5) * plate.width;
                let y = plate.y + ((phase * 1.3).cos() * 0.5 + 0.5) * plate.height;
                draw_circle(x, y, 4.0 + (phase * 2.0).sin().abs() * 8.0, Color::from_hex(LAVA));
            }
        }

        for ember in &sim.effects.fire {
            let alpha = ember.life as f32 / 30.0 * 0.8;
            draw_circle(ember.x, ember.y, ember.size, Color::new(1.0, 0.27, 0.0, alpha));
        }
    }

    fn draw_fruits(&mut self, sim: &Simulation) {
        for fruit in &sim.fruits {
            draw_circle(fruit.x, fruit.y, fruit.radius(), Color::from_hex(fruit.kind.color()));
            if fruit.kind.is_boost() {
                draw_circle_lines(fruit.x, fruit.y, fruit.radius() + 2.0, 1.0, WHITE);
            }
        }
    }

    fn draw_capybara(&mut self, player: &PlayerState, is_local: bool, time: f32) {
        let breathing = (time * 6.0).sin() * 2.0;
        let cx = player.x + CAPYBARA_WIDTH / 2.0;
        let cy = player.y + CAPYBARA_HEIGHT / 2.0 + breathing;

        draw_ellipse(cx, cy, CAPYBARA_WIDTH / 1.8, CAPYBARA_HEIGHT / 1.8, 0.0, Color::from_hex(BODY));
        draw_ellipse(
            cx,
            player.y + CAPYBARA_HEIGHT / 1.7 + breathing,
            CAPYBARA_WIDTH / 2.2,
            CAPYBARA_HEIGHT / 2.5,
            0.0,
            Color::from_hex(BELLY),
        );

        let facing = if player.direction == Direction::Right { 1.0 } else { -1.0 };
        let head_x = cx + facing * CAPYBARA_WIDTH * 0.2;
        let head_y = player.y + CAPYBARA_HEIGHT * 0.4 + breathing;
        draw_circle(head_x, head_y, CAPYBARA_WIDTH * 0.25, Color::from_hex(BODY));
        draw_ellipse(
            head_x + facing * 15.0,
            player.y + CAPYBARA_HEIGHT * 0.45 + breathing,
            8.0,
            6.0,
            0.0,
            Color::from_hex(SNOUT),
        );
        draw_circle(head_x + facing * 5.0, head_y - 4.0, 2.5, BLACK);

        if is_local {
            draw_circle_lines(cx, cy, CAPYBARA_WIDTH * 0.65, 1.5, YELLOW);
        }
        if !player.pseudo.is_empty() {
            let size = measure_text(&player.pseudo, None, 16, 1.0);
            draw_text(&player.pseudo, cx - size.width / 2.0, player.y - 8.0, 16.0, WHITE);
        }
    }

    fn draw_anaconda(&mut self, sim: &Simulation, time: f32) {
        let anaconda = &sim.anaconda;
        let count = anaconda.segments.len();

        for (i, segment) in anaconda.segments.iter().enumerate().rev() {
            let green = segment_green(i, count);
            let wave = (time * 5.0 + i as f32 * 0.5).sin() * 5.0;
            draw_ellipse(
                segment.x,
                segment.y + wave,
                segment.width / 2.0,
                segment.height / 2.0,
                0.0,
                Color::from_rgba(0, green, 0, 255),
            );
            if i + 1 < count {
                draw_circle(
                    segment.x,
                    segment.y + wave,
                    segment.width / 4.0,
                    Color::from_rgba(0, green.saturating_sub(20), 0, 128),
                );
            }
        }

        draw_ellipse(
            anaconda.x,
            anaconda.y,
            crate::anaconda::ANACONDA_WIDTH / 2.0,
            crate::anaconda::ANACONDA_HEIGHT / 2.0,
            0.0,
            Color::from_hex(HEAD),
        );
        let eye_offset = if anaconda.direction == Direction::Right { 15.0 } else { -15.0 };
        draw_circle(anaconda.x + eye_offset, anaconda.y - 5.0, 5.0, YELLOW);

        let tongue_wave = (time * 10.0).sin() * 5.0;
        let tongue_x = anaconda.x + eye_offset;
        let reach = eye_offset * 4.0 / 3.0;
        draw_line(tongue_x, anaconda.y + 5.0, tongue_x + reach / 2.0, anaconda.y + 15.0 + tongue_wave, 2.0, RED);
        draw_line(tongue_x + reach / 2.0, anaconda.y + 15.0 + tongue_wave, tongue_x + reach, anaconda.y + 5.0, 2.0, RED);
    }

    fn draw_weather(&mut self, sim: &Simulation) {
        if sim.weather.current == WeatherKind::Foggy {
            draw_rectangle(0.0, 0.0, self.width, self.height, Color::from_rgba(200, 200, 200, 77));
        }

        for particle in &sim.effects.particles {
            draw_circle(particle.x, particle.y, particle.size, Color::from_hex(particle.color));
        }
    }

    fn draw_hud(&mut self, sim: &Simulation) {
        let mut y = 30.0;
        for line in hud_lines(sim) {
            draw_text(&line, 10.0, y, 18.0, WHITE);
            y += 20.0;
        }

        let bar_width = 150.0;
        let bar_x = self.width - bar_width - 10.0;
        draw_rectangle(bar_x, 10.0, bar_width, 10.0, Color::from_rgba(51, 51, 51, 255));
        draw_rectangle(bar_x, 10.0, bar_width * sim.player.hunger / 100.0, 10.0, ORANGE);
        draw_rectangle(bar_x, 25.0, bar_width, 10.0, Color::from_rgba(51, 51, 51, 255));
        draw_rectangle(bar_x, 25.0, bar_width * sim.player.happiness / 100.0, 10.0, PINK);

        let mut y = self.height - 10.0;
        for notice in sim.notices.iter().rev() {
            draw_text(notice, 10.0, y, 16.0, WHITE);
            y -= 18.0;
        }
    }

    fn draw_game_over(&mut self, sim: &Simulation) {
        draw_rectangle(0.0, 0.0, self.width, self.height, Color::new(0.0, 0.0, 0.0, 0.7));

        let center = |text: &str, size: u16, y: f32, color: Color| {
            let dims = measure_text(text, None, size, 1.0);
            draw_text(text, self.width / 2.0 - dims.width / 2.0, y, size as f32, color);
        };
        let mid = self.height / 2.0;
        center("GAME OVER", 64, mid, RED);
        center(&format!("Final score: {}", sim.score.value()), 24, mid + 50.0, WHITE);
        center(&format!("Survived {} seconds", sim.score.time_alive), 24, mid + 80.0, WHITE);
        center("Press SPACE to play again", 20, mid + 120.0, WHITE);
    }
}
