use anyhow::{Context, Result};
use console_engine::pixel::{self, Pixel};
use console_engine::screen::Screen;
use console_engine::{ConsoleEngine, KeyCode};

use crate::environment::dino::algebra_2d::Rect;
use crate::environment::dino::obstacle::ObstacleKind;
use crate::environment::dino::sprites::{CLOUD, DINO_RUN};
use crate::environment::dino::world::{GameAction, World};
use crate::ql::prelude::DebugVisualizer;

/// World pixels per console column
const SCALE_X: i32 = 10;
/// World pixels per console row
const SCALE_Y: i32 = 15;

fn console_size(world_width: i32, world_height: i32) -> (u32, u32) {
    (
        (world_width / SCALE_X).max(1) as u32,
        (world_height / SCALE_Y).max(1) as u32,
    )
}

fn fill_scaled(screen: &mut Screen, rect: &Rect, pixel: Pixel) {
    let x1 = rect.left() / SCALE_X;
    let y1 = rect.top() / SCALE_Y;
    let x2 = ((rect.right() - 1) / SCALE_X).max(x1);
    let y2 = ((rect.bottom() - 1) / SCALE_Y).max(y1);
    screen.fill_rect(x1, y1, x2, y2, pixel);
}

fn legs_pixel(anim_frame: u8) -> Pixel {
    if anim_frame == 0 {
        pixel::pxl('/')
    } else {
        pixel::pxl('\\')
    }
}

impl DebugVisualizer for World {
    fn one_line_info(&self) -> String {
        let dino = self.dino();
        format!(
            "score: {}, speed: {:.2}, distance: {:.0}, obstacles: {}, dino: {{y: {:.0}, vy: {:.1}, {}}}{}",
            self.score(),
            self.speed(),
            self.distance(),
            self.obstacles().len(),
            dino.y(),
            dino.vy(),
            if !dino.on_ground() {
                "airborne"
            } else if dino.is_ducking() {
                "ducking"
            } else {
                "running"
            },
            if self.is_terminated() { " GAME OVER" } else { "" }
        )
    }

    fn render_to_console(&self) -> Screen {
        let (width, height) = console_size(self.config().width, self.config().height);
        let mut screen = Screen::new_empty(width, height);
        screen.clear();

        for cloud in self.clouds() {
            fill_scaled(&mut screen, &Rect::at(cloud.x, cloud.y, CLOUD), pixel::pxl('~'));
        }

        let ground_row = (self.dino().ground_y() as i32 + DINO_RUN.1) / SCALE_Y;
        screen.line(0, ground_row, width as i32 - 1, ground_row, pixel::pxl('_'));

        for obstacle in self.obstacles() {
            let pixel = match obstacle.kind() {
                ObstacleKind::Cactus { .. } => pixel::pxl('#'),
                ObstacleKind::Bird { anim_frame: 0, .. } => pixel::pxl('v'),
                ObstacleKind::Bird { .. } => pixel::pxl('^'),
                ObstacleKind::Bonus { collected: false } => pixel::pxl('o'),
                ObstacleKind::Bonus { collected: true } => continue,
            };
            fill_scaled(&mut screen, &obstacle.sprite_rect(), pixel);
        }

        let dino = self.dino();
        let dino_rect = dino.sprite_rect();
        if self.is_terminated() {
            fill_scaled(&mut screen, &dino_rect, pixel::pxl('X'));
        } else {
            fill_scaled(&mut screen, &dino_rect, pixel::pxl('D'));
            if dino.on_ground() {
                // bottom row shows the run/duck animation phase
                let legs = Rect::new(dino_rect.x, dino_rect.bottom() - 1, dino_rect.w, 1);
                fill_scaled(&mut screen, &legs, legs_pixel(dino.anim_frame()));
            }
        }

        let score_line = format!("{:05}", self.score());
        screen.print(width as i32 - score_line.len() as i32 - 1, 0, &score_line);
        screen
    }
}

/// Terminal presentation of a [World] with keyboard input
pub struct ConsoleRenderer {
    engine: ConsoleEngine,
}

impl ConsoleRenderer {
    pub fn new(world_width: i32, world_height: i32, fps: u32) -> Result<Self> {
        let (width, height) = console_size(world_width, world_height);
        // one extra row for the info line
        let engine = ConsoleEngine::init(width, height + 1, fps.max(1))
            .context("Failed to initialize the console renderer")?;
        Ok(Self { engine })
    }

    /// Blocks until the next frame is due
    pub fn wait_frame(&mut self) {
        self.engine.wait_frame();
    }

    /// Draws the world. Returns true when the user asked to quit (Esc / q).
    pub fn draw(&mut self, world: &World) -> bool {
        let screen = world.render_to_console();
        self.engine.clear_screen();
        self.engine.print_screen(0, 0, &screen);
        self.engine.print(0, screen.get_height() as i32, &world.one_line_info());
        self.engine.draw();

        self.engine.is_key_pressed(KeyCode::Esc) || self.engine.is_key_pressed(KeyCode::Char('q'))
    }

    /// Action requested from the keyboard: Space/Up jumps, Down ducks
    pub fn human_action(&self) -> GameAction {
        let active = |key: KeyCode| self.engine.is_key_pressed(key) || self.engine.is_key_held(key);
        if active(KeyCode::Char(' ')) || active(KeyCode::Up) {
            GameAction::Jump
        } else if active(KeyCode::Down) {
            GameAction::Duck
        } else {
            GameAction::Stand
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::environment::dino::world::GameConfig;

    use super::*;

    #[test]
    fn test_render_fits_screen() {
        let mut world = World::new(GameConfig::default(), 1);
        for _ in 0..50 {
            world.step(GameAction::Stand, 1.0 / 60.0);
        }
        let screen = world.render_to_console();
        assert_eq!(screen.get_width(), 110);
        assert_eq!(screen.get_height(), 40);
        assert!(screen.to_string().contains('D'));
    }

    #[test]
    fn test_render_shows_run_animation() {
        let mut world = World::new(GameConfig::default(), 1);
        let first = world.render_to_console().to_string();
        assert!(first.contains('/') && !first.contains('\\'));

        let start_frame = world.dino().anim_frame();
        let mut ticks = 0;
        while world.dino().anim_frame() == start_frame && ticks < 60 {
            world.step(GameAction::Stand, 1.0 / 60.0);
            ticks += 1;
        }
        assert_ne!(world.dino().anim_frame(), start_frame);
        let second = world.render_to_console().to_string();
        assert!(second.contains('\\') && !second.contains('/'));
    }

    #[test]
    fn test_one_line_info() {
        let world = World::new(GameConfig::default(), 1);
        let info = world.one_line_info();
        assert!(info.starts_with("score: 0, speed: 6.00"));
        assert!(info.contains("running"));
    }
}
