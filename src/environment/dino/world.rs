use std::fmt::{Display, Formatter};

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::environment::dino::cloud::Cloud;
use crate::environment::dino::dino::Dino;
use crate::environment::dino::frame_factor;
use crate::environment::dino::obstacle::Obstacle;
use crate::environment::dino::spawner::{build_spawn_policy, SpawnConfig, SpawnContext, SpawnPolicy};
use crate::environment::dino::sprites::{DINO_X, GROUND_Y};
use crate::ql::prelude::{Action, ModelActionType};

/// Score points per pixel of distance
pub const SCORE_PER_DISTANCE: f32 = 0.025;
pub const BONUS_SCORE: u32 = 10;
/// New obstacles appear this far right of the visible area
pub const SPAWN_OFFSET_X: f32 = 100.0;

const INITIAL_CLOUDS: usize = 3;
const MAX_CLOUDS: usize = 5;
const CLOUD_SPAWN_CHANCE: f64 = 0.01;

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub width: i32,
    pub height: i32,
    pub fps: u32,
    pub base_speed: f32,
    pub max_speed: f32,
    pub gravity: f32,
    /// Launch velocity of a jump (negative = upwards)
    pub jump_vel: f32,
    /// Speed increase per nominal 60 fps frame
    pub acceleration: f32,
    pub spawn: SpawnConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 1100,
            height: 600,
            fps: 60,
            base_speed: 6.0,
            max_speed: 13.0,
            gravity: 0.8,
            jump_vel: -19.2,
            acceleration: 0.004,
            spawn: SpawnConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum GameAction {
    #[default]
    Stand,
    Jump,
    Duck,
}

impl Display for GameAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Action for GameAction {
    const ACTION_SPACE: ModelActionType = 3;

    fn numeric(&self) -> ModelActionType {
        match self {
            GameAction::Stand => 0,
            GameAction::Jump => 1,
            GameAction::Duck => 2,
        }
    }

    fn try_from_numeric(value: ModelActionType) -> Result<Self> {
        match value {
            0 => Ok(GameAction::Stand),
            1 => Ok(GameAction::Jump),
            2 => Ok(GameAction::Duck),
            _ => bail!("value {} out of range", value),
        }
    }
}

/// Snapshot reported after each world step
#[derive(Clone, Debug, PartialEq)]
pub struct WorldInfo {
    pub score: u32,
    pub speed: f32,
    pub distance: f32,
    pub bonus_collected: bool,
    /// Non-bonus obstacles that got passed during this step
    pub obstacles_passed: u32,
}

/// The runner game simulation.
///
/// One [World::step] advances everything by one tick in a fixed order:
/// action, speed, distance, dino, spawn, clouds, obstacles, passed-marking, removal,
/// bonus collection, collision. After a collision the world stays terminated until [World::reset].
pub struct World {
    config: GameConfig,
    rng: StdRng,
    spawn_policy: Box<dyn SpawnPolicy>,
    dino: Dino,
    obstacles: Vec<Obstacle>,
    clouds: Vec<Cloud>,
    speed: f32,
    distance: f32,
    bonuses_collected: u32,
    score: u32,
    terminated: bool,
    ticks: u64,
}

impl World {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let spawn_policy = build_spawn_policy(&config.spawn);
        Self::with_spawn_policy(config, spawn_policy, seed)
    }

    pub fn with_spawn_policy(config: GameConfig, spawn_policy: Box<dyn SpawnPolicy>, seed: u64) -> Self {
        let dino = Dino::new(DINO_X, GROUND_Y, config.jump_vel, config.gravity);
        let mut world = Self {
            speed: config.base_speed,
            config,
            rng: StdRng::seed_from_u64(seed),
            spawn_policy,
            dino,
            obstacles: vec![],
            clouds: vec![],
            distance: 0.0,
            bonuses_collected: 0,
            score: 0,
            terminated: false,
            ticks: 0,
        };
        world.reset();
        world
    }

    pub fn reset(&mut self) {
        self.speed = self.config.base_speed;
        self.distance = 0.0;
        self.bonuses_collected = 0;
        self.score = 0;
        self.terminated = false;
        self.ticks = 0;
        self.dino = Dino::new(DINO_X, GROUND_Y, self.config.jump_vel, self.config.gravity);
        self.obstacles.clear();
        self.clouds.clear();
        self.spawn_initial_clouds();
        self.spawn_policy.reset(&mut self.rng);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn dino(&self) -> &Dino {
        &self.dino
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn clouds(&self) -> &[Cloud] {
        &self.clouds
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn bonuses_collected(&self) -> u32 {
        self.bonuses_collected
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn info(&self) -> WorldInfo {
        WorldInfo {
            score: self.score,
            speed: self.speed,
            distance: self.distance,
            bonus_collected: false,
            obstacles_passed: 0,
        }
    }

    /// Advances the simulation by `dt` seconds. Returns the terminated flag and a snapshot.
    pub fn step(&mut self, action: GameAction, dt: f32) -> (bool, WorldInfo) {
        if self.terminated {
            return (true, self.info());
        }
        self.ticks += 1;
        let k = frame_factor(dt);

        match action {
            GameAction::Jump => self.dino.jump(),
            GameAction::Duck => self.dino.duck(),
            GameAction::Stand => self.dino.stand(),
        }

        self.speed = (self.speed + self.config.acceleration * k).min(self.config.max_speed);
        self.distance += self.speed * k;
        self.update_score();

        self.dino.update(dt);
        self.run_spawner();
        self.update_clouds(dt);
        for obstacle in self.obstacles.iter_mut() {
            obstacle.update(self.speed, dt);
        }

        let dino_x = self.dino.x();
        let mut obstacles_passed = 0;
        for obstacle in self.obstacles.iter_mut() {
            if obstacle.mark_passed(dino_x) && !obstacle.is_bonus() {
                obstacles_passed += 1;
            }
        }

        self.obstacles.retain(|o| !o.offscreen() && !o.is_collected());

        let dino_hitbox = self.dino.hitbox();
        let bonus_collected = self
            .obstacles
            .iter_mut()
            .filter(|o| o.is_bonus() && !o.is_collected())
            .find(|o| o.hitbox().intersects(&dino_hitbox))
            .map(|bonus| bonus.collect())
            .unwrap_or(false);
        if bonus_collected {
            self.bonuses_collected += 1;
            self.update_score();
            log::trace!("bonus collected at distance {:.0}", self.distance);
        }

        self.terminated = self
            .obstacles
            .iter()
            .any(|o| !o.is_collected() && o.hitbox().intersects(&dino_hitbox));
        if self.terminated {
            log::trace!("collision after {} ticks, score {}", self.ticks, self.score);
        }

        let info = WorldInfo {
            score: self.score,
            speed: self.speed,
            distance: self.distance,
            bonus_collected,
            obstacles_passed,
        };
        (self.terminated, info)
    }

    fn update_score(&mut self) {
        let distance_score = (self.distance * SCORE_PER_DISTANCE).round_ties_even() as u32;
        self.score = distance_score + BONUS_SCORE * self.bonuses_collected;
    }

    fn run_spawner(&mut self) {
        let context = SpawnContext {
            distance: self.distance,
            live_obstacles: self.obstacles.len(),
        };
        if let Some(spec) = self.spawn_policy.decide_spawn(&context, &mut self.rng) {
            let x = self.config.width as f32 + SPAWN_OFFSET_X;
            self.obstacles.push(Obstacle::spawn(spec, x, GROUND_Y));
        }
    }

    fn spawn_initial_clouds(&mut self) {
        for i in 0..INITIAL_CLOUDS {
            let x = self.rng.gen_range(200..=self.config.width.max(200)) + (i as i32) * 400;
            let y = self.rng.gen_range(50..=120);
            self.clouds.push(Cloud::new(x as f32, y as f32));
        }
    }

    fn update_clouds(&mut self, dt: f32) {
        for cloud in self.clouds.iter_mut() {
            cloud.update(self.speed, dt);
        }
        self.clouds.retain(|c| !c.offscreen());

        if self.clouds.len() < MAX_CLOUDS && self.rng.gen::<f64>() < CLOUD_SPAWN_CHANCE {
            let x = self.config.width + self.rng.gen_range(100..=300);
            let y = self.rng.gen_range(50..=120);
            self.clouds.push(Cloud::new(x as f32, y as f32));
        }
    }
}
