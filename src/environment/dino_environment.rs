use std::time::Instant;

use anyhow::Result;

use crate::environment::dino::console_drawer::ConsoleRenderer;
use crate::environment::dino::world::{GameAction, GameConfig, World, WorldInfo};
use crate::ql::prelude::{Environment, EpisodeStats, Step};

pub const OBSERVATION_DIM: usize = 9;

/// Reward for every tick survived
pub const SURVIVAL_REWARD: f32 = 0.1;
pub const PASS_REWARD: f32 = 1.0;
pub const BONUS_REWARD: f32 = 5.0;
/// Replaces all other rewards on the terminating tick
pub const DEATH_PENALTY: f32 = -10.0;

/// Obstacle feature scale (pixels)
const SIZE_SCALE: f32 = 100.0;

pub type DinoObservation = [f32; OBSERVATION_DIM];

impl EpisodeStats for WorldInfo {
    fn score(&self) -> f64 {
        self.score as f64
    }
}

/// Learning environment around the runner game.
///
/// Observation layout:
///   0. dino y / world height
///   1. dino vy / |jump velocity|
///   2. on-ground flag
///   3. nearest obstacle ahead: dx / world width (1.0 when there is none)
///   4. its hitbox y / world height
///   5. its hitbox width / 100
///   6. its hitbox height / 100
///   7. its kind (cactus 0.0, bird 0.5, bonus 1.0)
///   8. speed / max speed
pub struct DinoEnvironment {
    world: World,
    renderer: Option<ConsoleRenderer>,
    last_frame: Instant,
}

impl DinoEnvironment {
    /// Headless environment
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            world: World::new(config, seed),
            renderer: None,
            last_frame: Instant::now(),
        }
    }

    /// Environment drawing to the terminal, paced at the configured frame rate
    pub fn with_console(config: GameConfig, seed: u64) -> Result<Self> {
        let renderer = ConsoleRenderer::new(config.width, config.height, config.fps)?;
        let mut environment = Self::new(config, seed);
        environment.renderer = Some(renderer);
        Ok(environment)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn is_rendering(&self) -> bool {
        self.renderer.is_some()
    }

    /// Keyboard action for human play; `Stand` without a console
    pub fn human_action(&self) -> GameAction {
        self.renderer
            .as_ref()
            .map(ConsoleRenderer::human_action)
            .unwrap_or_default()
    }

    pub fn observe(world: &World) -> DinoObservation {
        let config = world.config();
        let width = config.width.max(1) as f32;
        let height = config.height.max(1) as f32;
        let dino = world.dino();

        let mut observation = [0.0; OBSERVATION_DIM];
        observation[0] = dino.y() / height;
        observation[1] = dino.vy() / config.jump_vel.abs().max(f32::EPSILON);
        observation[2] = if dino.on_ground() { 1.0 } else { 0.0 };

        let nearest_ahead = world
            .obstacles()
            .iter()
            .find(|o| o.hitbox().right() as f32 >= dino.x() && !o.is_collected());
        match nearest_ahead {
            Some(obstacle) => {
                let hitbox = obstacle.hitbox();
                observation[3] = (obstacle.x() - dino.x()) / width;
                observation[4] = hitbox.y as f32 / height;
                observation[5] = hitbox.w as f32 / SIZE_SCALE;
                observation[6] = hitbox.h as f32 / SIZE_SCALE;
                observation[7] = obstacle.kind_code();
            }
            None => observation[3] = 1.0,
        }

        observation[8] = world.speed() / config.max_speed.max(f32::EPSILON);
        observation
    }

    pub fn reward(terminated: bool, info: &WorldInfo) -> f32 {
        if terminated {
            return DEATH_PENALTY;
        }
        let mut reward = SURVIVAL_REWARD + PASS_REWARD * info.obstacles_passed as f32;
        if info.bonus_collected {
            reward += BONUS_REWARD;
        }
        reward
    }
}

impl Environment for DinoEnvironment {
    type S = DinoObservation;
    type A = GameAction;
    type I = WorldInfo;

    fn reset(&mut self) -> Self::S {
        self.world.reset();
        self.last_frame = Instant::now();
        self.state()
    }

    fn state(&self) -> Self::S {
        Self::observe(&self.world)
    }

    fn tick(&mut self) -> f32 {
        match self.renderer.as_mut() {
            None => 1.0 / self.world.config().fps.max(1) as f32,
            Some(renderer) => {
                renderer.wait_frame();
                let now = Instant::now();
                let dt = now.duration_since(self.last_frame).as_secs_f32();
                self.last_frame = now;
                dt
            }
        }
    }

    fn step(&mut self, action: Self::A, dt: f32) -> Step<Self::S, Self::I> {
        let (terminated, info) = self.world.step(action, dt);
        log::trace!("{action} -> score {} speed {:.2} done {terminated}", info.score, info.speed);
        Step {
            state: self.state(),
            reward: Self::reward(terminated, &info),
            done: terminated,
            info,
        }
    }

    fn render(&mut self) -> Result<bool> {
        match self.renderer.as_mut() {
            Some(renderer) => Ok(renderer.draw(&self.world)),
            None => Ok(false),
        }
    }

    fn close(&mut self) {
        self.renderer = None;
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::environment::dino::spawner::{ObstacleCategory, SpawnConfig};

    use super::*;

    fn info(obstacles_passed: u32, bonus_collected: bool) -> WorldInfo {
        WorldInfo {
            score: 3,
            speed: 6.5,
            distance: 120.0,
            bonus_collected,
            obstacles_passed,
        }
    }

    #[rstest]
    #[case(false, 0, false, 0.1)]
    #[case(false, 1, false, 1.1)]
    #[case(false, 0, true, 5.1)]
    #[case(true, 1, true, -10.0)]
    fn test_reward(#[case] terminated: bool, #[case] passed: u32, #[case] bonus: bool, #[case] expected: f32) {
        let reward = DinoEnvironment::reward(terminated, &info(passed, bonus));
        assert!((reward - expected).abs() < 1e-6);
    }

    #[test]
    fn test_initial_observation() {
        let mut env = DinoEnvironment::new(GameConfig::default(), 1);
        let observation = env.reset();
        assert_eq!(observation.len(), OBSERVATION_DIM);
        assert_eq!(observation[0], 310.0 / 600.0);
        assert_eq!(observation[1], 0.0);
        assert_eq!(observation[2], 1.0);
        // nothing spawned before the first step
        assert_eq!(observation[3], 1.0);
        assert_eq!(&observation[4..8], &[0.0; 4]);
        assert_eq!(observation[8], 6.0 / 13.0);
    }

    #[test]
    fn test_observation_tracks_nearest_obstacle() {
        let config = GameConfig {
            spawn: SpawnConfig {
                obstacle_kinds: vec![ObstacleCategory::Bird],
                ..Default::default()
            },
            ..Default::default()
        };
        let mut env = DinoEnvironment::new(config, 2);
        env.reset();
        let dt = env.tick();
        let step = env.step(GameAction::Stand, dt);
        assert_eq!(step.state[7], 0.5);
        assert!(step.state[3] > 1.0);
        assert_eq!(step.state[5], 0.57);
    }

    #[test]
    fn test_jump_observation() {
        let mut env = DinoEnvironment::new(GameConfig::default(), 3);
        env.reset();
        let dt = env.tick();
        let step = env.step(GameAction::Jump, dt);
        assert_eq!(step.state[2], 0.0);
        assert!(step.state[1] < 0.0);
        assert!(!step.done);
        assert!((step.reward - SURVIVAL_REWARD).abs() < 1e-6);
    }

    #[test]
    fn test_episode_ends_with_penalty() {
        let mut env = DinoEnvironment::new(GameConfig::default(), 4);
        env.reset();
        let mut last = None;
        for _ in 0..10_000 {
            let dt = env.tick();
            let step = env.step(GameAction::Stand, dt);
            if step.done {
                last = Some(step);
                break;
            }
        }
        let last = last.expect("standing still should end the episode");
        assert_eq!(last.reward, DEATH_PENALTY);
        assert!(env.world().is_terminated());
        assert!(!env.render().unwrap());
    }
}
