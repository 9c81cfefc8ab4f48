#![allow(dead_code)]

use q_learning_dino::environment::dino::spawner::{ObstacleCategory, SpawnConfig};
use q_learning_dino::environment::dino::world::{GameAction, GameConfig};
use q_learning_dino::environment::dino_environment::{DinoEnvironment, OBSERVATION_DIM};
use q_learning_dino::ql::learn::dqn_agent::AgentConfig;
use q_learning_dino::ql::learn::trainer::TrainParameter;
use q_learning_dino::ql::prelude::Action;
use q_learning_dino::util::log::init_logging;

#[ctor::ctor]
fn init() {
    init_logging();
}

/// Small and quick agent for full-pipeline runs
pub fn tiny_agent_config(seed: u64) -> AgentConfig {
    AgentConfig {
        obs_dim: OBSERVATION_DIM,
        n_actions: GameAction::ACTION_SPACE as usize,
        batch_size: 16,
        buffer_size: 2_000,
        train_start: 32,
        target_update: 50,
        epsilon_decay_steps: 200,
        seed: Some(seed),
        ..Default::default()
    }
}

pub fn cactus_only_config() -> GameConfig {
    GameConfig {
        spawn: SpawnConfig {
            obstacle_kinds: vec![ObstacleCategory::Cactus],
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn headless_environment(seed: u64) -> DinoEnvironment {
    DinoEnvironment::new(cactus_only_config(), seed)
}

pub fn short_train_parameter(episodes: usize) -> TrainParameter {
    TrainParameter {
        episodes,
        max_steps_per_episode: 300,
        train_freq: 2,
        save_every: 1,
        score_window: 5,
        progress_every: 2,
    }
}
