use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use q_learning_dino::environment::dino::spawner::{parse_obstacle_kinds, SpawnConfig, SpawnMode};
use q_learning_dino::environment::dino::world::{GameAction, GameConfig};
use q_learning_dino::environment::dino_environment::{DinoEnvironment, OBSERVATION_DIM};
use q_learning_dino::ql::learn::dqn_agent::{AgentConfig, DqnAgent};
use q_learning_dino::ql::learn::run_paths::{prepare_run_dirs, resume_dir, save_args};
use q_learning_dino::ql::learn::trainer::{self, TrainParameter};
use q_learning_dino::ql::prelude::{Action, Environment};
use q_learning_dino::util::format::grouped;
use q_learning_dino::util::log::init_logging;

#[derive(Parser)]
#[command(name = "dino-q-learning", about = "Dino runner game with a Deep-Q-Learning agent")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the DQN agent
    Train(TrainArgs),
    /// Play one episode with a trained agent or by keyboard
    Play(PlayArgs),
}

#[derive(Args, Serialize)]
struct GameArgs {
    /// Draw the game in the terminal
    #[arg(long, default_value_t = false)]
    render: bool,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(long, default_value_t = 60)]
    fps: u32,
    #[arg(long, default_value_t = 5_000)]
    max_steps: usize,
    #[arg(long, default_value_t = 1100)]
    width: i32,
    #[arg(long, default_value_t = 600)]
    height: i32,
    /// regular | random
    #[arg(long, default_value = "regular")]
    spawn_mode: SpawnMode,
    /// Distance between obstacles in regular mode (pixels)
    #[arg(long, default_value_t = 600.0)]
    spawn_distance: f32,
    #[arg(long, default_value_t = 400.0)]
    spawn_gap_min: f32,
    #[arg(long, default_value_t = 600.0)]
    spawn_gap_max: f32,
    /// Enabled obstacle kinds, e.g. `cactus` or `cactus,bird,bonus`
    #[arg(long, default_value = "cactus,bird,bonus")]
    obstacles: String,
    #[arg(long, default_value_t = 6.0)]
    base_speed: f32,
    #[arg(long, default_value_t = 13.0)]
    max_speed: f32,
    #[arg(long, default_value_t = 0.8)]
    gravity: f32,
    #[arg(long, default_value_t = -19.2, allow_hyphen_values = true)]
    jump_vel: f32,
    /// Speed increase per frame
    #[arg(long, default_value_t = 0.004)]
    acceleration: f32,
}

impl GameArgs {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            width: self.width,
            height: self.height,
            fps: self.fps,
            base_speed: self.base_speed,
            max_speed: self.max_speed,
            gravity: self.gravity,
            jump_vel: self.jump_vel,
            acceleration: self.acceleration,
            spawn: SpawnConfig {
                mode: self.spawn_mode,
                spawn_distance_px: self.spawn_distance,
                random_gap_min: self.spawn_gap_min,
                random_gap_max: self.spawn_gap_max,
                obstacle_kinds: parse_obstacle_kinds(&self.obstacles),
            },
        }
    }

    fn environment(&self) -> Result<DinoEnvironment> {
        if self.render {
            DinoEnvironment::with_console(self.game_config(), self.seed)
        } else {
            Ok(DinoEnvironment::new(self.game_config(), self.seed))
        }
    }
}

#[derive(Args, Serialize)]
struct AgentArgs {
    #[arg(long, default_value_t = 0.99)]
    gamma: f32,
    #[arg(long, default_value_t = 1e-3)]
    lr: f64,
    #[arg(long, default_value_t = 64)]
    batch_size: usize,
    #[arg(long, default_value_t = 50_000)]
    buffer_size: usize,
    /// Transitions to collect before training starts
    #[arg(long, default_value_t = 1_000)]
    train_start: usize,
    /// Training steps between target model syncs
    #[arg(long, default_value_t = 1_000)]
    target_update: u64,
    #[arg(long, default_value_t = 1.0)]
    epsilon_start: f64,
    #[arg(long, default_value_t = 0.01)]
    epsilon_end: f64,
    #[arg(long, default_value_t = 10_000)]
    epsilon_decay_steps: u64,
}

impl AgentArgs {
    fn agent_config(&self, seed: u64) -> AgentConfig {
        AgentConfig {
            obs_dim: OBSERVATION_DIM,
            n_actions: GameAction::ACTION_SPACE as usize,
            gamma: self.gamma,
            learning_rate: self.lr,
            batch_size: self.batch_size,
            buffer_size: self.buffer_size,
            train_start: self.train_start,
            target_update: self.target_update,
            epsilon_start: self.epsilon_start,
            epsilon_end: self.epsilon_end,
            epsilon_decay_steps: self.epsilon_decay_steps,
            seed: Some(seed.wrapping_add(1)),
        }
    }
}

#[derive(Args, Serialize)]
struct TrainArgs {
    #[command(flatten)]
    game: GameArgs,
    #[command(flatten)]
    agent: AgentArgs,
    #[arg(long, default_value_t = 500)]
    episodes: usize,
    /// Train every n environment steps
    #[arg(long, default_value_t = 4)]
    train_freq: usize,
    /// Save the latest checkpoint every n episodes
    #[arg(long, default_value_t = 50)]
    save_every: usize,
    #[arg(long)]
    run_name: Option<String>,
    /// Checkpoint directory to continue from: <models_dir>/runs/<run_id>/latest
    #[arg(long)]
    resume: Option<PathBuf>,
    #[arg(long, default_value = "models")]
    models_dir: PathBuf,
    #[arg(long, default_value = "logs")]
    logs_dir: PathBuf,
}

#[derive(Args, Serialize)]
struct PlayArgs {
    #[command(flatten)]
    game: GameArgs,
    /// Checkpoint directory (a `best` or `latest` directory)
    #[arg(long)]
    model: Option<PathBuf>,
    /// Use the `best` checkpoint of this run when no --model is given
    #[arg(long)]
    run_name: Option<String>,
    #[arg(long, default_value = "models")]
    models_dir: PathBuf,
    /// Keyboard control (Space/Up jump, Down duck) instead of the agent
    #[arg(long, default_value_t = false)]
    human: bool,
}

fn main() -> Result<()> {
    init_logging();
    match Cli::parse().command {
        Commands::Train(args) => train(args),
        Commands::Play(args) => play(args),
    }
}

fn train(args: TrainArgs) -> Result<()> {
    let resume = resume_dir(args.resume.as_deref());

    let run = prepare_run_dirs(
        &args.models_dir,
        &args.logs_dir,
        args.run_name.as_deref(),
        args.resume.as_deref(),
    )?;
    save_args(&run, &args)?;

    let mut environment = args.game.environment()?;
    let mut agent = DqnAgent::with_q_network(args.agent.agent_config(args.game.seed))?;
    if let Some(dir) = resume {
        agent.load(&dir)?;
    }

    let param = TrainParameter {
        episodes: args.episodes,
        max_steps_per_episode: args.game.max_steps,
        train_freq: args.train_freq,
        save_every: args.save_every,
        ..Default::default()
    };
    let summary = trainer::train(&mut environment, &mut agent, &param, &run)?;
    log::info!(
        "🏁 run '{}' finished after {} episodes ({} steps), best avg score: {:.1}, last avg: {:.1}",
        run.run_id,
        grouped(summary.episodes),
        grouped(agent.step_count()),
        summary.best_average,
        summary.last_average
    );
    Ok(())
}

fn play(args: PlayArgs) -> Result<()> {
    let mut environment = args.game.environment()?;
    let max_steps = args.game.max_steps;

    let outcome = if args.human {
        if !environment.is_rendering() {
            log::warn!("human play without --render: the dino will only run");
        }
        trainer::play_episode(&mut environment, max_steps, |env, _| Ok(env.human_action()))?
    } else {
        let model_dir = match (&args.model, &args.run_name) {
            (Some(dir), _) => dir.clone(),
            (None, Some(run_name)) => args.models_dir.join("runs").join(run_name).join("best"),
            (None, None) => bail!("play needs --model <dir> or --run-name <run>"),
        };
        let config = AgentConfig {
            obs_dim: OBSERVATION_DIM,
            n_actions: GameAction::ACTION_SPACE as usize,
            buffer_size: 1,
            epsilon_start: 0.0,
            epsilon_end: 0.0,
            epsilon_decay_steps: 1,
            seed: Some(args.game.seed),
            ..Default::default()
        };
        let mut agent = DqnAgent::with_q_network(config)?;
        agent.load(&model_dir)?;
        trainer::play_greedy(&mut environment, &mut agent, max_steps)?
    };
    environment.close();

    log::info!(
        "Score: {}  Steps: {}  Reward: {:.1}",
        outcome.score,
        grouped(outcome.steps),
        outcome.total_reward
    );
    Ok(())
}
