use std::collections::VecDeque;

use anyhow::Result;
use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::ql::learn::dqn_agent::DqnAgent;
use crate::ql::learn::metrics::{EpisodeRecord, MetricsLogger};
use crate::ql::learn::run_paths::RunPaths;
use crate::ql::model::model::QValueModel;
use crate::ql::prelude::{Action, Environment, EpisodeStats, ModelActionType};
use crate::util::format::grouped;

pub struct TrainParameter {
    pub episodes: usize,
    pub max_steps_per_episode: usize,
    /// Call a training step after every n environment steps
    pub train_freq: usize,
    /// Save the latest checkpoint every n episodes
    pub save_every: usize,
    /// Number of recent episode scores the rolling average covers
    pub score_window: usize,
    /// Log a progress summary every n episodes
    pub progress_every: usize,
}

impl Default for TrainParameter {
    fn default() -> Self {
        Self {
            episodes: 500,
            max_steps_per_episode: 5_000,
            train_freq: 4,
            save_every: 50,
            score_window: 20,
            progress_every: 10,
        }
    }
}

/// Rolling mean over the last `capacity` scores
pub struct ScoreWindow {
    capacity: usize,
    scores: VecDeque<f64>,
}

impl ScoreWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            scores: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, score: f64) {
        if self.scores.len() >= self.capacity {
            self.scores.pop_front();
        }
        self.scores.push_back(score);
    }

    pub fn average(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().sum::<f64>() / self.scores.len() as f64
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeOutcome {
    pub score: f64,
    pub total_reward: f32,
    pub steps: usize,
    pub loss_avg: Option<f32>,
    /// The user asked to quit while the episode was rendered
    pub quit: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainSummary {
    pub episodes: usize,
    pub best_average: f64,
    pub last_average: f64,
}

/// Trains `agent` in `environment` for the configured number of episodes.
///
/// Keeps `latest` and `best` checkpoints of the run up to date and appends one metrics row per episode.
/// `best` is written whenever the rolling score average exceeds the best average seen so far
/// (which starts at the agent's persisted `best_score`).
pub fn train<E: Environment, M: QValueModel>(
    environment: &mut E,
    agent: &mut DqnAgent<M>,
    param: &TrainParameter,
    run: &RunPaths,
) -> Result<TrainSummary> {
    let mut metrics = MetricsLogger::open(&run.metrics_file())?;
    let mut window = ScoreWindow::new(param.score_window);
    let mut best_average = agent.best_score();
    let mut action_counts = FxHashMap::<E::A, usize>::default();
    let mut episodes_done = 0;

    log::info!(
        "🚀 run '{}': {} episodes, max {} steps each, starting at step {}, 𝜀={:.3}",
        run.run_id,
        grouped(param.episodes),
        grouped(param.max_steps_per_episode),
        grouped(agent.step_count()),
        agent.epsilon()
    );

    for episode in 1..=param.episodes {
        let outcome = train_episode(environment, agent, param, &mut action_counts)?;
        episodes_done = episode;

        window.push(outcome.score);
        let average = window.average();

        if param.save_every > 0 && episode % param.save_every == 0 {
            agent.save(&run.latest_dir)?;
        }
        if average > best_average {
            best_average = average;
            agent.set_best_score(best_average);
            agent.save(&run.best_dir)?;
        }

        metrics.log_episode(&EpisodeRecord {
            episode,
            score: outcome.score,
            total_reward: outcome.total_reward,
            steps: outcome.steps,
            epsilon: agent.epsilon(),
            loss_avg: outcome.loss_avg,
        })?;

        log::debug!(
            "episode {episode}: score={} reward={:.1} steps={} 𝜀={:.3}",
            outcome.score,
            outcome.total_reward,
            outcome.steps,
            agent.epsilon()
        );
        if param.progress_every > 0 && episode % param.progress_every == 0 {
            progress_log(episode, agent, &window, best_average, &action_counts);
            action_counts.clear();
        }

        if outcome.quit {
            log::info!("quit requested, stopping after episode {episode}");
            break;
        }
    }

    agent.save(&run.latest_dir)?;
    environment.close();

    Ok(TrainSummary {
        episodes: episodes_done,
        best_average,
        last_average: window.average(),
    })
}

fn train_episode<E: Environment, M: QValueModel>(
    environment: &mut E,
    agent: &mut DqnAgent<M>,
    param: &TrainParameter,
    action_counts: &mut FxHashMap<E::A, usize>,
) -> Result<EpisodeOutcome> {
    let train_freq = param.train_freq.max(1);
    let mut state = environment.reset();
    let mut total_reward = 0.0;
    let mut steps = 0;
    let mut score = 0.0;
    let mut losses = vec![];
    let mut quit = false;

    loop {
        let dt = environment.tick();
        let numeric_action = agent.act(state.as_ref(), true)?;
        let action = E::A::try_from_numeric(numeric_action as ModelActionType)?;
        *action_counts.entry(action).or_insert(0) += 1;

        let step = environment.step(action, dt);
        agent.remember(state.as_ref(), numeric_action, step.reward, step.state.as_ref(), step.done)?;

        if steps % train_freq == 0 {
            if let Some(loss) = agent.train_step()? {
                losses.push(loss);
            }
        }

        total_reward += step.reward;
        steps += 1;
        score = step.info.score();
        state = step.state;

        if environment.render()? {
            quit = true;
            break;
        }
        if step.done || steps >= param.max_steps_per_episode {
            break;
        }
    }

    let loss_avg = if losses.is_empty() {
        None
    } else {
        Some(losses.iter().sum::<f32>() / losses.len() as f32)
    };
    Ok(EpisodeOutcome {
        score,
        total_reward,
        steps,
        loss_avg,
        quit,
    })
}

/// Runs one episode without learning; `policy` picks the action for the current state.
pub fn play_episode<E: Environment>(
    environment: &mut E,
    max_steps: usize,
    mut policy: impl FnMut(&E, &E::S) -> Result<E::A>,
) -> Result<EpisodeOutcome> {
    let mut state = environment.reset();
    let mut total_reward = 0.0;
    let mut steps = 0;
    let mut score = 0.0;
    let mut quit = false;

    loop {
        let dt = environment.tick();
        let action = policy(environment, &state)?;
        let step = environment.step(action, dt);
        total_reward += step.reward;
        steps += 1;
        score = step.info.score();
        state = step.state;

        if environment.render()? {
            quit = true;
            break;
        }
        if step.done || steps >= max_steps {
            break;
        }
    }
    log::info!("episode finished: score={score} steps={} reward={total_reward:.1}", grouped(steps));

    Ok(EpisodeOutcome {
        score,
        total_reward,
        steps,
        loss_avg: None,
        quit,
    })
}

/// Greedy (non-exploring) evaluation of `agent`
pub fn play_greedy<E: Environment, M: QValueModel>(
    environment: &mut E,
    agent: &mut DqnAgent<M>,
    max_steps: usize,
) -> Result<EpisodeOutcome> {
    play_episode(environment, max_steps, |_, state| {
        let numeric_action = agent.act(state.as_ref(), false)?;
        E::A::try_from_numeric(numeric_action as ModelActionType)
    })
}

fn progress_log<A: Action, M: QValueModel>(
    episode: usize,
    agent: &DqnAgent<M>,
    window: &ScoreWindow,
    best_average: f64,
    action_counts: &FxHashMap<A, usize>,
) {
    let total_actions: usize = action_counts.values().sum();
    let action_distribution_line = action_counts
        .iter()
        .sorted_by_key(|(action, _)| action.numeric())
        .map(|(action, &count)| {
            let ratio = 100.0 * count as f32 / total_actions.max(1) as f32;
            format!("{} {:.1}%", action, ratio)
        })
        .join(", ");

    log::info!(
        "\n\
    episode: {}, steps: {}, 𝛾={:.2}, 𝜀={:.3}, avg{}: {:.1}, best_avg: {:.1}, replay: {}\n\
    action_distribution (of last {}): {}",
        grouped(episode),
        grouped(agent.step_count()),
        agent.config().gamma,
        agent.epsilon(),
        window.len(),
        window.average(),
        best_average,
        grouped(agent.replay_buffer().len()),
        grouped(total_actions),
        action_distribution_line
    );
}
