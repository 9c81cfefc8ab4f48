use std::fs;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ql::learn::checkpoint::{load_state, save_state, TrainState, MODEL_FILE};
use crate::ql::learn::replay_buffer::{ReplayBuffer, Transition};
use crate::ql::model::model::QValueModel;
use crate::ql::model::q_network::QNetwork;

#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Length of an observation vector
    pub obs_dim: usize,
    pub n_actions: usize,
    /// Discount rate; (0 <= 𝛾 <= 1) represents the value of future rewards
    pub gamma: f32,
    pub learning_rate: f64,
    pub batch_size: usize,
    /// Maximum replay length
    pub buffer_size: usize,
    /// Minimum number of stored transitions before any gradient update happens
    pub train_start: usize,
    /// Copy online weights into the target model every n training steps
    pub target_update: u64,
    pub epsilon_start: f64,
    pub epsilon_end: f64,
    /// Number of training steps for the linear epsilon decay
    pub epsilon_decay_steps: u64,
    /// Seed for exploration and replay sampling; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            obs_dim: 9,
            n_actions: 3,
            gamma: 0.99,
            learning_rate: 1e-3,
            batch_size: 64,
            buffer_size: 50_000,
            train_start: 1_000,
            target_update: 1_000,
            epsilon_start: 1.0,
            epsilon_end: 0.01,
            epsilon_decay_steps: 10_000,
            seed: None,
        }
    }
}

/// Deep-Q-Network agent with experience replay and a periodically synced target model.
pub struct DqnAgent<M: QValueModel = QNetwork> {
    config: AgentConfig,
    model: M,
    // "stabilized model"
    target_model: M,
    replay_buffer: ReplayBuffer,
    rng: StdRng,
    step_count: u64,
    ///  Epsilon greedy parameter
    epsilon: f64,
    best_score: f64,
}

impl DqnAgent<QNetwork> {
    pub fn with_q_network(config: AgentConfig) -> Result<Self> {
        let (obs_dim, n_actions, learning_rate) = (config.obs_dim, config.n_actions, config.learning_rate);
        Self::new(config, || QNetwork::new(obs_dim, n_actions, learning_rate))
    }
}

impl<M: QValueModel> DqnAgent<M> {
    /// `model_init` is called twice: for the online and for the target model
    pub fn new(config: AgentConfig, model_init: impl Fn() -> Result<M>) -> Result<Self> {
        ensure!(config.batch_size > 0, "batch_size must be positive");
        ensure!(config.buffer_size > 0, "buffer_size must be positive");
        ensure!(config.target_update > 0, "target_update must be positive");

        let model = model_init()?;
        let mut target_model = model_init()?;
        ensure!(
            model.input_dim() == config.obs_dim && model.num_actions() == config.n_actions,
            "model dimensions ({}→{}) do not match agent config ({}→{})",
            model.input_dim(),
            model.num_actions(),
            config.obs_dim,
            config.n_actions
        );
        target_model.set_weights(&model.weights()?)?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let replay_buffer = ReplayBuffer::new(config.buffer_size);
        let epsilon = config.epsilon_start;

        Ok(Self {
            config,
            model,
            target_model,
            replay_buffer,
            rng,
            step_count: 0,
            epsilon,
            best_score: 0.0,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn target_model(&self) -> &M {
        &self.target_model
    }

    pub fn replay_buffer(&self) -> &ReplayBuffer {
        &self.replay_buffer
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    pub fn set_best_score(&mut self, best_score: f64) {
        self.best_score = best_score;
    }

    pub fn train_state(&self) -> TrainState {
        TrainState {
            step: self.step_count,
            epsilon: self.epsilon,
            best_score: self.best_score,
        }
    }

    pub fn restore_train_state(&mut self, state: TrainState) {
        self.step_count = state.step;
        self.epsilon = state.epsilon;
        self.best_score = state.best_score;
    }

    /// Epsilon-greedy action selection. Exploration only happens while `training`.
    pub fn act(&mut self, observation: &[f32], training: bool) -> Result<usize> {
        if training && self.rng.gen::<f64>() < self.epsilon {
            // Take random action
            return Ok(self.rng.gen_range(0..self.config.n_actions));
        }
        let q_values = self.q_values(observation)?;
        Ok(argmax(&q_values))
    }

    pub fn q_values(&self, observation: &[f32]) -> Result<Vec<f32>> {
        ensure!(
            observation.len() == self.config.obs_dim,
            "observation has {} features, expected {}",
            observation.len(),
            self.config.obs_dim
        );
        let mut rows = self.model.predict(&[observation.to_vec()])?;
        rows.pop().context("model returned no prediction")
    }

    /// Stores one transition; the action must be in `0..n_actions` and both states `obs_dim` long
    pub fn remember(&mut self, state: &[f32], action: usize, reward: f32, next_state: &[f32], done: bool) -> Result<()> {
        ensure!(
            action < self.config.n_actions,
            "action {action} out of range (n_actions = {})",
            self.config.n_actions
        );
        ensure!(
            state.len() == self.config.obs_dim && next_state.len() == self.config.obs_dim,
            "transition states must have {} features",
            self.config.obs_dim
        );
        self.replay_buffer.add(Transition {
            state: state.to_vec(),
            action,
            reward,
            next_state: next_state.to_vec(),
            done,
        });
        Ok(())
    }

    /// Linear decay from `epsilon_start` to `epsilon_end` over `epsilon_decay_steps` training steps
    fn decay_epsilon(&mut self) {
        let (start, end) = (self.config.epsilon_start, self.config.epsilon_end);
        if self.config.epsilon_decay_steps == 0 || self.step_count >= self.config.epsilon_decay_steps {
            self.epsilon = end;
            return;
        }
        let fraction = self.step_count as f64 / self.config.epsilon_decay_steps as f64;
        self.epsilon = (start + fraction * (end - start)).clamp(start.min(end), start.max(end));
    }

    /// One training step.
    ///
    /// Counts the step and decays epsilon. Once the replay buffer holds at least `train_start`
    /// transitions, a batch gets sampled and the online model is regressed towards
    /// `reward + (1 - done) * 𝛾 * max_a' Q_target(s', a')` for the taken actions.
    ///
    /// # Returns
    ///   the training loss, or `None` when no update happened
    pub fn train_step(&mut self) -> Result<Option<f32>> {
        self.step_count += 1;
        self.decay_epsilon();

        if self.replay_buffer.len() < self.config.train_start {
            return Ok(None);
        }
        let batch = self.replay_buffer.sample(self.config.batch_size, &mut self.rng);
        if batch.is_empty() {
            return Ok(None);
        }

        // Use the target model for stability
        let future_rewards = self.target_model.predict(&batch.next_states)?;
        let mut updated_q_values = self.model.predict(&batch.states)?;

        for i in 0..batch.len() {
            let max_future_reward = future_rewards[i].iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let target = batch.rewards[i] + (1.0 - batch.dones[i]) * self.config.gamma * max_future_reward;
            // only the taken action contributes to the loss
            updated_q_values[i][batch.actions[i]] = target;
        }

        let loss = self.model.train_on_batch(&batch.states, &updated_q_values)?;

        if self.step_count % self.config.target_update == 0 {
            self.sync_target_model()?;
            log::debug!("target model synced at step {}", self.step_count);
        }
        Ok(Some(loss))
    }

    /// Copies the online weights verbatim into the target model
    pub fn sync_target_model(&mut self) -> Result<()> {
        let snapshot = self.model.weights()?;
        self.target_model.set_weights(&snapshot)
    }

    /// Writes model weights and train state into `dir` (created if necessary)
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        self.model.save(&dir.join(MODEL_FILE))?;
        save_state(dir, &self.train_state())?;
        log::info!("💾 agent saved to {}", dir.display());
        Ok(())
    }

    /// Restores model weights (mandatory) and train state (optional) from `dir`
    pub fn load(&mut self, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            bail!("checkpoint directory not found: {}", dir.display());
        }
        let model_file = dir.join(MODEL_FILE);
        if !model_file.is_file() {
            bail!("model weights not found: {}", model_file.display());
        }
        self.model.load(&model_file)?;
        self.sync_target_model()?;

        match load_state(dir)? {
            Some(state) => self.restore_train_state(state),
            None => log::warn!("no train state in {}, keeping step/epsilon/best_score", dir.display()),
        }
        log::info!("📂 agent loaded from {}", dir.display());
        Ok(())
    }
}

/// Index of the largest value; the first one wins on ties
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
