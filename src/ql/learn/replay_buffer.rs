use std::collections::VecDeque;

use rand::seq::index;
use rand::Rng;

/// One experienced step: (state, action, reward, next_state, done)
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: Vec<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Vec<f32>,
    pub done: bool,
}

/// Sampled transitions, batched by field
#[derive(Clone, Debug, Default)]
pub struct TransitionBatch {
    pub states: Vec<Vec<f32>>,
    pub actions: Vec<usize>,
    pub rewards: Vec<f32>,
    pub next_states: Vec<Vec<f32>>,
    /// 1.0 for terminal transitions, 0.0 otherwise
    pub dones: Vec<f32>,
}

impl TransitionBatch {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Experience replay buffer with ring-buffer semantics: once full, the oldest transition gets evicted.
pub struct ReplayBuffer {
    max_buffer_len: usize,
    buffer: VecDeque<Transition>,
}

impl ReplayBuffer {
    pub fn new(max_buffer_len: usize) -> Self {
        assert!(max_buffer_len > 0);
        Self {
            max_buffer_len,
            buffer: VecDeque::with_capacity(max_buffer_len.min(1 << 16)),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn add(&mut self, element: Transition) {
        if self.buffer.len() >= self.max_buffer_len {
            self.buffer.pop_front();
        }
        self.buffer.push_back(element);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    /// Draws `min(batch_size, len)` distinct transitions uniformly at random.
    /// The buffer itself stays untouched.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> TransitionBatch {
        let amount = batch_size.min(self.buffer.len());
        let mut batch = TransitionBatch {
            states: Vec::with_capacity(amount),
            actions: Vec::with_capacity(amount),
            rewards: Vec::with_capacity(amount),
            next_states: Vec::with_capacity(amount),
            dones: Vec::with_capacity(amount),
        };
        for i in index::sample(rng, self.buffer.len(), amount).into_iter() {
            let t = &self.buffer[i];
            batch.states.push(t.state.clone());
            batch.actions.push(t.action);
            batch.rewards.push(t.reward);
            batch.next_states.push(t.next_state.clone());
            batch.dones.push(if t.done { 1.0 } else { 0.0 });
        }
        batch
    }
}
