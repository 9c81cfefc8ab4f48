use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

/// Values of one named parameter tensor
#[derive(Clone, Debug, PartialEq)]
pub struct TensorData {
    pub shape: Vec<usize>,
    pub values: Vec<f32>,
}

/// Full copy of a model's learned parameters, keyed by parameter name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightSnapshot {
    pub tensors: BTreeMap<String, TensorData>,
}

/// Learned action-value function approximator.
///
/// States are fixed-length feature vectors; predictions are one value per action.
pub trait QValueModel {
    fn input_dim(&self) -> usize;

    fn num_actions(&self) -> usize;

    /// Predicts the action values for a batch of states.
    ///
    /// # Returns
    /// One row per state with [Self::num_actions] values each
    fn predict(&self, states: &[Vec<f32>]) -> Result<Vec<Vec<f32>>>;

    /// Performs a single supervised regression step of the predictions for `states` towards `targets`.
    ///
    /// # Returns
    ///   the loss before the update
    fn train_on_batch(&mut self, states: &[Vec<f32>], targets: &[Vec<f32>]) -> Result<f32>;

    fn weights(&self) -> Result<WeightSnapshot>;

    fn set_weights(&mut self, snapshot: &WeightSnapshot) -> Result<()>;

    fn save(&self, file: &Path) -> Result<()>;

    fn load(&mut self, file: &Path) -> Result<()>;
}
