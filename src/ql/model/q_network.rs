use std::path::Path;

use anyhow::{anyhow, ensure, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{AdamW, Linear, Module, Optimizer, ParamsAdamW, VarBuilder, VarMap};

use crate::ql::model::model::{QValueModel, TensorData, WeightSnapshot};

pub const HIDDEN_SIZE: usize = 64;

/// Dense feed-forward Q network: input → 64 (ReLU) → 64 (ReLU) → one linear output per action.
/// Trained with mean squared error and Adam.
pub struct QNetwork {
    varmap: VarMap,
    fc1: Linear,
    fc2: Linear,
    out: Linear,
    optimizer: AdamW,
    device: Device,
    input_dim: usize,
    num_actions: usize,
}

impl QNetwork {
    pub fn new(input_dim: usize, num_actions: usize, learning_rate: f64) -> Result<Self> {
        ensure!(input_dim > 0 && num_actions > 0, "network dimensions must be positive");
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let fc1 = candle_nn::linear(input_dim, HIDDEN_SIZE, vb.pp("fc1"))?;
        let fc2 = candle_nn::linear(HIDDEN_SIZE, HIDDEN_SIZE, vb.pp("fc2"))?;
        let out = candle_nn::linear(HIDDEN_SIZE, num_actions, vb.pp("out"))?;

        // plain Adam: no decoupled weight decay
        let params = ParamsAdamW {
            lr: learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-7,
            weight_decay: 0.0,
        };
        let optimizer = AdamW::new(varmap.all_vars(), params)?;

        Ok(Self {
            varmap,
            fc1,
            fc2,
            out,
            optimizer,
            device,
            input_dim,
            num_actions,
        })
    }

    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let h = self.fc1.forward(x)?.relu()?;
        let h = self.fc2.forward(&h)?.relu()?;
        self.out.forward(&h)
    }

    fn to_tensor(&self, rows: &[Vec<f32>], width: usize) -> Result<Tensor> {
        ensure!(
            rows.iter().all(|r| r.len() == width),
            "expected rows of length {width}"
        );
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        Ok(Tensor::from_vec(flat, (rows.len(), width), &self.device)?)
    }
}

impl QValueModel for QNetwork {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn predict(&self, states: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        if states.is_empty() {
            return Ok(vec![]);
        }
        let x = self.to_tensor(states, self.input_dim)?;
        Ok(self.forward(&x)?.to_vec2::<f32>()?)
    }

    fn train_on_batch(&mut self, states: &[Vec<f32>], targets: &[Vec<f32>]) -> Result<f32> {
        ensure!(!states.is_empty(), "empty training batch");
        ensure!(states.len() == targets.len(), "states and targets differ in batch size");
        let x = self.to_tensor(states, self.input_dim)?;
        let y = self.to_tensor(targets, self.num_actions)?;

        let predicted = self.forward(&x)?;
        let loss = candle_nn::loss::mse(&predicted, &y)?;
        self.optimizer.backward_step(&loss)?;
        Ok(loss.to_scalar::<f32>()?)
    }

    fn weights(&self) -> Result<WeightSnapshot> {
        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|_| anyhow!("Failed to lock varmap for weight snapshot"))?;
        let mut snapshot = WeightSnapshot::default();
        for (name, var) in data.iter() {
            let tensor = var.as_tensor().detach();
            let shape = tensor.shape().dims().to_vec();
            let values = tensor.flatten_all()?.to_vec1::<f32>()?;
            snapshot.tensors.insert(name.clone(), TensorData { shape, values });
        }
        Ok(snapshot)
    }

    fn set_weights(&mut self, snapshot: &WeightSnapshot) -> Result<()> {
        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|_| anyhow!("Failed to lock varmap for weight update"))?;
        for (name, var) in data.iter() {
            let source = snapshot
                .tensors
                .get(name)
                .ok_or_else(|| anyhow!("Missing var {name} in weight snapshot"))?;
            let tensor = Tensor::from_vec(source.values.clone(), source.shape.as_slice(), &self.device)?;
            var.set(&tensor)?;
        }
        Ok(())
    }

    fn save(&self, file: &Path) -> Result<()> {
        self.varmap
            .save(file)
            .with_context(|| format!("Failed to write model weights to {}", file.display()))
    }

    fn load(&mut self, file: &Path) -> Result<()> {
        self.varmap
            .load(file)
            .with_context(|| format!("Failed to read model weights from {}", file.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(rows: usize, width: usize) -> Vec<Vec<f32>> {
        (0..rows)
            .map(|r| (0..width).map(|c| ((r * width + c) as f32 * 0.1).sin()).collect())
            .collect()
    }

    #[test]
    fn test_predict_shape() -> Result<()> {
        let net = QNetwork::new(9, 3, 1e-3)?;
        let q = net.predict(&batch(5, 9))?;
        assert_eq!(q.len(), 5);
        assert!(q.iter().all(|row| row.len() == 3));
        Ok(())
    }

    #[test]
    fn test_predict_rejects_wrong_width() -> Result<()> {
        let net = QNetwork::new(9, 3, 1e-3)?;
        assert!(net.predict(&batch(2, 4)).is_err());
        Ok(())
    }

    #[test]
    fn test_training_reduces_loss() -> Result<()> {
        let mut net = QNetwork::new(4, 2, 1e-2)?;
        let states = batch(16, 4);
        let targets: Vec<Vec<f32>> = states.iter().map(|s| vec![s[0] + 1.0, -s[1]]).collect();
        let first = net.train_on_batch(&states, &targets)?;
        let mut last = first;
        for _ in 0..200 {
            last = net.train_on_batch(&states, &targets)?;
        }
        assert!(last < first, "loss did not decrease: {first} -> {last}");
        Ok(())
    }

    #[test]
    fn test_weight_snapshot_copy_is_exact() -> Result<()> {
        let source = QNetwork::new(9, 3, 1e-3)?;
        let mut copy = QNetwork::new(9, 3, 1e-3)?;
        assert_ne!(source.weights()?, copy.weights()?);

        copy.set_weights(&source.weights()?)?;
        assert_eq!(source.weights()?, copy.weights()?);

        let input = batch(3, 9);
        assert_eq!(source.predict(&input)?, copy.predict(&input)?);
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("model.safetensors");
        let source = QNetwork::new(9, 3, 1e-3)?;
        source.save(&file)?;

        let mut restored = QNetwork::new(9, 3, 1e-3)?;
        restored.load(&file)?;
        assert_eq!(source.weights()?, restored.weights()?);
        Ok(())
    }

    #[test]
    fn test_load_missing_file_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut net = QNetwork::new(9, 3, 1e-3)?;
        assert!(net.load(&dir.path().join("absent.safetensors")).is_err());
        Ok(())
    }
}
