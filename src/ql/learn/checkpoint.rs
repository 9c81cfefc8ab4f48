use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const MODEL_FILE: &str = "model.safetensors";
pub const STATE_FILE: &str = "state.json";

/// Agent progress persisted next to the model weights
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainState {
    #[serde(default)]
    pub step: u64,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default)]
    pub best_score: f64,
}

fn default_epsilon() -> f64 {
    1.0
}

impl Default for TrainState {
    fn default() -> Self {
        Self {
            step: 0,
            epsilon: default_epsilon(),
            best_score: 0.0,
        }
    }
}

pub fn save_state(dir: &Path, state: &TrainState) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(STATE_FILE);
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), state)?;
    Ok(())
}

/// Returns `None` when there is no state record in `dir`
pub fn load_state(dir: &Path) -> Result<Option<TrainState>> {
    let path = dir.join(STATE_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
    let state = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(state))
}
