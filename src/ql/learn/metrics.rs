use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const METRICS_HEADER: &str = "episode,score,total_reward,steps,epsilon,loss_avg";

/// Summary of one finished training episode
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeRecord {
    pub episode: usize,
    pub score: f64,
    pub total_reward: f32,
    pub steps: usize,
    pub epsilon: f64,
    /// Mean training loss over the episode; `None` if no update happened
    pub loss_avg: Option<f32>,
}

/// Appends one CSV row per episode
pub struct MetricsLogger {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl MetricsLogger {
    /// Opens `path` for appending. The header line is only written into a new (or empty) file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        if is_new {
            writeln!(writer, "{METRICS_HEADER}")?;
            writer.flush()?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn log_episode(&mut self, record: &EpisodeRecord) -> Result<()> {
        let loss = record.loss_avg.map(|l| format!("{l:.6}")).unwrap_or_default();
        writeln!(
            self.writer,
            "{},{},{:.4},{},{:.6},{}",
            record.episode, record.score, record.total_reward, record.steps, record.epsilon, loss
        )
        .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        self.writer.flush()?;
        Ok(())
    }
}
