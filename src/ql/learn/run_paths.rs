use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::ql::learn::checkpoint::MODEL_FILE;

pub const ARGS_FILE: &str = "args.json";
pub const METRICS_FILE: &str = "metrics.csv";

/// Directories belonging to one training run
#[derive(Clone, Debug, PartialEq)]
pub struct RunPaths {
    pub run_id: String,
    pub models_run_dir: PathBuf,
    pub logs_run_dir: PathBuf,
    pub latest_dir: PathBuf,
    pub best_dir: PathBuf,
}

impl RunPaths {
    pub fn metrics_file(&self) -> PathBuf {
        self.logs_run_dir.join(METRICS_FILE)
    }

    pub fn args_file(&self) -> PathBuf {
        self.logs_run_dir.join(ARGS_FILE)
    }
}

fn timestamp_id() -> String {
    chrono::Local::now().format("%Y-%m-%d_%H%M%S").to_string()
}

/// Creates (if needed) and returns the directory layout
/// `<models_root>/runs/<run_id>/{latest,best}` and `<logs_root>/runs/<run_id>`.
///
/// With `resume` pointing at a `.../<run_id>/latest` directory, the run id and the sibling `best`
/// directory are derived from that path.
pub fn prepare_run_dirs(
    models_root: &Path,
    logs_root: &Path,
    run_name: Option<&str>,
    resume: Option<&Path>,
) -> Result<RunPaths> {
    let paths = match resume {
        Some(latest_dir) => {
            let models_run_dir = latest_dir
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let run_id = models_run_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(timestamp_id);
            RunPaths {
                logs_run_dir: logs_root.join("runs").join(&run_id),
                best_dir: models_run_dir.join("best"),
                latest_dir: latest_dir.to_path_buf(),
                models_run_dir,
                run_id,
            }
        }
        None => {
            let run_id = run_name.map(str::to_owned).unwrap_or_else(timestamp_id);
            let models_run_dir = models_root.join("runs").join(&run_id);
            RunPaths {
                logs_run_dir: logs_root.join("runs").join(&run_id),
                latest_dir: models_run_dir.join("latest"),
                best_dir: models_run_dir.join("best"),
                models_run_dir,
                run_id,
            }
        }
    };

    for dir in [&paths.latest_dir, &paths.best_dir, &paths.logs_run_dir] {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(paths)
}

/// Checkpoint directory to continue training from.
///
/// A resume path without model weights means a fresh agent; that case is logged and `None` returned.
pub fn resume_dir(resume: Option<&Path>) -> Option<PathBuf> {
    match resume {
        Some(dir) if dir.join(MODEL_FILE).is_file() => Some(dir.to_path_buf()),
        Some(dir) => {
            log::warn!("nothing to resume in {}, training a fresh agent", dir.display());
            None
        }
        None => None,
    }
}

/// Stores the effective run arguments as pretty JSON
pub fn save_args<T: Serialize>(paths: &RunPaths, args: &T) -> Result<()> {
    let path = paths.args_file();
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), args)?;
    Ok(())
}
