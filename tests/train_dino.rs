use std::fs;

use q_learning_dino::ql::learn::checkpoint::{MODEL_FILE, STATE_FILE};
use q_learning_dino::ql::learn::dqn_agent::DqnAgent;
use q_learning_dino::ql::learn::metrics::METRICS_HEADER;
use q_learning_dino::ql::learn::run_paths::{prepare_run_dirs, save_args};
use q_learning_dino::ql::learn::trainer;

mod common;

fn metrics_rows(content: &str) -> Vec<&str> {
    content.lines().skip(1).collect()
}

#[test]
fn test_train_writes_run_artifacts() {
    let root = tempfile::tempdir().unwrap();
    let run = prepare_run_dirs(&root.path().join("models"), &root.path().join("logs"), Some("itest"), None).unwrap();
    save_args(&run, &serde_json::json!({"episodes": 3})).unwrap();

    let mut environment = common::headless_environment(7);
    let mut agent = DqnAgent::with_q_network(common::tiny_agent_config(8)).unwrap();
    let summary = trainer::train(&mut environment, &mut agent, &common::short_train_parameter(3), &run).unwrap();

    assert_eq!(summary.episodes, 3);
    assert!(agent.step_count() > 0);
    assert!(agent.epsilon() < 1.0);

    let content = fs::read_to_string(run.metrics_file()).unwrap();
    assert_eq!(content.lines().next(), Some(METRICS_HEADER));
    let rows = metrics_rows(&content);
    assert_eq!(rows.len(), 3);
    for (i, row) in rows.iter().enumerate() {
        assert!(row.starts_with(&format!("{},", i + 1)), "unexpected row: {row}");
        assert_eq!(row.split(',').count(), 6);
    }

    assert!(run.latest_dir.join(MODEL_FILE).is_file());
    assert!(run.latest_dir.join(STATE_FILE).is_file());
    // every episode runs far enough to score, so the rolling average beats the initial best of 0
    assert!(summary.best_average > 0.0);
    assert!(run.best_dir.join(MODEL_FILE).is_file());
    assert!(run.args_file().is_file());
}

#[test]
fn test_resume_continues_run() {
    let root = tempfile::tempdir().unwrap();
    let models_root = root.path().join("models");
    let logs_root = root.path().join("logs");
    let run = prepare_run_dirs(&models_root, &logs_root, Some("resume"), None).unwrap();

    let mut environment = common::headless_environment(11);
    let mut agent = DqnAgent::with_q_network(common::tiny_agent_config(12)).unwrap();
    let first = trainer::train(&mut environment, &mut agent, &common::short_train_parameter(2), &run).unwrap();
    let steps_after_first = agent.step_count();

    let resumed_run = prepare_run_dirs(&models_root, &logs_root, None, Some(&run.latest_dir)).unwrap();
    assert_eq!(resumed_run, run);

    let mut resumed = DqnAgent::with_q_network(common::tiny_agent_config(13)).unwrap();
    resumed.load(&resumed_run.latest_dir).unwrap();
    assert_eq!(resumed.step_count(), steps_after_first);
    assert!((resumed.epsilon() - agent.epsilon()).abs() < 1e-9);
    assert!((resumed.best_score() - first.best_average).abs() < 1e-9);

    trainer::train(&mut environment, &mut resumed, &common::short_train_parameter(2), &resumed_run).unwrap();
    assert!(resumed.step_count() > steps_after_first);

    let content = fs::read_to_string(run.metrics_file()).unwrap();
    assert_eq!(content.matches(METRICS_HEADER).count(), 1);
    assert_eq!(metrics_rows(&content).len(), 4);
}

#[test]
fn test_play_greedy_from_best_checkpoint() {
    let root = tempfile::tempdir().unwrap();
    let run = prepare_run_dirs(&root.path().join("models"), &root.path().join("logs"), Some("play"), None).unwrap();

    let mut environment = common::headless_environment(21);
    let mut agent = DqnAgent::with_q_network(common::tiny_agent_config(22)).unwrap();
    trainer::train(&mut environment, &mut agent, &common::short_train_parameter(2), &run).unwrap();

    let mut player = DqnAgent::with_q_network(common::tiny_agent_config(23)).unwrap();
    player.load(&run.best_dir).unwrap();
    let step_count = player.step_count();

    let outcome = trainer::play_greedy(&mut environment, &mut player, 150).unwrap();
    assert!(outcome.steps > 0 && outcome.steps <= 150);
    assert!(!outcome.quit);
    assert_eq!(outcome.loss_avg, None);
    // evaluation never learns
    assert_eq!(player.step_count(), step_count);
    assert_eq!(player.replay_buffer().len(), 0);
}
