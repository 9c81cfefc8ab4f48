pub mod checkpoint;
pub mod dqn_agent;
pub mod metrics;
pub mod replay_buffer;
pub mod run_paths;
pub mod trainer;
