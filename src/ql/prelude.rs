use std::fmt::Display;
use std::hash::Hash;

use anyhow::Result;
use console_engine::screen::Screen;

/// Data type we use to encode an `Action` to feed the model.
pub type ModelActionType = u8;

pub trait Action: Display + Sized + Clone + Copy + Hash + PartialEq + Eq {
    /// Number of possible actions
    const ACTION_SPACE: ModelActionType;
    /// Identifying the Action as a unique value in range (0..Self::ACTION_SPACE)
    fn numeric(&self) -> ModelActionType;
    fn try_from_numeric(value: ModelActionType) -> Result<Self>;
}

/// Per-step facts an environment reports besides state, reward and done flag.
pub trait EpisodeStats {
    /// Game score reached so far in the running episode
    fn score(&self) -> f64;
}

/// One environment step as seen by a learner
#[derive(Clone, Debug)]
pub struct Step<S, I> {
    pub state: S,
    pub reward: f32,
    pub done: bool,
    pub info: I,
}

/// Learning environment, modeling the world of a learning agent
pub trait Environment {
    /// Fixed-length observation vector
    type S: Clone + AsRef<[f32]>;
    type A: Action;
    type I: EpisodeStats + Clone;

    /// Resets the environment to a defined starting point and returns the initial observation
    fn reset(&mut self) -> Self::S;

    /// Current observation
    fn state(&self) -> Self::S;

    /// Paces the loop and returns the elapsed time (in seconds) the next step shall simulate
    fn tick(&mut self) -> f32;

    /// Performs one time/action-step.
    ///
    /// Applies the given `action` for a time span of `dt` seconds and returns:
    ///   - next state
    ///   - immediate reward earned during performing that step
    ///   - done flag (e.g. game ended)
    ///   - step info
    fn step(&mut self, action: Self::A, dt: f32) -> Step<Self::S, Self::I>;

    /// Draws the current state, if the environment has a presentation layer.
    /// Returns `true` when the user asked to quit.
    fn render(&mut self) -> Result<bool> {
        Ok(false)
    }

    /// Releases presentation resources
    fn close(&mut self) {}
}

pub trait DebugVisualizer {
    fn one_line_info(&self) -> String;
    fn render_to_console(&self) -> Screen;
}
