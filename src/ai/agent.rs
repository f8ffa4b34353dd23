use crate::ai::network::StateVector;
use crate::game::GameState;

/// A single step of experience for Q-learning.
#[derive(Debug, Clone, PartialEq)]
pub struct Experience {
    pub state: StateVector,
    pub action: usize,
    pub reward: f64,
    pub next_state: StateVector,
    pub done: bool,
}

/// Universal interface for anything that can pick a move.
pub trait Agent {
    /// Select an action (`row * 3 + col`) for the player to move.
    /// When `training` is true, the agent may explore; otherwise it exploits.
    /// Returns `None` when there is no legal action.
    fn select_action(&mut self, state: &GameState, training: bool) -> Option<usize>;

    /// Return the agent's display name.
    fn name(&self) -> &str;
}
