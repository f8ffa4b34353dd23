//! Agents: the shared `Agent` interface, the Q-network, the epsilon-greedy
//! Q-learning agent, and a uniform random opponent.

mod agent;
pub mod network;
mod q_agent;
mod random;

pub use agent::{Agent, Experience};
pub use network::{ActionValues, NetworkParameters, QFunction, QNetwork, StateVector};
pub use q_agent::{QAgent, QLearningConfig};
pub use random::RandomAgent;
