//! # ML Tic-Tac-Toe
//!
//! A tic-tac-toe agent trained by self-play Q-learning. A small tanh network
//! approximates action values, experience replay feeds it mini-batches, and
//! exploration follows a decaying epsilon-greedy schedule.
//!
//! ## Modules
//!
//! - [`game`]: Board, players, and the in-place game state machine
//! - [`ai`]: Agent trait, Q-network, Q-learning agent, random opponent
//! - [`training`]: Self-play episodes, replay buffer, metrics, staged trainer
//! - [`checkpoint`]: JSON model documents and stage/final checkpoint files
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

pub mod ai;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod game;
pub mod training;
