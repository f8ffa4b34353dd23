//! Training infrastructure: self-play and evaluation episodes, replay buffer,
//! metrics collection, and the staged trainer.

pub mod episode;
pub mod metrics;
pub mod replay_buffer;
pub mod trainer;
