use std::path::Path;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::ai::agent::{Agent, Experience};
use crate::ai::network::{QFunction, QNetwork, StateVector};
use crate::checkpoint::ModelDocument;
use crate::error::CheckpointError;
use crate::game::{GameOutcome, GameState};
use crate::training::metrics::TrainingStats;
use crate::training::replay_buffer::ReplayBuffer;

/// Q-learning hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    pub learning_rate: f64,
    pub gamma: f64,
    pub epsilon_start: f64,
    pub epsilon_min: f64,
    pub epsilon_decay: f64,
    pub batch_size: usize,
    pub replay_capacity: usize,
    /// Episodes per win-rate sample.
    pub win_rate_window: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        QLearningConfig {
            learning_rate: 0.001,
            gamma: 0.95,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            batch_size: 32,
            replay_capacity: 10_000,
            win_rate_window: 100,
            seed: None,
        }
    }
}

/// Epsilon-greedy Q-learning agent with experience replay.
///
/// Self-play uses a single agent for both sides, so the learned values are
/// always those of "the player to move".
pub struct QAgent<Q: QFunction = QNetwork> {
    q: Q,
    replay_buffer: ReplayBuffer,
    config: QLearningConfig,
    epsilon: f64,
    step_count: usize,
    stats: TrainingStats,
    rng: StdRng,
}

impl QAgent<QNetwork> {
    /// Fresh agent with a randomly initialised network. Seeded from
    /// `config.seed` when set, otherwise from the OS.
    pub fn new(config: QLearningConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let network = QNetwork::random(config.learning_rate, &mut rng);
        Self::with_q_function(network, config, rng)
    }

    pub fn network(&self) -> &QNetwork {
        &self.q
    }

    pub fn network_mut(&mut self) -> &mut QNetwork {
        &mut self.q
    }

    /// Write parameters and training counters to `path` as JSON.
    pub fn save(&self, path: &Path) -> Result<(), CheckpointError> {
        ModelDocument::capture(self).write(path)
    }

    /// Restore parameters and counters from `path`. Keys absent from the file
    /// keep their current values.
    pub fn load(&mut self, path: &Path) -> Result<(), CheckpointError> {
        ModelDocument::read(path)?.apply_to(self);
        Ok(())
    }
}

impl<Q: QFunction> QAgent<Q> {
    /// Build an agent around any value function and an explicit random source.
    pub fn with_q_function(q: Q, config: QLearningConfig, rng: StdRng) -> Self {
        QAgent {
            q,
            replay_buffer: ReplayBuffer::new(config.replay_capacity),
            epsilon: config.epsilon_start,
            stats: TrainingStats::new(config.win_rate_window),
            step_count: 0,
            config,
            rng,
        }
    }

    /// Epsilon-greedy choice among `legal`. `None` when `legal` is empty.
    pub fn choose_action(
        &mut self,
        state: &StateVector,
        legal: &[usize],
        explore: bool,
    ) -> Option<usize> {
        if legal.is_empty() {
            return None;
        }
        if explore && self.rng.random_range(0.0..1.0) < self.epsilon {
            let idx = self.rng.random_range(0..legal.len());
            return Some(legal[idx]);
        }
        self.greedy_action(state, legal)
    }

    /// Highest-valued legal action; ties go to the earliest entry in `legal`.
    pub fn greedy_action(&self, state: &StateVector, legal: &[usize]) -> Option<usize> {
        let q_values = self.q.evaluate(state);
        let mut best: Option<(usize, f64)> = None;
        for &action in legal {
            let value = q_values[action];
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((action, value)),
            }
        }
        best.map(|(action, _)| action)
    }

    /// Store a transition for later replay.
    pub fn remember(&mut self, experience: Experience) {
        self.replay_buffer.push(experience);
    }

    /// `r` for terminal transitions, else `r + gamma * max_a Q(s', a)`.
    pub fn td_target(&self, experience: &Experience) -> f64 {
        if experience.done {
            return experience.reward;
        }
        let next_q = self.q.evaluate(&experience.next_state);
        let max_next = next_q.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        experience.reward + self.config.gamma * max_next
    }

    /// One replay round: sample a mini-batch and regress each taken action
    /// towards its TD target. Returns the batch's mean squared TD error, or
    /// `None` when the buffer is smaller than the batch.
    pub fn train_step(&mut self) -> Option<f64> {
        let batch = self
            .replay_buffer
            .sample(self.config.batch_size, &mut self.rng);
        if batch.is_empty() {
            return None;
        }

        let mut squared_error = 0.0;
        for experience in &batch {
            let current = self.q.evaluate(&experience.state);
            let target_value = self.td_target(experience);
            let error = target_value - current[experience.action];
            squared_error += error * error;

            let mut target = current;
            target[experience.action] = target_value;
            self.q.update(&experience.state, &target);
        }

        self.step_count += 1;
        Some(squared_error / batch.len() as f64)
    }

    /// Per-episode bookkeeping: counters, win-rate sampling, epsilon decay.
    /// Returns a new win-rate sample when one was appended.
    pub fn finish_episode(&mut self, outcome: GameOutcome) -> Option<f64> {
        let sample = self.stats.record(outcome);
        self.decay_epsilon();
        sample
    }

    /// `epsilon = max(epsilon_min, epsilon * epsilon_decay)`.
    pub fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Set epsilon directly (e.g. 0.0 for pure greedy inference).
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    pub fn q_function(&self) -> &Q {
        &self.q
    }

    pub fn replay_buffer(&self) -> &ReplayBuffer {
        &self.replay_buffer
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut TrainingStats {
        &mut self.stats
    }

    /// Number of completed replay rounds.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn episode_count(&self) -> usize {
        self.stats.total_games()
    }
}

impl<Q: QFunction> Agent for QAgent<Q> {
    fn select_action(&mut self, state: &GameState, training: bool) -> Option<usize> {
        let legal = state.legal_actions();
        self.choose_action(&state.to_vector(), &legal, training)
    }

    fn name(&self) -> &str {
        "Q-learning"
    }
}
