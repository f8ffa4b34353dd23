use std::collections::VecDeque;

use crate::game::{GameOutcome, Player};

/// Result of a single episode.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeResult {
    pub outcome: GameOutcome,
    pub game_length: usize,
}

/// Long-lived training counters persisted alongside the network.
///
/// A "win" is an X win: in self-play X is the side that moves first.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingStats {
    total_games: usize,
    window: usize,
    wins_in_window: usize,
    recent_win_rates: Vec<f64>,
}

impl TrainingStats {
    pub fn new(window: usize) -> Self {
        TrainingStats {
            total_games: 0,
            window: window.max(1),
            wins_in_window: 0,
            recent_win_rates: Vec::new(),
        }
    }

    /// Count one finished episode. Returns the new win-rate sample when the
    /// episode closes a window.
    pub fn record(&mut self, outcome: GameOutcome) -> Option<f64> {
        self.total_games += 1;
        if outcome == GameOutcome::Winner(Player::X) {
            self.wins_in_window += 1;
        }

        if self.total_games % self.window != 0 {
            return None;
        }
        let rate = self.wins_in_window as f64 / self.window as f64;
        self.recent_win_rates.push(rate);
        self.wins_in_window = 0;
        Some(rate)
    }

    pub fn total_games(&self) -> usize {
        self.total_games
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn wins_in_window(&self) -> usize {
        self.wins_in_window
    }

    pub fn recent_win_rates(&self) -> &[f64] {
        &self.recent_win_rates
    }

    pub fn last_win_rate(&self) -> Option<f64> {
        self.recent_win_rates.last().copied()
    }

    /// Replace the persisted counters. The in-progress window starts over.
    ///
    /// Samples stay aligned to multiples of the window, so when `total_games`
    /// is not a multiple the first sample after a restore covers fewer games
    /// but is still divided by the full window.
    pub fn restore(&mut self, total_games: Option<usize>, recent_win_rates: Option<Vec<f64>>) {
        if let Some(total) = total_games {
            self.total_games = total;
        }
        if let Some(rates) = recent_win_rates {
            self.recent_win_rates = rates;
        }
        self.wins_in_window = 0;
    }
}

/// Rolling window over recent episodes and TD losses, used for log lines.
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    update_losses: VecDeque<f64>,
    capacity: usize,
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            update_losses: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    pub fn record_update(&mut self, loss: f64) {
        self.update_losses.push_back(loss);
        if self.update_losses.len() > self.capacity {
            self.update_losses.pop_front();
        }
    }

    fn rate_of(&self, last_n: usize, pred: impl Fn(&EpisodeResult) -> bool) -> f64 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let hits = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .filter(|r| pred(r))
            .count();
        hits as f64 / n as f64
    }

    /// X win rate in the last N episodes.
    pub fn win_rate(&self, last_n: usize) -> f64 {
        self.rate_of(last_n, |r| r.outcome == GameOutcome::Winner(Player::X))
    }

    /// Draw rate in the last N episodes.
    pub fn draw_rate(&self, last_n: usize) -> f64 {
        self.rate_of(last_n, |r| r.outcome == GameOutcome::Draw)
    }

    /// Average loss over the last N updates.
    pub fn average_loss(&self, last_n: usize) -> f64 {
        let n = self.update_losses.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f64 = self.update_losses.iter().rev().take(n).sum();
        sum / n as f64
    }

    /// Average game length over the last N episodes.
    pub fn average_game_length(&self, last_n: usize) -> f64 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .map(|r| r.game_length)
            .sum();
        total as f64 / n as f64
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}
