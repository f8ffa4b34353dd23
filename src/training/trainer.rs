use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ai::{QAgent, QNetwork};
use crate::checkpoint::CheckpointManager;
use crate::error::TrainingError;
use crate::game::GameState;
use crate::training::episode::{episode_seed, evaluate, play_self_play_episode};
use crate::training::metrics::TrainingMetrics;

/// Trainer configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub stages: usize,
    pub episodes_per_stage: usize,
    pub log_interval: usize,
    /// Episodes between evaluations against a random opponent; 0 disables.
    pub eval_interval: usize,
    pub eval_games: usize,
    pub checkpoint_dir: PathBuf,
    /// Consecutive illegal picks tolerated before an episode is abandoned.
    pub max_illegal_retries: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            stages: 5,
            episodes_per_stage: 5_000_000,
            log_interval: 100,
            eval_interval: 0,
            eval_games: 100,
            checkpoint_dir: PathBuf::from("checkpoints"),
            max_illegal_retries: 9,
        }
    }
}

/// What a call to [`Trainer::train`] got through.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    /// Episodes played during this run.
    pub episodes: usize,
    pub stages_completed: usize,
    pub interrupted: bool,
    pub final_epsilon: f64,
    pub last_win_rate: Option<f64>,
}

/// Staged self-play trainer.
pub struct Trainer {
    config: TrainerConfig,
    checkpoints: CheckpointManager,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        let checkpoints = CheckpointManager::new(config.checkpoint_dir.clone());
        Trainer {
            config,
            checkpoints,
        }
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    /// Run every stage, writing a stage checkpoint after each one and the
    /// final model at the end. `stop` is polled between episodes; once set,
    /// the final model is written and the run returns early.
    pub fn train(
        &self,
        agent: &mut QAgent<QNetwork>,
        stop: &AtomicBool,
    ) -> Result<TrainingSummary, TrainingError> {
        let mut metrics = TrainingMetrics::with_capacity(self.config.log_interval.max(1));
        let mut game = GameState::initial();
        let mut episodes = 0;
        let mut stages_completed = 0;
        let mut interrupted = false;
        let total = self.config.stages * self.config.episodes_per_stage;
        let eval_seed = agent.config().seed.unwrap_or(0);

        log::info!(
            "starting Q-learning training: {} stages x {} episodes (epsilon {:.3}, {} games so far)",
            self.config.stages,
            self.config.episodes_per_stage,
            agent.epsilon(),
            agent.episode_count()
        );

        'stages: for stage in 0..self.config.stages {
            for _ in 0..self.config.episodes_per_stage {
                if stop.load(Ordering::Relaxed) {
                    interrupted = true;
                    break 'stages;
                }

                let trace =
                    play_self_play_episode(agent, &mut game, self.config.max_illegal_retries)?;
                for loss in &trace.losses {
                    metrics.record_update(*loss);
                }
                metrics.record_episode(trace.result);
                episodes += 1;

                if let Some(rate) = trace.win_rate_sample {
                    log::debug!(
                        "games {}: win rate {:.1}% over last {}",
                        agent.episode_count(),
                        rate * 100.0,
                        agent.stats().window()
                    );
                }

                if self.config.log_interval > 0 && episodes % self.config.log_interval == 0 {
                    let window = self.config.log_interval;
                    log::info!(
                        "episode {}/{} | eps: {:.3} | loss: {:.4} | win_rate({}): {:.1}% | draw: {:.1}% | avg_len: {:.1}",
                        episodes,
                        total,
                        agent.epsilon(),
                        metrics.average_loss(window),
                        window,
                        metrics.win_rate(window) * 100.0,
                        metrics.draw_rate(window) * 100.0,
                        metrics.average_game_length(window),
                    );
                }

                if self.config.eval_interval > 0 && episodes % self.config.eval_interval == 0 {
                    let win_rate = evaluate(
                        agent,
                        self.config.eval_games,
                        episode_seed(eval_seed, episodes),
                    );
                    log::info!(
                        "eval vs random ({} games): {:.1}% win rate",
                        self.config.eval_games,
                        win_rate * 100.0
                    );
                }
            }

            stages_completed += 1;
            if let Err(e) = self.checkpoints.save_stage(agent, stage) {
                log::warn!("stage {stage} checkpoint failed: {e}");
            }
        }

        if interrupted {
            log::info!("stop requested after {episodes} episodes");
        }
        self.checkpoints.save_final(agent)?;

        Ok(TrainingSummary {
            episodes,
            stages_completed,
            interrupted,
            final_epsilon: agent.epsilon(),
            last_win_rate: agent.stats().last_win_rate(),
        })
    }
}
