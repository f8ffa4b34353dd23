use crate::ai::{Agent, Experience, QAgent, QFunction, RandomAgent};
use crate::error::TrainingError;
use crate::game::{GameOutcome, GameState, Player};
use crate::training::metrics::EpisodeResult;

pub const WIN_REWARD: f64 = 1.0;
pub const LOSS_REWARD: f64 = -1.0;
pub const DRAW_REWARD: f64 = 0.1;

/// Result of playing a single self-play episode.
#[derive(Debug, Clone)]
pub struct EpisodeTrace {
    pub result: EpisodeResult,
    /// Mean squared TD error of every replay round that ran this episode.
    pub losses: Vec<f64>,
    /// New win-rate sample, when this episode closed a window.
    pub win_rate_sample: Option<f64>,
}

/// Reward after a move, always scored for X: the same side the win-rate
/// statistics count as the agent.
pub fn reward_for(outcome: Option<GameOutcome>) -> f64 {
    match outcome {
        None => 0.0,
        Some(GameOutcome::Draw) => DRAW_REWARD,
        Some(GameOutcome::Winner(Player::X)) => WIN_REWARD,
        Some(GameOutcome::Winner(Player::O)) => LOSS_REWARD,
    }
}

/// Play one self-play episode on `game`. The agent plays both sides, stores
/// every transition and runs one replay round after each move.
///
/// An illegal pick skips the step without touching the board; more than
/// `max_illegal_retries` consecutive skips is an error.
pub fn play_self_play_episode<Q: QFunction>(
    agent: &mut QAgent<Q>,
    game: &mut GameState,
    max_illegal_retries: usize,
) -> Result<EpisodeTrace, TrainingError> {
    game.reset();
    let mut losses = Vec::new();
    let mut illegal_streak = 0;

    while !game.is_over() {
        let state = game.to_vector();
        let legal = game.legal_actions();
        let Some(action) = agent.choose_action(&state, &legal, true) else {
            break;
        };

        if game.apply_action(action).is_err() {
            illegal_streak += 1;
            log::debug!("skipping illegal action {action} (legal: {legal:?})");
            if illegal_streak > max_illegal_retries {
                return Err(TrainingError::IllegalAction { action, legal });
            }
            continue;
        }
        illegal_streak = 0;

        agent.remember(Experience {
            state,
            action,
            reward: reward_for(game.outcome()),
            next_state: game.to_vector(),
            done: game.is_over(),
        });
        if let Some(loss) = agent.train_step() {
            losses.push(loss);
        }
    }

    // A loop exit without an outcome means no legal action on a live board,
    // which the board invariants rule out; score it as a draw.
    let outcome = game.outcome().unwrap_or(GameOutcome::Draw);
    let win_rate_sample = agent.finish_episode(outcome);

    Ok(EpisodeTrace {
        result: EpisodeResult {
            outcome,
            game_length: game.move_count(),
        },
        losses,
        win_rate_sample,
    })
}

/// Play a single evaluation game between two agents.
/// Returns Some(true) if agent won, Some(false) if agent lost, None if draw.
pub fn play_eval_game(
    agent: &mut dyn Agent,
    opponent: &mut dyn Agent,
    agent_plays_x: bool,
) -> Option<bool> {
    let mut state = GameState::initial();

    while !state.is_over() {
        let is_agent_turn = (state.current_player() == Player::X) == agent_plays_x;
        let action = if is_agent_turn {
            agent.select_action(&state, false)
        } else {
            opponent.select_action(&state, false)
        };
        let Some(action) = action else { break };
        if state.apply_action(action).is_err() {
            log::warn!(
                "illegal move {action} by {} during eval, ending game",
                state.current_player().name()
            );
            break;
        }
    }

    match state.outcome() {
        Some(GameOutcome::Winner(winner)) => Some((winner == Player::X) == agent_plays_x),
        _ => None,
    }
}

/// Greedy win rate against a random opponent over `eval_games`, alternating
/// who moves first. Epsilon is restored afterwards.
pub fn evaluate<Q: QFunction>(agent: &mut QAgent<Q>, eval_games: usize, base_seed: u64) -> f64 {
    if eval_games == 0 {
        return 0.0;
    }
    let saved_epsilon = agent.epsilon();
    agent.set_epsilon(0.0);

    let mut wins = 0;
    for game_idx in 0..eval_games {
        let mut random = RandomAgent::with_seed(episode_seed(base_seed, game_idx));
        if let Some(true) = play_eval_game(&mut *agent, &mut random, game_idx % 2 == 0) {
            wins += 1;
        }
    }

    agent.set_epsilon(saved_epsilon);
    wins as f64 / eval_games as f64
}

/// Outcome counts of greedy self-play games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelfPlayReport {
    pub x_wins: usize,
    pub o_wins: usize,
    pub draws: usize,
}

impl SelfPlayReport {
    pub fn games(&self) -> usize {
        self.x_wins + self.o_wins + self.draws
    }
}

/// Let the agent play itself greedily without learning.
pub fn self_play_report<Q: QFunction>(agent: &mut QAgent<Q>, games: usize) -> SelfPlayReport {
    let saved_epsilon = agent.epsilon();
    agent.set_epsilon(0.0);

    let mut report = SelfPlayReport::default();
    let mut game = GameState::initial();
    for _ in 0..games {
        game.reset();
        while let Some(action) = agent.select_action(&game, false) {
            if game.apply_action(action).is_err() {
                break;
            }
        }
        match game.outcome() {
            Some(GameOutcome::Winner(Player::X)) => report.x_wins += 1,
            Some(GameOutcome::Winner(Player::O)) => report.o_wins += 1,
            _ => report.draws += 1,
        }
    }

    agent.set_epsilon(saved_epsilon);
    report
}

/// Derive a deterministic seed for a given game index.
pub fn episode_seed(base_seed: u64, episode_index: usize) -> u64 {
    // FNV-1a style mixing
    let mut hash = base_seed ^ 0x517cc1b727220a95;
    let index = episode_index as u64;
    hash = hash.wrapping_mul(0x100000001b3);
    hash ^= index;
    hash = hash.wrapping_mul(0x100000001b3);
    hash ^= index >> 32;
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ActionValues, QLearningConfig, StateVector};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Always prefers the lowest free index.
    struct ScanOrderQ;

    impl QFunction for ScanOrderQ {
        fn evaluate(&self, _state: &StateVector) -> ActionValues {
            [0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.2, 0.1]
        }

        fn update(&mut self, _state: &StateVector, _target: &ActionValues) {}
    }

    fn greedy_scan_agent(config: QLearningConfig) -> QAgent<ScanOrderQ> {
        let mut agent = QAgent::with_q_function(ScanOrderQ, config, StdRng::seed_from_u64(0));
        agent.set_epsilon(0.0);
        agent
    }

    fn seeded_agent(seed: u64) -> QAgent {
        QAgent::new(QLearningConfig {
            seed: Some(seed),
            batch_size: 4,
            ..Default::default()
        })
    }

    #[test]
    fn test_reward_for() {
        assert_eq!(reward_for(None), 0.0);
        assert_eq!(reward_for(Some(GameOutcome::Winner(Player::X))), 1.0);
        assert_eq!(reward_for(Some(GameOutcome::Winner(Player::O))), -1.0);
        assert_eq!(reward_for(Some(GameOutcome::Draw)), 0.1);
    }

    #[test]
    fn test_full_board_draw_reward() {
        let mut state = GameState::initial();
        for a in [0, 1, 2, 4, 3, 5, 7, 6, 8] {
            state.apply_action(a).unwrap();
        }
        assert_eq!(state.move_count(), 9);
        assert_eq!(state.outcome(), Some(GameOutcome::Draw));
        assert!((reward_for(state.outcome()) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_scan_order_episode_records_every_move() {
        // Greedy scan order: X 0, O 1, X 2, O 3, X 4, O 5, X 6 wins on 2-4-6.
        let mut agent = greedy_scan_agent(QLearningConfig {
            batch_size: 1_000,
            ..Default::default()
        });
        let mut game = GameState::initial();
        let trace = play_self_play_episode(&mut agent, &mut game, 9).unwrap();

        assert_eq!(trace.result.outcome, GameOutcome::Winner(Player::X));
        assert_eq!(trace.result.game_length, 7);
        assert!(trace.losses.is_empty());

        let stored: Vec<&Experience> = agent.replay_buffer().iter().collect();
        assert_eq!(stored.len(), 7);
        assert_eq!(
            stored.iter().map(|e| e.action).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4, 5, 6]
        );
        assert!(stored[..6].iter().all(|e| e.reward == 0.0 && !e.done));
        assert_eq!(stored[6].reward, 1.0);
        assert!(stored[6].done);
        assert_eq!(stored[0].state, [0.0; 9]);
        assert_eq!(stored[0].next_state[0], 1.0);
        assert_eq!(stored[1].next_state[1], -1.0);
        assert_eq!(agent.episode_count(), 1);
    }

    /// Greedy order 0, 3, 1, 4, 8, 5: O completes the middle row.
    struct OWinsQ;

    impl QFunction for OWinsQ {
        fn evaluate(&self, _state: &StateVector) -> ActionValues {
            [0.9, 0.7, 0.1, 0.8, 0.6, 0.4, 0.2, 0.3, 0.5]
        }

        fn update(&mut self, _state: &StateVector, _target: &ActionValues) {}
    }

    #[test]
    fn test_o_win_is_scored_as_loss() {
        let mut agent = QAgent::with_q_function(
            OWinsQ,
            QLearningConfig {
                batch_size: 1_000,
                ..Default::default()
            },
            StdRng::seed_from_u64(0),
        );
        agent.set_epsilon(0.0);
        let mut game = GameState::initial();
        let trace = play_self_play_episode(&mut agent, &mut game, 9).unwrap();

        assert_eq!(trace.result.outcome, GameOutcome::Winner(Player::O));
        assert_eq!(trace.result.game_length, 6);
        let stored: Vec<&Experience> = agent.replay_buffer().iter().collect();
        assert_eq!(
            stored.iter().map(|e| e.action).collect::<Vec<_>>(),
            vec![0, 3, 1, 4, 8, 5]
        );
        let last = stored[5];
        assert!(last.done);
        assert_eq!(last.reward, -1.0);
        assert!(stored[..5].iter().all(|e| e.reward == 0.0));
    }

    #[test]
    fn test_random_self_play_emits_both_terminal_signs() {
        let mut agent = seeded_agent(1);
        let mut game = GameState::initial();
        let mut o_wins = 0;
        for _ in 0..300 {
            agent.set_epsilon(1.0);
            let trace = play_self_play_episode(&mut agent, &mut game, 9).unwrap();
            if trace.result.outcome == GameOutcome::Winner(Player::O) {
                o_wins += 1;
            }
        }
        let terminal: Vec<f64> = agent
            .replay_buffer()
            .iter()
            .filter(|e| e.done)
            .map(|e| e.reward)
            .collect();
        assert!(o_wins > 0);
        assert_eq!(
            terminal.iter().filter(|&&r| r == -1.0).count(),
            o_wins,
            "every O win stores a -1 terminal reward"
        );
        assert!(terminal.contains(&1.0));
    }

    #[test]
    fn test_episode_trains_once_buffer_fills() {
        let mut agent = greedy_scan_agent(QLearningConfig {
            batch_size: 3,
            ..Default::default()
        });
        let mut game = GameState::initial();
        let trace = play_self_play_episode(&mut agent, &mut game, 9).unwrap();
        // Training starts on the third stored move.
        assert_eq!(trace.losses.len(), 5);
        assert_eq!(agent.step_count(), 5);
    }

    #[test]
    fn test_episode_decays_epsilon_once() {
        let mut agent = seeded_agent(3);
        let mut game = GameState::initial();
        play_self_play_episode(&mut agent, &mut game, 9).unwrap();
        assert!((agent.epsilon() - 0.995).abs() < 1e-12);
        play_self_play_episode(&mut agent, &mut game, 9).unwrap();
        assert!((agent.epsilon() - 0.995 * 0.995).abs() < 1e-12);
    }

    #[test]
    fn test_self_play_episodes_terminate() {
        let mut agent = seeded_agent(5);
        let mut game = GameState::initial();
        for _ in 0..50 {
            let trace = play_self_play_episode(&mut agent, &mut game, 9).unwrap();
            assert!(game.is_over());
            assert!((5..=9).contains(&trace.result.game_length));
        }
        assert_eq!(agent.episode_count(), 50);
    }

    #[test]
    fn test_play_eval_game_scan_agents() {
        let mut agent = greedy_scan_agent(QLearningConfig::default());
        let mut opponent = greedy_scan_agent(QLearningConfig::default());
        // Scan-order play always ends with X on the 2-4-6 diagonal.
        assert_eq!(play_eval_game(&mut agent, &mut opponent, true), Some(true));
        assert_eq!(play_eval_game(&mut agent, &mut opponent, false), Some(false));
    }

    #[test]
    fn test_evaluate_restores_epsilon() {
        let mut agent = seeded_agent(7);
        agent.set_epsilon(0.4);
        let win_rate = evaluate(&mut agent, 20, 99);
        assert!((0.0..=1.0).contains(&win_rate));
        assert_eq!(agent.epsilon(), 0.4);
        assert_eq!(evaluate(&mut agent, 0, 99), 0.0);
    }

    #[test]
    fn test_self_play_report_counts_every_game() {
        let mut agent = greedy_scan_agent(QLearningConfig::default());
        let report = self_play_report(&mut agent, 10);
        assert_eq!(report.games(), 10);
        assert_eq!(report.x_wins, 10);
    }

    #[test]
    fn test_episode_seed_deterministic() {
        assert_eq!(episode_seed(42, 100), episode_seed(42, 100));
        assert_ne!(episode_seed(42, 0), episode_seed(42, 1));
        assert_ne!(episode_seed(1, 0), episode_seed(2, 0));
    }
}
