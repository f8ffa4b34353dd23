use super::board::{to_coords, PlaceError, CELLS};
use super::{Board, Cell, Player};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Winner(Player),
    Draw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    OutOfBounds,
    Occupied,
    GameOver,
}

/// A single tic-tac-toe game, reset in place between episodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameState {
    board: Board,
    current_player: Player,
    outcome: Option<GameOutcome>,
    move_count: usize,
}

impl GameState {
    /// Create initial game state
    pub fn initial() -> Self {
        GameState {
            board: Board::new(),
            current_player: Player::X, // X starts
            outcome: None,
            move_count: 0,
        }
    }

    /// Return to the empty board with X to move.
    pub fn reset(&mut self) {
        self.board.clear();
        self.current_player = Player::X;
        self.outcome = None;
        self.move_count = 0;
    }

    /// Get current player
    pub fn current_player(&self) -> Player {
        self.current_player
    }

    /// Get reference to board
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Get game outcome if game is over
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Check if game is over
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    /// Raw absolute marks, row-major: X = +1, O = -1, empty = 0.
    pub fn to_vector(&self) -> [f64; CELLS] {
        self.board.to_vector()
    }

    /// Empty cells as action indices; empty once the game is over.
    pub fn legal_actions(&self) -> Vec<usize> {
        if self.is_over() {
            return Vec::new();
        }
        (0..CELLS).filter(|&a| self.board.is_empty_at(a)).collect()
    }

    /// Place the current player's mark. On error nothing is mutated.
    pub fn apply_move(&mut self, row: usize, col: usize) -> Result<(), MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }

        self.board
            .place(row, col, self.current_player.to_cell())
            .map_err(|e| match e {
                PlaceError::OutOfBounds => MoveError::OutOfBounds,
                PlaceError::Occupied => MoveError::Occupied,
            })?;
        self.move_count += 1;

        self.outcome = match self.board.winning_mark() {
            Some(Cell::X) => Some(GameOutcome::Winner(Player::X)),
            Some(Cell::O) => Some(GameOutcome::Winner(Player::O)),
            _ if self.board.is_full() => Some(GameOutcome::Draw),
            _ => None,
        };

        self.current_player = self.current_player.other();
        Ok(())
    }

    /// Apply a flattened action index (`row * 3 + col`).
    pub fn apply_action(&mut self, action: usize) -> Result<(), MoveError> {
        if action >= CELLS {
            return Err(MoveError::OutOfBounds);
        }
        let (row, col) = to_coords(action);
        self.apply_move(row, col)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(actions: &[usize]) -> GameState {
        let mut state = GameState::initial();
        for &a in actions {
            state.apply_action(a).unwrap();
        }
        state
    }

    #[test]
    fn test_initial_state() {
        let state = GameState::initial();
        assert_eq!(state.current_player(), Player::X);
        assert!(!state.is_over());
        assert_eq!(state.move_count(), 0);
        assert_eq!(state.legal_actions().len(), 9);
        assert_eq!(state.to_vector(), [0.0; 9]);
    }

    #[test]
    fn test_apply_move() {
        let mut state = GameState::initial();
        state.apply_move(1, 1).unwrap();

        assert_eq!(state.current_player(), Player::O);
        assert_eq!(state.board().get(1, 1), Cell::X);
        assert_eq!(state.move_count(), 1);
        assert_eq!(state.to_vector()[4], 1.0);
    }

    #[test]
    fn test_occupied_cell_never_mutates() {
        let mut state = play(&[4]);
        let before = state;
        for _ in 0..3 {
            assert_eq!(state.apply_move(1, 1), Err(MoveError::Occupied));
            assert_eq!(state, before);
        }
    }

    #[test]
    fn test_out_of_bounds_never_mutates() {
        let mut state = GameState::initial();
        assert_eq!(state.apply_move(3, 0), Err(MoveError::OutOfBounds));
        assert_eq!(state.apply_move(0, 7), Err(MoveError::OutOfBounds));
        assert_eq!(state.apply_action(9), Err(MoveError::OutOfBounds));
        assert_eq!(state, GameState::initial());
    }

    #[test]
    fn test_win_detection() {
        // X: 0, 1, 2 across the top row; O: 3, 4
        let state = play(&[0, 3, 1, 4, 2]);
        assert!(state.is_over());
        assert_eq!(state.outcome(), Some(GameOutcome::Winner(Player::X)));
        assert!(state.legal_actions().is_empty());
    }

    #[test]
    fn test_column_and_diagonal_wins_for_o() {
        // O takes the middle column
        let state = play(&[0, 1, 2, 4, 8, 7]);
        assert_eq!(state.outcome(), Some(GameOutcome::Winner(Player::O)));

        // O takes the anti-diagonal
        let state = play(&[0, 2, 1, 4, 8, 6]);
        assert_eq!(state.outcome(), Some(GameOutcome::Winner(Player::O)));
    }

    #[test]
    fn test_move_after_game_over_rejected() {
        let mut state = play(&[0, 3, 1, 4, 2]);
        let before = state;
        assert_eq!(state.apply_move(2, 2), Err(MoveError::GameOver));
        assert_eq!(state, before);
    }

    #[test]
    fn test_draw() {
        // X O X / X O O / O X X
        let state = play(&[0, 1, 2, 4, 3, 5, 7, 6, 8]);
        assert!(state.is_over());
        assert_eq!(state.move_count(), 9);
        assert_eq!(state.outcome(), Some(GameOutcome::Draw));
    }

    #[test]
    fn test_win_on_ninth_move_is_not_a_draw() {
        // X O X / O X O / O X X -> X completes the main diagonal on move 9
        let state = play(&[0, 1, 2, 3, 4, 5, 7, 6, 8]);
        assert_eq!(state.outcome(), Some(GameOutcome::Winner(Player::X)));
    }

    #[test]
    fn test_over_exactly_when_line_or_full() {
        // Walk every legal game in a fixed order and check the invariant at each step.
        fn walk(state: GameState) {
            let line = state.board().winning_mark().is_some();
            assert_eq!(state.is_over(), line || state.move_count() == 9);
            for a in state.legal_actions() {
                let mut next = state;
                next.apply_action(a).unwrap();
                walk(next);
            }
        }
        walk(GameState::initial());
    }

    #[test]
    fn test_reset() {
        let mut state = play(&[0, 3, 1, 4, 2]);
        state.reset();
        assert_eq!(state, GameState::initial());
    }
}
