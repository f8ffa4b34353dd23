//! Core tic-tac-toe logic: board representation, player types, and a game
//! state machine mutated in place.

mod board;
mod player;
mod state;

pub use board::{to_action, to_coords, Board, Cell, CELLS, SIZE};
pub use player::Player;
pub use state::{GameOutcome, GameState, MoveError};
