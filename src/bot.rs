use crate::action::{GameMove, PlayerId};
use crate::state::RedactedGameState;

/// Interface for decision-making agents.
///
/// Implementations must return one of `state.legal_moves(player)`. The turn
/// loop does not correct other choices; an illegal move aborts the game.
pub trait Bot {
    fn select_move(&mut self, state: &RedactedGameState, player: PlayerId) -> GameMove;
}
