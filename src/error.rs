use thiserror::Error;

use crate::action::PlayerId;

/// Errors that can occur when manipulating the game state.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("player index {0} is out of range")]
    InvalidPlayer(PlayerId),
    #[error("not the specified player's turn")]
    NotPlayersTurn,
    #[error("invalid move: {0}")]
    InvalidMove(#[from] InvalidMove),
    #[error("game is already over")]
    GameOver,
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("draw pile and discard pile are both empty")]
    DeckExhausted,
    #[error("turn limit of {0} reached before the round ended")]
    TurnLimit(usize),
}

/// Details of moves that do not match the addressed cell or the round state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidMove {
    #[error("cell ({column}, {row}) is outside the field")]
    OutOfBounds { column: usize, row: usize },
    #[error("cell ({column}, {row}) has been cleared")]
    CellGone { column: usize, row: usize },
    #[error("cell ({column}, {row}) is already revealed")]
    AlreadyRevealed { column: usize, row: usize },
    #[error("player {0} has already ended the round")]
    PlayerFinished(PlayerId),
    #[error("player {0} already declared the end of the round")]
    EndAlreadyDeclared(PlayerId),
}
