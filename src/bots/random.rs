use rand::Rng;
use rand::seq::SliceRandom;

use crate::action::{GameMove, PlayerId};
use crate::bot::Bot;
use crate::state::RedactedGameState;

/// Baseline bot that samples uniformly from the legal move set.
pub struct RandomBot<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomBot<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Bot for RandomBot<R> {
    fn select_move(&mut self, state: &RedactedGameState, player: PlayerId) -> GameMove {
        state
            .legal_moves(player)
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(GameMove::End)
    }
}
