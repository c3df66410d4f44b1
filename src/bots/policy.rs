use burn::tensor::backend::Backend;

use crate::action::{GameMove, PlayerId};
use crate::bot::Bot;
use crate::ml::{ActionSpace, PolicyNetwork};
use crate::state::RedactedGameState;

/// Policy-driven bot backed by a Burn neural network.
pub struct PolicyBot<B: Backend> {
    policy: PolicyNetwork<B>,
}

impl<B: Backend> PolicyBot<B> {
    pub fn new(policy: PolicyNetwork<B>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PolicyNetwork<B> {
        &self.policy
    }
}

impl<B> Bot for PolicyBot<B>
where
    B: Backend,
    B::Device: Default,
{
    fn select_move(&mut self, state: &RedactedGameState, player: PlayerId) -> GameMove {
        let legal = state.legal_moves(player);
        let logits: Vec<f32> = self
            .policy
            .forward_state(state, player)
            .into_data()
            .to_vec::<f32>()
            .unwrap_or_default();
        let mut best: Option<(f32, GameMove)> = None;
        for game_move in &legal {
            let Some(value) = ActionSpace::action_index(game_move).and_then(|i| logits.get(i))
            else {
                continue;
            };
            if best.map(|(top, _)| *value > top).unwrap_or(true) {
                best = Some((*value, *game_move));
            }
        }
        best.map(|(_, game_move)| game_move)
            .or_else(|| legal.first().copied())
            .unwrap_or(GameMove::End)
    }
}
