use std::collections::VecDeque;

use crate::action::{GameMove, PlayerId};
use crate::bot::Bot;
use crate::card::{COLUMNS, ROWS};
use crate::state::RedactedGameState;

/// Plays a fixed list of moves in order.
///
/// Scripted moves that are no longer legal when their turn comes are dropped.
/// Once the script runs out the bot plays the first legal move.
pub struct ScriptedBot {
    script: VecDeque<GameMove>,
}

impl ScriptedBot {
    pub fn new(script: impl IntoIterator<Item = GameMove>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// Reveals every cell column by column, then declares the end.
    pub fn reveal_then_end() -> Self {
        let reveals = (0..COLUMNS)
            .flat_map(|column| (0..ROWS).map(move |row| GameMove::Reveal { column, row }));
        Self::new(reveals.chain(std::iter::once(GameMove::End)))
    }

    /// Declares the end on its first turn.
    pub fn end_immediately() -> Self {
        Self::new([GameMove::End])
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Bot for ScriptedBot {
    fn select_move(&mut self, state: &RedactedGameState, player: PlayerId) -> GameMove {
        let legal = state.legal_moves(player);
        while let Some(next) = self.script.pop_front() {
            if legal.contains(&next) {
                return next;
            }
        }
        legal.first().copied().unwrap_or(GameMove::End)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameBuilder;

    #[test]
    fn skips_illegal_script_entries() {
        let game = GameBuilder::new(2).expect("builder").build().expect("game");
        let view = game.redacted_view();
        let mut bot = ScriptedBot::new([
            GameMove::Reveal { column: 9, row: 0 },
            GameMove::DrawTo { column: 1, row: 1 },
        ]);
        assert_eq!(bot.select_move(&view, 0), GameMove::DrawTo { column: 1, row: 1 });
        assert_eq!(bot.remaining(), 0);
        assert_eq!(bot.select_move(&view, 0), GameMove::End);
    }

    #[test]
    fn reveal_script_covers_every_cell() {
        let bot = ScriptedBot::reveal_then_end();
        assert_eq!(bot.remaining(), COLUMNS * ROWS + 1);
    }
}
