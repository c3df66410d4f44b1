use crate::action::{GameMove, PlayerId};
use crate::bot::Bot;
use crate::card::{CardValue, ROWS};
use crate::field::{RedactedCell, RedactedField};
use crate::state::RedactedGameState;

/// Average card value of the standard deck, rounded.
const EXPECTED_HIDDEN: i32 = 5;
/// A drawn card is unknown when the target is chosen, so drawing carries a cost.
const DRAW_RISK: i32 = 150;
/// Estimated sum at or below which declaring the end is worth the risk.
const END_THRESHOLD: i32 = 10;

/// Rule-based bot that plays "sensible" moves without search or learning.
///
/// In plain English:
/// - Take the middle card when it clearly beats the card it replaces, and
///   always when it completes a column.
/// - Draw onto a face-up card when that card is well above average.
/// - Otherwise turn over a hidden card.
/// - Declare the end once everything is face-up, or earlier when few cards are
///   hidden and the estimated sum is low and strictly below every opponent's.
#[derive(Default)]
pub struct HeuristicBot;

impl HeuristicBot {
    pub fn new() -> Self {
        Self
    }

    /// Sum of face-up cards plus the average for every hidden card.
    fn estimate(field: &RedactedField) -> i32 {
        field.revealed_sum() + EXPECTED_HIDDEN * field.unrevealed_count() as i32
    }

    fn cell_estimate(cell: RedactedCell) -> i32 {
        match cell {
            RedactedCell::Revealed(v) => i32::from(v),
            RedactedCell::Unrevealed => EXPECTED_HIDDEN,
            RedactedCell::Gone => 0,
        }
    }

    /// Face-up cards equal to `value` in the column, not counting `row`.
    fn column_matches(field: &RedactedField, column: usize, row: usize, value: CardValue) -> usize {
        (0..ROWS)
            .filter(|other| *other != row)
            .filter(|other| field.cell(column, *other) == Some(RedactedCell::Revealed(value)))
            .count()
    }

    fn score_end(state: &RedactedGameState, player: PlayerId, field: &RedactedField) -> i32 {
        if field.unrevealed_count() == 0 {
            return 10_000;
        }
        let own = Self::estimate(field);
        let best_other = state
            .fields
            .iter()
            .enumerate()
            .filter(|(id, _)| *id != player)
            .map(|(_, other)| Self::estimate(other))
            .min()
            .unwrap_or(i32::MAX);
        if field.unrevealed_count() <= 2 && own <= END_THRESHOLD && own < best_other {
            5_000
        } else {
            i32::MIN / 2
        }
    }

    fn score_swap(middle: CardValue, field: &RedactedField, column: usize, row: usize) -> i32 {
        let Some(cell) = field.cell(column, row) else {
            return i32::MIN / 2;
        };
        let gain = Self::cell_estimate(cell) - i32::from(middle);
        let column_bonus = match Self::column_matches(field, column, row, middle) {
            2 => 1_500 + i32::from(middle) * 200,
            1 => 200,
            _ => 0,
        };
        gain * 100 + column_bonus
    }

    fn score_draw(field: &RedactedField, column: usize, row: usize) -> i32 {
        let Some(cell) = field.cell(column, row) else {
            return i32::MIN / 2;
        };
        (Self::cell_estimate(cell) - EXPECTED_HIDDEN) * 100 - DRAW_RISK
    }

    fn score_move(state: &RedactedGameState, player: PlayerId, game_move: &GameMove) -> i32 {
        let Some(field) = state.field(player) else {
            return i32::MIN / 2;
        };
        match *game_move {
            GameMove::End => Self::score_end(state, player, field),
            GameMove::SwapMiddle { column, row } => {
                Self::score_swap(state.middle_card, field, column, row)
            }
            GameMove::DrawTo { column, row } => Self::score_draw(field, column, row),
            GameMove::Reveal { .. } => 100,
        }
    }
}

impl Bot for HeuristicBot {
    fn select_move(&mut self, state: &RedactedGameState, player: PlayerId) -> GameMove {
        let mut best: Option<(i32, GameMove)> = None;
        for game_move in state.legal_moves(player) {
            let score = Self::score_move(state, player, &game_move);
            if best.map(|(top, _)| score > top).unwrap_or(true) {
                best = Some((score, game_move));
            }
        }
        best.map(|(_, game_move)| game_move)
            .unwrap_or(GameMove::End)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::COLUMNS;
    use crate::field::{CellState, Field};
    use crate::state::GameState;
    use CellState::{Revealed, Unrevealed};

    fn view_with(middle: CardValue, own: [[CellState; ROWS]; COLUMNS]) -> RedactedGameState {
        let other = Field::from_columns([[Unrevealed(6); ROWS]; COLUMNS]);
        GameState::from_parts(
            middle,
            vec![1, 2, 3],
            Vec::new(),
            vec![Field::from_columns(own), other],
            None,
        )
        .redacted()
    }

    #[test]
    fn takes_middle_card_that_completes_a_column() {
        let mut own = [[Unrevealed(1); ROWS]; COLUMNS];
        own[2] = [Revealed(4), Unrevealed(9), Revealed(4)];
        let view = view_with(4, own);
        let chosen = HeuristicBot::new().select_move(&view, 0);
        assert_eq!(chosen, GameMove::SwapMiddle { column: 2, row: 1 });
    }

    #[test]
    fn replaces_highest_card_with_low_middle() {
        let mut own = [[Revealed(3); ROWS]; COLUMNS];
        own[0] = [Revealed(3), Revealed(11), Revealed(2)];
        own[3] = [Revealed(7), Revealed(12), Unrevealed(0)];
        let view = view_with(-2, own);
        let chosen = HeuristicBot::new().select_move(&view, 0);
        assert_eq!(chosen, GameMove::SwapMiddle { column: 3, row: 1 });
    }

    #[test]
    fn reveals_when_nothing_is_worth_taking() {
        let own = [[Unrevealed(1); ROWS]; COLUMNS];
        let view = view_with(9, own);
        let chosen = HeuristicBot::new().select_move(&view, 0);
        assert!(matches!(chosen, GameMove::Reveal { .. }));
    }

    #[test]
    fn ends_once_everything_is_revealed() {
        let own = [[Revealed(8), Revealed(1), Revealed(2)]; COLUMNS];
        let view = view_with(12, own);
        assert_eq!(HeuristicBot::new().select_move(&view, 0), GameMove::End);
    }
}
