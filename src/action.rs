use serde::{Deserialize, Serialize};

use crate::card::{COLUMNS, ROWS};

/// Zero-based index of a player within the game.
pub type PlayerId = usize;

/// Move available to an agent during its turn. Cells are addressed by column then row.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum GameMove {
    /// Turn a face-down card face-up.
    Reveal { column: usize, row: usize },
    /// Put the middle card into the cell; the replaced card becomes the middle card.
    SwapMiddle { column: usize, row: usize },
    /// Draw from the draw pile into the cell; the replaced card becomes the middle card.
    DrawTo { column: usize, row: usize },
    /// Declare the end of the round.
    End,
}

impl GameMove {
    /// Returns the addressed cell, if the move targets one.
    pub fn cell(&self) -> Option<(usize, usize)> {
        match *self {
            GameMove::Reveal { column, row }
            | GameMove::SwapMiddle { column, row }
            | GameMove::DrawTo { column, row } => Some((column, row)),
            GameMove::End => None,
        }
    }

    /// Validates whether the addressed cell lies within the field.
    pub fn cell_in_range(&self) -> bool {
        self.cell()
            .map(|(column, row)| column < COLUMNS && row < ROWS)
            .unwrap_or(true)
    }
}

/// What a legality check can see of a cell, with the card value erased.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Occupancy {
    Gone,
    FaceUp,
    FaceDown,
}

/// Legal moves for `player` given the round's end marker and the player's own
/// cells in column-major order. Both the full and the redacted state call this,
/// so they agree for any input with the same occupancy.
pub(crate) fn legal_moves_for<I>(
    ends_at: Option<PlayerId>,
    player: PlayerId,
    cells: I,
) -> Vec<GameMove>
where
    I: IntoIterator<Item = (usize, usize, Occupancy)>,
{
    if ends_at == Some(player) {
        return Vec::new();
    }
    let mut moves = Vec::new();
    if ends_at.is_none() {
        moves.push(GameMove::End);
    }
    for (column, row, occupancy) in cells {
        match occupancy {
            Occupancy::Gone => {}
            Occupancy::FaceUp => {
                moves.push(GameMove::DrawTo { column, row });
                moves.push(GameMove::SwapMiddle { column, row });
            }
            Occupancy::FaceDown => {
                moves.push(GameMove::DrawTo { column, row });
                moves.push(GameMove::SwapMiddle { column, row });
                moves.push(GameMove::Reveal { column, row });
            }
        }
    }
    moves
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_player_has_no_moves() {
        let cells = vec![(0, 0, Occupancy::FaceDown)];
        assert!(legal_moves_for(Some(2), 2, cells).is_empty());
    }

    #[test]
    fn end_only_offered_before_declaration() {
        let open = legal_moves_for(None, 0, Vec::new());
        assert_eq!(open, vec![GameMove::End]);
        let closing = legal_moves_for(Some(1), 0, Vec::new());
        assert!(closing.is_empty());
    }

    #[test]
    fn reveal_only_offered_for_face_down_cells() {
        let cells = vec![
            (0, 0, Occupancy::Gone),
            (0, 1, Occupancy::FaceUp),
            (0, 2, Occupancy::FaceDown),
        ];
        let moves = legal_moves_for(Some(3), 0, cells);
        assert_eq!(moves.len(), 5);
        assert!(!moves.iter().any(|m| m.cell() == Some((0, 0))));
        assert!(!moves.contains(&GameMove::Reveal { column: 0, row: 1 }));
        assert!(moves.contains(&GameMove::Reveal { column: 0, row: 2 }));
    }

    #[test]
    fn cell_range_check() {
        assert!(GameMove::End.cell_in_range());
        assert!(GameMove::DrawTo { column: 3, row: 2 }.cell_in_range());
        assert!(!GameMove::Reveal { column: 4, row: 0 }.cell_in_range());
    }
}
