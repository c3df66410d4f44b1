//! A player's 4×3 grid of cards and the column-clear rule.
//!
//! Fields are small `Copy` values. Every operation returns a new field and
//! leaves the receiver untouched, so a state and the views derived from it can
//! never alias.

use serde::{Deserialize, Serialize};

use crate::action::Occupancy;
use crate::card::{COLUMNS, CardValue, FIELD_CELLS, ROWS};
use crate::error::InvalidMove;

/// True state of one grid position.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Cleared as part of a matched column.
    Gone,
    /// Face-up, value known to everyone.
    Revealed(CardValue),
    /// Face-down, value known only to the engine.
    Unrevealed(CardValue),
}

impl CellState {
    /// The card held by the cell regardless of visibility.
    #[inline]
    pub fn value(self) -> Option<CardValue> {
        match self {
            CellState::Gone => None,
            CellState::Revealed(v) | CellState::Unrevealed(v) => Some(v),
        }
    }

    /// Contribution to the field sum. Hidden cards count at their true value.
    #[inline]
    pub fn estimated_value(self) -> i32 {
        self.value().map(i32::from).unwrap_or(0)
    }

    #[inline]
    pub fn redacted(self) -> RedactedCell {
        match self {
            CellState::Gone => RedactedCell::Gone,
            CellState::Revealed(v) => RedactedCell::Revealed(v),
            CellState::Unrevealed(_) => RedactedCell::Unrevealed,
        }
    }

    #[inline]
    pub fn occupancy(self) -> Occupancy {
        self.redacted().occupancy()
    }
}

/// What an agent may know about a cell.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RedactedCell {
    Gone,
    Revealed(CardValue),
    Unrevealed,
}

impl RedactedCell {
    #[inline]
    pub fn revealed_value(self) -> Option<CardValue> {
        match self {
            RedactedCell::Revealed(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn occupancy(self) -> Occupancy {
        match self {
            RedactedCell::Gone => Occupancy::Gone,
            RedactedCell::Revealed(_) => Occupancy::FaceUp,
            RedactedCell::Unrevealed => Occupancy::FaceDown,
        }
    }
}

/// Result of a field operation: the new field plus the cards it gave up.
///
/// For a swap the first released card is the one replaced; cleared column
/// cards follow. The last released card is the next middle card.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldUpdate {
    pub field: Field,
    pub released: Vec<CardValue>,
    pub cleared_column: bool,
}

impl FieldUpdate {
    /// Splits the released cards into the next middle card and the cards bound
    /// for the discard pile.
    pub fn split_middle(&self) -> Option<(CardValue, &[CardValue])> {
        self.released
            .split_last()
            .map(|(middle, rest)| (*middle, rest))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Field {
    columns: [[CellState; ROWS]; COLUMNS],
}

impl Field {
    /// Lays out freshly dealt cards face-down, filling each column top to bottom.
    pub fn dealt(cards: [CardValue; FIELD_CELLS]) -> Self {
        let mut columns = [[CellState::Gone; ROWS]; COLUMNS];
        for (index, value) in cards.into_iter().enumerate() {
            columns[index / ROWS][index % ROWS] = CellState::Unrevealed(value);
        }
        Self { columns }
    }

    pub fn from_columns(columns: [[CellState; ROWS]; COLUMNS]) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[[CellState; ROWS]; COLUMNS] {
        &self.columns
    }

    pub fn cell(&self, column: usize, row: usize) -> Option<CellState> {
        self.columns.get(column).and_then(|cells| cells.get(row)).copied()
    }

    /// All cells in column-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, CellState)> + '_ {
        self.columns.iter().enumerate().flat_map(|(column, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(row, cell)| (column, row, *cell))
        })
    }

    /// Number of cards still on the field.
    pub fn card_count(&self) -> usize {
        self.cells()
            .filter(|(_, _, cell)| *cell != CellState::Gone)
            .count()
    }

    pub fn unrevealed_count(&self) -> usize {
        self.cells()
            .filter(|(_, _, cell)| matches!(cell, CellState::Unrevealed(_)))
            .count()
    }

    pub fn reveal(&self, column: usize, row: usize) -> Result<FieldUpdate, InvalidMove> {
        let value = match self.checked_cell(column, row)? {
            CellState::Unrevealed(v) => v,
            CellState::Revealed(_) => return Err(InvalidMove::AlreadyRevealed { column, row }),
            CellState::Gone => return Err(InvalidMove::CellGone { column, row }),
        };
        let mut field = *self;
        field.columns[column][row] = CellState::Revealed(value);
        let cleared = field.clear_column(column);
        Ok(FieldUpdate {
            field,
            cleared_column: cleared.is_some(),
            released: cleared.map(Vec::from).unwrap_or_default(),
        })
    }

    pub fn swap_into(
        &self,
        column: usize,
        row: usize,
        incoming: CardValue,
    ) -> Result<FieldUpdate, InvalidMove> {
        let previous = self
            .checked_cell(column, row)?
            .value()
            .ok_or(InvalidMove::CellGone { column, row })?;
        let mut field = *self;
        field.columns[column][row] = CellState::Revealed(incoming);
        let mut released = vec![previous];
        let cleared = field.clear_column(column);
        if let Some(values) = cleared {
            released.extend(values);
        }
        Ok(FieldUpdate {
            field,
            released,
            cleared_column: cleared.is_some(),
        })
    }

    pub fn redacted(&self) -> RedactedField {
        RedactedField {
            columns: self.columns.map(|cells| cells.map(CellState::redacted)),
        }
    }

    pub fn sum(&self) -> i32 {
        self.cells().map(|(_, _, cell)| cell.estimated_value()).sum()
    }

    fn checked_cell(&self, column: usize, row: usize) -> Result<CellState, InvalidMove> {
        self.cell(column, row)
            .ok_or(InvalidMove::OutOfBounds { column, row })
    }

    /// Clears the column when all three cells show the same revealed value.
    fn clear_column(&mut self, column: usize) -> Option<[CardValue; ROWS]> {
        let cells = self.columns[column];
        let CellState::Revealed(first) = cells[0] else {
            return None;
        };
        if cells.iter().all(|cell| *cell == CellState::Revealed(first)) {
            self.columns[column] = [CellState::Gone; ROWS];
            tracing::debug!(column, value = first, "column cleared");
            Some([first; ROWS])
        } else {
            None
        }
    }
}

/// A field as seen by agents: hidden values erased.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RedactedField {
    columns: [[RedactedCell; ROWS]; COLUMNS],
}

impl RedactedField {
    pub fn columns(&self) -> &[[RedactedCell; ROWS]; COLUMNS] {
        &self.columns
    }

    pub fn cell(&self, column: usize, row: usize) -> Option<RedactedCell> {
        self.columns.get(column).and_then(|cells| cells.get(row)).copied()
    }

    /// All cells in column-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, RedactedCell)> + '_ {
        self.columns.iter().enumerate().flat_map(|(column, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(row, cell)| (column, row, *cell))
        })
    }

    /// Sum of the face-up cards; hidden cards are not counted.
    pub fn revealed_sum(&self) -> i32 {
        self.cells()
            .filter_map(|(_, _, cell)| cell.revealed_value())
            .map(i32::from)
            .sum()
    }

    pub fn unrevealed_count(&self) -> usize {
        self.cells()
            .filter(|(_, _, cell)| *cell == RedactedCell::Unrevealed)
            .count()
    }
}
