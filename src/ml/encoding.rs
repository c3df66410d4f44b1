use burn::tensor::{Tensor, TensorData, backend::Backend};

use crate::action::{GameMove, PlayerId};
use crate::card::{COLUMNS, FIELD_CELLS, MAX_CARD_VALUE, MAX_PLAYERS, MIN_CARD_VALUE, ROWS};
use crate::field::{RedactedCell, RedactedField};
use crate::state::RedactedGameState;

pub const GLOBAL_FEATURES: usize = 2; // middle card, end declared
pub const CELL_FEATURES: usize = 4; // gone, revealed, unrevealed, value
pub const FIELD_FEATURES: usize = FIELD_CELLS * CELL_FEATURES;
pub const SEAT_FEATURES: usize = 2 + FIELD_FEATURES; // present, declarer, cells
pub const STATE_FEATURES: usize = GLOBAL_FEATURES + MAX_PLAYERS * SEAT_FEATURES;

pub const REVEAL_OFFSET: usize = 0;
pub const SWAP_MIDDLE_OFFSET: usize = REVEAL_OFFSET + FIELD_CELLS;
pub const DRAW_TO_OFFSET: usize = SWAP_MIDDLE_OFFSET + FIELD_CELLS;
pub const END_INDEX: usize = DRAW_TO_OFFSET + FIELD_CELLS;
pub const MAX_ACTIONS: usize = END_INDEX + 1;

#[inline]
fn value_scalar(value: i8) -> f32 {
    (value - MIN_CARD_VALUE) as f32 / (MAX_CARD_VALUE - MIN_CARD_VALUE) as f32
}

#[inline]
fn cell_index(column: usize, row: usize) -> Option<usize> {
    if column < COLUMNS && row < ROWS {
        Some(column * ROWS + row)
    } else {
        None
    }
}

pub struct StateEncoder;

impl StateEncoder {
    pub fn encode_cell(cell: RedactedCell) -> [f32; CELL_FEATURES] {
        match cell {
            RedactedCell::Gone => [1.0, 0.0, 0.0, 0.0],
            RedactedCell::Revealed(v) => [0.0, 1.0, 0.0, value_scalar(v)],
            RedactedCell::Unrevealed => [0.0, 0.0, 1.0, 0.0],
        }
    }

    pub fn encode_field(field: &RedactedField) -> [f32; FIELD_FEATURES] {
        let mut out = [0.0; FIELD_FEATURES];
        for (index, (_, _, cell)) in field.cells().enumerate() {
            let start = index * CELL_FEATURES;
            out[start..start + CELL_FEATURES].copy_from_slice(&Self::encode_cell(cell));
        }
        out
    }

    /// Fixed-length features for `player`. Seats are rotated so the observer
    /// comes first; missing seats stay zero.
    pub fn encode(state: &RedactedGameState, player: PlayerId) -> [f32; STATE_FEATURES] {
        let mut out = [0.0; STATE_FEATURES];
        let mut offset = 0;

        out[offset] = value_scalar(state.middle_card);
        offset += 1;
        out[offset] = if state.ends_at.is_some() { 1.0 } else { 0.0 };
        offset += 1;

        let seats = state.num_players();
        for slot in 0..MAX_PLAYERS {
            if slot < seats {
                let seat = (player + slot) % seats;
                out[offset] = 1.0;
                out[offset + 1] = if state.ends_at == Some(seat) { 1.0 } else { 0.0 };
                let field = Self::encode_field(&state.fields[seat]);
                out[offset + 2..offset + SEAT_FEATURES].copy_from_slice(&field);
            }
            offset += SEAT_FEATURES;
        }

        debug_assert_eq!(offset, STATE_FEATURES);
        out
    }

    pub fn encode_tensor<B>(state: &RedactedGameState, player: PlayerId) -> Tensor<B, 2>
    where
        B: Backend,
        B::Device: Default,
    {
        let features = Self::encode(state, player);
        let data = TensorData::from([features]);
        Tensor::<B, 2>::from_data(data, &B::Device::default())
    }
}

pub struct ActionSpace;

impl ActionSpace {
    pub const MAX: usize = MAX_ACTIONS;

    pub fn action_index(game_move: &GameMove) -> Option<usize> {
        match *game_move {
            GameMove::Reveal { column, row } => cell_index(column, row).map(|i| REVEAL_OFFSET + i),
            GameMove::SwapMiddle { column, row } => {
                cell_index(column, row).map(|i| SWAP_MIDDLE_OFFSET + i)
            }
            GameMove::DrawTo { column, row } => cell_index(column, row).map(|i| DRAW_TO_OFFSET + i),
            GameMove::End => Some(END_INDEX),
        }
    }

    pub fn index_to_action(index: usize) -> Option<GameMove> {
        if index == END_INDEX {
            return Some(GameMove::End);
        }
        if index > END_INDEX {
            return None;
        }
        let cell = index % FIELD_CELLS;
        let column = cell / ROWS;
        let row = cell % ROWS;
        Some(match index / FIELD_CELLS {
            0 => GameMove::Reveal { column, row },
            1 => GameMove::SwapMiddle { column, row },
            _ => GameMove::DrawTo { column, row },
        })
    }

    pub fn mask(legal: &[GameMove]) -> [f32; MAX_ACTIONS] {
        const NEGATIVE: f32 = -1.0e9;
        let mut mask = [NEGATIVE; MAX_ACTIONS];
        for game_move in legal {
            if let Some(index) = Self::action_index(game_move) {
                mask[index] = 0.0;
            }
        }
        mask
    }

    pub fn mask_tensor<B>(legal: &[GameMove]) -> Tensor<B, 2>
    where
        B: Backend,
        B::Device: Default,
    {
        let mask = Self::mask(legal);
        Tensor::<B, 2>::from_data(TensorData::from([mask]), &B::Device::default())
    }

    pub fn targets_from_indices(indices: &[usize]) -> [f32; MAX_ACTIONS] {
        let mut target = [0.0f32; MAX_ACTIONS];
        if indices.is_empty() {
            return target;
        }
        let weight = 1.0 / indices.len() as f32;
        for &idx in indices {
            if idx < MAX_ACTIONS {
                target[idx] = weight;
            }
        }
        target
    }

    pub fn target_tensor<B>(indices: &[usize]) -> Tensor<B, 2>
    where
        B: Backend,
        B::Device: Default,
    {
        let target = Self::targets_from_indices(indices);
        Tensor::<B, 2>::from_data(TensorData::from([target]), &B::Device::default())
    }
}
