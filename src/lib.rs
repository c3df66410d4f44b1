//! Skyjo-style card game engine built for bot experimentation and imitation learning.

pub mod action;
pub mod batch;
pub mod bot;
pub mod bots;
pub mod card;
pub mod error;
pub mod field;
pub mod game;
pub mod ml;
pub mod score;
pub mod state;
pub mod visualize;

pub use crate::action::{GameMove, Occupancy, PlayerId};
pub use crate::batch::{BatchConfig, GameSummary, mix_seed, run_batch};
pub use crate::bot::Bot;
pub use crate::bots::{
    HeuristicBot, HumanBot, PolicyBot, RandomBot, ScriptedBot, create_bot_from_spec,
    label_for_spec,
};
pub use crate::card::{
    COLUMNS, CardValue, DECK_SIZE, FIELD_CELLS, MAX_CARD_VALUE, MAX_PLAYERS, MIN_CARD_VALUE,
    MIN_PLAYERS, ROWS, full_deck, shuffled_deck,
};
pub use crate::error::{GameError, InvalidMove};
pub use crate::field::{CellState, Field, FieldUpdate, RedactedCell, RedactedField};
pub use crate::game::{Game, GameBuilder, GameConfig, TurnOutcome};
pub use crate::ml::{
    ActionSpace, PolicyCheckpoint, PolicyMetadata, PolicyNetwork, PolicyShape, PolicyTrainer,
    StateEncoder,
};
pub use crate::score::{final_scores, winners};
pub use crate::state::{ClearingReveal, GameState, RedactedGameState};
pub use crate::visualize::{
    VisualOptions, describe_move, render_field, render_redacted_field, render_redacted_state,
    render_state, render_state_with_options,
};
