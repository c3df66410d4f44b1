use im::Vector;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::action::{GameMove, PlayerId, legal_moves_for};
use crate::card::{CardValue, FIELD_CELLS, MAX_PLAYERS, MIN_PLAYERS, refill_if_empty};
use crate::error::{GameError, InvalidMove};
use crate::field::{CellState, Field, FieldUpdate, RedactedField};
use crate::score::final_scores;

/// What happens to the previous middle card when a reveal clears a column.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ClearingReveal {
    /// The previous middle card goes to the discard pile.
    #[default]
    DiscardMiddle,
    /// The previous middle card leaves circulation.
    DropMiddle,
}

/// Authoritative snapshot of a round, every card value visible.
///
/// Transitions never mutate a state; [`GameState::applying`] returns the
/// successor. Piles are persistent vectors so successors share structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    middle_card: CardValue,
    stack: Vector<CardValue>,
    off_stack: Vector<CardValue>,
    fields: Vector<Field>,
    ends_at: Option<PlayerId>,
    clearing_reveal: ClearingReveal,
}

impl GameState {
    /// Deals a round from `deck`, taking cards from the end: one middle card,
    /// then twelve per player. The rest becomes the draw pile.
    pub fn deal(
        num_players: usize,
        mut deck: Vec<CardValue>,
        clearing_reveal: ClearingReveal,
    ) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&num_players) {
            return Err(GameError::InvalidConfiguration(
                "players must be between 2 and 8",
            ));
        }
        if deck.len() < 1 + num_players * FIELD_CELLS {
            return Err(GameError::InvalidConfiguration(
                "deck does not contain enough cards to deal fields",
            ));
        }
        let middle_card = deck.pop().ok_or(GameError::DeckExhausted)?;
        let mut fields = Vector::new();
        for _ in 0..num_players {
            let mut cards = [0; FIELD_CELLS];
            for slot in cards.iter_mut() {
                *slot = deck.pop().ok_or(GameError::DeckExhausted)?;
            }
            fields.push_back(Field::dealt(cards));
        }
        Ok(Self {
            middle_card,
            stack: deck.into_iter().collect(),
            off_stack: Vector::new(),
            fields,
            ends_at: None,
            clearing_reveal,
        })
    }

    /// Assembles a state from explicit parts. The last element of `stack` is drawn first.
    pub fn from_parts(
        middle_card: CardValue,
        stack: Vec<CardValue>,
        off_stack: Vec<CardValue>,
        fields: Vec<Field>,
        ends_at: Option<PlayerId>,
    ) -> Self {
        Self {
            middle_card,
            stack: stack.into_iter().collect(),
            off_stack: off_stack.into_iter().collect(),
            fields: fields.into_iter().collect(),
            ends_at,
            clearing_reveal: ClearingReveal::default(),
        }
    }

    pub fn with_clearing_reveal(mut self, clearing_reveal: ClearingReveal) -> Self {
        self.clearing_reveal = clearing_reveal;
        self
    }

    pub fn middle_card(&self) -> CardValue {
        self.middle_card
    }

    pub fn stack(&self) -> &Vector<CardValue> {
        &self.stack
    }

    pub fn off_stack(&self) -> &Vector<CardValue> {
        &self.off_stack
    }

    pub fn fields(&self) -> &Vector<Field> {
        &self.fields
    }

    pub fn field(&self, player: PlayerId) -> Option<&Field> {
        self.fields.get(player)
    }

    pub fn ends_at(&self) -> Option<PlayerId> {
        self.ends_at
    }

    pub fn clearing_reveal(&self) -> ClearingReveal {
        self.clearing_reveal
    }

    pub fn num_players(&self) -> usize {
        self.fields.len()
    }

    /// Cards currently in play: middle card, both piles and every field card.
    pub fn card_count(&self) -> usize {
        1 + self.stack.len()
            + self.off_stack.len()
            + self.fields.iter().map(Field::card_count).sum::<usize>()
    }

    pub fn legal_moves(&self, player: PlayerId) -> Vec<GameMove> {
        match self.fields.get(player) {
            Some(field) => legal_moves_for(
                self.ends_at,
                player,
                field
                    .cells()
                    .map(|(column, row, cell)| (column, row, cell.occupancy())),
            ),
            None => Vec::new(),
        }
    }

    pub fn redacted(&self) -> RedactedGameState {
        RedactedGameState {
            middle_card: self.middle_card,
            fields: self.fields.iter().map(Field::redacted).collect(),
            ends_at: self.ends_at,
        }
    }

    /// Field sums before the end-declaration penalty.
    pub fn raw_scores(&self) -> Vec<i32> {
        self.fields.iter().map(Field::sum).collect()
    }

    /// Final scores, doubling the declarer's sum unless it is strictly the lowest.
    pub fn scores(&self) -> Vec<i32> {
        final_scores(&self.raw_scores(), self.ends_at)
    }

    /// Returns the state after `player` makes `game_move`. The receiver is left untouched.
    pub fn applying<R: Rng + ?Sized>(
        &self,
        player: PlayerId,
        game_move: GameMove,
        rng: &mut R,
    ) -> Result<GameState, GameError> {
        let field = *self
            .fields
            .get(player)
            .ok_or(GameError::InvalidPlayer(player))?;
        if self.ends_at == Some(player) && game_move != GameMove::End {
            return Err(InvalidMove::PlayerFinished(player).into());
        }
        let next = match game_move {
            GameMove::End => {
                if let Some(declarer) = self.ends_at {
                    return Err(InvalidMove::EndAlreadyDeclared(declarer).into());
                }
                let mut next = self.clone();
                next.ends_at = Some(player);
                tracing::info!(player, "end of round declared");
                return Ok(next);
            }
            GameMove::Reveal { column, row } => {
                let update = field.reveal(column, row)?;
                let retire_middle = self.clearing_reveal == ClearingReveal::DiscardMiddle;
                self.settle(self.clone(), player, update, retire_middle)
            }
            GameMove::SwapMiddle { column, row } => {
                let update = field.swap_into(column, row, self.middle_card)?;
                self.settle(self.clone(), player, update, false)
            }
            GameMove::DrawTo { column, row } => {
                match field.cell(column, row) {
                    None => return Err(InvalidMove::OutOfBounds { column, row }.into()),
                    Some(CellState::Gone) => {
                        return Err(InvalidMove::CellGone { column, row }.into());
                    }
                    Some(_) => {}
                }
                let (mut stack, off_stack) = refill_if_empty(&self.stack, &self.off_stack, rng)?;
                let drawn = stack.pop_back().ok_or(GameError::DeckExhausted)?;
                let update = field.swap_into(column, row, drawn)?;
                let mut next = self.clone();
                next.stack = stack;
                next.off_stack = off_stack;
                self.settle(next, player, update, true)
            }
        };
        tracing::debug!(
            player,
            ?game_move,
            middle = next.middle_card,
            draw_pile = next.stack.len(),
            discard_pile = next.off_stack.len(),
            "move applied"
        );
        Ok(next)
    }

    /// Installs the updated field and routes released cards: the last becomes
    /// the middle card, the rest go to the discard pile. With `retire_middle`
    /// the outgoing middle card is discarded too.
    fn settle(
        &self,
        mut next: GameState,
        player: PlayerId,
        update: FieldUpdate,
        retire_middle: bool,
    ) -> GameState {
        next.fields = next.fields.update(player, update.field);
        if let Some((middle, rest)) = update.split_middle() {
            if retire_middle {
                next.off_stack.push_back(self.middle_card);
            }
            next.off_stack.extend(rest.iter().copied());
            next.middle_card = middle;
        }
        next
    }
}

/// Partial-information projection handed to agents. Hidden values never appear.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedactedGameState {
    pub middle_card: CardValue,
    pub fields: Vec<RedactedField>,
    pub ends_at: Option<PlayerId>,
}

impl RedactedGameState {
    pub fn num_players(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, player: PlayerId) -> Option<&RedactedField> {
        self.fields.get(player)
    }

    pub fn legal_moves(&self, player: PlayerId) -> Vec<GameMove> {
        match self.fields.get(player) {
            Some(field) => legal_moves_for(
                self.ends_at,
                player,
                field
                    .cells()
                    .map(|(column, row, cell)| (column, row, cell.occupancy())),
            ),
            None => Vec::new(),
        }
    }
}
