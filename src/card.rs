use im::Vector;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::GameError;

/// Face value of a card. The deck spans -2 through 12.
pub type CardValue = i8;

pub const MIN_CARD_VALUE: CardValue = -2;
pub const MAX_CARD_VALUE: CardValue = 12;
pub const DECK_SIZE: usize = 150;
pub const COLUMNS: usize = 4;
pub const ROWS: usize = 3;
pub const FIELD_CELLS: usize = COLUMNS * ROWS;
pub const DEFAULT_PLAYERS: usize = 4;
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 8;

/// Number of distinct card values in the deck.
pub const VALUE_BUCKETS: usize = (MAX_CARD_VALUE - MIN_CARD_VALUE + 1) as usize;

/// Copies of each value in the standard deck, lowest value first.
const DECK_COMPOSITION: [(CardValue, usize); VALUE_BUCKETS] = [
    (-2, 5),
    (-1, 10),
    (0, 15),
    (1, 10),
    (2, 10),
    (3, 10),
    (4, 10),
    (5, 10),
    (6, 10),
    (7, 10),
    (8, 10),
    (9, 10),
    (10, 10),
    (11, 10),
    (12, 10),
];

/// Builds the standard 150-card deck in deterministic order (unshuffled).
pub fn full_deck() -> Vec<CardValue> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for (value, count) in DECK_COMPOSITION {
        deck.extend(std::iter::repeat(value).take(count));
    }
    deck
}

/// The standard deck in a uniformly random order drawn from `rng`.
pub fn shuffled_deck<R: Rng + ?Sized>(rng: &mut R) -> Vec<CardValue> {
    let mut deck = full_deck();
    deck.shuffle(rng);
    deck
}

/// Returns the piles unchanged while the draw pile still has cards. Once it is
/// empty, the discard pile is shuffled into a fresh draw pile and the discard
/// pile starts over empty.
pub fn refill_if_empty<R: Rng + ?Sized>(
    stack: &Vector<CardValue>,
    off_stack: &Vector<CardValue>,
    rng: &mut R,
) -> Result<(Vector<CardValue>, Vector<CardValue>), GameError> {
    if !stack.is_empty() {
        return Ok((stack.clone(), off_stack.clone()));
    }
    if off_stack.is_empty() {
        return Err(GameError::DeckExhausted);
    }
    let mut recycled: Vec<CardValue> = off_stack.iter().copied().collect();
    recycled.shuffle(rng);
    tracing::debug!(cards = recycled.len(), "recycled discard pile into draw pile");
    Ok((recycled.into_iter().collect(), Vector::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn full_deck_has_standard_composition() {
        let deck = full_deck();
        assert_eq!(deck.len(), DECK_SIZE);
        assert_eq!(deck.iter().filter(|v| **v == -2).count(), 5);
        assert_eq!(deck.iter().filter(|v| **v == -1).count(), 10);
        assert_eq!(deck.iter().filter(|v| **v == 0).count(), 15);
        for value in 1..=MAX_CARD_VALUE {
            assert_eq!(deck.iter().filter(|v| **v == value).count(), 10);
        }
    }

    #[test]
    fn shuffled_deck_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut shuffled = shuffled_deck(&mut rng);
        shuffled.sort_unstable();
        let mut reference = full_deck();
        reference.sort_unstable();
        assert_eq!(shuffled, reference);
    }

    #[test]
    fn refill_keeps_non_empty_stack() {
        let mut rng = StdRng::seed_from_u64(1);
        let stack: Vector<CardValue> = vec![1, 2].into_iter().collect();
        let off: Vector<CardValue> = vec![5].into_iter().collect();
        let (new_stack, new_off) = refill_if_empty(&stack, &off, &mut rng).unwrap();
        assert_eq!(new_stack, stack);
        assert_eq!(new_off, off);
    }

    #[test]
    fn refill_recycles_discard_pile() {
        let mut rng = StdRng::seed_from_u64(1);
        let off: Vector<CardValue> = vec![4, 4, 7, -2].into_iter().collect();
        let (new_stack, new_off) = refill_if_empty(&Vector::new(), &off, &mut rng).unwrap();
        assert!(new_off.is_empty());
        let mut drawn: Vec<CardValue> = new_stack.iter().copied().collect();
        drawn.sort_unstable();
        assert_eq!(drawn, vec![-2, 4, 4, 7]);
    }

    #[test]
    fn refill_with_both_piles_empty_is_an_invariant_violation() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = refill_if_empty(&Vector::new(), &Vector::new(), &mut rng);
        assert!(matches!(result, Err(GameError::DeckExhausted)));
    }
}
