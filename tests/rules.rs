use rand::SeedableRng;
use rand::rngs::StdRng;

use skyjobot::{
    Bot, CellState, ClearingReveal, DECK_SIZE, Field, GameBuilder, GameError, GameMove,
    GameState, InvalidMove, PlayerId, RedactedGameState, ScriptedBot, TurnOutcome, full_deck,
};

use CellState::{Gone, Revealed, Unrevealed};

fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

fn hidden_field(value: i8) -> Field {
    Field::from_columns([[Unrevealed(value); 3]; 4])
}

#[test]
fn initial_deal_four_players() -> Result<(), GameError> {
    let game = GameBuilder::new(4)?.with_deck(full_deck()).build()?;
    let state = game.state();
    assert_eq!(state.num_players(), 4);
    assert_eq!(state.stack().len(), DECK_SIZE - 49);
    assert!(state.off_stack().is_empty());
    assert_eq!(state.ends_at(), None);
    assert_eq!(state.card_count(), DECK_SIZE);
    for field in state.fields() {
        assert_eq!(field.card_count(), 12);
        assert!(field.cells().all(|(_, _, cell)| matches!(cell, Unrevealed(_))));
    }
    Ok(())
}

#[test]
fn deal_takes_cards_from_the_end_of_the_deck() -> Result<(), GameError> {
    let mut deck = vec![0; DECK_SIZE - 25];
    // Player 1's twelve cards, then player 0's, then the middle card on top.
    deck.extend([2; 12]);
    deck.extend([1; 12]);
    deck.push(-2);
    let game = GameBuilder::new(2)?.with_deck(deck).build()?;
    let state = game.state();
    assert_eq!(state.middle_card(), -2);
    assert_eq!(state.field(0).map(Field::sum), Some(12));
    assert_eq!(state.field(1).map(Field::sum), Some(24));
    Ok(())
}

#[test]
fn rejects_unsupported_player_counts() {
    assert!(matches!(
        GameBuilder::new(1),
        Err(GameError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        GameBuilder::new(9),
        Err(GameError::InvalidConfiguration(_))
    ));
    assert!(GameBuilder::new(8).is_ok());
}

#[test]
fn matched_swap_clears_the_column() -> Result<(), GameError> {
    let mut columns = [[Unrevealed(1); 3]; 4];
    columns[1] = [Revealed(5), Unrevealed(9), Revealed(5)];
    let state = GameState::from_parts(
        5,
        vec![0, 0, 0],
        Vec::new(),
        vec![Field::from_columns(columns), hidden_field(3)],
        None,
    );
    let before = state.card_count();
    let next = state.applying(0, GameMove::SwapMiddle { column: 1, row: 1 }, &mut rng())?;
    let field = next.field(0).expect("player 0");
    assert_eq!(field.columns()[1], [Gone; 3]);
    assert_eq!(next.middle_card(), 5);
    // The replaced card and two of the matched cards; the third becomes the middle card.
    assert_eq!(next.off_stack().iter().copied().collect::<Vec<_>>(), vec![9, 5, 5]);
    assert_eq!(next.card_count(), before);
    assert_eq!(next.legal_moves(0).len(), 1 + 9 * 2 + 9);
    Ok(())
}

#[test]
fn swapping_in_the_last_match_discards_three_cards() -> Result<(), GameError> {
    let mut columns = [[Unrevealed(1); 3]; 4];
    columns[0] = [Revealed(5), Revealed(5), Unrevealed(5)];
    let state = GameState::from_parts(
        5,
        vec![0, 0],
        Vec::new(),
        vec![Field::from_columns(columns), hidden_field(3)],
        None,
    );
    let before = state.card_count();
    let next = state.applying(0, GameMove::SwapMiddle { column: 0, row: 2 }, &mut rng())?;
    assert_eq!(next.field(0).expect("player 0").columns()[0], [Gone; 3]);
    assert_eq!(next.middle_card(), 5);
    // Four cards are released: the face-down 5 and the three matched 5s. One
    // becomes the middle card, so three are discarded rather than two.
    assert_eq!(next.off_stack().iter().copied().collect::<Vec<_>>(), vec![5, 5, 5]);
    assert_eq!(next.card_count(), before);
    Ok(())
}

#[test]
fn draw_to_cell_moves_old_card_to_the_middle() -> Result<(), GameError> {
    let state = GameState::from_parts(
        10,
        vec![3, 4],
        Vec::new(),
        vec![hidden_field(8), hidden_field(6)],
        None,
    );
    let next = state.applying(0, GameMove::DrawTo { column: 3, row: 2 }, &mut rng())?;
    assert_eq!(next.field(0).and_then(|f| f.cell(3, 2)), Some(Revealed(4)));
    assert_eq!(next.middle_card(), 8);
    assert_eq!(next.stack().len(), 1);
    assert_eq!(next.off_stack().iter().copied().collect::<Vec<_>>(), vec![10]);
    assert_eq!(next.card_count(), state.card_count());
    Ok(())
}

#[test]
fn empty_draw_pile_is_refilled_from_discards() -> Result<(), GameError> {
    let state = GameState::from_parts(
        0,
        Vec::new(),
        vec![1, 2, 3],
        vec![hidden_field(8), hidden_field(6)],
        None,
    );
    let next = state.applying(1, GameMove::DrawTo { column: 0, row: 0 }, &mut rng())?;
    assert_eq!(next.stack().len(), 2);
    assert_eq!(next.off_stack().len(), 1);
    assert_eq!(next.middle_card(), 6);
    assert_eq!(next.card_count(), state.card_count());

    let dry = GameState::from_parts(0, Vec::new(), Vec::new(), vec![hidden_field(8); 2], None);
    assert!(matches!(
        dry.applying(0, GameMove::DrawTo { column: 0, row: 0 }, &mut rng()),
        Err(GameError::DeckExhausted)
    ));
    Ok(())
}

fn clearing_reveal_state(rule: ClearingReveal) -> GameState {
    let mut columns = [[Unrevealed(1); 3]; 4];
    columns[0] = [Revealed(7), Revealed(7), Unrevealed(7)];
    GameState::from_parts(
        3,
        vec![1, 2],
        Vec::new(),
        vec![Field::from_columns(columns), hidden_field(4)],
        None,
    )
    .with_clearing_reveal(rule)
}

#[test]
fn clearing_reveal_discards_the_previous_middle_card() -> Result<(), GameError> {
    let state = clearing_reveal_state(ClearingReveal::DiscardMiddle);
    let next = state.applying(0, GameMove::Reveal { column: 0, row: 2 }, &mut rng())?;
    assert_eq!(next.middle_card(), 7);
    assert_eq!(next.off_stack().iter().copied().collect::<Vec<_>>(), vec![3, 7, 7]);
    assert_eq!(next.card_count(), state.card_count());
    Ok(())
}

#[test]
fn clearing_reveal_can_drop_the_previous_middle_card() -> Result<(), GameError> {
    let state = clearing_reveal_state(ClearingReveal::DropMiddle);
    let next = state.applying(0, GameMove::Reveal { column: 0, row: 2 }, &mut rng())?;
    assert_eq!(next.middle_card(), 7);
    assert_eq!(next.off_stack().iter().copied().collect::<Vec<_>>(), vec![7, 7]);
    assert_eq!(next.card_count(), state.card_count() - 1);
    Ok(())
}

#[test]
fn plain_reveal_keeps_the_middle_card() -> Result<(), GameError> {
    let state = clearing_reveal_state(ClearingReveal::DiscardMiddle);
    let next = state.applying(0, GameMove::Reveal { column: 2, row: 0 }, &mut rng())?;
    assert_eq!(next.middle_card(), 3);
    assert!(next.off_stack().is_empty());
    assert_eq!(next.field(0).and_then(|f| f.cell(2, 0)), Some(Revealed(1)));
    Ok(())
}

#[test]
fn reveal_rejects_revealed_and_missing_cells() {
    let state = clearing_reveal_state(ClearingReveal::DiscardMiddle);
    let err = state
        .applying(0, GameMove::Reveal { column: 0, row: 0 }, &mut rng())
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::InvalidMove(InvalidMove::AlreadyRevealed { column: 0, row: 0 })
    ));
    let err = state
        .applying(0, GameMove::Reveal { column: 4, row: 0 }, &mut rng())
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::InvalidMove(InvalidMove::OutOfBounds { column: 4, row: 0 })
    ));
}

#[test]
fn only_one_player_may_declare_the_end() -> Result<(), GameError> {
    let mut game = GameBuilder::new(3)?.build()?;
    game.apply_move(0, GameMove::End)?;
    assert_eq!(game.state().ends_at(), Some(0));
    assert!(!game.legal_moves(1)?.contains(&GameMove::End));
    let err = game.apply_move(1, GameMove::End).unwrap_err();
    assert!(matches!(
        err,
        GameError::InvalidMove(InvalidMove::EndAlreadyDeclared(0))
    ));
    assert_eq!(game.state().ends_at(), Some(0));
    Ok(())
}

#[test]
fn declarer_cannot_move_again() {
    let state = GameState::from_parts(0, vec![1], Vec::new(), vec![hidden_field(2); 2], Some(1));
    assert!(state.legal_moves(1).is_empty());
    let err = state
        .applying(1, GameMove::Reveal { column: 0, row: 0 }, &mut rng())
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::InvalidMove(InvalidMove::PlayerFinished(1))
    ));
}

fn scripted(moves: &[GameMove]) -> Box<dyn Bot> {
    Box::new(ScriptedBot::new(moves.iter().copied()))
}

#[test]
fn round_ends_when_play_returns_to_the_declarer() -> Result<(), GameError> {
    let mut game = GameBuilder::new(4)?.with_seed(3).build()?;
    let reveals = [
        GameMove::Reveal { column: 0, row: 0 },
        GameMove::Reveal { column: 0, row: 1 },
    ];
    let mut bots = vec![
        scripted(&reveals),
        scripted(&reveals),
        scripted(&[GameMove::End]),
        scripted(&reveals),
    ];
    let mut outcomes = Vec::new();
    loop {
        let outcome = game.step(&mut bots)?;
        outcomes.push(outcome);
        if matches!(outcome, TurnOutcome::Skipped { .. }) {
            break;
        }
    }
    let movers: Vec<PlayerId> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            TurnOutcome::Moved { player, .. } => Some(*player),
            TurnOutcome::Skipped { .. } | TurnOutcome::Passed { .. } => None,
        })
        .collect();
    assert_eq!(movers, vec![0, 1, 2, 3, 0, 1]);
    assert_eq!(outcomes.last(), Some(&TurnOutcome::Skipped { player: 2 }));
    assert_eq!(game.turns(), 6);
    assert!(game.is_finished());
    // Rotation still advanced past the skipped declarer.
    assert_eq!(game.current_player(), 3);
    assert!(matches!(game.step(&mut bots), Err(GameError::GameOver)));
    Ok(())
}

#[test]
fn run_returns_penalized_scores() -> Result<(), GameError> {
    let mut game = GameBuilder::new(2)?.build()?;
    let mut bots = vec![scripted(&[GameMove::End]), scripted(&[])];
    let scores = game.run(&mut bots)?;
    assert_eq!(game.turns(), 2);
    assert_eq!(scores, game.state().scores());
    let raw = game.state().raw_scores();
    if raw[0] >= raw[1] {
        assert_eq!(scores[0], raw[0] * 2);
    } else {
        assert_eq!(scores[0], raw[0]);
    }
    assert_eq!(scores[1], raw[1]);
    Ok(())
}

#[test]
fn cleared_player_passes_during_the_final_lap() -> Result<(), GameError> {
    let mut deck = vec![10; 20];
    // Player 1 is dealt four face-down columns of matching cards.
    deck.extend([5, 5, 5, 6, 6, 6, 7, 7, 7, 8, 8, 8]);
    deck.extend([1; 12]);
    deck.push(0);
    let mut game = GameBuilder::new(2)?.with_deck(deck).build()?;
    let draws = std::iter::repeat_n(GameMove::DrawTo { column: 0, row: 0 }, 12);
    let mut bots: Vec<Box<dyn Bot>> = vec![
        Box::new(ScriptedBot::new(draws.chain([GameMove::End]))),
        Box::new(ScriptedBot::reveal_then_end()),
    ];
    let mut outcomes = Vec::new();
    loop {
        let outcome = game.step(&mut bots)?;
        outcomes.push(outcome);
        if matches!(outcome, TurnOutcome::Skipped { .. }) {
            break;
        }
    }
    assert_eq!(game.state().field(1).map(Field::card_count), Some(0));
    assert_eq!(game.state().ends_at(), Some(0));
    assert_eq!(
        outcomes[outcomes.len() - 3..],
        [
            TurnOutcome::Moved {
                player: 0,
                game_move: GameMove::End
            },
            TurnOutcome::Passed { player: 1 },
            TurnOutcome::Skipped { player: 0 },
        ]
    );
    assert_eq!(game.turns(), 25);
    assert_eq!(game.scores()[1], 0);
    assert!(matches!(game.step(&mut bots), Err(GameError::GameOver)));
    Ok(())
}

struct OutOfBounds;

impl Bot for OutOfBounds {
    fn select_move(&mut self, _state: &RedactedGameState, _player: PlayerId) -> GameMove {
        GameMove::Reveal { column: 7, row: 0 }
    }
}

#[test]
fn illegal_bot_move_aborts_the_game() -> Result<(), GameError> {
    let mut game = GameBuilder::new(2)?.build()?;
    let before = game.state().clone();
    let mut bots: Vec<Box<dyn Bot>> = vec![Box::new(OutOfBounds), Box::new(OutOfBounds)];
    let err = game.run(&mut bots).unwrap_err();
    assert!(matches!(
        err,
        GameError::InvalidMove(InvalidMove::OutOfBounds { column: 7, row: 0 })
    ));
    assert_eq!(game.state(), &before);
    assert_eq!(game.turns(), 0);
    Ok(())
}
