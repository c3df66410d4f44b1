use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::action::{GameMove, PlayerId};
use crate::bot::Bot;
use crate::card::{CardValue, DEFAULT_PLAYERS, MAX_PLAYERS, MIN_PLAYERS, full_deck};
use crate::error::GameError;
use crate::state::{ClearingReveal, GameState, RedactedGameState};

const DEFAULT_SEED: u64 = 0x5EED_5EED_5EED_5EED;

/// Configuration required to bootstrap a game instance.
#[derive(Clone, Copy, Debug)]
pub struct GameConfig {
    pub num_players: usize,
    pub seed: u64,
    pub max_turns: Option<usize>,
    pub clearing_reveal: ClearingReveal,
}

impl GameConfig {
    pub fn new(num_players: usize, seed: u64) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&num_players) {
            return Err(GameError::InvalidConfiguration(
                "players must be between 2 and 8",
            ));
        }
        Ok(Self {
            num_players,
            seed,
            max_turns: None,
            clearing_reveal: ClearingReveal::default(),
        })
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            num_players: DEFAULT_PLAYERS,
            seed: DEFAULT_SEED,
            max_turns: None,
            clearing_reveal: ClearingReveal::default(),
        }
    }
}

/// Builder that enables deterministic deck injection for testing and experiments.
pub struct GameBuilder {
    config: GameConfig,
    deck: Option<Vec<CardValue>>,
}

impl GameBuilder {
    pub fn new(num_players: usize) -> Result<Self, GameError> {
        Ok(Self {
            config: GameConfig::new(num_players, DEFAULT_SEED)?,
            deck: None,
        })
    }

    pub fn with_players(mut self, num_players: usize) -> Result<Self, GameError> {
        self.config.num_players = GameConfig::new(num_players, self.config.seed)?.num_players;
        Ok(self)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Deal from this exact deck instead of a shuffled one. Cards are taken from the end.
    pub fn with_deck(mut self, deck: Vec<CardValue>) -> Self {
        self.deck = Some(deck);
        self
    }

    /// Abort with [`GameError::TurnLimit`] once this many moves have been made.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.config.max_turns = Some(max_turns);
        self
    }

    pub fn with_clearing_reveal(mut self, clearing_reveal: ClearingReveal) -> Self {
        self.config.clearing_reveal = clearing_reveal;
        self
    }

    pub fn build(self) -> Result<Game, GameError> {
        Game::from_builder(self)
    }
}

/// What a single call to [`Game::step`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Moved { player: PlayerId, game_move: GameMove },
    /// The declarer's turn came around again; the round is over.
    Skipped { player: PlayerId },
    /// The end is declared and this player has no cards left, so there is
    /// nothing to play. Not counted as a move.
    Passed { player: PlayerId },
}

/// Turn loop driving one round from the deal to the final scores.
///
/// Every move replaces the held [`GameState`] with its successor; the loop
/// itself only tracks whose turn it is.
pub struct Game {
    config: GameConfig,
    state: GameState,
    current_player: PlayerId,
    turns: usize,
    finished: bool,
    rng: StdRng,
}

impl Game {
    pub fn builder(num_players: usize) -> Result<GameBuilder, GameError> {
        GameBuilder::new(num_players)
    }

    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        GameBuilder { config, deck: None }.build()
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn current_player(&self) -> PlayerId {
        self.current_player
    }

    /// Moves made so far; skipped turns are not counted.
    pub fn turns(&self) -> usize {
        self.turns
    }

    pub fn redacted_view(&self) -> RedactedGameState {
        self.state.redacted()
    }

    pub fn legal_moves(&self, player: PlayerId) -> Result<Vec<GameMove>, GameError> {
        if player >= self.state.num_players() {
            return Err(GameError::InvalidPlayer(player));
        }
        if self.is_finished() {
            return Ok(Vec::new());
        }
        Ok(self.state.legal_moves(player))
    }

    /// True once play has come back around to the player who declared the end.
    pub fn is_finished(&self) -> bool {
        self.finished || self.state.ends_at() == Some(self.current_player)
    }

    /// Final scores with the end-declaration penalty applied.
    pub fn scores(&self) -> Vec<i32> {
        self.state.scores()
    }

    /// Applies `game_move` for the current player and passes the turn on.
    pub fn apply_move(&mut self, player: PlayerId, game_move: GameMove) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }
        if player >= self.state.num_players() {
            return Err(GameError::InvalidPlayer(player));
        }
        if player != self.current_player {
            return Err(GameError::NotPlayersTurn);
        }
        if let Some(limit) = self.config.max_turns {
            if self.turns >= limit {
                return Err(GameError::TurnLimit(limit));
            }
        }
        self.state = self.state.applying(player, game_move, &mut self.rng)?;
        self.turns += 1;
        self.advance_turn();
        Ok(())
    }

    /// Plays one turn. The declarer is skipped rather than asked for a move,
    /// which ends the round, and a player left without legal moves passes.
    /// Rotation advances either way.
    pub fn step(&mut self, bots: &mut [Box<dyn Bot>]) -> Result<TurnOutcome, GameError> {
        if self.finished {
            return Err(GameError::GameOver);
        }
        if bots.len() != self.state.num_players() {
            return Err(GameError::InvalidConfiguration(
                "one bot is required per player",
            ));
        }
        if let Some(outcome) = self.forced_turn()? {
            return Ok(outcome);
        }
        let player = self.current_player;
        let view = self.state.redacted();
        let game_move = bots[player].select_move(&view, player);
        self.apply_move(player, game_move)?;
        Ok(TurnOutcome::Moved { player, game_move })
    }

    /// Resolves the current turn if it needs no decision: the declarer's
    /// closing skip, or a pass for a player with an empty field after the
    /// end was declared. Returns `None` when the current player must move.
    pub fn forced_turn(&mut self) -> Result<Option<TurnOutcome>, GameError> {
        if self.finished {
            return Err(GameError::GameOver);
        }
        let player = self.current_player;
        if self.state.ends_at() == Some(player) {
            tracing::trace!(player, "declarer skipped, round over");
            self.finished = true;
            self.advance_turn();
            return Ok(Some(TurnOutcome::Skipped { player }));
        }
        if self.state.legal_moves(player).is_empty() {
            tracing::trace!(player, "no cards left, passing");
            self.advance_turn();
            return Ok(Some(TurnOutcome::Passed { player }));
        }
        Ok(None)
    }

    /// Steps until the round ends and returns the final scores.
    pub fn run(&mut self, bots: &mut [Box<dyn Bot>]) -> Result<Vec<i32>, GameError> {
        while !self.finished {
            self.step(bots)?;
        }
        let scores = self.scores();
        tracing::info!(turns = self.turns, ?scores, "round finished");
        Ok(scores)
    }

    fn from_builder(builder: GameBuilder) -> Result<Self, GameError> {
        let GameBuilder { config, deck } = builder;
        GameConfig::new(config.num_players, config.seed)?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let deck = if let Some(deck) = deck {
            deck
        } else {
            let mut deck = full_deck();
            deck.shuffle(&mut rng);
            deck
        };
        let state = GameState::deal(config.num_players, deck, config.clearing_reveal)?;
        tracing::debug!(
            players = config.num_players,
            seed = config.seed,
            middle = state.middle_card(),
            "round dealt"
        );
        Ok(Game {
            config,
            state,
            current_player: 0,
            turns: 0,
            finished: false,
            rng,
        })
    }

    fn advance_turn(&mut self) {
        self.current_player = (self.current_player + 1) % self.state.num_players();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EndImmediately;

    impl Bot for EndImmediately {
        fn select_move(&mut self, state: &RedactedGameState, player: PlayerId) -> GameMove {
            state.legal_moves(player)[0]
        }
    }

    #[test]
    fn default_config_has_four_players() {
        let game = Game::new(GameConfig::default()).unwrap();
        assert_eq!(game.state().num_players(), 4);
        assert_eq!(game.current_player(), 0);
        assert!(!game.is_finished());
    }

    #[test]
    fn same_seed_deals_same_round() {
        let a = GameBuilder::new(4).unwrap().with_seed(11).build().unwrap();
        let b = GameBuilder::new(4).unwrap().with_seed(11).build().unwrap();
        let c = GameBuilder::new(4).unwrap().with_seed(12).build().unwrap();
        assert_eq!(a.state(), b.state());
        assert_ne!(a.state(), c.state());
    }

    #[test]
    fn out_of_turn_moves_are_rejected() {
        let mut game = GameBuilder::new(2).unwrap().build().unwrap();
        let err = game.apply_move(1, GameMove::End).unwrap_err();
        assert!(matches!(err, GameError::NotPlayersTurn));
    }

    #[test]
    fn bot_count_must_match_players() {
        let mut game = GameBuilder::new(3).unwrap().build().unwrap();
        let mut bots: Vec<Box<dyn Bot>> = vec![Box::new(EndImmediately)];
        assert!(matches!(
            game.step(&mut bots),
            Err(GameError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn forced_turn_leaves_live_turns_alone() {
        let mut game = GameBuilder::new(2).unwrap().build().unwrap();
        assert_eq!(game.forced_turn().unwrap(), None);
        game.apply_move(0, GameMove::End).unwrap();
        assert_eq!(game.forced_turn().unwrap(), None);
        assert_eq!(game.current_player(), 1);
    }

    #[test]
    fn turn_limit_aborts_the_round() {
        let mut game = GameBuilder::new(2)
            .unwrap()
            .with_max_turns(1)
            .build()
            .unwrap();
        game.apply_move(0, GameMove::Reveal { column: 0, row: 0 })
            .unwrap();
        let err = game
            .apply_move(1, GameMove::Reveal { column: 0, row: 0 })
            .unwrap_err();
        assert!(matches!(err, GameError::TurnLimit(1)));
    }
}
