use std::num::NonZeroUsize;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::action::PlayerId;
use crate::bot::Bot;
use crate::card::DEFAULT_PLAYERS;
use crate::error::GameError;
use crate::game::GameBuilder;
use crate::score::winners;
use crate::state::ClearingReveal;

const DECK_STREAM: u64 = 0x5EED_15;

/// Builds the bot for `seat` in game number `game`, seeded with `seed`.
///
/// Called on the worker thread that plays the game, so bots never cross threads.
pub type BotFactory<'a> =
    dyn Fn(usize, PlayerId, u64) -> Result<Box<dyn Bot>, GameError> + Sync + 'a;

/// Settings shared by every game in a batch.
#[derive(Clone, Copy, Debug)]
pub struct BatchConfig {
    pub games: usize,
    pub num_players: usize,
    pub seed: u64,
    pub max_turns: Option<usize>,
    pub clearing_reveal: ClearingReveal,
    /// Worker threads; `None` uses the available parallelism.
    pub workers: Option<NonZeroUsize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            games: 100,
            num_players: DEFAULT_PLAYERS,
            seed: 0xC0FF_EE00_5EED,
            max_turns: Some(2_000),
            clearing_reveal: ClearingReveal::default(),
            workers: None,
        }
    }
}

/// Outcome of one finished game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub game: usize,
    pub seed: u64,
    pub scores: Vec<i32>,
    pub turns: usize,
    pub ended_by: Option<PlayerId>,
}

impl GameSummary {
    pub fn winners(&self) -> Vec<PlayerId> {
        winners(&self.scores)
    }
}

/// Derives a seed for stream `b` of item `a` from a base seed.
pub fn mix_seed(base: u64, a: u64, b: u64) -> u64 {
    let mut z = base ^ a.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ b.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z ^= z >> 12;
    z ^= z << 25;
    z ^= z >> 27;
    z
}

/// Plays `config.games` independent games across scoped worker threads.
///
/// Results come back in game order. A failing game yields its error without
/// affecting the others.
pub fn run_batch(
    config: &BatchConfig,
    factory: &BotFactory<'_>,
) -> Vec<Result<GameSummary, GameError>> {
    let workers = config
        .workers
        .or_else(|| thread::available_parallelism().ok())
        .map_or(1, NonZeroUsize::get)
        .min(config.games.max(1));
    tracing::debug!(games = config.games, workers, "starting batch");

    let mut results: Vec<(usize, Result<GameSummary, GameError>)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                scope.spawn(move || {
                    (worker..config.games)
                        .step_by(workers)
                        .map(|game| (game, play_one(config, game, factory)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(chunk) => chunk,
                Err(payload) => std::panic::resume_unwind(payload),
            })
            .collect()
    });
    results.sort_by_key(|(game, _)| *game);
    results.into_iter().map(|(_, result)| result).collect()
}

fn play_one(
    config: &BatchConfig,
    game_index: usize,
    factory: &BotFactory<'_>,
) -> Result<GameSummary, GameError> {
    let seed = mix_seed(config.seed, game_index as u64, DECK_STREAM);
    let mut builder = GameBuilder::new(config.num_players)?
        .with_seed(seed)
        .with_clearing_reveal(config.clearing_reveal);
    if let Some(limit) = config.max_turns {
        builder = builder.with_max_turns(limit);
    }
    let mut game = builder.build()?;
    let mut bots = (0..config.num_players)
        .map(|seat| factory(game_index, seat, mix_seed(config.seed, game_index as u64, seat as u64)))
        .collect::<Result<Vec<_>, _>>()?;
    let scores = game.run(&mut bots)?;
    Ok(GameSummary {
        game: game_index,
        seed,
        scores,
        turns: game.turns(),
        ended_by: game.state().ends_at(),
    })
}
