use std::error::Error;
use std::process;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use skyjobot::{
    Bot, ClearingReveal, Game, TurnOutcome, create_bot_from_spec, describe_move, render_state,
    winners,
};

const DEFAULT_SEED: u64 = 0xDEC0_1DED_5EED_F00D;

#[derive(Parser, Debug)]
#[command(name = "simulate", about = "Play a single round with the chosen bots.")]
struct Args {
    /// Show the full table and every chosen move
    #[arg(long = "visualize", action = ArgAction::SetTrue)]
    visualize: bool,

    /// Seed for shuffling
    #[arg(short = 's', long = "seed", default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Abort the round after this many moves
    #[arg(long = "max-turns")]
    max_turns: Option<usize>,

    /// Drop the previous middle card when a reveal clears a column
    #[arg(long = "drop-middle", action = ArgAction::SetTrue)]
    drop_middle: bool,

    /// Player bot specs, 2 to 8 of: human[:name] random[:seed] heuristic scripted end policy[:path]
    #[arg(default_values_t = [String::from("human"), String::from("heuristic")])]
    bots: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let num_players = args.bots.len();
    let clearing_reveal = if args.drop_middle {
        ClearingReveal::DropMiddle
    } else {
        ClearingReveal::DiscardMiddle
    };
    let mut builder = Game::builder(num_players)?
        .with_seed(args.seed)
        .with_clearing_reveal(clearing_reveal);
    if let Some(limit) = args.max_turns {
        builder = builder.with_max_turns(limit);
    }
    let mut game = builder.build()?;

    let mut bots: Vec<Box<dyn Bot>> = Vec::with_capacity(num_players);
    for (index, spec) in args.bots.iter().enumerate() {
        bots.push(create_bot_from_spec(spec, index, args.seed)?);
    }

    println!("Starting round with {num_players} players.\n");
    loop {
        let before = game.redacted_view();
        if args.visualize {
            println!("{}", render_state(game.state()));
        }
        match game.step(&mut bots)? {
            TurnOutcome::Moved { player, game_move } if args.visualize => {
                println!("Chosen move: {}\n", describe_move(&before, player, &game_move));
            }
            TurnOutcome::Moved { .. } => {}
            TurnOutcome::Passed { player } if args.visualize => {
                println!("Player {player} has no cards left and passes.\n");
            }
            TurnOutcome::Passed { .. } => {}
            TurnOutcome::Skipped { player } => {
                println!("Play is back with player {player}, who declared the end.\n");
                break;
            }
        }
    }

    println!("{}", render_state(game.state()));
    let scores = game.scores();
    for (player, score) in scores.iter().enumerate() {
        println!("Player {player}: {score}");
    }
    let best = winners(&scores);
    println!("Round finished after {} moves. Winner(s): {best:?}", game.turns());
    Ok(())
}
