use std::io::{self, Write};

use crate::action::{GameMove, PlayerId};
use crate::bot::Bot;
use crate::state::RedactedGameState;
use crate::visualize::{describe_move, render_redacted_state};

/// Interactive bot that queries a human via standard input.
pub struct HumanBot {
    name: String,
}

impl HumanBot {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for HumanBot {
    fn default() -> Self {
        Self::new("Human")
    }
}

impl Bot for HumanBot {
    fn select_move(&mut self, state: &RedactedGameState, player: PlayerId) -> GameMove {
        let legal = state.legal_moves(player);
        if legal.is_empty() {
            return GameMove::End;
        }
        loop {
            println!("\n=== {}'s turn (player {player}) ===", self.name);
            println!("{}", render_redacted_state(state, Some(player)));
            println!("Available moves:");
            for (index, game_move) in legal.iter().enumerate() {
                println!("  [{index}] {}", describe_move(state, player, game_move));
            }
            println!("Type the move index, 'help' or 'q' to quit.");
            print!("Selection: ");
            if io::stdout().flush().is_err() {
                eprintln!("failed to flush stdout");
            }
            let mut input = String::new();
            if io::stdin().read_line(&mut input).is_err() {
                eprintln!("failed to read input");
                continue;
            }
            let trimmed = input.trim();
            if trimmed.eq_ignore_ascii_case("q") || trimmed.eq_ignore_ascii_case("quit") {
                println!("Exiting game at user's request.");
                std::process::exit(0);
            }
            if trimmed.eq_ignore_ascii_case("help") {
                println!("Cells read [ N] face-up, **** face-down, //// cleared.");
                println!("Columns run left to right from 0, rows top to bottom from 0.");
                continue;
            }
            let Ok(choice) = trimmed.parse::<usize>() else {
                println!("Invalid input: '{trimmed}'. Please enter a number.");
                continue;
            };
            if let Some(game_move) = legal.get(choice).copied() {
                println!("You selected: {}", describe_move(state, player, &game_move));
                return game_move;
            }
            println!("Index out of range. Please choose a valid option.");
        }
    }
}
