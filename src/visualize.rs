use std::fmt::Write;

use crate::action::{GameMove, PlayerId};
use crate::card::{COLUMNS, ROWS};
use crate::field::{CellState, Field, RedactedCell, RedactedField};
use crate::state::{GameState, RedactedGameState};

/// Customize state rendering for CLI visualization.
#[derive(Clone, Copy, Debug)]
pub struct VisualOptions {
    pub show_sums: bool,
    pub show_pile_sizes: bool,
}

impl Default for VisualOptions {
    fn default() -> Self {
        Self {
            show_sums: true,
            show_pile_sizes: true,
        }
    }
}

fn cell_token(cell: CellState) -> String {
    match cell {
        CellState::Gone => String::from("////"),
        CellState::Revealed(v) => format!("[{v:>2}]"),
        CellState::Unrevealed(v) => format!("{{{v:>2}}}"),
    }
}

fn redacted_token(cell: RedactedCell) -> String {
    match cell {
        RedactedCell::Gone => String::from("////"),
        RedactedCell::Revealed(v) => format!("[{v:>2}]"),
        RedactedCell::Unrevealed => String::from("****"),
    }
}

fn write_grid<F>(out: &mut String, indent: &str, token: F)
where
    F: Fn(usize, usize) -> String,
{
    for row in 0..ROWS {
        let line = (0..COLUMNS)
            .map(|column| token(column, row))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(out, "{indent}{line}");
    }
}

/// Grid of one field with every value shown, followed by its sum.
pub fn render_field(field: &Field) -> String {
    let mut out = String::new();
    write_grid(&mut out, "", |column, row| {
        field
            .cell(column, row)
            .map(cell_token)
            .unwrap_or_default()
    });
    let _ = writeln!(out, "sum: {}", field.sum());
    out
}

/// Grid of one field as an agent sees it. The sum covers revealed cards only.
pub fn render_redacted_field(field: &RedactedField) -> String {
    let mut out = String::new();
    write_grid(&mut out, "", |column, row| {
        field
            .cell(column, row)
            .map(redacted_token)
            .unwrap_or_default()
    });
    let _ = writeln!(out, "sum: {}", field.revealed_sum());
    out
}

pub fn render_state(state: &GameState) -> String {
    render_state_with_options(state, VisualOptions::default())
}

pub fn render_state_with_options(state: &GameState, options: VisualOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Middle card: {}", state.middle_card());
    if options.show_pile_sizes {
        let _ = writeln!(
            out,
            "Draw pile: {}  |  Discard pile: {}",
            state.stack().len(),
            state.off_stack().len()
        );
    }
    write_end_marker(&mut out, state.ends_at());
    for (player, field) in state.fields().iter().enumerate() {
        let _ = writeln!(out, "Player {player}:");
        write_grid(&mut out, "  ", |column, row| {
            field
                .cell(column, row)
                .map(cell_token)
                .unwrap_or_default()
        });
        if options.show_sums {
            let _ = writeln!(out, "  sum: {}", field.sum());
        }
    }
    out
}

/// Renders the redacted view, tagging `perspective` as the viewer.
pub fn render_redacted_state(state: &RedactedGameState, perspective: Option<PlayerId>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Middle card: {}", state.middle_card);
    write_end_marker(&mut out, state.ends_at);
    for (player, field) in state.fields.iter().enumerate() {
        let you = if perspective == Some(player) {
            " (You)"
        } else {
            ""
        };
        let _ = writeln!(out, "Player {player}{you}:");
        write_grid(&mut out, "  ", |column, row| {
            field
                .cell(column, row)
                .map(redacted_token)
                .unwrap_or_default()
        });
        let _ = writeln!(out, "  sum: {}", field.revealed_sum());
    }
    out
}

fn write_end_marker(out: &mut String, ends_at: Option<PlayerId>) {
    match ends_at {
        Some(player) => {
            let _ = writeln!(out, "Round ending (declared by player {player})");
        }
        None => {
            let _ = writeln!(out, "Round open");
        }
    }
}

pub fn describe_move(state: &RedactedGameState, player: PlayerId, game_move: &GameMove) -> String {
    let shown = |column: usize, row: usize| {
        state
            .field(player)
            .and_then(|field| field.cell(column, row))
            .map(redacted_token)
            .unwrap_or_else(|| String::from("--"))
    };
    match *game_move {
        GameMove::Reveal { column, row } => {
            format!("Reveal column {column} row {row}")
        }
        GameMove::SwapMiddle { column, row } => format!(
            "Swap middle card {} into column {column} row {row} {}",
            state.middle_card,
            shown(column, row)
        ),
        GameMove::DrawTo { column, row } => {
            format!("Draw into column {column} row {row} {}", shown(column, row))
        }
        GameMove::End => String::from("End the round"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameBuilder;
    use CellState::{Gone, Revealed, Unrevealed};

    fn sample_field() -> Field {
        let mut columns = [[Unrevealed(1); ROWS]; COLUMNS];
        columns[0] = [Revealed(5), Unrevealed(-2), Gone];
        columns[3] = [Revealed(12), Revealed(-1), Revealed(0)];
        Field::from_columns(columns)
    }

    #[test]
    fn field_dump_uses_fixed_width_tokens() {
        let text = render_field(&sample_field());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[ 5] { 1} { 1} [12]");
        assert_eq!(lines[1], "{-2} { 1} { 1} [-1]");
        assert_eq!(lines[2], "//// { 1} { 1} [ 0]");
        assert_eq!(lines[3], "sum: 20");
    }

    #[test]
    fn redacted_dump_masks_hidden_cards() {
        let text = render_redacted_field(&sample_field().redacted());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[ 5] **** **** [12]");
        assert_eq!(lines[2], "//// **** **** [ 0]");
        assert_eq!(lines[3], "sum: 16");
        assert!(!text.contains("{"));
    }

    #[test]
    fn render_and_describe_include_expected_phrases() {
        let game = GameBuilder::new(4).expect("builder").build().expect("game");
        let view = game.redacted_view();
        let text = render_redacted_state(&view, Some(0));
        assert!(text.contains("Player 0 (You)"));
        assert!(text.contains("Middle card:"));
        assert!(render_state(game.state()).contains("Draw pile: 101"));
        let desc = describe_move(&view, 0, &GameMove::SwapMiddle { column: 1, row: 2 });
        assert!(desc.contains("into column 1 row 2 ****"));
        assert_eq!(describe_move(&view, 0, &GameMove::End), "End the round");
    }
}
