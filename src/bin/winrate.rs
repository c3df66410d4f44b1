use std::collections::BTreeMap;
use std::error::Error;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use clap::{ArgAction, Parser};
use plotters::prelude::*;
use tracing_subscriber::EnvFilter;

use skyjobot::{
    BatchConfig, ClearingReveal, GameError, create_bot_from_spec, label_for_spec, run_batch,
};

/// Default base seed for deterministic runs.
const DEFAULT_SEED: u64 = 0xC0FFEE_u64 << 32 | 0x5EED_u64;

#[derive(Parser, Debug)]
#[command(
    name = "winrate",
    about = "Run many rounds in parallel and compare bots by score and win share."
)]
struct Args {
    /// Number of rounds to simulate
    #[arg(short = 'g', long = "games", default_value_t = 200)]
    games: usize,

    /// Base RNG seed (deck and bot RNGs are derived deterministically)
    #[arg(short = 's', long = "seed", default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Output chart file (png)
    #[arg(short = 'o', long = "out", default_value = "winrates.png")]
    out: PathBuf,

    /// Show a textual summary only (no chart)
    #[arg(long = "no-chart", action = ArgAction::SetTrue)]
    no_chart: bool,

    /// Safety cap on moves per round; capped rounds are reported as aborted
    #[arg(long = "max-turns", default_value_t = 2000)]
    max_turns: usize,

    /// Worker threads (defaults to the available parallelism)
    #[arg(short = 'j', long = "workers")]
    workers: Option<NonZeroUsize>,

    /// Drop the previous middle card when a reveal clears a column
    #[arg(long = "drop-middle", action = ArgAction::SetTrue)]
    drop_middle: bool,

    /// Player bot specs: e.g., heuristic random (2-8 total)
    bots: Vec<String>,
}

#[derive(Default)]
struct LabelStats {
    seats: usize,
    wins: f64,
    total_score: i64,
}

impl LabelStats {
    fn mean_score(&self) -> f64 {
        if self.seats == 0 {
            0.0
        } else {
            self.total_score as f64 / self.seats as f64
        }
    }

    fn win_share(&self) -> f64 {
        if self.seats == 0 {
            0.0
        } else {
            self.wins / self.seats as f64
        }
    }
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
    if args.bots.len() < 2 || args.bots.len() > 8 {
        return Err(format!(
            "expected between 2 and 8 bot specs (e.g., heuristic random), received {}",
            args.bots.len()
        )
        .into());
    }
    // A human seat would block the workers waiting for input.
    if args.bots.iter().any(|spec| label_for_spec(spec) == "human") {
        return Err("human players are not supported in winrate runs".into());
    }
    // Surface bad specs with their real message before any worker starts.
    for (index, spec) in args.bots.iter().enumerate() {
        create_bot_from_spec(spec, index, args.seed)?;
    }

    let players = args.bots.len();
    let labels: Vec<String> = args.bots.iter().map(|spec| label_for_spec(spec)).collect();
    // Rotate seating each round so no spec keeps the first-mover seat.
    let spec_for = |game: usize, seat: usize| (seat + game) % players;

    let config = BatchConfig {
        games: args.games,
        num_players: players,
        seed: args.seed,
        max_turns: Some(args.max_turns),
        clearing_reveal: if args.drop_middle {
            ClearingReveal::DropMiddle
        } else {
            ClearingReveal::DiscardMiddle
        },
        workers: args.workers,
    };
    let specs = &args.bots;
    let started = Instant::now();
    let results = run_batch(&config, &|game, seat, seed| {
        create_bot_from_spec(&specs[spec_for(game, seat)], seat, seed)
            .map_err(|_| GameError::InvalidConfiguration("bot spec failed to load"))
    });
    let elapsed = started.elapsed();

    let mut stats: BTreeMap<String, LabelStats> = BTreeMap::new();
    let mut aborted = 0usize;
    let mut total_turns = 0usize;
    for (game, result) in results.iter().enumerate() {
        let summary = match result {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!(game, %err, "round aborted");
                aborted += 1;
                continue;
            }
        };
        total_turns += summary.turns;
        let best = summary.winners();
        for (seat, score) in summary.scores.iter().enumerate() {
            let entry = stats
                .entry(labels[spec_for(game, seat)].clone())
                .or_default();
            entry.seats += 1;
            entry.total_score += i64::from(*score);
            if best.contains(&seat) {
                entry.wins += 1.0 / best.len() as f64;
            }
        }
    }

    let mut rows: Vec<(String, f64, f64, usize)> = stats
        .iter()
        .map(|(label, entry)| (label.clone(), entry.mean_score(), entry.win_share(), entry.seats))
        .collect();
    // Lower scores are better.
    rows.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    println!("Results over {} rounds ({:.2?}):", args.games, elapsed);
    for (label, mean, share, seats) in &rows {
        println!(
            "  {label:<12}  seats: {seats:<6}  mean score: {mean:>7.2}  win share: {:>6.2}%",
            share * 100.0
        );
    }
    let finished = args.games - aborted;
    if finished > 0 {
        println!(
            "\nAverage moves per round: {:.1}",
            total_turns as f64 / finished as f64
        );
    }
    if aborted > 0 {
        println!("Note: {aborted} round(s) aborted (turn cap or rule error).");
    }

    if !args.no_chart && !rows.is_empty() {
        if args
            .out
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| !ext.eq_ignore_ascii_case("png"))
            .unwrap_or(true)
        {
            return Err("only PNG output is supported; use --out with .png".into());
        }
        render_bar_chart(&args.out, &rows)?;
        println!("\nChart written to {}", args.out.display());
    }
    Ok(())
}

fn render_bar_chart(out: &Path, rows: &[(String, f64, f64, usize)]) -> Result<(), Box<dyn Error>> {
    let labels: Vec<String> = rows.iter().map(|(label, ..)| label.clone()).collect();
    let values: Vec<f64> = rows.iter().map(|(_, mean, ..)| *mean).collect();
    let low = values.iter().copied().fold(0.0_f64, f64::min) - 5.0;
    let high = values.iter().copied().fold(0.0_f64, f64::max) + 5.0;

    let root = BitMapBackend::new(out, (1000, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| format!("{e}"))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Mean round score per bot (lower is better)", ("sans-serif", 28).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0..labels.len(), low..high)
        .map_err(|e| format!("{e}"))?;

    chart
        .configure_mesh()
        .y_desc("Mean score")
        .x_desc("Bot type")
        .x_labels(labels.len())
        .x_label_formatter(&|idx| labels.get(*idx).cloned().unwrap_or_default())
        .y_label_formatter(&|v| format!("{v:.0}"))
        .light_line_style(&WHITE.mix(0.0))
        .draw()
        .map_err(|e| format!("{e}"))?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, value)| {
            Rectangle::new([(i, 0.0), (i + 1, *value)], BLUE.mix(0.7).filled())
        }))
        .map_err(|e| format!("{e}"))?;

    root.present().map_err(|e| format!("{e}"))?;
    Ok(())
}
