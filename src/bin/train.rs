use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use burn::module::AutodiffModule;
use burn::optim::LearningRate;
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use burn_train::logger::{FileMetricLogger, MetricLogger};
use burn_train::metric::MetricEntry;
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use tracing_subscriber::EnvFilter;

use skyjobot::ml::{
    DEFAULT_HIDDEN, DEFAULT_STACK, EpochReport, FitConfig, OutcomeWeights, PolicyCheckpoint,
    PolicyDataset, PolicyMetadata, PolicyNetwork, PolicyShape, PolicyTrainer, RoundRecorder,
};
use skyjobot::{Bot, GameBuilder, GameError, GameMove, HeuristicBot, RandomBot};

type TrainBackend = Autodiff<NdArray<f32>>;

#[derive(Parser, Debug)]
#[command(about = "Train policy bots by imitating an expert bot", version, author)]
struct TrainArgs {
    /// Number of players per game during data collection.
    #[arg(long, default_value_t = 4)]
    players: usize,
    /// Number of games to collect.
    #[arg(long = "games", default_value_t = 512)]
    games: usize,
    /// Mini-batch size used during optimization.
    #[arg(long, default_value_t = 64)]
    batch_size: usize,
    /// Number of training epochs.
    #[arg(long, default_value_t = 20)]
    epochs: usize,
    /// Hidden layer width for the policy network.
    #[arg(long, default_value_t = DEFAULT_HIDDEN)]
    hidden: usize,
    /// Number of hidden layers (stack depth) for the policy network.
    #[arg(long, default_value_t = DEFAULT_STACK)]
    depth: usize,
    /// Learning rate passed to the Adam optimizer.
    #[arg(long, default_value_t = 1.0e-3)]
    learning_rate: f32,
    /// Fraction of the dataset to hold out for validation (0.0 - 0.5).
    #[arg(long, default_value_t = 0.1)]
    validation_split: f32,
    /// Directory where checkpoints and metric logs are written.
    #[arg(long, default_value = "checkpoints")]
    output: PathBuf,
    /// Probability of replacing the expert's move with a random legal move.
    #[arg(long, default_value_t = 0.05)]
    exploration: f32,
    /// Weight applied to moves made by a round winner.
    #[arg(long, default_value_t = 2.0)]
    winner_weight: f32,
    /// Weight applied to moves made by everyone else, shrinking as they trail the winner.
    #[arg(long, default_value_t = 1.0)]
    runner_weight: f32,
    /// Weight applied to moves from rounds cut off by --max-turns.
    #[arg(long, default_value_t = 0.5)]
    unfinished_weight: f32,
    /// Cap on moves per collected round.
    #[arg(long, default_value_t = 1000)]
    max_turns: usize,
    /// Master seed controlling reproducibility.
    #[arg(long, default_value_t = 0xA11C_E5EED_F00Du64)]
    seed: u64,
    /// Bot whose moves make up the training data.
    #[arg(long, value_enum, default_value_t = ExpertKind::Heuristic)]
    expert: ExpertKind,
    /// Early stopping patience (epochs without validation improvement).
    #[arg(long)]
    patience: Option<usize>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ExpertKind {
    Heuristic,
    Random,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = TrainArgs::parse();
    validate_args(&args)?;
    fs::create_dir_all(&args.output)?;

    let dataset = collect_dataset(&args)?;
    if dataset.is_empty() {
        return Err("data collection returned an empty dataset".into());
    }
    let total_samples = dataset.len();
    let mut rng = StdRng::seed_from_u64(args.seed ^ 0x5EED_B07);
    let (mut train_dataset, validation_raw) = dataset.hold_out(args.validation_split, &mut rng);
    let validation_dataset = (!validation_raw.is_empty()).then_some(validation_raw);
    let validation_samples = validation_dataset.as_ref().map_or(0, PolicyDataset::len);
    println!(
        "dataset split -> train: {} | validation: {} | total: {}",
        train_dataset.len(),
        validation_samples,
        total_samples,
    );

    let train_log_dir = args.output.join("train");
    let valid_log_dir = args.output.join("valid");
    fs::create_dir_all(&train_log_dir)?;
    fs::create_dir_all(&valid_log_dir)?;
    let mut train_logger = FileMetricLogger::new_train(&train_log_dir);
    let mut valid_logger = FileMetricLogger::new_eval(&valid_log_dir);

    let shape = PolicyShape {
        hidden: args.hidden,
        depth: args.depth,
    };
    let model = PolicyNetwork::<TrainBackend>::from_shape(shape);
    let learning_rate: LearningRate = args.learning_rate as f64;
    let mut trainer = PolicyTrainer::new(model, learning_rate);
    let loop_config = FitConfig {
        epochs: args.epochs,
        batch_size: args.batch_size,
    };
    let train_samples = train_dataset.len();
    let metadata_for = |metrics: &EpochReport, best: Option<f32>| PolicyMetadata {
        shape,
        learning_rate: args.learning_rate,
        epochs: metrics.epoch,
        batch_size: args.batch_size,
        players: args.players,
        games: args.games,
        seed: args.seed,
        train_samples,
        validation_samples,
        final_train_loss: metrics.train_loss,
        final_validation_loss: metrics.validation_loss,
        best_validation_loss: best,
    };

    let best_path = args.output.join("policy-best.bin");
    let mut best_validation: Option<f32> = None;
    let mut epochs_without_improvement = 0usize;
    let mut checkpoint_error: Option<Box<dyn Error>> = None;
    let mut training_rng = StdRng::seed_from_u64(args.seed ^ 0x9E37_79B9);
    let history = trainer.fit_with(
        &mut train_dataset,
        validation_dataset.as_ref(),
        loop_config,
        &mut training_rng,
        |model, metrics| {
            train_logger.log(&loss_entry(metrics.train_loss, metrics.samples));
            train_logger.end_epoch(metrics.epoch);
            println!(
                "epoch {:>3}: train loss {:.5} | validation loss {}",
                metrics.epoch,
                metrics.train_loss,
                metrics
                    .validation_loss
                    .map_or_else(|| String::from("n/a"), |loss| format!("{loss:.5}"))
            );
            let Some(validation_loss) = metrics.validation_loss else {
                return true;
            };
            valid_logger.log(&loss_entry(validation_loss, validation_samples));
            valid_logger.end_epoch(metrics.epoch);
            if best_validation.is_none_or(|best| validation_loss < best) {
                best_validation = Some(validation_loss);
                epochs_without_improvement = 0;
                let saved = PolicyCheckpoint::capture(
                    &model.valid(),
                    metadata_for(metrics, best_validation),
                )
                .and_then(|checkpoint| checkpoint.save(&best_path));
                if let Err(err) = saved {
                    checkpoint_error = Some(Box::new(err));
                    return false;
                }
                return true;
            }
            epochs_without_improvement += 1;
            args.patience
                .is_none_or(|patience| epochs_without_improvement < patience)
        },
    );
    if let Some(err) = checkpoint_error {
        return Err(err);
    }
    if best_validation.is_some() {
        println!("best checkpoint -> {}", display_path(&best_path));
    }

    let last = history.last().ok_or("training ran zero epochs")?;
    let checkpoint =
        PolicyCheckpoint::capture(&trainer.model().valid(), metadata_for(last, best_validation))?;
    let path = args.output.join("policy.bin");
    checkpoint.save(&path)?;
    println!(
        "checkpoint saved after {} optimizer steps -> {}",
        trainer.steps(),
        display_path(&path)
    );
    Ok(())
}

fn loss_entry(loss: f32, samples: usize) -> MetricEntry {
    MetricEntry::new(
        "Loss".to_string().into(),
        format!("{loss:.6} (samples {samples})"),
        format!("{:.8},{}", loss as f64, samples),
    )
}

fn validate_args(args: &TrainArgs) -> Result<(), Box<dyn Error>> {
    if !(2..=8).contains(&args.players) {
        return Err("players must be between 2 and 8".into());
    }
    if args.games == 0 {
        return Err("games must be positive".into());
    }
    if args.batch_size == 0 {
        return Err("batch size must be positive".into());
    }
    if args.hidden == 0 || args.depth == 0 {
        return Err("hidden width and depth must be positive".into());
    }
    if args.epochs == 0 {
        return Err("epochs must be positive".into());
    }
    if !(0.0..=0.5).contains(&args.validation_split) {
        return Err("validation split must be in [0, 0.5]".into());
    }
    if !(0.0..=1.0).contains(&args.exploration) {
        return Err("exploration rate must be between 0 and 1".into());
    }
    if args.learning_rate <= 0.0 {
        return Err("learning rate must be positive".into());
    }
    Ok(())
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn collect_dataset(args: &TrainArgs) -> Result<PolicyDataset, GameError> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let weights = OutcomeWeights {
        winner: args.winner_weight,
        runner: args.runner_weight,
        unfinished: args.unfinished_weight,
    };
    let mut dataset = PolicyDataset::new();
    for game_index in 0..args.games {
        let mut game = GameBuilder::new(args.players)?
            .with_seed(rng.next_u64())
            .build()?;
        let mut bots = build_expert_bots(args.expert, args.players, &mut rng);
        let mut recorder = RoundRecorder::new();
        while !game.is_finished() && game.turns() < args.max_turns {
            if game.forced_turn()?.is_some() {
                continue;
            }
            let current = game.current_player();
            let view = game.redacted_view();
            let legal = game.legal_moves(current)?;
            let game_move = if rng.gen_range(0.0..1.0) < args.exploration {
                legal.choose(&mut rng).copied().unwrap_or(GameMove::End)
            } else {
                bots[current].select_move(&view, current)
            };
            recorder.record(&view, current, &legal, game_move);
            game.apply_move(current, game_move)?;
        }
        recorder.finish(&game, &weights, &mut dataset);
        if (game_index + 1) % 50 == 0 {
            tracing::info!(
                games = game_index + 1,
                samples = dataset.len(),
                weight = dataset.total_weight(),
                "collecting expert games"
            );
        }
    }
    Ok(dataset)
}

fn build_expert_bots(kind: ExpertKind, count: usize, rng: &mut StdRng) -> Vec<Box<dyn Bot>> {
    (0..count)
        .map(|_| match kind {
            ExpertKind::Heuristic => Box::new(HeuristicBot::new()) as Box<dyn Bot>,
            ExpertKind::Random => {
                Box::new(RandomBot::new(StdRng::seed_from_u64(rng.next_u64()))) as Box<dyn Bot>
            }
        })
        .collect()
}
