use burn::module::AutodiffModule;
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use rand::SeedableRng;
use rand::rngs::StdRng;

use skyjobot::ml::{
    ActionSpace, FitConfig, OutcomeWeights, PolicyCheckpoint, PolicyDataset, PolicyMetadata,
    PolicyNetwork, PolicyShape, PolicyTrainer, RoundRecorder, STATE_FEATURES, StateEncoder,
};
use skyjobot::{Bot, GameBuilder, HeuristicBot, PolicyBot};

type Backend = NdArray<f32>;
type TrainBackend = Autodiff<NdArray<f32>>;

#[test]
fn encoder_outputs_expected_length() {
    let game = GameBuilder::new(2).expect("builder").build().expect("game");
    let encoded = StateEncoder::encode(&game.redacted_view(), 0);
    assert_eq!(encoded.len(), STATE_FEATURES);
}

#[test]
fn policy_bot_returns_legal_move() {
    let game = GameBuilder::new(3).expect("builder").build().expect("game");
    let view = game.redacted_view();
    let mut bot = PolicyBot::<Backend>::new(PolicyNetwork::<Backend>::with_default_shape());
    let legal = view.legal_moves(0);
    let chosen = bot.select_move(&view, 0);
    assert!(legal.contains(&chosen));
    let index = ActionSpace::action_index(&chosen).expect("mapped index");
    assert!(index < ActionSpace::MAX);
}

#[test]
fn trained_checkpoint_drives_a_full_round() {
    let mut game = GameBuilder::new(2)
        .expect("builder")
        .with_seed(21)
        .with_max_turns(400)
        .build()
        .expect("game");
    let mut expert = HeuristicBot::new();
    let mut recorder = RoundRecorder::new();
    while !game.is_finished() && game.turns() < 24 {
        if game.forced_turn().expect("round in progress").is_some() {
            continue;
        }
        let player = game.current_player();
        let view = game.redacted_view();
        let legal = view.legal_moves(player);
        let chosen = expert.select_move(&view, player);
        recorder.record(&view, player, &legal, chosen);
        game.apply_move(player, chosen).expect("heuristic move is legal");
    }
    let recorded = recorder.len();
    let mut dataset = PolicyDataset::new();
    assert_eq!(
        recorder.finish(&game, &OutcomeWeights::default(), &mut dataset),
        recorded
    );
    assert!(!dataset.is_empty());

    let shape = PolicyShape { hidden: 16, depth: 1 };
    let mut trainer =
        PolicyTrainer::new(PolicyNetwork::<TrainBackend>::from_shape(shape), 1.0e-2);
    let history = trainer.fit(
        &mut dataset,
        None,
        FitConfig {
            epochs: 3,
            batch_size: 4,
        },
        &mut StdRng::seed_from_u64(1),
    );
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|epoch| epoch.train_loss.is_finite()));

    let metadata = PolicyMetadata {
        shape,
        learning_rate: 1.0e-2,
        epochs: 3,
        batch_size: 4,
        players: 2,
        games: 1,
        seed: 21,
        train_samples: dataset.len(),
        validation_samples: 0,
        final_train_loss: history[2].train_loss,
        final_validation_loss: None,
        best_validation_loss: None,
    };
    let checkpoint =
        PolicyCheckpoint::capture(&trainer.model().valid(), metadata).expect("capture");
    let bytes = checkpoint.to_bytes().expect("encode");
    let restored = PolicyCheckpoint::from_bytes(&bytes)
        .expect("decode")
        .restore::<Backend>()
        .expect("restore");

    let mut fresh = GameBuilder::new(2)
        .expect("builder")
        .with_seed(5)
        .with_max_turns(500)
        .build()
        .expect("game");
    let mut bots: Vec<Box<dyn Bot>> = vec![
        Box::new(PolicyBot::new(restored)),
        Box::new(HeuristicBot::new()),
    ];
    match fresh.run(&mut bots) {
        Ok(scores) => assert_eq!(scores.len(), 2),
        // An undertrained policy may stall; it must still never play an illegal move.
        Err(err) => assert!(matches!(err, skyjobot::GameError::TurnLimit(500)), "{err}"),
    }
}
