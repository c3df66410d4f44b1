//! Imitation learning for [`PolicyNetwork`].
//!
//! A [`RoundRecorder`] follows one round decision by decision. Once the round
//! is over its decisions become [`PolicySample`]s weighted by how the deciding
//! seat finished, and a [`PolicyTrainer`] fits the network to them.

use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, LearningRate, Optimizer};
use burn::tensor::activation::log_softmax;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{Tensor, TensorData};
use rand::Rng;
use rand::seq::SliceRandom;

use super::encoding::{ActionSpace, STATE_FEATURES, StateEncoder};
use super::policy::PolicyNetwork;
use crate::action::{GameMove, PlayerId};
use crate::game::Game;
use crate::score::winners;
use crate::state::RedactedGameState;

/// Points behind the winner at which a losing seat's weight is halved.
const SCORE_GAP_HALVING: f32 = 10.0;

/// One decision: the encoded view, the legal-move mask, the move distribution
/// to imitate and how much the decision counts.
#[derive(Clone, Debug)]
pub struct PolicySample {
    pub state: [f32; STATE_FEATURES],
    pub mask: [f32; ActionSpace::MAX],
    pub target: [f32; ActionSpace::MAX],
    pub weight: f32,
}

impl PolicySample {
    /// `chosen` may list several moves; the target splits evenly between them.
    pub fn from_decision(
        view: &RedactedGameState,
        player: PlayerId,
        legal: &[GameMove],
        chosen: &[GameMove],
        weight: f32,
    ) -> Self {
        let indices: Vec<usize> = chosen.iter().filter_map(ActionSpace::action_index).collect();
        Self {
            state: StateEncoder::encode(view, player),
            mask: ActionSpace::mask(legal),
            target: ActionSpace::targets_from_indices(&indices),
            weight,
        }
    }

    fn is_usable(&self) -> bool {
        self.weight.is_finite() && self.weight > 0.0 && self.target.iter().any(|t| *t > 0.0)
    }
}

/// How much a recorded decision counts, by how its seat finished the round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutcomeWeights {
    /// Seats sharing the lowest final score.
    pub winner: f32,
    /// Every other seat, before the score-gap discount.
    pub runner: f32,
    /// Rounds cut off before play returned to the declarer.
    pub unfinished: f32,
}

impl Default for OutcomeWeights {
    fn default() -> Self {
        Self {
            winner: 2.0,
            runner: 1.0,
            unfinished: 0.5,
        }
    }
}

impl OutcomeWeights {
    /// Weight for `seat` given the round's final scores, or `None` when the
    /// round never finished. Losing seats lose weight the further they trail.
    pub fn weight_for(&self, seat: PlayerId, final_scores: Option<&[i32]>) -> f32 {
        let Some(scores) = final_scores else {
            return self.unfinished;
        };
        let best = winners(scores);
        if best.contains(&seat) {
            return self.winner;
        }
        let lowest = scores.iter().copied().min().unwrap_or_default();
        let gap = scores.get(seat).map_or(0, |score| score - lowest).max(0);
        self.runner / (1.0 + gap as f32 / SCORE_GAP_HALVING)
    }
}

/// Collects the decisions of one round until its outcome is known.
#[derive(Default)]
pub struct RoundRecorder {
    decisions: Vec<(PlayerId, PolicySample)>,
}

impl RoundRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// Records that `player`, looking at `view`, picked `chosen` out of `legal`.
    pub fn record(
        &mut self,
        view: &RedactedGameState,
        player: PlayerId,
        legal: &[GameMove],
        chosen: GameMove,
    ) {
        let sample = PolicySample::from_decision(view, player, legal, &[chosen], 1.0);
        self.decisions.push((player, sample));
    }

    /// Weights every decision by the final scores of `game` and moves them
    /// into `dataset`. Returns how many samples were kept.
    pub fn finish(
        self,
        game: &Game,
        weights: &OutcomeWeights,
        dataset: &mut PolicyDataset,
    ) -> usize {
        let scores = game.is_finished().then(|| game.scores());
        self.finish_with_scores(scores.as_deref(), weights, dataset)
    }

    pub fn finish_with_scores(
        self,
        final_scores: Option<&[i32]>,
        weights: &OutcomeWeights,
        dataset: &mut PolicyDataset,
    ) -> usize {
        let before = dataset.len();
        for (player, mut sample) in self.decisions {
            sample.weight = weights.weight_for(player, final_scores);
            dataset.push(sample);
        }
        dataset.len() - before
    }
}

/// Samples with a positive finite weight and a non-empty target.
#[derive(Clone, Debug, Default)]
pub struct PolicyDataset {
    samples: Vec<PolicySample>,
}

impl PolicyDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn total_weight(&self) -> f32 {
        self.samples.iter().map(|sample| sample.weight).sum()
    }

    /// Silently drops unusable samples.
    pub fn push(&mut self, sample: PolicySample) {
        if sample.is_usable() {
            self.samples.push(sample);
        }
    }

    /// Shuffles, then moves roughly `fraction` of the samples into a second
    /// set. Both halves keep at least one sample when there are two or more.
    pub fn hold_out(mut self, fraction: f32, rng: &mut impl Rng) -> (Self, Self) {
        let total = self.samples.len();
        if total < 2 || fraction.is_nan() || fraction <= 0.0 {
            return (self, Self::default());
        }
        self.samples.shuffle(rng);
        let held = ((total as f32 * fraction.min(0.9)).round() as usize).clamp(1, total - 1);
        let validation = Self {
            samples: self.samples.drain(..held).collect(),
        };
        (self, validation)
    }
}

/// Epoch and batch sizes for [`PolicyTrainer::fit`].
#[derive(Clone, Copy, Debug)]
pub struct FitConfig {
    pub epochs: usize,
    pub batch_size: usize,
}

#[derive(Clone, Debug)]
pub struct EpochReport {
    /// 1-based.
    pub epoch: usize,
    pub train_loss: f32,
    pub validation_loss: Option<f32>,
    pub batches: usize,
    pub samples: usize,
}

struct MiniBatch<B: AutodiffBackend> {
    states: Tensor<B, 2>,
    masks: Tensor<B, 2>,
    targets: Tensor<B, 2>,
    weights: Tensor<B, 2>,
    weight_sum: f32,
}

impl<B: AutodiffBackend> MiniBatch<B> {
    fn stack(samples: &[PolicySample]) -> Option<Self> {
        let weight_sum: f32 = samples.iter().map(|sample| sample.weight).sum();
        if samples.is_empty() || weight_sum <= 0.0 {
            return None;
        }
        let rows = samples.len();
        Some(Self {
            states: matrix(rows, STATE_FEATURES, samples.iter().flat_map(|s| s.state)),
            masks: matrix(rows, ActionSpace::MAX, samples.iter().flat_map(|s| s.mask)),
            targets: matrix(rows, ActionSpace::MAX, samples.iter().flat_map(|s| s.target)),
            weights: matrix(rows, 1, samples.iter().map(|s| s.weight)),
            weight_sum,
        })
    }

    /// Weight-summed cross-entropy of the masked policy against the targets.
    fn summed_loss(&self, model: &PolicyNetwork<B>) -> Tensor<B, 1> {
        let log_probs = log_softmax(model.forward(self.states.clone()) + self.masks.clone(), 1);
        let per_sample = (self.targets.clone() * log_probs).sum_dim(1).neg();
        (per_sample * self.weights.clone()).sum()
    }
}

fn matrix<B: AutodiffBackend>(
    rows: usize,
    width: usize,
    values: impl Iterator<Item = f32>,
) -> Tensor<B, 2> {
    let values: Vec<f32> = values.collect();
    Tensor::from_data(TensorData::new(values, [rows, width]), &B::Device::default())
}

fn scalar<B: AutodiffBackend>(tensor: Tensor<B, 1>) -> f32 {
    tensor
        .detach()
        .into_data()
        .to_vec::<f32>()
        .ok()
        .and_then(|values| values.first().copied())
        .unwrap_or_default()
}

/// Fits a [`PolicyNetwork`] to recorded decisions with Adam.
pub struct PolicyTrainer<B: AutodiffBackend> {
    model: PolicyNetwork<B>,
    optimizer: OptimizerAdaptor<Adam, PolicyNetwork<B>, B>,
    learning_rate: LearningRate,
    steps: usize,
}

impl<B: AutodiffBackend> PolicyTrainer<B> {
    pub fn new(model: PolicyNetwork<B>, learning_rate: LearningRate) -> Self {
        Self {
            model,
            optimizer: AdamConfig::new().init(),
            learning_rate,
            steps: 0,
        }
    }

    pub fn model(&self) -> &PolicyNetwork<B> {
        &self.model
    }

    /// Optimizer steps taken so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// One optimizer step on `samples`. Returns the weighted mean loss, or
    /// `None` when the slice carries no weight.
    pub fn train_on(&mut self, samples: &[PolicySample]) -> Option<f32> {
        let batch = MiniBatch::<B>::stack(samples)?;
        let loss = batch.summed_loss(&self.model).div_scalar(batch.weight_sum);
        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self
            .optimizer
            .step(self.learning_rate, self.model.clone(), grads);
        self.steps += 1;
        Some(scalar(loss))
    }

    /// Weighted mean loss over `dataset` without updating the model.
    pub fn evaluate(&self, dataset: &PolicyDataset, batch_size: usize) -> Option<f32> {
        let mut loss = 0.0;
        let mut weight = 0.0;
        for chunk in dataset.samples.chunks(batch_size.max(1)) {
            if let Some(batch) = MiniBatch::<B>::stack(chunk) {
                loss += scalar(batch.summed_loss(&self.model));
                weight += batch.weight_sum;
            }
        }
        (weight > 0.0).then(|| loss / weight)
    }

    pub fn fit(
        &mut self,
        train: &mut PolicyDataset,
        validation: Option<&PolicyDataset>,
        config: FitConfig,
        rng: &mut impl Rng,
    ) -> Vec<EpochReport> {
        self.fit_with(train, validation, config, rng, |_, _| true)
    }

    /// Like [`PolicyTrainer::fit`], handing the model and the report to
    /// `on_epoch` after every epoch. Stops early once it returns `false`.
    pub fn fit_with<F>(
        &mut self,
        train: &mut PolicyDataset,
        validation: Option<&PolicyDataset>,
        config: FitConfig,
        rng: &mut impl Rng,
        mut on_epoch: F,
    ) -> Vec<EpochReport>
    where
        F: FnMut(&PolicyNetwork<B>, &EpochReport) -> bool,
    {
        let batch_size = config.batch_size.max(1);
        let mut history = Vec::with_capacity(config.epochs);
        for epoch in 1..=config.epochs {
            train.samples.shuffle(rng);
            let mut report = EpochReport {
                epoch,
                train_loss: 0.0,
                validation_loss: None,
                batches: 0,
                samples: 0,
            };
            let mut weight = 0.0;
            for chunk in train.samples.chunks(batch_size) {
                let Some(loss) = self.train_on(chunk) else {
                    continue;
                };
                let chunk_weight: f32 = chunk.iter().map(|sample| sample.weight).sum();
                report.train_loss += loss * chunk_weight;
                weight += chunk_weight;
                report.batches += 1;
                report.samples += chunk.len();
            }
            if weight > 0.0 {
                report.train_loss /= weight;
            }
            report.validation_loss = validation.and_then(|set| self.evaluate(set, batch_size));
            tracing::debug!(
                epoch,
                train_loss = report.train_loss,
                validation_loss = ?report.validation_loss,
                steps = self.steps,
                "epoch finished"
            );
            let keep_going = on_epoch(&self.model, &report);
            history.push(report);
            if !keep_going {
                break;
            }
        }
        history
    }
}
