pub mod checkpoint;
pub mod encoding;
pub mod policy;
pub mod training;

pub use checkpoint::{CheckpointError, PolicyCheckpoint, PolicyMetadata};
pub use encoding::{ActionSpace, STATE_FEATURES, StateEncoder};
pub use policy::{DEFAULT_HIDDEN, DEFAULT_OUTPUT, DEFAULT_STACK, PolicyNetwork, PolicyShape};
pub use training::{
    EpochReport, FitConfig, OutcomeWeights, PolicyDataset, PolicySample, PolicyTrainer,
    RoundRecorder,
};
