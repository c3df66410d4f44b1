use std::fs;
use std::path::Path;

use burn::module::Module;
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder, RecorderError};
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::policy::{PolicyNetwork, PolicyShape};

type PolicyRecord<B> = <PolicyNetwork<B> as Module<B>>::Record;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode checkpoint: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to decode checkpoint: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("weights record error: {0}")]
    Record(#[from] RecorderError),
    #[error("invalid policy shape: hidden {hidden}, depth {depth}")]
    InvalidShape { hidden: usize, depth: usize },
}

/// How a checkpointed policy was produced.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PolicyMetadata {
    pub shape: PolicyShape,
    pub learning_rate: f32,
    pub epochs: usize,
    pub batch_size: usize,
    pub players: usize,
    pub games: usize,
    pub seed: u64,
    pub train_samples: usize,
    pub validation_samples: usize,
    pub final_train_loss: f32,
    pub final_validation_loss: Option<f32>,
    pub best_validation_loss: Option<f32>,
}

/// Network weights plus metadata, serialized with bincode.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyCheckpoint {
    pub metadata: PolicyMetadata,
    pub weights: Vec<u8>,
}

impl PolicyCheckpoint {
    pub fn capture<B>(
        model: &PolicyNetwork<B>,
        metadata: PolicyMetadata,
    ) -> Result<Self, CheckpointError>
    where
        B: Backend,
    {
        let record: PolicyRecord<B> = model.clone().into_record();
        let weights = BinBytesRecorder::<FullPrecisionSettings>::new().record(record, ())?;
        Ok(Self { metadata, weights })
    }

    /// Rebuilds the network on the default device of `B`.
    pub fn restore<B>(&self) -> Result<PolicyNetwork<B>, CheckpointError>
    where
        B: Backend,
        B::Device: Default,
    {
        let PolicyShape { hidden, depth } = self.metadata.shape;
        if hidden == 0 || depth == 0 {
            return Err(CheckpointError::InvalidShape { hidden, depth });
        }
        let device = B::Device::default();
        let record = BinBytesRecorder::<FullPrecisionSettings>::new()
            .load::<PolicyRecord<B>>(self.weights.clone(), &device)?;
        Ok(PolicyNetwork::<B>::from_shape(self.metadata.shape).load_record(record))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        Ok(bincode::serde::encode_to_vec(
            self,
            bincode::config::standard(),
        )?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let (checkpoint, _): (PolicyCheckpoint, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(checkpoint)
    }

    pub fn save(&self, path: &Path) -> Result<(), CheckpointError> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        Self::from_bytes(&fs::read(path)?)
    }
}
