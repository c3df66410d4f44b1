use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::Tensor;
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};

use crate::action::PlayerId;
use crate::state::RedactedGameState;

use super::encoding::{ActionSpace, STATE_FEATURES, StateEncoder};

pub const DEFAULT_HIDDEN: usize = 128;
pub const DEFAULT_STACK: usize = 2;
pub const DEFAULT_OUTPUT: usize = ActionSpace::MAX;

/// Shape of a [`PolicyNetwork`]; stored next to checkpoint weights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyShape {
    pub hidden: usize,
    pub depth: usize,
}

impl Default for PolicyShape {
    fn default() -> Self {
        Self {
            hidden: DEFAULT_HIDDEN,
            depth: DEFAULT_STACK,
        }
    }
}

/// Multi-layer perceptron scoring every move index for a vectorized view.
#[derive(Module, Debug)]
pub struct PolicyNetwork<B: Backend> {
    stack: Vec<Linear<B>>,
    output: Linear<B>,
}

impl<B> PolicyNetwork<B>
where
    B: Backend,
    B::Device: Default,
{
    pub fn new(hidden: usize, stack_depth: usize) -> Self {
        assert!(stack_depth > 0, "stack depth must be positive");
        let device = B::Device::default();
        let mut stack = Vec::with_capacity(stack_depth);
        let mut width = STATE_FEATURES;
        for _ in 0..stack_depth {
            stack.push(LinearConfig::new(width, hidden).init(&device));
            width = hidden;
        }
        let output = LinearConfig::new(width, ActionSpace::MAX).init(&device);
        Self { stack, output }
    }

    pub fn from_shape(shape: PolicyShape) -> Self {
        Self::new(shape.hidden, shape.depth)
    }

    pub fn with_default_shape() -> Self {
        Self::from_shape(PolicyShape::default())
    }

    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut activations = input;
        for layer in &self.stack {
            activations = relu(layer.forward(activations));
        }
        self.output.forward(activations)
    }

    /// Logits over [`ActionSpace`] for `player` looking at `state`.
    pub fn forward_state(&self, state: &RedactedGameState, player: PlayerId) -> Tensor<B, 1> {
        let batch = StateEncoder::encode_tensor::<B>(state, player);
        self.forward(batch).reshape([ActionSpace::MAX])
    }
}
