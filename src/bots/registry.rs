use std::error::Error;
use std::path::Path;

use burn_ndarray::NdArray;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::bot::Bot;
use crate::bots::{HeuristicBot, HumanBot, PolicyBot, RandomBot, ScriptedBot};
use crate::ml::{PolicyCheckpoint, PolicyNetwork};

type InferenceBackend = NdArray<f32>;

/// Returns a normalized label for a bot spec (the head token before any ':').
pub fn label_for_spec(spec: &str) -> String {
    spec.split(':')
        .next()
        .unwrap_or(spec)
        .trim()
        .to_ascii_lowercase()
}

/// Create a bot instance from a CLI-style spec.
/// Supported specs:
/// - human[:name]
/// - random[:seed]
/// - heuristic
/// - scripted (reveal every cell, then end)
/// - end (declare the end on the first turn)
/// - policy[:checkpoint.bin] (untrained network when no path is given)
pub fn create_bot_from_spec(
    spec: &str,
    index: usize,
    seed: u64,
) -> Result<Box<dyn Bot>, Box<dyn Error>> {
    let argument = spec.split_once(':').map(|(_, value)| value.trim());
    match label_for_spec(spec).as_str() {
        "human" => {
            let name = argument
                .map(str::to_string)
                .unwrap_or_else(|| format!("Human {index}"));
            Ok(Box::new(HumanBot::new(name)))
        }
        "random" => {
            let custom_seed = argument
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(seed ^ ((index as u64 + 1) * 0x9E37_79B9));
            Ok(Box::new(RandomBot::new(StdRng::seed_from_u64(custom_seed))))
        }
        "heuristic" => Ok(Box::new(HeuristicBot::new())),
        "scripted" => Ok(Box::new(ScriptedBot::reveal_then_end())),
        "end" => Ok(Box::new(ScriptedBot::end_immediately())),
        "policy" => {
            let network = match argument {
                Some(path) => PolicyCheckpoint::load(Path::new(path))?.restore::<InferenceBackend>()?,
                None => PolicyNetwork::<InferenceBackend>::with_default_shape(),
            };
            Ok(Box::new(PolicyBot::new(network)))
        }
        _ => Err(format!("unrecognized bot spec: {spec}").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_drop_arguments() {
        assert_eq!(label_for_spec("Random:42"), "random");
        assert_eq!(label_for_spec(" heuristic "), "heuristic");
    }

    #[test]
    fn known_specs_build() {
        for spec in ["random", "random:3", "heuristic", "scripted", "end", "human:Ada"] {
            assert!(create_bot_from_spec(spec, 0, 1).is_ok(), "{spec}");
        }
        assert!(create_bot_from_spec("oracle", 0, 1).is_err());
        assert!(create_bot_from_spec("policy:/nonexistent/checkpoint.bin", 0, 1).is_err());
    }
}
