use serde::{Deserialize, Serialize};

use super::common::Settings;
use super::error::NeatError;
use super::genome::Genome;
use super::network::Network;

/// Standalone inference wrapper around one decoded network. This is the
/// surface a host embeds per in-game agent: build it once from a genome
/// (typically an exported, pruned champion), then call `evaluate` every
/// simulation tick. It carries no evolutionary state and is cheap to clone.
#[derive(Clone, Serialize, Deserialize)]
pub struct NetworkAgent {
    network: Network,
}

impl NetworkAgent {
    pub fn from_genome(genome: &Genome, settings: &Settings) -> Result<NetworkAgent, NeatError> {
        settings.validate()?;
        Ok(NetworkAgent {
            network: Network::from_genome(genome, settings),
        })
    }

    /// Fails with `DimensionMismatch` if the input length does not match the
    /// genome's sensor count.
    pub fn evaluate(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NeatError> {
        self.network.activate(inputs)
    }

    pub fn n_inputs(&self) -> usize {
        self.network.n_inputs()
    }

    pub fn n_outputs(&self) -> usize {
        self.network.n_outputs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neat::activation::Activation;
    use crate::neat::genome::{Gene, GeneExt};
    use assert_approx_eq::assert_approx_eq;

    fn sample_agent() -> NetworkAgent {
        let genome = Genome::create(
            vec![
                Gene::create(0, 3, 0.5, 0, true),
                Gene::create(1, 3, 1.5, 1, true),
                Gene::create(2, 3, -0.5, 2, true),
            ],
            2,
            1,
            Activation::Identity,
            Activation::Identity,
        );
        let mut settings = Settings::standard(2, 1);
        settings.n_propagation_steps = 1;
        settings.output_activation = Activation::Identity;
        NetworkAgent::from_genome(&genome, &settings).unwrap()
    }

    #[test]
    fn evaluates_decoded_genome() {
        let mut agent = sample_agent();
        assert_eq!(agent.n_inputs(), 2);
        assert_eq!(agent.n_outputs(), 1);
        let output = agent.evaluate(&[2.0, 1.0]).unwrap();
        assert_approx_eq!(output[0], 1.0 + 1.5 - 0.5);
    }

    #[test]
    fn rejects_wrong_input_length() {
        let mut agent = sample_agent();
        assert!(matches!(
            agent.evaluate(&[1.0, 2.0, 3.0]),
            Err(NeatError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn rejects_invalid_settings() {
        let genome = Genome::create(
            vec![Gene::create(0, 2, 0.5, 0, true)],
            1,
            1,
            Activation::Identity,
            Activation::Identity,
        );
        let mut settings = Settings::standard(1, 1);
        settings.n_propagation_steps = 0;
        assert!(matches!(
            NetworkAgent::from_genome(&genome, &settings),
            Err(NeatError::ConfigurationError(_))
        ));
    }
}
