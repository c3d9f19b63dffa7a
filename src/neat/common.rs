use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};

use super::activation::Activation;
use super::error::NeatError;

pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Full configuration surface of the engine. Validated once at population
/// construction; every field is plain data so settings can be loaded from a
/// host-side config file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    /// Number of sensor (input) nodes, excluding the bias node the engine
    /// adds itself.
    pub n_sensor_nodes: usize,
    pub n_output_nodes: usize,
    /// Population size, constant across generations.
    pub n_organisms: usize,

    /// c1: weight of excess genes in compatibility distance.
    pub excess_coefficient: f64,
    /// c2: weight of disjoint genes in compatibility distance.
    pub disjoint_coefficient: f64,
    /// c3: weight of mean weight difference over matching genes.
    pub weight_coefficient: f64,
    /// Initial compatibility threshold; adapts each generation to keep the
    /// species count within [n_species_min, n_species_max].
    pub species_distance_threshold: f64,
    pub n_species_min: usize,
    pub n_species_max: usize,

    /// Per-connection probability of a weight mutation.
    pub mutate_weight_rate: f64,
    /// Stddev of the Gaussian perturbation applied to a mutated weight.
    pub mutate_weight_scale: f64,
    /// Given a weight mutation fires, probability the weight is replaced by
    /// a fresh uniform sample instead of perturbed.
    pub mutate_weight_replace_rate: f64,
    /// Probability of an add-connection mutation per `mutate` call. The
    /// three structural rates are mutually exclusive per call and must sum
    /// to at most 1.
    pub mutate_add_connection_rate: f64,
    pub mutate_add_node_rate: f64,
    pub mutate_toggle_enable_rate: f64,

    /// Probability a matching gene disabled in either parent stays disabled
    /// in the crossover child.
    pub disabled_gene_inherit_rate: f64,
    /// Probability the second parent is drawn from outside the species.
    pub interspecies_mating_rate: f64,
    /// Fraction of each species, fittest first, eligible as parents.
    pub survival_fraction: f64,

    /// Generations a species may go without improvement before removal; the
    /// best species overall is always protected.
    pub max_stagnation: usize,
    /// Generations the whole population may go without a new champion before
    /// it restarts from mutated champion clones. `usize::MAX` disables this.
    pub global_stagnation_limit: usize,
    /// Unmutated top genomes carried over per qualifying species.
    pub elitism_count: usize,
    /// Species below this size get no elites.
    pub elitism_min_species_size: usize,
    /// Cap on enabled connections per genome; growth mutations no-op at the
    /// cap. `usize::MAX` disables it.
    pub max_connections: usize,

    /// Synchronous propagation steps per evaluation. Values settle over this
    /// many steps, so recurrent topologies need enough steps for signals to
    /// traverse cycles.
    pub n_propagation_steps: usize,
    pub hidden_activation: Activation,
    pub output_activation: Activation,
}

impl Settings {
    pub fn standard(n_sensor_nodes: usize, n_output_nodes: usize) -> Settings {
        Settings {
            n_sensor_nodes,
            n_output_nodes,
            n_organisms: 150,
            excess_coefficient: 1.0,
            disjoint_coefficient: 1.0,
            weight_coefficient: 0.4,
            species_distance_threshold: 3.0,
            n_species_min: 2,
            n_species_max: 8,
            mutate_weight_rate: 0.8,
            mutate_weight_scale: 0.13,
            mutate_weight_replace_rate: 0.1,
            mutate_add_connection_rate: 0.1,
            mutate_add_node_rate: 0.03,
            mutate_toggle_enable_rate: 0.05,
            disabled_gene_inherit_rate: 0.75,
            interspecies_mating_rate: 0.001,
            survival_fraction: 0.25,
            max_stagnation: 15,
            global_stagnation_limit: usize::MAX,
            elitism_count: 1,
            elitism_min_species_size: 5,
            max_connections: usize::MAX,
            n_propagation_steps: 3,
            hidden_activation: Activation::Tanh,
            output_activation: Activation::Tanh,
        }
    }

    pub fn validate(&self) -> Result<(), NeatError> {
        fn check_rate(name: &str, value: f64) -> Result<(), NeatError> {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(NeatError::ConfigurationError(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
            Ok(())
        }

        if self.n_sensor_nodes == 0 {
            return Err(NeatError::ConfigurationError(
                "n_sensor_nodes must be positive".into(),
            ));
        }
        if self.n_output_nodes == 0 {
            return Err(NeatError::ConfigurationError(
                "n_output_nodes must be positive".into(),
            ));
        }
        if self.n_organisms == 0 {
            return Err(NeatError::ConfigurationError(
                "n_organisms must be positive".into(),
            ));
        }
        if self.n_propagation_steps == 0 {
            return Err(NeatError::ConfigurationError(
                "n_propagation_steps must be at least 1".into(),
            ));
        }
        if self.n_species_min == 0 || self.n_species_max < self.n_species_min {
            return Err(NeatError::ConfigurationError(
                "species bounds must satisfy 1 <= n_species_min <= n_species_max".into(),
            ));
        }

        check_rate("mutate_weight_rate", self.mutate_weight_rate)?;
        check_rate("mutate_weight_replace_rate", self.mutate_weight_replace_rate)?;
        check_rate("mutate_add_connection_rate", self.mutate_add_connection_rate)?;
        check_rate("mutate_add_node_rate", self.mutate_add_node_rate)?;
        check_rate("mutate_toggle_enable_rate", self.mutate_toggle_enable_rate)?;
        check_rate("disabled_gene_inherit_rate", self.disabled_gene_inherit_rate)?;
        check_rate("interspecies_mating_rate", self.interspecies_mating_rate)?;

        let structural_sum = self.mutate_add_connection_rate
            + self.mutate_add_node_rate
            + self.mutate_toggle_enable_rate;
        if structural_sum > 1.0 {
            return Err(NeatError::ConfigurationError(format!(
                "structural mutation rates sum to {structural_sum}, must not exceed 1"
            )));
        }

        if !self.mutate_weight_scale.is_finite() || self.mutate_weight_scale <= 0.0 {
            return Err(NeatError::ConfigurationError(
                "mutate_weight_scale must be a positive finite number".into(),
            ));
        }
        if !self.species_distance_threshold.is_finite() || self.species_distance_threshold <= 0.0 {
            return Err(NeatError::ConfigurationError(
                "species_distance_threshold must be a positive finite number".into(),
            ));
        }
        if !self.survival_fraction.is_finite()
            || self.survival_fraction <= 0.0
            || self.survival_fraction > 1.0
        {
            return Err(NeatError::ConfigurationError(
                "survival_fraction must lie in (0, 1]".into(),
            ));
        }
        for (name, value) in [
            ("excess_coefficient", self.excess_coefficient),
            ("disjoint_coefficient", self.disjoint_coefficient),
            ("weight_coefficient", self.weight_coefficient),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(NeatError::ConfigurationError(format!(
                    "{name} must be a non-negative finite number"
                )));
            }
        }
        if self.elitism_count > self.n_organisms {
            return Err(NeatError::ConfigurationError(
                "elitism_count cannot exceed n_organisms".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_settings_are_valid() {
        assert!(Settings::standard(3, 1).validate().is_ok());
    }

    #[test]
    fn zero_population_rejected() {
        let mut settings = Settings::standard(3, 1);
        settings.n_organisms = 0;
        assert!(matches!(
            settings.validate(),
            Err(NeatError::ConfigurationError(_))
        ));
    }

    #[test]
    fn out_of_range_rate_rejected() {
        let mut settings = Settings::standard(3, 1);
        settings.mutate_weight_rate = 1.3;
        assert!(matches!(
            settings.validate(),
            Err(NeatError::ConfigurationError(_))
        ));
    }

    #[test]
    fn structural_rates_must_not_exceed_one() {
        let mut settings = Settings::standard(3, 1);
        settings.mutate_add_connection_rate = 0.5;
        settings.mutate_add_node_rate = 0.4;
        settings.mutate_toggle_enable_rate = 0.2;
        assert!(settings.validate().is_err());
    }
}
