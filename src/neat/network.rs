use serde::{Deserialize, Serialize};

use super::activation::Activation;
use super::common::Settings;
use super::error::NeatError;
use super::genome::{Genome, NodeRole};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct NetConnection {
    source: usize,
    target: usize,
    weight: f64,
}

/// Executable form of a genome: nodes flattened into dense arrays indexed by
/// position, enabled connections resolved to (source, target, weight)
/// triples held in ascending innovation order. Rebuilt whenever the genome
/// changes; disabled genes never appear here.
///
/// Evaluation runs a fixed number of synchronous propagation steps: every
/// step computes each node's weighted input sum from the previous step's
/// values, so cycles are well-defined without any topology analysis. Node
/// values are zeroed at the start of each `activate` call, making the output
/// a pure function of the genome and the input vector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Network {
    values: Vec<f64>,
    sums: Vec<f64>,
    roles: Vec<NodeRole>,
    activations: Vec<Activation>,
    connections: Vec<NetConnection>,
    sensor_indices: Vec<usize>,
    bias_indices: Vec<usize>,
    output_indices: Vec<usize>,
    n_propagation_steps: usize,
}

impl Network {
    pub fn from_genome(genome: &Genome, settings: &Settings) -> Network {
        let n_nodes = genome.n_nodes();
        let mut roles = Vec::with_capacity(n_nodes);
        let mut activations = Vec::with_capacity(n_nodes);
        let mut sensor_indices = Vec::new();
        let mut bias_indices = Vec::new();
        let mut output_indices = Vec::new();

        for (index, node) in genome.node_genes().enumerate() {
            roles.push(node.role);
            activations.push(node.activation);
            match node.role {
                NodeRole::Sensor => sensor_indices.push(index),
                NodeRole::Bias => bias_indices.push(index),
                NodeRole::Output => output_indices.push(index),
                NodeRole::Hidden => {}
            }
        }

        let connections = genome
            .iter()
            .filter(|(_, value)| value.enabled)
            .filter_map(|(key, value)| {
                let source = genome.node_index_of(key.in_node_id)?;
                let target = genome.node_index_of(key.out_node_id)?;
                Some(NetConnection {
                    source,
                    target,
                    weight: value.weight,
                })
            })
            .collect();

        Network {
            values: vec![0.0; n_nodes],
            sums: vec![0.0; n_nodes],
            roles,
            activations,
            connections,
            sensor_indices,
            bias_indices,
            output_indices,
            n_propagation_steps: settings.n_propagation_steps,
        }
    }

    pub fn n_inputs(&self) -> usize {
        self.sensor_indices.len()
    }

    pub fn n_outputs(&self) -> usize {
        self.output_indices.len()
    }

    /// Runs the configured number of propagation steps and returns the
    /// output node values, in node-id order. Sensor nodes are clamped to the
    /// input vector and bias nodes to 1.0 throughout.
    pub fn activate(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NeatError> {
        if inputs.len() != self.sensor_indices.len() {
            return Err(NeatError::DimensionMismatch {
                expected: self.sensor_indices.len(),
                actual: inputs.len(),
            });
        }

        for value in &mut self.values {
            *value = 0.0;
        }
        for (position, &index) in self.sensor_indices.iter().enumerate() {
            self.values[index] = inputs[position];
        }
        for &index in &self.bias_indices {
            self.values[index] = 1.0;
        }

        for _ in 0..self.n_propagation_steps {
            for sum in &mut self.sums {
                *sum = 0.0;
            }
            // connections are innovation-ordered, so summation order is stable
            for connection in &self.connections {
                self.sums[connection.target] += connection.weight * self.values[connection.source];
            }
            for index in 0..self.values.len() {
                match self.roles[index] {
                    NodeRole::Sensor | NodeRole::Bias => {}
                    NodeRole::Hidden | NodeRole::Output => {
                        self.values[index] = self.activations[index].apply(self.sums[index]);
                    }
                }
            }
        }

        Ok(self
            .output_indices
            .iter()
            .map(|&index| self.values[index])
            .collect())
    }
}
