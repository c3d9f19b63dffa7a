use indexmap::IndexMap;
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal, Uniform};
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::activation::Activation;
use super::align::{align_iter, align_map, AlignedPair};
use super::common::{FxIndexMap, Settings};
use super::error::NeatError;
use super::innovation::{InnovationNumber, InnovationTable};

/// Weights never drift beyond this magnitude under mutation.
const WEIGHT_CAP: f64 = 100.0;
/// Candidate-pair attempts before an add-connection mutation gives up.
const ADD_CONNECTION_ATTEMPTS: usize = 20;
/// Genomes smaller than this are compared without size normalization.
const DISTANCE_NORMALIZATION_FLOOR: usize = 20;

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum NodeRole {
    Sensor,
    Bias,
    Hidden,
    Output,
}

/// A node's immutable identity: once created it is never renamed or removed
/// by evolution, only orphaned when its connections are disabled.
#[derive(PartialEq, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct NodeGene {
    pub id: NodeId,
    pub role: NodeRole,
    pub activation: Activation,
}

/// Structural key of a connection. Two genes with the same key describe the
/// same topology feature anywhere in the population.
#[derive(Hash, Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GeneKey {
    pub in_node_id: NodeId,
    pub out_node_id: NodeId,
}

#[derive(PartialEq, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GeneValue {
    pub weight: f64,
    pub enabled: bool,
    pub innovation: InnovationNumber,
}

pub type Gene = (GeneKey, GeneValue);

pub trait GeneExt {
    fn create(in_node_id: usize, out_node_id: usize, weight: f64, innovation: usize, enabled: bool) -> Self;
}

impl GeneExt for Gene {
    fn create(in_node_id: usize, out_node_id: usize, weight: f64, innovation: usize, enabled: bool) -> Gene {
        (
            GeneKey {
                in_node_id: NodeId(in_node_id),
                out_node_id: NodeId(out_node_id),
            },
            GeneValue {
                weight,
                enabled,
                innovation: InnovationNumber(innovation),
            },
        )
    }
}

/// Genetic encoding of one candidate network: node genes keyed by id and
/// connection genes keyed by structural key, both held in flat index maps
/// (arena + stable integer ids, no reference graphs).
///
/// Invariants: `nodes` is sorted by ascending id and `connections` by
/// ascending innovation number. Every structural operation restores them, so
/// iteration, crossover alignment and the evaluator's summation order are
/// all deterministic.
///
/// Node id layout: sensors occupy `0..n_sensor_nodes`, the bias node is
/// `n_sensor_nodes`, outputs follow, and hidden ids are allocated globally
/// by the innovation table.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Genome {
    nodes: FxIndexMap<NodeId, NodeGene>,
    connections: FxIndexMap<GeneKey, GeneValue>,
    pub n_sensor_nodes: usize,
    pub n_output_nodes: usize,
}

impl Genome {
    /// Assembles a genome from explicit genes. Sensor, bias and output node
    /// genes are always present; hidden node genes are derived from the
    /// connection endpoints.
    pub fn create(
        genes: Vec<Gene>,
        n_sensor_nodes: usize,
        n_output_nodes: usize,
        hidden_activation: Activation,
        output_activation: Activation,
    ) -> Genome {
        let mut nodes: FxIndexMap<NodeId, NodeGene> =
            IndexMap::with_capacity_and_hasher(n_sensor_nodes + 1 + n_output_nodes, FxBuildHasher);
        for id in 0..n_sensor_nodes {
            let id = NodeId(id);
            nodes.insert(id, NodeGene { id, role: NodeRole::Sensor, activation: Activation::Identity });
        }
        let bias = NodeId(n_sensor_nodes);
        nodes.insert(bias, NodeGene { id: bias, role: NodeRole::Bias, activation: Activation::Identity });
        for out_ind in 0..n_output_nodes {
            let id = NodeId(n_sensor_nodes + 1 + out_ind);
            nodes.insert(id, NodeGene { id, role: NodeRole::Output, activation: output_activation });
        }

        let mut connections: FxIndexMap<GeneKey, GeneValue> =
            IndexMap::with_capacity_and_hasher(genes.len(), FxBuildHasher);
        for (key, value) in genes {
            for id in [key.in_node_id, key.out_node_id] {
                nodes.entry(id).or_insert(NodeGene {
                    id,
                    role: NodeRole::Hidden,
                    activation: hidden_activation,
                });
            }
            connections.insert(key, value);
        }

        let mut genome = Genome {
            nodes,
            connections,
            n_sensor_nodes,
            n_output_nodes,
        };
        genome.sort_nodes();
        genome.sort_connections();
        genome
    }

    /// Minimal initial topology: every sensor and the bias node connected to
    /// every output with a random weight, innovations resolved through the
    /// shared table so the whole founding population agrees on numbering.
    pub fn init<R: RngCore>(
        rng: &mut R,
        innovation: &mut InnovationTable,
        settings: &Settings,
    ) -> Genome {
        let between = Uniform::from(-1.0..1.0);
        let n_connections = (settings.n_sensor_nodes + 1) * settings.n_output_nodes;
        let mut genes = Vec::with_capacity(n_connections);

        for out_ind in 0..settings.n_output_nodes {
            let out_node_id = NodeId(settings.n_sensor_nodes + 1 + out_ind);
            for in_ind in 0..=settings.n_sensor_nodes {
                let key = GeneKey {
                    in_node_id: NodeId(in_ind),
                    out_node_id,
                };
                let value = GeneValue {
                    weight: between.sample(rng),
                    enabled: true,
                    innovation: innovation.connection_innovation(key),
                };
                genes.push((key, value));
            }
        }

        Genome::create(
            genes,
            settings.n_sensor_nodes,
            settings.n_output_nodes,
            settings.hidden_activation,
            settings.output_activation,
        )
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, GeneKey, GeneValue> {
        self.connections.iter()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeGene> {
        self.nodes.get(&id)
    }

    pub fn node_genes(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes.values()
    }

    /// Dense position of a node id within the sorted node arena.
    pub fn node_index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.get_index_of(&id)
    }

    pub fn connection(&self, key: &GeneKey) -> Option<&GeneValue> {
        self.connections.get(key)
    }

    pub fn enabled_connection_count(&self) -> usize {
        self.connections.values().filter(|v| v.enabled).count()
    }

    pub fn bias_node_id(&self) -> NodeId {
        NodeId(self.n_sensor_nodes)
    }

    /// Appends a node gene with a table-allocated id, so the id cannot
    /// collide with hidden nodes created in any other genome sharing the
    /// table.
    pub fn add_node(
        &mut self,
        role: NodeRole,
        activation: Activation,
        innovation: &mut InnovationTable,
    ) -> NodeId {
        let id = innovation.allocate_node_id();
        self.nodes.insert(id, NodeGene { id, role, activation });
        self.sort_nodes();
        id
    }

    /// Adds an enabled connection gene. Re-adding a key whose gene is
    /// disabled re-enables it with the new weight and keeps its innovation
    /// number.
    pub fn add_connection(
        &mut self,
        in_node_id: NodeId,
        out_node_id: NodeId,
        weight: f64,
        innovation: InnovationNumber,
    ) -> Result<(), NeatError> {
        if in_node_id == out_node_id {
            return Err(NeatError::InvalidTopology(format!(
                "connection from node {} to itself",
                in_node_id.0
            )));
        }
        let source = self.nodes.get(&in_node_id).ok_or_else(|| {
            NeatError::InvalidTopology(format!("unknown source node {}", in_node_id.0))
        })?;
        let target = self.nodes.get(&out_node_id).ok_or_else(|| {
            NeatError::InvalidTopology(format!("unknown target node {}", out_node_id.0))
        })?;
        if source.role == NodeRole::Output {
            return Err(NeatError::InvalidTopology(format!(
                "connection out of output node {}",
                in_node_id.0
            )));
        }
        if matches!(target.role, NodeRole::Sensor | NodeRole::Bias) {
            return Err(NeatError::InvalidTopology(format!(
                "connection into input node {}",
                out_node_id.0
            )));
        }

        let key = GeneKey {
            in_node_id,
            out_node_id,
        };
        if let Some(existing) = self.connections.get_mut(&key) {
            if existing.enabled {
                return Err(NeatError::InvalidTopology(format!(
                    "enabled connection {} -> {} already exists",
                    in_node_id.0, out_node_id.0
                )));
            }
            existing.enabled = true;
            existing.weight = weight;
            return Ok(());
        }

        self.connections.insert(
            key,
            GeneValue {
                weight,
                enabled: true,
                innovation,
            },
        );
        self.sort_connections();
        Ok(())
    }

    pub fn disable_connection(&mut self, innovation: InnovationNumber) -> Result<(), NeatError> {
        match self
            .connections
            .values_mut()
            .find(|value| value.innovation == innovation)
        {
            Some(value) => {
                value.enabled = false;
                Ok(())
            }
            None => Err(NeatError::InvalidTopology(format!(
                "no connection gene carries innovation number {}",
                innovation.0
            ))),
        }
    }

    /// Compatibility distance: c1*excess/N + c2*disjoint/N + c3*mean weight
    /// difference over matching genes. N is the larger genome's gene count,
    /// taken as 1 below the small-genome floor. Symmetric in its arguments.
    pub fn distance(
        &self,
        other: &Genome,
        excess_coefficient: f64,
        disjoint_coefficient: f64,
        weight_coefficient: f64,
    ) -> f64 {
        #[derive(PartialEq)]
        enum ExcessSide {
            Left,
            Right,
            Neither,
        }

        let mut excess_side = ExcessSide::Neither;
        let mut excess_count = 0usize;
        let mut disjoint_count = 0usize;
        let mut matching_count = 0usize;
        let mut total_weight_diff = 0.0;

        align_iter(&self.connections, &other.connections, &mut |pair| match pair {
            AlignedPair::Both(left, right) => {
                matching_count += 1;
                disjoint_count += excess_count;
                excess_count = 0;
                excess_side = ExcessSide::Neither;
                total_weight_diff += (left.1.weight - right.1.weight).abs();
            }
            AlignedPair::Left(_) => match excess_side {
                ExcessSide::Left => excess_count += 1,
                ExcessSide::Neither => {
                    excess_side = ExcessSide::Left;
                    excess_count = 1;
                }
                ExcessSide::Right => {
                    disjoint_count += excess_count;
                    excess_side = ExcessSide::Left;
                    excess_count = 1;
                }
            },
            AlignedPair::Right(_) => match excess_side {
                ExcessSide::Right => excess_count += 1,
                ExcessSide::Neither => {
                    excess_side = ExcessSide::Right;
                    excess_count = 1;
                }
                ExcessSide::Left => {
                    disjoint_count += excess_count;
                    excess_side = ExcessSide::Right;
                    excess_count = 1;
                }
            },
        });

        let n_larger = std::cmp::max(self.len(), other.len());
        let n = if n_larger < DISTANCE_NORMALIZATION_FLOOR {
            1.0
        } else {
            n_larger as f64
        };
        let excess_term = excess_coefficient * (excess_count as f64) / n;
        let disjoint_term = disjoint_coefficient * (disjoint_count as f64) / n;
        let weight_term = if matching_count > 0 {
            weight_coefficient * total_weight_diff / (matching_count as f64)
        } else {
            0.0
        };
        excess_term + disjoint_term + weight_term
    }

    /// Applies one round of mutation. Weight mutation is always attempted;
    /// at most one structural mutation (add-connection, add-node,
    /// toggle-enable, in that priority) fires per call, selected by a single
    /// uniform draw against the cumulative rates. A structural mutation with
    /// no valid candidates is a no-op, never an error.
    pub fn mutate<R: RngCore>(
        &mut self,
        rng: &mut R,
        innovation: &mut InnovationTable,
        settings: &Settings,
    ) {
        self.mutate_weights(rng, settings);

        let roll: f64 = rng.gen();
        let p_connection = settings.mutate_add_connection_rate;
        let p_node = p_connection + settings.mutate_add_node_rate;
        let p_toggle = p_node + settings.mutate_toggle_enable_rate;
        if roll < p_connection {
            self.mutate_add_connection(rng, innovation, settings);
        } else if roll < p_node {
            self.mutate_add_node(rng, innovation, settings);
        } else if roll < p_toggle {
            self.mutate_toggle_enable(rng, settings);
        }
    }

    fn mutate_weights<R: RngCore>(&mut self, rng: &mut R, settings: &Settings) {
        let perturb = Normal::new(0.0, settings.mutate_weight_scale).unwrap();
        for value in self.connections.values_mut() {
            if !value.enabled {
                continue;
            }
            if rng.gen::<f64>() >= settings.mutate_weight_rate {
                continue;
            }
            if rng.gen::<f64>() < settings.mutate_weight_replace_rate {
                value.weight = rng.gen_range(-1.0..1.0);
            } else {
                value.weight += perturb.sample(rng);
            }
            value.weight = value.weight.clamp(-WEIGHT_CAP, WEIGHT_CAP);
        }
    }

    fn mutate_add_connection<R: RngCore>(
        &mut self,
        rng: &mut R,
        innovation: &mut InnovationTable,
        settings: &Settings,
    ) {
        if self.enabled_connection_count() >= settings.max_connections {
            return;
        }
        let sources: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.role != NodeRole::Output)
            .map(|n| n.id)
            .collect();
        let targets: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| matches!(n.role, NodeRole::Hidden | NodeRole::Output))
            .map(|n| n.id)
            .collect();
        if sources.is_empty() || targets.is_empty() {
            return;
        }

        for _ in 0..ADD_CONNECTION_ATTEMPTS {
            let in_node_id = sources[rng.gen_range(0..sources.len())];
            let out_node_id = targets[rng.gen_range(0..targets.len())];
            if in_node_id == out_node_id {
                continue;
            }
            let key = GeneKey {
                in_node_id,
                out_node_id,
            };
            // a gene in either state blocks the pair; re-enabling is the
            // toggle mutation's business
            if self.connections.contains_key(&key) {
                continue;
            }
            let value = GeneValue {
                weight: rng.gen_range(-1.0..1.0),
                enabled: true,
                innovation: innovation.connection_innovation(key),
            };
            self.connections.insert(key, value);
            self.sort_connections();
            return;
        }
    }

    fn mutate_add_node<R: RngCore>(
        &mut self,
        rng: &mut R,
        innovation: &mut InnovationTable,
        settings: &Settings,
    ) {
        if self.enabled_connection_count() >= settings.max_connections {
            return;
        }
        let enabled_keys: Vec<GeneKey> = self
            .connections
            .iter()
            .filter(|(_, value)| value.enabled)
            .map(|(key, _)| *key)
            .collect();
        if enabled_keys.is_empty() {
            return;
        }
        let split_key = enabled_keys[rng.gen_range(0..enabled_keys.len())];
        let new_node_id = innovation.split_node(split_key);
        if self.nodes.contains_key(&new_node_id) {
            // this genome already split this gene once
            return;
        }

        let split_weight = match self.connections.get_mut(&split_key) {
            Some(value) => {
                let weight = value.weight;
                value.enabled = false;
                weight
            }
            None => return,
        };

        self.nodes.insert(
            new_node_id,
            NodeGene {
                id: new_node_id,
                role: NodeRole::Hidden,
                activation: settings.hidden_activation,
            },
        );
        self.sort_nodes();

        // incoming half carries unit weight, outgoing half inherits the
        // split weight, so the composed path starts out equivalent
        let front = GeneKey {
            in_node_id: split_key.in_node_id,
            out_node_id: new_node_id,
        };
        let back = GeneKey {
            in_node_id: new_node_id,
            out_node_id: split_key.out_node_id,
        };
        let front_value = GeneValue {
            weight: 1.0,
            enabled: true,
            innovation: innovation.connection_innovation(front),
        };
        let back_value = GeneValue {
            weight: split_weight,
            enabled: true,
            innovation: innovation.connection_innovation(back),
        };
        self.connections.insert(front, front_value);
        self.connections.insert(back, back_value);
        self.sort_connections();
    }

    fn mutate_toggle_enable<R: RngCore>(&mut self, rng: &mut R, settings: &Settings) {
        if self.connections.is_empty() {
            return;
        }
        let at_cap = self.enabled_connection_count() >= settings.max_connections;
        let index = rng.gen_range(0..self.connections.len());
        if let Some((_, value)) = self.connections.get_index_mut(index) {
            if value.enabled {
                value.enabled = false;
            } else if !at_cap {
                value.enabled = true;
            }
        }
    }

    /// Copy of this genome with every hidden node that has no enabled path
    /// to an output removed, along with its connections. Disabled genes are
    /// dropped as well. Used for champion export; evolution itself never
    /// deletes structure.
    pub fn prune(&self) -> Genome {
        let mut incoming: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
        for (key, _) in self.connections.iter().filter(|(_, v)| v.enabled) {
            incoming.entry(key.out_node_id).or_default().push(key.in_node_id);
        }

        let mut useful: FxHashSet<NodeId> = FxHashSet::default();
        let mut stack: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.role == NodeRole::Output)
            .map(|n| n.id)
            .collect();
        while let Some(id) = stack.pop() {
            if let Some(sources) = incoming.get(&id) {
                for &source in sources {
                    if useful.insert(source) {
                        stack.push(source);
                    }
                }
            }
        }

        let keep = |node: &NodeGene| node.role != NodeRole::Hidden || useful.contains(&node.id);
        let nodes: FxIndexMap<NodeId, NodeGene> = self
            .nodes
            .values()
            .filter(|node| keep(node))
            .map(|node| (node.id, *node))
            .collect();
        let connections: FxIndexMap<GeneKey, GeneValue> = self
            .connections
            .iter()
            .filter(|(key, value)| {
                value.enabled
                    && nodes.contains_key(&key.in_node_id)
                    && nodes.contains_key(&key.out_node_id)
            })
            .map(|(key, value)| (*key, *value))
            .collect();

        Genome {
            nodes,
            connections,
            n_sensor_nodes: self.n_sensor_nodes,
            n_output_nodes: self.n_output_nodes,
        }
    }
}

/// Recombines two parents aligned by innovation number. Matching genes are
/// chosen uniformly, with the child's copy disabled with the configured
/// probability when either parent's copy is disabled. Disjoint and excess
/// genes come from the primary parent only: the fitter one, with ties broken
/// toward the smaller genome and then by a random draw (deterministic under
/// a fixed seed). Parents are untouched.
pub fn cross_over<R: RngCore>(
    rng: &mut R,
    settings: &Settings,
    genome_1: &Genome,
    fitness_1: f64,
    genome_2: &Genome,
    fitness_2: f64,
) -> Genome {
    let primary_is_first = if fitness_1 > fitness_2 {
        true
    } else if fitness_2 > fitness_1 {
        false
    } else if genome_1.len() != genome_2.len() {
        genome_1.len() < genome_2.len()
    } else {
        rng.gen::<bool>()
    };
    let (primary, secondary) = if primary_is_first {
        (genome_1, genome_2)
    } else {
        (genome_2, genome_1)
    };

    let mut choose_gene = |pair: AlignedPair<'_>| -> Option<Gene> {
        match pair {
            AlignedPair::Both(left, right) => {
                let (key, mut value) = if rng.gen::<bool>() {
                    (*left.0, *left.1)
                } else {
                    (*right.0, *right.1)
                };
                if !left.1.enabled || !right.1.enabled {
                    value.enabled = rng.gen::<f64>() >= settings.disabled_gene_inherit_rate;
                }
                Some((key, value))
            }
            AlignedPair::Left(left) => Some((*left.0, *left.1)),
            AlignedPair::Right(_) => None,
        }
    };
    let connections = align_map(&primary.connections, &secondary.connections, &mut choose_gene);

    let mut nodes: FxIndexMap<NodeId, NodeGene> =
        IndexMap::with_capacity_and_hasher(primary.n_nodes(), FxBuildHasher);
    for node in primary.node_genes() {
        if node.role != NodeRole::Hidden {
            nodes.insert(node.id, *node);
        }
    }
    for key in connections.keys() {
        for node_id in [key.in_node_id, key.out_node_id] {
            if nodes.contains_key(&node_id) {
                continue;
            }
            if let Some(node) = primary.node(node_id).or_else(|| secondary.node(node_id)) {
                nodes.insert(node_id, *node);
            }
        }
    }

    let mut child = Genome {
        nodes,
        connections,
        n_sensor_nodes: primary.n_sensor_nodes,
        n_output_nodes: primary.n_output_nodes,
    };
    child.sort_nodes();
    child
}

impl Genome {
    fn sort_nodes(&mut self) {
        self.nodes.sort_unstable_by(|a, _, b, _| a.cmp(b));
    }

    fn sort_connections(&mut self) {
        self.connections
            .sort_unstable_by(|_, a, _, b| a.innovation.cmp(&b.innovation));
    }
}
