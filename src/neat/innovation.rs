use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::genome::{GeneKey, NodeId};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct InnovationNumber(pub usize);

impl InnovationNumber {
    fn inc(self) -> InnovationNumber {
        InnovationNumber(self.0 + 1)
    }
}

/// Process-wide record of every structural feature discovered so far. The
/// table is an explicit value passed into each mutation call, never hidden
/// global state: two independent mutations anywhere in the population that
/// produce the same (source, target) connection read the same innovation
/// number back, which is what makes crossover alignment across lineages
/// meaningful.
///
/// Splits are recorded alongside connections so that splitting the same
/// connection in two different genomes yields the same hidden-node id, and
/// therefore the same pair of replacement connections.
#[derive(Clone, Serialize, Deserialize)]
pub struct InnovationTable {
    next_innovation: InnovationNumber,
    next_node_id: NodeId,
    connections: FxHashMap<GeneKey, InnovationNumber>,
    splits: FxHashMap<GeneKey, NodeId>,
}

impl InnovationTable {
    /// Pre-seeds innovations for the fully connected initial topology:
    /// every sensor node and the bias node wired to every output node, in a
    /// fixed order so all genomes of a fresh population agree on numbering.
    pub fn init(n_sensor_nodes: usize, n_output_nodes: usize) -> InnovationTable {
        let mut table = InnovationTable {
            next_innovation: InnovationNumber(0),
            next_node_id: NodeId(n_sensor_nodes + 1 + n_output_nodes),
            connections: FxHashMap::default(),
            splits: FxHashMap::default(),
        };

        for out_node_ind in 0..n_output_nodes {
            let out_node_id = NodeId(n_sensor_nodes + 1 + out_node_ind);
            for in_node_ind in 0..=n_sensor_nodes {
                let gene_key = GeneKey {
                    in_node_id: NodeId(in_node_ind),
                    out_node_id,
                };
                table.connection_innovation(gene_key);
            }
        }

        table
    }

    /// Innovation number for a structural key, assigning the next number on
    /// first sight and reusing the recorded one afterwards.
    pub fn connection_innovation(&mut self, gene_key: GeneKey) -> InnovationNumber {
        match self.connections.entry(gene_key) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let assigned = self.next_innovation;
                entry.insert(assigned);
                self.next_innovation = assigned.inc();
                assigned
            }
        }
    }

    /// Hidden-node id for splitting the given connection. The first split of
    /// a connection allocates a fresh global node id; later splits of the
    /// same connection, in any genome, reuse it.
    pub fn split_node(&mut self, gene_key: GeneKey) -> NodeId {
        match self.splits.entry(gene_key) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let assigned = self.next_node_id;
                entry.insert(assigned);
                self.next_node_id = NodeId(assigned.0 + 1);
                assigned
            }
        }
    }

    /// Fresh global node id for structure built outside the split path
    /// (e.g. hand-assembled genomes). Global allocation keeps node ids
    /// unambiguous across every genome sharing this table.
    pub fn allocate_node_id(&mut self) -> NodeId {
        let assigned = self.next_node_id;
        self.next_node_id = NodeId(assigned.0 + 1);
        assigned
    }

    pub fn n_innovations(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(in_id: usize, out_id: usize) -> GeneKey {
        GeneKey {
            in_node_id: NodeId(in_id),
            out_node_id: NodeId(out_id),
        }
    }

    #[test]
    fn init_seeds_full_connectivity() {
        // 2 sensors + bias, 2 outputs
        let table = InnovationTable::init(2, 2);
        assert_eq!(table.n_innovations(), 6);
        assert_eq!(table.next_innovation, InnovationNumber(6));
        assert_eq!(table.next_node_id, NodeId(5));
    }

    #[test]
    fn same_key_reuses_number() {
        let mut table = InnovationTable::init(2, 1);
        let first = table.connection_innovation(key(5, 3));
        let second = table.connection_innovation(key(5, 3));
        assert_eq!(first, second);
        let other = table.connection_innovation(key(5, 4));
        assert!(other > first);
    }

    #[test]
    fn same_split_reuses_node_id() {
        let mut table = InnovationTable::init(2, 1);
        let first = table.split_node(key(0, 3));
        let second = table.split_node(key(0, 3));
        assert_eq!(first, second);
        assert_ne!(table.split_node(key(1, 3)), first);
    }
}
