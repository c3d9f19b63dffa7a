use std::ops::{Index, IndexMut};

use rand::RngCore;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::common::Settings;
use super::error::NeatError;
use super::genome::Genome;
use super::innovation::InnovationTable;
use super::network::Network;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct OrganismIndex(pub usize);

/// One member of the current generation: the genome plus its decoded
/// network, fitness bookkeeping, and whether the host has reported a score
/// for it this generation.
#[derive(Clone, Serialize, Deserialize)]
pub struct Organism {
    pub genome: Genome,
    pub network: Network,
    pub fitness: f64,
    pub adjusted_fitness: f64,
    pub fitness_reported: bool,
}

impl Organism {
    pub fn from_genome(genome: Genome, settings: &Settings) -> Organism {
        let network = Network::from_genome(&genome, settings);
        Organism {
            genome,
            network,
            fitness: 0.0,
            adjusted_fitness: 0.0,
            fitness_reported: false,
        }
    }

    pub fn init<R: RngCore>(
        rng: &mut R,
        innovation: &mut InnovationTable,
        settings: &Settings,
    ) -> Organism {
        let genome = Genome::init(rng, innovation, settings);
        Organism::from_genome(genome, settings)
    }

    pub fn activate(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NeatError> {
        self.network.activate(inputs)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Organisms(Vec<Organism>);

impl Organisms {
    pub fn new(data: Vec<Organism>) -> Organisms {
        Organisms(data)
    }

    pub fn push(&mut self, organism: Organism) {
        self.0.push(organism);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Organism> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Organism> {
        self.0.iter_mut()
    }
}

impl Index<OrganismIndex> for Organisms {
    type Output = Organism;
    fn index(&self, index: OrganismIndex) -> &Self::Output {
        &self.0[index.0]
    }
}

impl IndexMut<OrganismIndex> for Organisms {
    fn index_mut(&mut self, index: OrganismIndex) -> &mut Self::Output {
        &mut self.0[index.0]
    }
}

impl<'a> IntoParallelRefMutIterator<'a> for Organisms {
    type Item = &'a mut Organism;
    type Iter = rayon::slice::IterMut<'a, Organism>;

    fn par_iter_mut(&'a mut self) -> Self::Iter {
        self.0.par_iter_mut()
    }
}
