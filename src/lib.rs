//! NEAT (NeuroEvolution of Augmenting Topologies) core engine.
//!
//! The crate evolves populations of variable-topology neural-network
//! genomes: speciated selection, innovation-aligned crossover, structural
//! and weight mutation, and a flat-array network evaluator. A host
//! integration layer drives it through two surfaces: [`neat::agent::NetworkAgent`]
//! (or [`neat::population::Population::activate`]) every simulation tick,
//! and `report_fitness`/`advance_generation` at generation boundaries.

pub mod neat;
