use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use itertools::Itertools;
use rand::{Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::agent::NetworkAgent;
use super::common::Settings;
use super::error::NeatError;
use super::genome::{cross_over, Genome};
use super::innovation::InnovationTable;
use super::organism::{Organism, OrganismIndex, Organisms};

const THRESHOLD_SHRINK: f64 = 0.95;
const THRESHOLD_GROW: f64 = 1.05;
const THRESHOLD_FLOOR: f64 = 0.3;
/// Species younger than this get a fitness-sharing bonus.
const YOUNG_SPECIES_AGE: usize = 10;
const YOUNG_SPECIES_BONUS: f64 = 1.5;

/// A cluster of genomes within the compatibility threshold of its
/// representative. Members are indices into the population's organisms, not
/// owners.
#[derive(Clone, Serialize, Deserialize)]
pub struct Species {
    pub id: usize,
    pub members: Vec<OrganismIndex>,
    pub representative: Genome,
    pub champion: OrganismIndex,
    pub avg_adjusted_fitness: f64,
    pub age: usize,
    pub gens_since_improved: usize,
    pub max_fitness_ever: f64,
}

#[derive(Clone, Serialize, Deserialize)]
struct Champion {
    genome: Genome,
    fitness: f64,
}

/// In-process fitness evaluation hook. Host integrations that drive agents
/// tick by tick use `activate`/`report_fitness` instead.
pub trait Evaluator {
    fn evaluate_single_organism(&self, organism: &mut Organism);
}

/// Owner of the current generation: all organisms, all species, the
/// innovation table, and the global champion. Lifecycle per generation is
/// evaluate (fitness reports) -> `advance_generation` (speciation,
/// selection, crossover, mutation); termination is the host's decision.
#[derive(Clone, Serialize, Deserialize)]
pub struct Population {
    pub species: Vec<Species>,
    pub organisms: Organisms,
    pub generation: usize,
    pub species_distance_threshold: f64,
    innovation: InnovationTable,
    next_species_id: usize,
    champion: Option<Champion>,
    gens_without_improvement: usize,
}

impl Population {
    pub fn init<R: RngCore>(rng: &mut R, settings: &Settings) -> Result<Population, NeatError> {
        settings.validate()?;
        let mut innovation = InnovationTable::init(settings.n_sensor_nodes, settings.n_output_nodes);
        let organisms = (0..settings.n_organisms)
            .map(|_| Organism::init(rng, &mut innovation, settings))
            .collect_vec();

        let mut population = Population {
            species: Vec::new(),
            organisms: Organisms::new(organisms),
            generation: 0,
            species_distance_threshold: settings.species_distance_threshold,
            innovation,
            next_species_id: 0,
            champion: None,
            gens_without_improvement: 0,
        };
        population.speciate(settings);
        info!(
            n_organisms = settings.n_organisms,
            n_species = population.species.len(),
            "population initialized"
        );
        Ok(population)
    }

    pub fn n_organisms(&self) -> usize {
        self.organisms.len()
    }

    /// Tick-time evaluation of one organism's network.
    pub fn activate(
        &mut self,
        index: OrganismIndex,
        inputs: &[f64],
    ) -> Result<Vec<f64>, NeatError> {
        self.check_index(index)?;
        self.organisms[index].activate(inputs)
    }

    /// Records the host's fitness score for one organism. Must be called for
    /// every organism before `advance_generation`.
    pub fn report_fitness(&mut self, index: OrganismIndex, score: f64) -> Result<(), NeatError> {
        self.check_index(index)?;
        if !score.is_finite() || score < 0.0 {
            return Err(NeatError::ConfigurationError(format!(
                "fitness must be finite and non-negative, got {score}"
            )));
        }
        let organism = &mut self.organisms[index];
        organism.fitness = score;
        organism.fitness_reported = true;
        Ok(())
    }

    pub fn evaluate<E: Evaluator>(&mut self, evaluator: &E) {
        for organism in self.organisms.iter_mut() {
            evaluator.evaluate_single_organism(organism);
            organism.fitness_reported = true;
        }
    }

    /// Evaluates the whole population concurrently. Evaluations share
    /// nothing mutable: each one sees only its own organism.
    pub fn evaluate_par<E: Evaluator + Send + Sync>(&mut self, evaluator: &E) {
        self.organisms.par_iter_mut().for_each(|organism| {
            evaluator.evaluate_single_organism(organism);
            organism.fitness_reported = true;
        });
    }

    /// As `evaluate_par`, with a cancellation checkpoint before each
    /// organism. Aborting leaves already-evaluated organisms with their
    /// reports and the rest unreported; population state stays consistent
    /// and a later `advance_generation` simply demands the missing reports.
    /// Returns the number of organisms evaluated.
    pub fn evaluate_cancellable<E: Evaluator + Send + Sync>(
        &mut self,
        evaluator: &E,
        cancel: &AtomicBool,
    ) -> usize {
        let n_evaluated = AtomicUsize::new(0);
        self.organisms.par_iter_mut().for_each(|organism| {
            if cancel.load(Ordering::SeqCst) {
                return;
            }
            evaluator.evaluate_single_organism(organism);
            organism.fitness_reported = true;
            n_evaluated.fetch_add(1, Ordering::SeqCst);
        });
        n_evaluated.into_inner()
    }

    /// Runs speciation bookkeeping, selection, crossover and mutation to
    /// produce the next generation, returning the new generation number.
    /// Fails with `IncompleteFitnessReports` if any organism has no score.
    pub fn advance_generation<R: RngCore>(
        &mut self,
        rng: &mut R,
        settings: &Settings,
    ) -> Result<usize, NeatError> {
        let missing = self
            .organisms
            .iter()
            .filter(|organism| !organism.fitness_reported)
            .count();
        if missing > 0 {
            return Err(NeatError::IncompleteFitnessReports { missing });
        }

        self.update_species_stats();
        if self.update_champion() {
            self.gens_without_improvement = 0;
        } else {
            self.gens_without_improvement += 1;
        }

        if self.gens_without_improvement > settings.global_stagnation_limit {
            self.restart_from_champion(rng, settings);
            self.generation += 1;
            info!(
                generation = self.generation,
                "population restarted from champion after stagnation"
            );
            return Ok(self.generation);
        }

        self.apply_fitness_sharing();
        self.remove_stale_species(settings);
        self.reproduce(rng, settings);
        self.speciate(settings);
        self.generation += 1;
        debug!(
            generation = self.generation,
            n_species = self.species.len(),
            threshold = self.species_distance_threshold,
            "generation advanced"
        );
        Ok(self.generation)
    }

    pub fn has_champion(&self) -> bool {
        self.champion.is_some()
    }

    pub fn champion_fitness(&self) -> Option<f64> {
        self.champion.as_ref().map(|champion| champion.fitness)
    }

    pub fn champion_genome(&self) -> Option<&Genome> {
        self.champion.as_ref().map(|champion| &champion.genome)
    }

    /// Pruned copy of the champion genome, suitable for persisting or for
    /// building a standalone `NetworkAgent`.
    pub fn champion_pruned(&self) -> Option<Genome> {
        self.champion.as_ref().map(|champion| champion.genome.prune())
    }

    /// Inference agent decoded from the pruned champion genome.
    pub fn champion_agent(&self, settings: &Settings) -> Result<NetworkAgent, NeatError> {
        match self.champion_pruned() {
            Some(genome) => NetworkAgent::from_genome(&genome, settings),
            None => Err(NeatError::ConfigurationError(
                "no champion recorded yet".into(),
            )),
        }
    }

    pub fn reset_champion(&mut self) {
        self.champion = None;
        self.gens_without_improvement = 0;
    }

    fn check_index(&self, index: OrganismIndex) -> Result<(), NeatError> {
        if index.0 >= self.organisms.len() {
            return Err(NeatError::ConfigurationError(format!(
                "organism index {} out of range 0..{}",
                index.0,
                self.organisms.len()
            )));
        }
        Ok(())
    }

    /// Assigns every organism, in generation order, to the first species
    /// whose representative is within the distance threshold, founding a new
    /// species when none is. Afterwards the threshold adapts toward the
    /// configured species-count band.
    fn speciate(&mut self, settings: &Settings) {
        for species in self.species.iter_mut() {
            species.members.clear();
        }
        for index in 0..self.organisms.len() {
            self.assign_species(settings, OrganismIndex(index));
        }
        self.species.retain(|species| !species.members.is_empty());
        for species in self.species.iter_mut() {
            species.representative = self.organisms[species.members[0]].genome.clone();
        }

        let n_species = self.species.len();
        if n_species < settings.n_species_min {
            self.species_distance_threshold =
                (self.species_distance_threshold * THRESHOLD_SHRINK).max(THRESHOLD_FLOOR);
            debug!(
                n_species,
                threshold = self.species_distance_threshold,
                "lowering species distance threshold"
            );
        } else if n_species > settings.n_species_max {
            self.species_distance_threshold *= THRESHOLD_GROW;
            debug!(
                n_species,
                threshold = self.species_distance_threshold,
                "raising species distance threshold"
            );
        }
    }

    fn assign_species(&mut self, settings: &Settings, organism_index: OrganismIndex) {
        let species_index = {
            let organism = &self.organisms[organism_index];
            self.species.iter().position(|species| {
                organism.genome.distance(
                    &species.representative,
                    settings.excess_coefficient,
                    settings.disjoint_coefficient,
                    settings.weight_coefficient,
                ) < self.species_distance_threshold
            })
        };

        match species_index {
            Some(index) => self.species[index].members.push(organism_index),
            None => {
                let representative = self.organisms[organism_index].genome.clone();
                self.species.push(Species {
                    id: self.next_species_id,
                    members: vec![organism_index],
                    representative,
                    champion: organism_index,
                    avg_adjusted_fitness: 0.0,
                    age: 0,
                    gens_since_improved: 0,
                    max_fitness_ever: f64::NEG_INFINITY,
                });
                self.next_species_id += 1;
            }
        }
    }

    fn update_species_stats(&mut self) {
        for species in self.species.iter_mut() {
            let mut champion = species.members[0];
            let mut champion_fitness = f64::NEG_INFINITY;
            for &index in &species.members {
                let fitness = self.organisms[index].fitness;
                if fitness > champion_fitness {
                    champion_fitness = fitness;
                    champion = index;
                }
            }
            species.champion = champion;
            species.age += 1;
            if champion_fitness > species.max_fitness_ever {
                species.max_fitness_ever = champion_fitness;
                species.gens_since_improved = 0;
            } else {
                species.gens_since_improved += 1;
            }
        }
    }

    fn update_champion(&mut self) -> bool {
        let mut best_index = None;
        let mut best_fitness = f64::NEG_INFINITY;
        for (index, organism) in self.organisms.iter().enumerate() {
            if organism.fitness > best_fitness {
                best_fitness = organism.fitness;
                best_index = Some(OrganismIndex(index));
            }
        }
        let Some(best_index) = best_index else {
            return false;
        };
        let improved = match &self.champion {
            None => true,
            Some(champion) => best_fitness > champion.fitness,
        };
        if improved {
            self.champion = Some(Champion {
                genome: self.organisms[best_index].genome.clone(),
                fitness: best_fitness,
            });
        }
        improved
    }

    /// Fitness sharing: each organism's adjusted fitness is its raw fitness
    /// divided by its species size, so large species cannot dominate purely
    /// by headcount. Young species get a flat bonus.
    fn apply_fitness_sharing(&mut self) {
        for species in &self.species {
            let size = species.members.len() as f64;
            let bonus = if species.age < YOUNG_SPECIES_AGE {
                YOUNG_SPECIES_BONUS
            } else {
                1.0
            };
            for &index in &species.members {
                let organism = &mut self.organisms[index];
                organism.adjusted_fitness = organism.fitness / size * bonus;
            }
        }
        for species in self.species.iter_mut() {
            let total: f64 = species
                .members
                .iter()
                .map(|&index| self.organisms[index].adjusted_fitness)
                .sum();
            species.avg_adjusted_fitness = total / species.members.len() as f64;
        }
    }

    fn remove_stale_species(&mut self, settings: &Settings) {
        let best_species_id = self
            .species
            .iter()
            .max_by(|a, b| {
                self.organisms[a.champion]
                    .fitness
                    .total_cmp(&self.organisms[b.champion].fitness)
            })
            .map(|species| species.id);
        let max_stagnation = settings.max_stagnation;
        let before = self.species.len();
        self.species.retain(|species| {
            Some(species.id) == best_species_id || species.gens_since_improved <= max_stagnation
        });
        if self.species.len() < before {
            debug!(removed = before - self.species.len(), "removed stale species");
        }
    }

    /// Builds the next generation's organisms. Species reproduce in
    /// parallel, each on its own deterministic RNG stream; the innovation
    /// table sits behind a mutex so concurrent offspring see a single
    /// writer. Elites are cloned unmutated; every other child is crossover
    /// followed by mutation.
    fn reproduce<R: RngCore>(&mut self, rng: &mut R, settings: &Settings) {
        for species in self.species.iter_mut() {
            species
                .members
                .sort_by(|&a, &b| self.organisms[b].fitness.total_cmp(&self.organisms[a].fitness));
        }

        let species_adjusted: Vec<f64> = self
            .species
            .iter()
            .map(|species| {
                species
                    .members
                    .iter()
                    .map(|&index| self.organisms[index].adjusted_fitness)
                    .sum()
            })
            .collect();
        let total_adjusted: f64 = species_adjusted.iter().sum();

        let offspring_counts: Vec<usize> = if total_adjusted > 0.0 {
            species_adjusted
                .iter()
                .map(|&adjusted| {
                    ((adjusted / total_adjusted) * settings.n_organisms as f64).round() as usize
                })
                .collect()
        } else {
            let n_species = self.species.len().max(1);
            vec![settings.n_organisms / n_species; self.species.len()]
        };

        let breeders: Vec<Vec<OrganismIndex>> = self
            .species
            .iter()
            .map(|species| {
                let n_breeders =
                    ((species.members.len() as f64) * settings.survival_fraction).ceil() as usize;
                species.members.iter().take(n_breeders.max(1)).copied().collect()
            })
            .collect();

        let elites: Vec<Vec<OrganismIndex>> = self
            .species
            .iter()
            .map(|species| {
                if species.members.len() >= settings.elitism_min_species_size {
                    species
                        .members
                        .iter()
                        .take(settings.elitism_count)
                        .copied()
                        .collect()
                } else {
                    Vec::new()
                }
            })
            .collect();
        let n_children: Vec<usize> = offspring_counts
            .iter()
            .zip(&elites)
            .map(|(&count, species_elites)| count.saturating_sub(species_elites.len()))
            .collect();

        let seeds: Vec<u64> = (0..self.species.len()).map(|_| rng.gen()).collect();
        let organisms = &self.organisms;
        let innovation = Mutex::new(&mut self.innovation);

        let broods: Vec<Vec<Genome>> = (0..breeders.len())
            .into_par_iter()
            .map(|species_index| {
                let mut local_rng = Xoshiro256PlusPlus::seed_from_u64(seeds[species_index]);
                let own_breeders = &breeders[species_index];
                let mut brood = Vec::with_capacity(n_children[species_index]);
                for _ in 0..n_children[species_index] {
                    let parent_1 =
                        &organisms[own_breeders[local_rng.gen_range(0..own_breeders.len())]];
                    let parent_2_index = if breeders.len() > 1
                        && local_rng.gen::<f64>() < settings.interspecies_mating_rate
                    {
                        let mut other = local_rng.gen_range(0..breeders.len());
                        if other == species_index {
                            other = (other + 1) % breeders.len();
                        }
                        breeders[other][local_rng.gen_range(0..breeders[other].len())]
                    } else {
                        own_breeders[local_rng.gen_range(0..own_breeders.len())]
                    };
                    let parent_2 = &organisms[parent_2_index];

                    let mut child = cross_over(
                        &mut local_rng,
                        settings,
                        &parent_1.genome,
                        parent_1.fitness,
                        &parent_2.genome,
                        parent_2.fitness,
                    );
                    {
                        let mut table = innovation.lock().unwrap();
                        child.mutate(&mut local_rng, &mut **table, settings);
                    }
                    brood.push(child);
                }
                brood
            })
            .collect();
        drop(innovation);

        let mut elite_genomes: Vec<Genome> = elites
            .iter()
            .flatten()
            .map(|&index| self.organisms[index].genome.clone())
            .collect();
        elite_genomes.truncate(settings.n_organisms);

        let mut children: Vec<Genome> = broods.into_iter().flatten().collect();
        let target_children = settings.n_organisms - elite_genomes.len();
        let all_breeders: Vec<OrganismIndex> = breeders.into_iter().flatten().collect();
        while children.len() < target_children && !all_breeders.is_empty() {
            let parent = &self.organisms[all_breeders[rng.gen_range(0..all_breeders.len())]];
            let mut child = parent.genome.clone();
            child.mutate(rng, &mut self.innovation, settings);
            children.push(child);
        }
        children.truncate(target_children);

        let new_population = elite_genomes
            .into_iter()
            .chain(children)
            .map(|genome| Organism::from_genome(genome, settings))
            .collect();
        self.organisms = Organisms::new(new_population);
    }

    /// Stagnation escape hatch: the population is rebuilt as the champion
    /// plus mutated champion clones (or fresh organisms if no champion
    /// exists yet).
    fn restart_from_champion<R: RngCore>(&mut self, rng: &mut R, settings: &Settings) {
        let champion_genome = self.champion.as_ref().map(|champion| champion.genome.clone());
        let mut new_population = Vec::with_capacity(settings.n_organisms);
        match champion_genome {
            Some(genome) => {
                new_population.push(Organism::from_genome(genome.clone(), settings));
                while new_population.len() < settings.n_organisms {
                    let mut mutant = genome.clone();
                    mutant.mutate(rng, &mut self.innovation, settings);
                    new_population.push(Organism::from_genome(mutant, settings));
                }
            }
            None => {
                while new_population.len() < settings.n_organisms {
                    new_population.push(Organism::init(rng, &mut self.innovation, settings));
                }
            }
        }
        self.organisms = Organisms::new(new_population);
        self.species.clear();
        self.gens_without_improvement = 0;
        self.speciate(settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn small_settings() -> Settings {
        let mut settings = Settings::standard(2, 1);
        settings.n_organisms = 20;
        settings.elitism_min_species_size = 1;
        settings
    }

    fn assert_speciation_total(population: &Population) {
        let mut seen = vec![0usize; population.n_organisms()];
        for species in &population.species {
            for member in &species.members {
                seen[member.0] += 1;
            }
        }
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn init_speciates_every_organism() {
        let settings = small_settings();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let population = Population::init(&mut rng, &settings).unwrap();
        assert_eq!(population.n_organisms(), 20);
        assert!(!population.species.is_empty());
        assert_speciation_total(&population);
    }

    #[test]
    fn init_rejects_bad_settings() {
        let mut settings = small_settings();
        settings.n_organisms = 0;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        assert!(matches!(
            Population::init(&mut rng, &settings),
            Err(NeatError::ConfigurationError(_))
        ));
    }

    #[test]
    fn identical_minimal_genomes_share_one_species() {
        let mut settings = small_settings();
        settings.n_organisms = 2;
        let mut innovation = InnovationTable::init(2, 1);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let organism = Organism::init(&mut rng, &mut innovation, &settings);
        let twin = organism.clone();
        assert_eq!(organism.genome.distance(&twin.genome, 1.0, 1.0, 0.4), 0.0);

        let mut population = Population {
            species: Vec::new(),
            organisms: Organisms::new(vec![organism, twin]),
            generation: 0,
            species_distance_threshold: settings.species_distance_threshold,
            innovation,
            next_species_id: 0,
            champion: None,
            gens_without_improvement: 0,
        };
        population.speciate(&settings);
        assert_eq!(population.species.len(), 1);
        assert_eq!(population.species[0].members.len(), 2);
    }

    #[test]
    fn report_fitness_validates_inputs() {
        let settings = small_settings();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut population = Population::init(&mut rng, &settings).unwrap();
        assert!(population.report_fitness(OrganismIndex(99), 1.0).is_err());
        assert!(population
            .report_fitness(OrganismIndex(0), f64::NAN)
            .is_err());
        assert!(population.report_fitness(OrganismIndex(0), -1.0).is_err());
        assert!(population.report_fitness(OrganismIndex(0), 1.0).is_ok());
    }

    #[test]
    fn advance_requires_all_fitness_reports() {
        let settings = small_settings();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut population = Population::init(&mut rng, &settings).unwrap();
        for index in 0..population.n_organisms() - 1 {
            population.report_fitness(OrganismIndex(index), 1.0).unwrap();
        }
        let err = population.advance_generation(&mut rng, &settings).unwrap_err();
        assert_eq!(err, NeatError::IncompleteFitnessReports { missing: 1 });
        // the failed advance must not have touched the population
        assert_eq!(population.generation, 0);
        assert_eq!(population.n_organisms(), settings.n_organisms);
    }

    #[test]
    fn advance_produces_a_full_new_generation() {
        let settings = small_settings();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut population = Population::init(&mut rng, &settings).unwrap();
        for index in 0..population.n_organisms() {
            population
                .report_fitness(OrganismIndex(index), index as f64)
                .unwrap();
        }
        let generation = population.advance_generation(&mut rng, &settings).unwrap();
        assert_eq!(generation, 1);
        assert_eq!(population.n_organisms(), settings.n_organisms);
        assert!(population
            .organisms
            .iter()
            .all(|organism| !organism.fitness_reported));
        assert_speciation_total(&population);
    }

    #[test]
    fn elite_genome_survives_unmutated() {
        let settings = small_settings();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let mut population = Population::init(&mut rng, &settings).unwrap();
        for index in 0..population.n_organisms() {
            population
                .report_fitness(OrganismIndex(index), 1.0 + index as f64)
                .unwrap();
        }
        let best_genome = population.organisms[OrganismIndex(population.n_organisms() - 1)]
            .genome
            .clone();
        population.advance_generation(&mut rng, &settings).unwrap();
        assert!(population
            .organisms
            .iter()
            .any(|organism| organism.genome == best_genome));
    }

    #[test]
    fn champion_tracks_best_reported_fitness() {
        let settings = small_settings();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut population = Population::init(&mut rng, &settings).unwrap();
        assert!(!population.has_champion());
        for index in 0..population.n_organisms() {
            population
                .report_fitness(OrganismIndex(index), index as f64)
                .unwrap();
        }
        population.advance_generation(&mut rng, &settings).unwrap();
        assert!(population.has_champion());
        assert_eq!(population.champion_fitness(), Some(19.0));
        assert!(population.champion_agent(&settings).is_ok());
    }

    #[test]
    fn cancelled_evaluation_leaves_reports_missing() {
        struct ConstEvaluator;
        impl Evaluator for ConstEvaluator {
            fn evaluate_single_organism(&self, organism: &mut Organism) {
                organism.fitness = 1.0;
            }
        }

        let settings = small_settings();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut population = Population::init(&mut rng, &settings).unwrap();
        let cancel = AtomicBool::new(true);
        let n_evaluated = population.evaluate_cancellable(&ConstEvaluator, &cancel);
        assert_eq!(n_evaluated, 0);
        assert!(matches!(
            population.advance_generation(&mut rng, &settings),
            Err(NeatError::IncompleteFitnessReports { .. })
        ));
    }

    #[test]
    fn stagnation_restart_keeps_population_size() {
        let mut settings = small_settings();
        settings.global_stagnation_limit = 0;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut population = Population::init(&mut rng, &settings).unwrap();

        // first advance records a champion (improvement from nothing)
        for index in 0..population.n_organisms() {
            population.report_fitness(OrganismIndex(index), 1.0).unwrap();
        }
        population.advance_generation(&mut rng, &settings).unwrap();

        // no improvement: the stagnation limit of 0 forces a restart
        for index in 0..population.n_organisms() {
            population.report_fitness(OrganismIndex(index), 1.0).unwrap();
        }
        population.advance_generation(&mut rng, &settings).unwrap();
        assert_eq!(population.generation, 2);
        assert_eq!(population.n_organisms(), settings.n_organisms);
        assert_speciation_total(&population);
        // champion itself is preserved through the restart
        let champion = population.champion_genome().unwrap().clone();
        assert!(population
            .organisms
            .iter()
            .any(|organism| organism.genome == champion));
    }
}
