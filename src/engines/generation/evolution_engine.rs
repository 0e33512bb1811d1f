use crate::config::EvolutionConfig;
use crate::data::{read_program, PopulationStore};
use crate::engines::evaluation::{Evaluation, EvaluationStatus, Evaluator, FitnessModel};
use crate::engines::generation::{
    codec,
    operators::{crossover_generation, mutate_generation, select_generation, CrossoverStats},
};
use crate::error::{GpError, Result};
use crate::instructions::InstructionSet;
use crate::types::{GenerationId, Program};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Stages of one generation cycle. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    LocateLatest,
    Load,
    Evaluate,
    Score,
    CreateNext,
    Select,
    Crossover,
    Mutate,
    Persist,
    Done,
    Failed,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleState::LocateLatest => "LOCATE_LATEST",
            CycleState::Load => "LOAD",
            CycleState::Evaluate => "EVALUATE",
            CycleState::Score => "SCORE",
            CycleState::CreateNext => "CREATE_NEXT",
            CycleState::Select => "SELECT",
            CycleState::Crossover => "CROSSOVER",
            CycleState::Mutate => "MUTATE",
            CycleState::Persist => "PERSIST",
            CycleState::Done => "DONE",
            CycleState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub source_generation: GenerationId,
    pub next_generation: GenerationId,
    pub population_size: usize,
    pub fitness: Vec<f64>,
    pub best_index: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    /// Programs scored as zero because their log was missing or malformed.
    pub unavailable_logs: Vec<usize>,
    pub timed_out: Vec<usize>,
    /// Source index of each program in the next generation.
    pub selected_sources: Vec<usize>,
    pub crossover: CrossoverStats,
    pub mutations: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub trait ProgressCallback {
    fn on_state(&mut self, state: CycleState);
    fn on_program_scored(&mut self, index: usize, fitness: f64);
    fn on_cycle_complete(&mut self, report: &GenerationReport);
}

pub struct EvolutionEngine<E: Evaluator> {
    store: PopulationStore,
    config: EvolutionConfig,
    instruction_set: InstructionSet,
    evaluator: E,
    fitness: Box<dyn FitnessModel>,
    rng: StdRng,
}

impl<E: Evaluator> EvolutionEngine<E> {
    pub fn new(
        store: PopulationStore,
        config: EvolutionConfig,
        evaluator: E,
        fitness: Box<dyn FitnessModel>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            store,
            config,
            instruction_set: InstructionSet::new(),
            evaluator,
            fitness,
            rng,
        }
    }

    pub fn with_instruction_set(mut self, instruction_set: InstructionSet) -> Self {
        self.instruction_set = instruction_set;
        self
    }

    pub fn store(&self) -> &PopulationStore {
        &self.store
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Synthesize generation 0 from random programs.
    pub fn initialize_population(&mut self) -> Result<PathBuf> {
        let staged = self.store.stage_generation(0)?;
        log::info!(
            "Creating new population with size {} at {}",
            self.store.population_size(),
            staged.target_dir().display()
        );

        let programs = (0..self.store.population_size())
            .map(|_| {
                codec::generate(
                    &self.instruction_set,
                    self.config.min_program_length,
                    self.config.max_program_length,
                    &mut self.rng,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        staged.write_all(&programs)?;
        staged.commit()
    }

    /// Run one cycle: evaluate the latest generation and derive the next.
    ///
    /// On failure nothing past the latest generation is left on disk.
    pub fn step<C: ProgressCallback>(&mut self, callback: &mut C) -> Result<GenerationReport> {
        match self.run_cycle(callback) {
            Ok(report) => {
                callback.on_state(CycleState::Done);
                callback.on_cycle_complete(&report);
                Ok(report)
            }
            Err(e) => {
                callback.on_state(CycleState::Failed);
                Err(e)
            }
        }
    }

    /// Run `cycles` consecutive steps, stopping at the first failure.
    pub fn run<C: ProgressCallback>(
        &mut self,
        cycles: usize,
        callback: &mut C,
    ) -> Result<Vec<GenerationReport>> {
        (0..cycles).map(|_| self.step(callback)).collect()
    }

    fn run_cycle<C: ProgressCallback>(&mut self, callback: &mut C) -> Result<GenerationReport> {
        let started_at = Utc::now();
        let population_size = self.store.population_size();

        callback.on_state(CycleState::LocateLatest);
        let source = self.store.latest_generation()?;
        let next = source.checked_add(1).ok_or_else(|| {
            GpError::Configuration(format!("Generation {} is the last representable", source))
        })?;
        let next_dir = self.store.generation_dir(next);
        if next_dir.exists() {
            return Err(GpError::AlreadyExists(next_dir));
        }
        log::info!(
            "Working with population at {}",
            self.store.generation_dir(source).display()
        );

        callback.on_state(CycleState::Load);
        let files = self.store.program_files(source)?;
        let programs = files
            .iter()
            .map(|(_, path)| read_program(path))
            .collect::<Result<Vec<Program>>>()?;

        callback.on_state(CycleState::Evaluate);
        let evaluations = self.evaluator.evaluate(&files)?;
        check_evaluations(&files, &evaluations)?;

        callback.on_state(CycleState::Score);
        let fitness: Vec<f64> = evaluations
            .iter()
            .map(|evaluation| {
                let score = self.fitness.score(&evaluation.log);
                callback.on_program_scored(evaluation.index, score);
                score
            })
            .collect();

        callback.on_state(CycleState::CreateNext);
        let staged = self.store.stage_generation(next)?;

        callback.on_state(CycleState::Select);
        let mut selection = select_generation(&programs, &fitness, population_size, &mut self.rng)?;

        callback.on_state(CycleState::Crossover);
        let crossover = crossover_generation(
            &mut selection.programs,
            &selection.weights,
            self.config.crossover_rate,
            self.config.allow_self_crossover,
            &mut self.rng,
        );

        callback.on_state(CycleState::Mutate);
        let mutations = mutate_generation(
            &mut selection.programs,
            &self.instruction_set,
            self.config.mutation_rate,
            &mut self.rng,
        );

        callback.on_state(CycleState::Persist);
        staged.write_all(&selection.programs)?;
        staged.commit()?;

        let (best_index, best_fitness) = fitness
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((0, 0.0));
        let mean_fitness = fitness.iter().sum::<f64>() / fitness.len().max(1) as f64;

        Ok(GenerationReport {
            source_generation: source,
            next_generation: next,
            population_size,
            best_index: evaluations.get(best_index).map_or(best_index, |e| e.index),
            best_fitness,
            mean_fitness,
            unavailable_logs: indices_with(&evaluations, |s| {
                matches!(s, EvaluationStatus::LogUnavailable { .. })
            }),
            timed_out: indices_with(&evaluations, |s| matches!(s, EvaluationStatus::TimedOut)),
            fitness,
            selected_sources: selection.sources,
            crossover,
            mutations,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

fn check_evaluations(files: &[(usize, PathBuf)], evaluations: &[Evaluation]) -> Result<()> {
    let matches = files.len() == evaluations.len()
        && files.iter().zip(evaluations).all(|((index, _), e)| *index == e.index);
    if !matches {
        return Err(GpError::EvaluatorLaunch(format!(
            "evaluator returned {} results for {} programs",
            evaluations.len(),
            files.len()
        )));
    }
    Ok(())
}

fn indices_with<F>(evaluations: &[Evaluation], predicate: F) -> Vec<usize>
where
    F: Fn(&EvaluationStatus) -> bool,
{
    evaluations
        .iter()
        .filter(|e| predicate(&e.status))
        .map(|e| e.index)
        .collect()
}
